//! SNMP Sim - many simulated SNMP v1/v2c agents in one process.
//!
//! Every agent is an IP address listed in a CSV table together with its
//! interface count and response delay. Agents answer Get, GetNext and GetBulk
//! over a synthetic interfaces MIB whose counters advance with wall-clock time.
//! A negative delay puts an agent in failure mode: requests are dropped.
//!
//! # Usage
//!
//! One socket per agent (addresses must exist locally, or use `--freebind`):
//! ```bash
//! snmp-sim --port 1611 --csv config.csv
//! ```
//!
//! One wildcard socket for all agents, demultiplexed by destination address:
//! ```bash
//! snmp-sim --mode shared --listen-addr 0.0.0.0 --csv config.csv
//! ```

/// BER encoding and decoding of SNMP messages.
pub mod codec;
/// Command-line configuration and validation.
pub mod configuration;
/// Agent lookup, fault injection and request routing.
pub mod dispatcher;
/// Get, GetNext and GetBulk tree operations.
pub mod handlers;
/// Synthetic interfaces MIB.
pub mod mib;
/// Object identifiers.
pub mod oid;
/// Decoded SNMP requests and responses.
pub mod pdu;
/// Agent table loaded from CSV.
pub mod registry;
/// UDP sockets and per-datagram tasks.
pub mod transport;
