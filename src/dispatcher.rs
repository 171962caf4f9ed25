//! Per-request entry point: agent lookup, fault injection and PDU routing.

use std::{sync::Arc, time::Duration};

use crate::{
    handlers,
    mib::{self, MibProfile},
    pdu::{PduType, Request, Response, Value, Version},
    registry::AgentRegistry,
};

/// Routes decoded requests to the simulated agent they were addressed to.
///
/// Holds no mutable state; one instance is shared by every receive loop and
/// request task.
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    profile: MibProfile,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>, profile: MibProfile) -> Self {
        Dispatcher { registry, profile }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Answers `request` as the agent identified by `destination`.
    ///
    /// Returns `None` when no reply must be sent: unknown agent, failure mode,
    /// or an unsupported PDU. A positive delay suspends only this future.
    pub async fn dispatch(&self, destination: &str, request: &Request) -> Option<Response> {
        let Some(config) = self.registry.lookup(destination).copied() else {
            log::debug!("Ignoring request for unknown agent {}", destination);
            return None;
        };

        if config.is_failing() {
            log::info!(
                "[{}] DROP {} (ID: {}) (failure mode)",
                destination,
                request.pdu_type,
                request.request_id
            );
            return None;
        }

        if config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.delay_ms as u64)).await;
        }

        self.respond(destination, config.if_count, request)
    }

    /// Builds the response without any delay handling.
    fn respond(&self, destination: &str, if_count: u32, request: &Request) -> Option<Response> {
        log::info!(
            "[{}] <<< Received {} (ID: {})",
            destination,
            request.pdu_type,
            request.request_id
        );
        for (i, oid) in request.oids.iter().enumerate() {
            log::debug!("    Varbind[{}]: OID={}", i, oid);
        }

        let mut snapshot = mib::generate(if_count, self.profile);
        if request.version == Version::V1 {
            // SNMPv1 has no Counter64; such objects are outside a v1 manager's view.
            snapshot.retain(|vb| !matches!(vb.value, Value::Counter64(_)));
        }

        let varbinds = match request.pdu_type {
            PduType::Get => handlers::get(&request.oids, &snapshot),
            PduType::GetNext => handlers::get_next(&request.oids, &snapshot),
            PduType::GetBulk => handlers::get_bulk(
                &request.oids,
                request.non_repeaters,
                request.max_repetitions,
                &snapshot,
            ),
            PduType::Other(_) => {
                log::warn!("[{}] Unsupported PDU type: {}", destination, request.pdu_type);
                return None;
            }
        };

        Some(Response::for_request(request, varbinds))
    }
}
