pub use clap::Parser;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

use crate::{mib::MibProfile, transport::TransportMode};

/// Linux IFNAMSIZ including the trailing NUL.
const IFNAMSIZ: usize = 16;

/// ConfigurationError is returned when the command line describes an unusable setup.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigurationError {
    #[error("UDP port must not be 0")]
    InvalidPort,
    #[error("Interface name {0:?} is empty or longer than {max} bytes", max = IFNAMSIZ - 1)]
    InvalidInterface(String),
    #[error("Socket option --{0} is only supported on Linux")]
    UnsupportedOption(&'static str),
}

#[derive(Parser, Debug, Clone)]
#[command(author = "Piotr Olszewski", version, about, long_about = None)]
pub struct Configuration {
    /// UDP port every simulated agent listens on
    #[arg(short, long, default_value_t = 1611)]
    pub port: u16,
    /// Path to the agent table (CSV: ip,if_count,delay_ms)
    #[arg(short, long, default_value = "config.csv")]
    pub csv: PathBuf,
    /// Socket layout: one socket per agent, or one shared socket demultiplexed by destination
    #[arg(short, long, value_enum, default_value_t = TransportMode::PerAgent)]
    pub mode: TransportMode,
    /// Address the shared socket binds to (shared mode only)
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_addr: IpAddr,
    /// Objects exposed by every simulated device
    #[arg(long, value_enum, default_value_t = MibProfile::Full)]
    pub profile: MibProfile,
    /// Allow binding addresses that are not configured on any local interface (IP_FREEBIND)
    #[arg(long, default_value_t = false)]
    pub freebind: bool,
    /// Bind sockets to this network device (SO_BINDTODEVICE)
    #[arg(short, long)]
    pub iface: Option<String>,
}

impl Configuration {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.port == 0 {
            return Err(ConfigurationError::InvalidPort);
        }

        if let Some(ref name) = self.iface {
            if name.is_empty() || name.len() >= IFNAMSIZ {
                return Err(ConfigurationError::InvalidInterface(name.clone()));
            }
        }

        if !cfg!(target_os = "linux") {
            if self.freebind {
                return Err(ConfigurationError::UnsupportedOption("freebind"));
            }
            if self.iface.is_some() {
                return Err(ConfigurationError::UnsupportedOption("iface"));
            }
        }

        if self.mode == TransportMode::PerAgent && !self.listen_addr.is_unspecified() {
            log::warn!("--listen-addr is ignored in per-agent mode");
        }

        Ok(())
    }
}
