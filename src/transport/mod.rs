//! UDP transport for the simulated agents.
//!
//! Platform backends:
//! - **Linux**: nix `recvmsg`/`sendmsg` with IP_PKTINFO, so the destination of
//!   every datagram is known and replies leave from the simulated agent's address.
//!   Also provides IP_FREEBIND and SO_BINDTODEVICE.
//! - **Other platforms**: plain tokio sockets; the destination is the bound address.
//!
//! Each receive loop only reads datagrams. Every datagram is handled on its own
//! task, so a delayed agent never holds up reception.

#[cfg(target_os = "linux")]
mod nix;
#[cfg(target_os = "linux")]
use self::nix as backend;

#[cfg(not(target_os = "linux"))]
mod default;
#[cfg(not(target_os = "linux"))]
use self::default as backend;

use std::{
    fmt, io,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use clap::ValueEnum;
use tokio::{net::UdpSocket, task::JoinHandle};

use crate::{codec, dispatcher::Dispatcher, pdu::PduType};

/// Receive buffer size; larger datagrams are truncated and fail to decode.
pub const RECV_BUFFER_SIZE: usize = 4096;

/// How simulated agents are mapped onto sockets.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum TransportMode {
    /// One socket per agent, bound to the agent's address.
    #[default]
    PerAgent,
    /// One socket for all agents, demultiplexed by destination address.
    Shared,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportMode::PerAgent => write!(f, "per-agent"),
            TransportMode::Shared => write!(f, "shared"),
        }
    }
}

/// Socket options applied before and after bind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// IP_FREEBIND: bind addresses not present on any local interface.
    pub freebind: bool,
    /// SO_BINDTODEVICE target.
    pub device: Option<String>,
}

/// A received datagram with its addressing metadata.
#[derive(Debug)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub source: SocketAddr,
    /// Original destination address, when the backend can report it.
    pub destination: Option<IpAddr>,
}

/// Binds a UDP socket with destination-address reporting enabled where supported.
pub fn bind(addr: SocketAddr, options: &SocketOptions) -> io::Result<UdpSocket> {
    backend::bind(addr, options)
}

/// Binds one socket per registry entry and spawns its receive loop.
///
/// Agents whose key is not an IP address, or whose socket cannot be bound,
/// are logged and skipped; the others keep running.
pub fn spawn_per_agent(
    dispatcher: Arc<Dispatcher>,
    port: u16,
    options: &SocketOptions,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    for (key, config) in dispatcher.registry().iter() {
        let ip: IpAddr = match key.parse() {
            Ok(ip) => ip,
            Err(_) => {
                log::error!("[{}] Agent key is not an IP address, not binding", key);
                continue;
            }
        };
        let addr = SocketAddr::new(ip, port);

        let socket = match bind(addr, options) {
            Ok(socket) => Arc::new(socket),
            Err(e) => {
                log::error!("[{}] Bind Error: {}", key, e);
                continue;
            }
        };

        log::info!(
            "[{}] Active (IFs: {}, Delay: {}ms)",
            key,
            config.if_count,
            config.delay_ms
        );

        handles.push(tokio::spawn(serve(
            socket,
            dispatcher.clone(),
            ip,
            TransportMode::PerAgent,
        )));
    }

    handles
}

/// Binds the shared socket and spawns its receive loop.
pub fn spawn_shared(
    dispatcher: Arc<Dispatcher>,
    addr: SocketAddr,
    options: &SocketOptions,
) -> io::Result<JoinHandle<()>> {
    let socket = Arc::new(bind(addr, options)?);
    log::info!(
        "Shared socket listening on {} for {} agents",
        addr,
        dispatcher.registry().len()
    );
    Ok(tokio::spawn(serve(
        socket,
        dispatcher,
        addr.ip(),
        TransportMode::Shared,
    )))
}

/// Receive loop: reads datagrams and hands each one to its own task.
///
/// `fallback` identifies the agent when the backend cannot report the
/// destination address. In shared mode replies are sent from the destination
/// address of the request.
pub async fn serve(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    fallback: IpAddr,
    mode: TransportMode,
) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let datagram = match backend::recv(&socket, &mut buf).await {
            Ok(datagram) => datagram,
            Err(e) => {
                log::warn!("[{}] Read error: {}", fallback, e);
                continue;
            }
        };

        let reply_from = match mode {
            TransportMode::PerAgent => None,
            TransportMode::Shared => datagram.destination,
        };

        tokio::spawn(handle_datagram(
            socket.clone(),
            dispatcher.clone(),
            datagram,
            fallback,
            reply_from,
        ));
    }
}

/// Decodes, dispatches, encodes and sends the reply for one datagram.
pub async fn handle_datagram(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher>,
    datagram: Datagram,
    fallback: IpAddr,
    reply_from: Option<IpAddr>,
) {
    let agent = datagram.destination.unwrap_or(fallback).to_string();

    let request = match codec::decode(&datagram.payload) {
        Ok(request) => request,
        Err(e) => {
            log::debug!(
                "[{}] Dropping undecodable datagram from {}: {}",
                agent,
                datagram.source,
                e
            );
            return;
        }
    };

    let Some(response) = dispatcher.dispatch(&agent, &request).await else {
        return;
    };

    let encoded = match request.pdu_type {
        PduType::GetBulk => codec::encode_fitting(&response),
        _ => codec::encode(&response),
    };

    let out = match encoded {
        Ok(out) => out,
        Err(e) => {
            log::warn!("[{}] Cannot encode response to {}: {}", agent, datagram.source, e);
            return;
        }
    };

    match backend::send(&socket, &out, datagram.source, reply_from).await {
        Ok(_) => log::info!(
            "[{}] SENT Response to {} ({} varbinds)",
            agent,
            datagram.source,
            response.varbinds.len()
        ),
        Err(e) => log::warn!("[{}] Failed to send response to {}: {}", agent, datagram.source, e),
    }
}
