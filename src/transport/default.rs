//! Default backend using plain tokio UDP sockets.
//!
//! The destination address of a datagram is not available, so agents are
//! identified by the address the socket is bound to and replies leave from it.

use std::{
    io,
    net::{IpAddr, SocketAddr},
};

use tokio::net::UdpSocket;

use super::{Datagram, SocketOptions};

pub(super) fn bind(addr: SocketAddr, _options: &SocketOptions) -> io::Result<UdpSocket> {
    let std_socket = std::net::UdpSocket::bind(addr)?;
    std_socket.set_nonblocking(true)?;
    UdpSocket::from_std(std_socket)
}

pub(super) async fn recv(socket: &UdpSocket, buf: &mut [u8]) -> io::Result<Datagram> {
    let (len, source) = socket.recv_from(buf).await?;
    Ok(Datagram {
        payload: buf[..len].to_vec(),
        source,
        destination: None,
    })
}

pub(super) async fn send(
    socket: &UdpSocket,
    payload: &[u8],
    to: SocketAddr,
    _from: Option<IpAddr>,
) -> io::Result<usize> {
    socket.send_to(payload, to).await
}
