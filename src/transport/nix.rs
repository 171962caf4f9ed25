//! Linux backend using the nix crate for per-datagram addressing.
//!
//! IP_PKTINFO/IPV6_RECVPKTINFO report the destination address of every
//! datagram, which identifies the simulated agent on a wildcard socket.
//! Replies carry the same address back in an outgoing pktinfo control message
//! so they leave from the agent's address rather than the primary one.

use std::{
    io::{self, IoSlice, IoSliceMut},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    os::fd::{AsRawFd, RawFd},
};

use nix::{
    libc,
    sys::socket::{
        recvmsg, sendmsg, socket, AddressFamily, ControlMessage, ControlMessageOwned, MsgFlags,
        RecvMsg, SockFlag, SockType, SockaddrIn, SockaddrIn6, SockaddrLike, SockaddrStorage,
    },
};
use tokio::{io::Interest, net::UdpSocket};

use super::{Datagram, SocketOptions};

/// Control message buffer; large enough for one in6_pktinfo.
const CMSG_BUFFER_SIZE: usize = 256;

/// Sets an integer socket option, mapping failure to the OS error.
fn set_int_option(fd: RawFd, level: libc::c_int, name: libc::c_int) -> io::Result<()> {
    let enable: libc::c_int = 1;
    let result = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &enable as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn bind_to_device(fd: RawFd, device: &str) -> io::Result<()> {
    let result = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            device.as_ptr() as *const libc::c_void,
            device.len() as libc::socklen_t,
        )
    };

    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn bind_raw<S: SockaddrLike>(fd: RawFd, addr: &S) -> io::Result<()> {
    let result = unsafe { libc::bind(fd, addr.as_ptr(), addr.len()) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(super) fn bind(addr: SocketAddr, options: &SocketOptions) -> io::Result<UdpSocket> {
    let family = match addr {
        SocketAddr::V4(_) => AddressFamily::Inet,
        SocketAddr::V6(_) => AddressFamily::Inet6,
    };

    let owned = socket(
        family,
        SockType::Datagram,
        SockFlag::SOCK_CLOEXEC | SockFlag::SOCK_NONBLOCK,
        None,
    )?;
    let fd = owned.as_raw_fd();

    // Options that affect bind must be set first.
    if options.freebind {
        set_int_option(fd, libc::SOL_IP, libc::IP_FREEBIND)?;
    }
    if let Some(ref device) = options.device {
        bind_to_device(fd, device)?;
    }

    match addr {
        SocketAddr::V4(v4) => bind_raw(fd, &SockaddrIn::from(v4))?,
        SocketAddr::V6(v6) => bind_raw(fd, &SockaddrIn6::from(v6))?,
    }

    let pktinfo = if addr.is_ipv6() {
        set_int_option(fd, libc::IPPROTO_IPV6, libc::IPV6_RECVPKTINFO)
    } else {
        set_int_option(fd, libc::IPPROTO_IP, libc::IP_PKTINFO)
    };
    if let Err(e) = pktinfo {
        log::warn!(
            "Failed to set IP_PKTINFO/IPV6_RECVPKTINFO on {}: {} (agents identified by bind address)",
            addr,
            e
        );
    }

    let std_socket = std::net::UdpSocket::from(owned);
    UdpSocket::from_std(std_socket)
}

pub(super) async fn recv(socket: &UdpSocket, buf: &mut [u8]) -> io::Result<Datagram> {
    let fd = socket.as_raw_fd();
    let mut cmsg_buf = vec![0u8; CMSG_BUFFER_SIZE];

    let (len, source, destination) = socket
        .async_io(Interest::READABLE, || {
            let mut iov = [IoSliceMut::new(&mut buf[..])];
            let msg = recvmsg::<SockaddrStorage>(
                fd,
                &mut iov,
                Some(&mut cmsg_buf),
                MsgFlags::MSG_DONTWAIT,
            )?;
            let source = msg.address.as_ref().and_then(to_socket_addr);
            let destination = extract_dst_addr_from_cmsgs(&msg);
            Ok((msg.bytes, source, destination))
        })
        .await?;

    let source = source.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "datagram without source address")
    })?;

    Ok(Datagram {
        payload: buf[..len].to_vec(),
        source,
        destination,
    })
}

pub(super) async fn send(
    socket: &UdpSocket,
    payload: &[u8],
    to: SocketAddr,
    from: Option<IpAddr>,
) -> io::Result<usize> {
    let Some(from) = from else {
        return socket.send_to(payload, to).await;
    };

    let fd = socket.as_raw_fd();
    socket
        .async_io(Interest::WRITABLE, || {
            let iov = [IoSlice::new(payload)];
            let sent = match (from, to) {
                (IpAddr::V4(src), SocketAddr::V4(dst)) => {
                    let info = libc::in_pktinfo {
                        ipi_ifindex: 0,
                        ipi_spec_dst: libc::in_addr {
                            s_addr: u32::from(src).to_be(),
                        },
                        ipi_addr: libc::in_addr { s_addr: 0 },
                    };
                    sendmsg(
                        fd,
                        &iov,
                        &[ControlMessage::Ipv4PacketInfo(&info)],
                        MsgFlags::empty(),
                        Some(&SockaddrIn::from(dst)),
                    )?
                }
                (IpAddr::V6(src), SocketAddr::V6(dst)) => {
                    let info = libc::in6_pktinfo {
                        ipi6_addr: libc::in6_addr {
                            s6_addr: src.octets(),
                        },
                        ipi6_ifindex: 0,
                    };
                    sendmsg(
                        fd,
                        &iov,
                        &[ControlMessage::Ipv6PacketInfo(&info)],
                        MsgFlags::empty(),
                        Some(&SockaddrIn6::from(dst)),
                    )?
                }
                // Mixed families: let the kernel pick the source.
                (_, SocketAddr::V4(dst)) => sendmsg::<SockaddrIn>(
                    fd,
                    &iov,
                    &[],
                    MsgFlags::empty(),
                    Some(&SockaddrIn::from(dst)),
                )?,
                (_, SocketAddr::V6(dst)) => sendmsg::<SockaddrIn6>(
                    fd,
                    &iov,
                    &[],
                    MsgFlags::empty(),
                    Some(&SockaddrIn6::from(dst)),
                )?,
            };
            Ok(sent)
        })
        .await
}

fn to_socket_addr(addr: &SockaddrStorage) -> Option<SocketAddr> {
    if let Some(v4) = addr.as_sockaddr_in() {
        Some(std::net::SocketAddrV4::new(v4.ip(), v4.port()).into())
    } else {
        addr.as_sockaddr_in6()
            .map(|v6| std::net::SocketAddrV6::new(v6.ip(), v6.port(), 0, 0).into())
    }
}

/// Destination address from IP_PKTINFO/IPV6_PKTINFO, if present.
fn extract_dst_addr_from_cmsgs(msg: &RecvMsg<SockaddrStorage>) -> Option<IpAddr> {
    let cmsgs = msg.cmsgs().ok()?;

    for cmsg in cmsgs {
        match cmsg {
            ControlMessageOwned::Ipv4PacketInfo(pktinfo) => {
                return Some(IpAddr::V4(Ipv4Addr::from(
                    u32::from_be(pktinfo.ipi_addr.s_addr),
                )));
            }
            ControlMessageOwned::Ipv6PacketInfo(pktinfo) => {
                return Some(IpAddr::V6(Ipv6Addr::from(pktinfo.ipi6_addr.s6_addr)));
            }
            _ => {}
        }
    }

    None
}
