//! One echo exchange per call over a short-lived `socket2` socket.
//!
//! The socket is connected to the target so the kernel drops traffic from
//! any other source before it reaches the receive loop.

use std::io::{ErrorKind, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};

use anyhow::Context;
use echoscan_common::config::ProbeOptions;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::packet::{self, ParsedReply};
use crate::prober::EchoReply;

const RECV_BUFFER_SIZE: usize = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    /// `SOCK_RAW`, needs privileges.
    Raw,
    /// Unprivileged `SOCK_DGRAM` ICMP. The kernel owns the identifier.
    Datagram,
}

impl SocketMode {
    fn socket_type(self) -> Type {
        match self {
            SocketMode::Raw => Type::RAW,
            SocketMode::Datagram => Type::DGRAM,
        }
    }

    fn expected_identifier(self, identifier: u16) -> Option<u16> {
        match self {
            SocketMode::Raw => Some(identifier),
            SocketMode::Datagram => None,
        }
    }
}

pub fn echo_v4(
    dst: Ipv4Addr,
    options: &ProbeOptions,
    mode: SocketMode,
    identifier: u16,
    sequence: u16,
) -> anyhow::Result<Option<EchoReply>> {
    let socket = open(Domain::IPV4, mode, Protocol::ICMPV4, IpAddr::V4(dst), options.source_address)?;

    let request = packet::echo_request_v4(identifier, sequence, &packet::payload(options.payload_size))?;
    let datagram = if mode == SocketMode::Raw && options.needs_ip_options() {
        socket
            .set_header_included_v4(true)
            .context("failed to enable IP header inclusion")?;
        let source = match options.source_address {
            Some(IpAddr::V4(src)) => src,
            _ => Ipv4Addr::UNSPECIFIED,
        };
        packet::ipv4_datagram(source, dst, options, &request)?
    } else {
        socket
            .set_ttl(u32::from(options.ttl))
            .context(format!("failed to set TTL to {}", options.ttl))?;
        if options.tos != 0 {
            socket
                .set_tos(u32::from(options.tos))
                .context(format!("failed to set TOS to {}", options.tos))?;
        }
        request
    };

    let expected = mode.expected_identifier(identifier);
    exchange(&socket, &datagram, options.timeout, |data| {
        packet::parse_echo_reply_v4(data).filter(|reply| reply.matches(expected, sequence))
    })
}

pub fn echo_v6(
    dst: Ipv6Addr,
    options: &ProbeOptions,
    mode: SocketMode,
    identifier: u16,
    sequence: u16,
) -> anyhow::Result<Option<EchoReply>> {
    let socket = open(Domain::IPV6, mode, Protocol::ICMPV6, IpAddr::V6(dst), options.source_address)?;
    socket
        .set_unicast_hops_v6(u32::from(options.ttl))
        .context(format!("failed to set hop limit to {}", options.ttl))?;

    let request = packet::echo_request_v6(identifier, sequence, &packet::payload(options.payload_size))?;

    let expected = mode.expected_identifier(identifier);
    exchange(&socket, &request, options.timeout, |data| {
        packet::parse_echo_reply_v6(data).filter(|reply| reply.matches(expected, sequence))
    })
}

fn open(
    domain: Domain,
    mode: SocketMode,
    protocol: Protocol,
    dst: IpAddr,
    source: Option<IpAddr>,
) -> anyhow::Result<Socket> {
    let socket = Socket::new(domain, mode.socket_type(), Some(protocol))
        .context(format!("failed to create {mode:?} ICMP socket"))?;

    if let Some(src) = source.filter(|src| src.is_ipv4() == dst.is_ipv4()) {
        socket
            .bind(&SockAddr::from(SocketAddr::new(src, 0)))
            .context(format!("failed to bind source address {src}"))?;
    }
    socket
        .connect(&SockAddr::from(SocketAddr::new(dst, 0)))
        .context(format!("failed to connect socket to {dst}"))?;
    Ok(socket)
}

/// Sends `datagram` and reads until `accept` recognizes a reply or the
/// timeout runs out.
fn exchange<F>(socket: &Socket, datagram: &[u8], timeout: Duration, accept: F) -> anyhow::Result<Option<EchoReply>>
where
    F: Fn(&[u8]) -> Option<ParsedReply>,
{
    let started = Instant::now();
    socket.send(datagram).context("failed to send echo request")?;

    let deadline = started + timeout;
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let mut reader: &Socket = socket;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        socket
            .set_read_timeout(Some(remaining))
            .context("failed to set read timeout on socket")?;

        let len = match reader.read(&mut buf) {
            Ok(len) => len,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("failed to receive echo reply"),
        };

        if let Some(reply) = accept(&buf[..len]) {
            return Ok(Some(EchoReply {
                rtt: started.elapsed(),
                ttl: reply.ttl,
                bytes: reply.payload_len,
                route_hops: reply.route_hops,
                timestamps: reply.timestamps,
            }));
        }
    }
}
