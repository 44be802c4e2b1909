//! # Echo Packets
//!
//! Building ICMP / ICMPv6 echo requests, the optional hand-built IPv4 header
//! carrying IP options, and parsing echo replies.

use std::net::{IpAddr, Ipv4Addr};

use anyhow::{Context, bail};
use echoscan_common::config::{MAX_RECORD_ROUTE, MAX_SOURCE_ROUTE, MAX_TIMESTAMP, ProbeOptions};
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{self as icmp_echo_request, MutableEchoRequestPacket};
use pnet::packet::icmp::IcmpTypes;
use pnet::packet::icmpv6::{self, Icmpv6Code, Icmpv6Types};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{self, Ipv4Flags, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::Packet;
use pnet::util;

pub const ICMP_HEADER_LEN: usize = 8;
pub const IPV4_HEADER_LEN: usize = 20;
pub const MAX_IP_OPTIONS_LEN: usize = 40;

const PAYLOAD_PATTERN: &[u8] = b"abcdefghijklmnopqrstuvw";

const OPT_END: u8 = 0;
const OPT_NOP: u8 = 1;
const OPT_RECORD_ROUTE: u8 = 7;
const OPT_TIMESTAMP: u8 = 68;
const OPT_LOOSE_SOURCE_ROUTE: u8 = 131;
const OPT_STRICT_SOURCE_ROUTE: u8 = 137;

/// Fields of an echo reply that matter to the prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub identifier: u16,
    pub sequence: u16,
    pub payload_len: usize,
    pub ttl: Option<u8>,
    pub route_hops: Vec<Ipv4Addr>,
    pub timestamps: Vec<u32>,
}

impl ParsedReply {
    fn new(identifier: u16, sequence: u16, payload_len: usize) -> Self {
        Self {
            identifier,
            sequence,
            payload_len,
            ttl: None,
            route_hops: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    /// Datagram ICMP sockets rewrite the identifier, so it is only checked
    /// when `identifier` is given.
    pub fn matches(&self, identifier: Option<u16>, sequence: u16) -> bool {
        self.sequence == sequence && identifier.is_none_or(|id| id == self.identifier)
    }
}

pub fn payload(size: usize) -> Vec<u8> {
    PAYLOAD_PATTERN.iter().copied().cycle().take(size).collect()
}

pub fn echo_request_v4(identifier: u16, sequence: u16, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![0u8; ICMP_HEADER_LEN + payload.len()];
    let mut packet = MutableEchoRequestPacket::new(&mut buf).context("failed to create echo request packet")?;
    packet.set_icmp_type(IcmpTypes::EchoRequest);
    packet.set_icmp_code(icmp_echo_request::IcmpCodes::NoCode);
    packet.set_identifier(identifier);
    packet.set_sequence_number(sequence);
    packet.set_payload(payload);
    let checksum: u16 = util::checksum(packet.packet(), 1);
    packet.set_checksum(checksum);
    Ok(buf)
}

/// The checksum is left zero; the kernel fills it in for ICMPv6 sockets.
pub fn echo_request_v6(identifier: u16, sequence: u16, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![0u8; ICMP_HEADER_LEN + payload.len()];
    let mut packet =
        icmpv6::echo_request::MutableEchoRequestPacket::new(&mut buf).context("failed to create echo request packet")?;
    packet.set_icmpv6_type(Icmpv6Types::EchoRequest);
    packet.set_icmpv6_code(Icmpv6Code(0));
    packet.set_identifier(identifier);
    packet.set_sequence_number(sequence);
    packet.set_payload(payload);
    packet.set_checksum(0);
    Ok(buf)
}

/// Encodes every requested IP option, padded to a 32-bit boundary.
pub fn ip_options(options: &ProbeOptions) -> anyhow::Result<Vec<u8>> {
    if options.record_route > MAX_RECORD_ROUTE {
        bail!("record route supports at most {MAX_RECORD_ROUTE} hops");
    }
    if options.timestamp > MAX_TIMESTAMP {
        bail!("timestamp supports at most {MAX_TIMESTAMP} hops");
    }
    if !options.loose_source_route.is_empty() && !options.strict_source_route.is_empty() {
        bail!("loose and strict source routes cannot be combined");
    }

    let mut bytes: Vec<u8> = Vec::new();
    if options.record_route > 0 {
        push_empty_slots(&mut bytes, OPT_RECORD_ROUTE, 3, options.record_route);
    }
    if options.timestamp > 0 {
        push_empty_slots(&mut bytes, OPT_TIMESTAMP, 4, options.timestamp);
    }
    if !options.loose_source_route.is_empty() {
        push_source_route(&mut bytes, OPT_LOOSE_SOURCE_ROUTE, &options.loose_source_route)?;
    }
    if !options.strict_source_route.is_empty() {
        push_source_route(&mut bytes, OPT_STRICT_SOURCE_ROUTE, &options.strict_source_route)?;
    }

    while bytes.len() % 4 != 0 {
        bytes.push(OPT_END);
    }
    if bytes.len() > MAX_IP_OPTIONS_LEN {
        bail!(
            "requested IP options need {} bytes but the header holds {MAX_IP_OPTIONS_LEN}",
            bytes.len()
        );
    }
    Ok(bytes)
}

/// Option with `slots` zeroed 4-byte slots after a `header_len` byte header.
/// Record route has a 3-byte header, timestamp a 4-byte one.
fn push_empty_slots(bytes: &mut Vec<u8>, kind: u8, header_len: u8, slots: u8) {
    let len: u8 = header_len + 4 * slots;
    bytes.extend([kind, len, header_len + 1]);
    if header_len == 4 {
        // overflow / flags: timestamps only
        bytes.push(0);
    }
    bytes.resize(bytes.len() + 4 * usize::from(slots), 0);
}

fn push_source_route(bytes: &mut Vec<u8>, kind: u8, hops: &[IpAddr]) -> anyhow::Result<()> {
    if hops.len() > MAX_SOURCE_ROUTE {
        bail!("source route supports at most {MAX_SOURCE_ROUTE} hops");
    }
    let len = u8::try_from(3 + 4 * hops.len())?;
    bytes.extend([kind, len, 4]);
    for hop in hops {
        match hop {
            IpAddr::V4(v4) => bytes.extend(v4.octets()),
            IpAddr::V6(v6) => bail!("source route hop {v6} is not an IPv4 address"),
        }
    }
    Ok(())
}

/// Wraps `icmp` in an IPv4 header carrying the TOS, TTL, DF flag and IP
/// options from `options`. An unspecified `source` is filled in by the kernel.
pub fn ipv4_datagram(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    options: &ProbeOptions,
    icmp: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let ip_options = ip_options(options)?;
    let header_len: usize = IPV4_HEADER_LEN + ip_options.len();
    let total_len: usize = header_len + icmp.len();
    let Ok(total_len_field) = u16::try_from(total_len) else {
        bail!("a {total_len} byte datagram exceeds the IPv4 maximum");
    };

    let mut buf = vec![0u8; total_len];
    buf[IPV4_HEADER_LEN..header_len].copy_from_slice(&ip_options);
    buf[header_len..].copy_from_slice(icmp);

    let mut packet = MutableIpv4Packet::new(&mut buf).context("failed to create IPv4 packet")?;
    packet.set_version(4);
    packet.set_header_length((header_len / 4) as u8);
    packet.set_dscp(options.tos >> 2);
    packet.set_ecn(options.tos & 0b11);
    packet.set_total_length(total_len_field);
    packet.set_identification(rand::random());
    packet.set_flags(if options.dont_fragment { Ipv4Flags::DontFragment } else { 0 });
    packet.set_fragment_offset(0);
    packet.set_ttl(options.ttl);
    packet.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
    packet.set_source(source);
    packet.set_destination(destination);
    let checksum: u16 = ipv4::checksum(&packet.to_immutable());
    packet.set_checksum(checksum);
    Ok(buf)
}

/// Parses an ICMPv4 echo reply, with or without the leading IPv4 header.
///
/// Raw sockets always deliver the header. Datagram sockets do on some
/// platforms; an ICMP message never starts with a `4` nibble, which tells
/// the two apart.
pub fn parse_echo_reply_v4(data: &[u8]) -> Option<ParsedReply> {
    if data.first().is_none_or(|byte| byte >> 4 != 4) {
        return parse_icmp_echo_reply(data);
    }

    let ip = Ipv4Packet::new(data)?;
    let header_len: usize = usize::from(ip.get_header_length()) * 4;
    if header_len < IPV4_HEADER_LEN || data.len() < header_len {
        return None;
    }

    let mut reply = parse_icmp_echo_reply(&data[header_len..])?;
    reply.ttl = Some(ip.get_ttl());
    read_ip_options(&data[IPV4_HEADER_LEN..header_len], &mut reply);
    Some(reply)
}

fn parse_icmp_echo_reply(data: &[u8]) -> Option<ParsedReply> {
    let packet = EchoReplyPacket::new(data)?;
    if packet.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    Some(ParsedReply::new(
        packet.get_identifier(),
        packet.get_sequence_number(),
        packet.payload().len(),
    ))
}

/// ICMPv6 sockets never deliver the IPv6 header, so the hop limit is unknown.
pub fn parse_echo_reply_v6(data: &[u8]) -> Option<ParsedReply> {
    let packet = icmpv6::echo_reply::EchoReplyPacket::new(data)?;
    if packet.get_icmpv6_type() != Icmpv6Types::EchoReply {
        return None;
    }
    Some(ParsedReply::new(
        packet.get_identifier(),
        packet.get_sequence_number(),
        packet.payload().len(),
    ))
}

fn read_ip_options(options: &[u8], reply: &mut ParsedReply) {
    let mut offset: usize = 0;
    while offset < options.len() {
        match options[offset] {
            OPT_END => break,
            OPT_NOP => offset += 1,
            kind => {
                let Some(&len) = options.get(offset + 1) else {
                    break;
                };
                let len = usize::from(len);
                if len < 2 || offset + len > options.len() {
                    break;
                }
                let option = &options[offset..offset + len];
                match kind {
                    OPT_RECORD_ROUTE => reply.route_hops = filled_slots(option, 3).map(Ipv4Addr::from).collect(),
                    OPT_TIMESTAMP => reply.timestamps = filled_slots(option, 4).collect(),
                    _ => {}
                }
                offset += len;
            }
        }
    }
}

/// Slots before the option's pointer, which is the 1-based offset of the
/// next free slot.
fn filled_slots(option: &[u8], data_start: usize) -> impl Iterator<Item = u32> + '_ {
    let pointer: usize = option.get(2).map_or(0, |p| usize::from(*p));
    let end: usize = pointer.saturating_sub(1).min(option.len());
    let start: usize = data_start.min(end);
    option[start..end]
        .chunks_exact(4)
        .map(|slot| u32::from_be_bytes([slot[0], slot[1], slot[2], slot[3]]))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
