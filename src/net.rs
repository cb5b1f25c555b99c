//! Decoding of the socket addresses found in /proc/net tables
//!
//! Files such as /proc/net/tcp or /proc/net/udp6 describe socket endpoints as
//! `HEXADDR:HEXPORT` tokens. The address is a fixed-width run of hex digits
//! (8 for IPv4, 32 for IPv6) without any inner separator, made of 32-bit words
//! which the kernel prints as host-endian integers. The port is a plain hex
//! number.

use crate::error::{Error, Result};
use crate::number::{to_number, Base};
use crate::splitter::split;
use itertools::Itertools;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};


/// Number of hex digits used to print one 32-bit address word
const HEX_WORD_LEN: usize = 8;

/// Number of 32-bit words in an IPv6 address
const IPV6_WORDS: usize = 4;

/// Separator between the address and the port
const ADDRESS_DELIM: char = ':';


/// Raw IP address, as printed by the kernel
///
/// Each 32-bit word is stored as the big-endian bytes of its hex digits, so
/// that "0100007F" becomes [0x01, 0x00, 0x00, 0x7F]. Use `to_std()` to get
/// the actual network address.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IpAddress {
    V4([u8; 4]),
    V6([u8; 16]),
}
//
impl IpAddress {
    /// Interpret the raw words the way the kernel produced them, i.e. as
    /// host-endian integers holding network-ordered bytes
    pub fn to_std(&self) -> IpAddr {
        match *self {
            IpAddress::V4(raw) => {
                IpAddr::V4(Ipv4Addr::from(host_word(raw)))
            },
            IpAddress::V6(raw) => {
                let mut octets = [0u8; 16];
                for (src, dst) in raw.chunks_exact(4)
                                     .zip(octets.chunks_exact_mut(4)) {
                    let word = [src[0], src[1], src[2], src[3]];
                    dst.copy_from_slice(&host_word(word));
                }
                IpAddr::V6(Ipv6Addr::from(octets))
            },
        }
    }
}

/// Reorder one address word from digit order to memory order
#[inline]
fn host_word(digits: [u8; 4]) -> [u8; 4] {
    u32::from_be_bytes(digits).to_ne_bytes()
}


/// Socket endpoint: an address and a port
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SocketAddress {
    pub ip: IpAddress,
    pub port: u16,
}


/// Decode one 8-digit hex word into its big-endian bytes
fn parse_hex_word(hex: &str) -> Result<[u8; 4]> {
    if hex.len() != HEX_WORD_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::malformed(hex, "an 8-digit hex address word"));
    }
    let word: u32 = to_number(hex, Base::Hex)?;
    Ok(word.to_be_bytes())
}


/// Decode an IPv4 address made of exactly 8 hex digits
pub fn parse_ipv4(hex: &str) -> Result<IpAddress> {
    parse_hex_word(hex).map(IpAddress::V4)
}


/// Decode an IPv6 address made of exactly 32 hex digits (four 8-digit words)
pub fn parse_ipv6(hex: &str) -> Result<IpAddress> {
    if hex.len() != IPV6_WORDS * HEX_WORD_LEN || !hex.is_ascii() {
        return Err(Error::malformed(hex, "a 32-digit hex IPv6 address"));
    }

    let mut raw = [0u8; 16];
    for (idx, bytes) in raw.chunks_exact_mut(4).enumerate() {
        let start = idx * HEX_WORD_LEN;
        let word = parse_hex_word(&hex[start..start + HEX_WORD_LEN])?;
        bytes.copy_from_slice(&word);
    }
    Ok(IpAddress::V6(raw))
}


/// Decode a `HEXADDR:HEXPORT` socket address token
///
/// The address family is told apart by the length of the address token.
/// There must be exactly one delimiter, with text on both sides of it.
///
pub fn parse_address(token: &str) -> Result<SocketAddress> {
    if token.matches(ADDRESS_DELIM).count() != 1 {
        return Err(Error::corrupted("socket address: unexpected token count",
                                    token));
    }
    let (ip_str, port_str) =
        split(token, ADDRESS_DELIM, true)
             .into_iter()
             .collect_tuple()
             .ok_or_else(|| {
                 Error::corrupted("socket address: unexpected token count",
                                  token)
             })?;

    let ip = match ip_str.len() {
        len if len == HEX_WORD_LEN => parse_ipv4(&ip_str)?,
        len if len == IPV6_WORDS * HEX_WORD_LEN => parse_ipv6(&ip_str)?,
        _ => return Err(Error::corrupted("socket address: bad length", token)),
    };

    let port = to_number(&port_str, Base::Hex)?;
    Ok(SocketAddress { ip, port })
}
