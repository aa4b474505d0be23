//! Art-Net 4 packet encoding
//!
//! Only the packets a controller needs: OpDmx and OpPoll out, OpPollReply in.

use std::net::Ipv4Addr;

use stagectl_core::{DmxUniverse, DMX_CHANNELS};

/// UDP port of every Art-Net node
pub const ARTNET_PORT: u16 = 6454;

const ARTNET_ID: &[u8; 8] = b"Art-Net\0";
const PROTOCOL_VERSION: u16 = 14;

/// OpCode of a poll request
pub const OP_POLL: u16 = 0x2000;
/// OpCode of a poll reply
pub const OP_POLL_REPLY: u16 = 0x2100;
/// OpCode of a DMX data packet
pub const OP_DMX: u16 = 0x5000;

const DMX_HEADER_LEN: usize = 18;
const POLL_LEN: usize = 14;
const SHORT_NAME: std::ops::Range<usize> = 26..44;
const LONG_NAME: std::ops::Range<usize> = 44..108;

/// Art-Net port address of a universe.
///
/// A 16-bit universe is split big-endian: the high byte is the Net, the low
/// byte the Sub-Net/Universe nibble pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortAddress {
    pub net: u8,
    pub sub_uni: u8,
}

impl PortAddress {
    pub fn from_universe(universe: DmxUniverse) -> Self {
        let [net, sub_uni] = universe.to_be_bytes();
        Self { net, sub_uni }
    }

    pub fn to_universe(self) -> DmxUniverse {
        u16::from_be_bytes([self.net, self.sub_uni])
    }
}

/// Build an OpDmx packet carrying a full universe
pub fn build_dmx_packet(sequence: u8, port: PortAddress, channels: &[u8; DMX_CHANNELS]) -> Vec<u8> {
    let mut packet = vec![0u8; DMX_HEADER_LEN + DMX_CHANNELS];

    packet[0..8].copy_from_slice(ARTNET_ID);
    // OpCode is little-endian, everything else big-endian
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet[12] = sequence;
    // physical input port
    packet[13] = 0;
    packet[14] = port.sub_uni;
    packet[15] = port.net;
    packet[16..18].copy_from_slice(&(DMX_CHANNELS as u16).to_be_bytes());
    packet[DMX_HEADER_LEN..].copy_from_slice(channels);

    packet
}

/// Build an OpPoll packet asking every node to reply
pub fn build_poll_packet() -> Vec<u8> {
    let mut packet = vec![0u8; POLL_LEN];
    packet[0..8].copy_from_slice(ARTNET_ID);
    packet[8..10].copy_from_slice(&OP_POLL.to_le_bytes());
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    // flags: send replies on change
    packet[12] = 0b0000_0010;
    packet
}

/// Read the OpCode of a packet, `None` when it is not Art-Net
pub fn op_code(packet: &[u8]) -> Option<u16> {
    if packet.len() < 10 || &packet[0..8] != ARTNET_ID {
        return None;
    }
    Some(u16::from_le_bytes([packet[8], packet[9]]))
}

/// A node that answered a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtNetNode {
    pub ip: Ipv4Addr,
    pub short_name: String,
    pub long_name: String,
}

impl std::fmt::Display for ArtNetNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.short_name.is_empty() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.short_name, self.ip)
        }
    }
}

/// Parse an OpPollReply. Names are optional, short packets keep them empty.
pub fn parse_poll_reply(packet: &[u8]) -> Option<ArtNetNode> {
    if op_code(packet)? != OP_POLL_REPLY || packet.len() < 14 {
        return None;
    }

    let ip = Ipv4Addr::new(packet[10], packet[11], packet[12], packet[13]);
    Some(ArtNetNode {
        ip,
        short_name: packet.get(SHORT_NAME).map(c_string).unwrap_or_default(),
        long_name: packet.get(LONG_NAME).map(c_string).unwrap_or_default(),
    })
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
