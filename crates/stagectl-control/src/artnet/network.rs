//! UDP transport for Art-Net
//!
//! Picks the local interface to speak Art-Net on and owns the socket all DMX
//! packets leave through.

use std::collections::BTreeMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use stagectl_core::DMX_CHANNELS;

use super::packet::{
    build_dmx_packet, build_poll_packet, parse_poll_reply, ArtNetNode, PortAddress, ARTNET_PORT,
};
use super::{ArtNetConfig, DmxSender};
use crate::error::{ControlError, Result};

/// Probe targets in order of preference: Art-Net primary (2.0.0.0/8) and
/// secondary (10.0.0.0/8) networks, then any routable address.
const PROBES: [(&str, Option<u8>); 3] = [
    ("2.255.255.255:6454", Some(2)),
    ("10.255.255.255:6454", Some(10)),
    ("192.0.2.1:6454", None),
];

/// Local IPv4 address the OS would use to reach `target`. Connecting a UDP
/// socket sends nothing, it only resolves the route.
fn local_addr_towards(target: &str) -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(target).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() && !ip.is_loopback() => Some(ip),
        _ => None,
    }
}

/// Find the IPv4 address of the interface to use for Art-Net
pub fn find_artnet_ip() -> Result<Ipv4Addr> {
    for (target, network) in PROBES {
        let Some(ip) = local_addr_towards(target) else {
            continue;
        };
        if network.map_or(true, |first| ip.octets()[0] == first) {
            tracing::debug!("Art-Net interface {} found via {}", ip, target);
            return Ok(ip);
        }
    }
    Err(ControlError::NoInterfaceFound)
}

/// Broadcast address for an interface address. The Art-Net networks use
/// their /8 broadcast, everything else the limited broadcast.
pub fn broadcast_for(ip: Ipv4Addr) -> Ipv4Addr {
    match ip.octets()[0] {
        2 => Ipv4Addr::new(2, 255, 255, 255),
        10 => Ipv4Addr::new(10, 255, 255, 255),
        _ => Ipv4Addr::BROADCAST,
    }
}

/// Art-Net over UDP broadcast
#[derive(Debug)]
pub struct UdpArtNetSender {
    /// `None` once closed
    socket: RwLock<Option<UdpSocket>>,
    local_ip: Ipv4Addr,
    target: SocketAddr,
    sequence: AtomicU8,
    reply_window: Duration,
    nodes: Mutex<BTreeMap<Ipv4Addr, ArtNetNode>>,
}

impl UdpArtNetSender {
    /// Open the socket on the configured or discovered interface
    pub fn new(config: &ArtNetConfig) -> Result<Self> {
        let local_ip = match config.bind_address {
            Some(ip) => ip,
            None => find_artnet_ip()?,
        };
        let broadcast = config
            .broadcast_address
            .unwrap_or_else(|| broadcast_for(local_ip));

        // replies are broadcast to the Art-Net port, fall back to an
        // ephemeral port when another controller holds it
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, ARTNET_PORT))
            .or_else(|_| UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)))?;
        socket.set_broadcast(true)?;
        socket.set_read_timeout(Some(Duration::from_millis(50)))?;

        tracing::info!(
            "Art-Net sender on {} ({}) -> {}",
            local_ip,
            socket.local_addr()?,
            broadcast
        );

        Ok(Self {
            socket: RwLock::new(Some(socket)),
            local_ip,
            target: SocketAddr::V4(SocketAddrV4::new(broadcast, ARTNET_PORT)),
            sequence: AtomicU8::new(0),
            reply_window: Duration::from_millis(config.reply_window_ms),
            nodes: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn local_ip(&self) -> Ipv4Addr {
        self.local_ip
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn is_closed(&self) -> bool {
        self.socket.read().is_none()
    }

    fn closed_error() -> ControlError {
        ControlError::DmxError("Art-Net sender is closed".to_string())
    }

    /// Next sequence number. Zero disables sequencing, so it is skipped.
    fn next_sequence(&self) -> u8 {
        let previous = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some(if s == u8::MAX { 1 } else { s + 1 })
            })
            .unwrap_or_default();
        if previous == u8::MAX {
            1
        } else {
            previous + 1
        }
    }
}

impl DmxSender for UdpArtNetSender {
    fn send_dmx(&self, port: PortAddress, data: &[u8; DMX_CHANNELS]) -> Result<()> {
        let socket = self.socket.read();
        let socket = socket.as_ref().ok_or_else(Self::closed_error)?;
        let packet = build_dmx_packet(self.next_sequence(), port, data);
        socket.send_to(&packet, self.target)?;
        tracing::trace!(
            "Sent Art-Net DMX packet for net {} sub-uni {}",
            port.net,
            port.sub_uni
        );
        Ok(())
    }

    fn discover(&self) -> Result<usize> {
        // a handle of our own, closing must not wait for the reply window
        let socket = match self.socket.read().as_ref() {
            Some(socket) => socket.try_clone()?,
            None => return Err(Self::closed_error()),
        };
        socket.send_to(&build_poll_packet(), self.target)?;

        let deadline = Instant::now() + self.reply_window;
        let mut buf = [0u8; 1024];
        let mut found = 0;

        while Instant::now() < deadline {
            let len = match socket.recv_from(&mut buf) {
                Ok((len, _)) => len,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(node) = parse_poll_reply(&buf[..len]) {
                // our own traffic is looped back on broadcast
                if node.ip == self.local_ip {
                    continue;
                }
                let mut nodes = self.nodes.lock();
                if nodes.insert(node.ip, node.clone()).is_none() {
                    tracing::info!("Discovered Art-Net node {}", node);
                    found += 1;
                }
            }
        }

        Ok(found)
    }

    fn nodes(&self) -> Vec<ArtNetNode> {
        self.nodes.lock().values().cloned().collect()
    }

    fn close(&self) {
        if self.socket.write().take().is_some() {
            tracing::info!("Art-Net sender on {} closed", self.local_ip);
        }
    }
}
