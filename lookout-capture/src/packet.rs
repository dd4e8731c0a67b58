/// Packets collected during one capture window.
use std::time::Duration;

use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct CapturedPacket {
    /// Capture time since the unix epoch.
    pub timestamp: Duration,
    /// Length on the wire; `data` may be shorter when truncated by snaplen.
    pub orig_len: u32,
    pub data: Bytes,
}

impl CapturedPacket {
    pub fn new(timestamp: Duration, orig_len: u32, data: Vec<u8>) -> Self {
        CapturedPacket {
            timestamp,
            orig_len,
            data: Bytes::from(data),
        }
    }
}

/// Everything one window produced, plus what a savefile header needs.
#[derive(Debug, Clone)]
pub struct CapturedTraffic {
    pub linktype: u32,
    pub snaplen: u32,
    packets: Vec<CapturedPacket>,
}

impl CapturedTraffic {
    pub fn new(linktype: u32, snaplen: u32) -> Self {
        Self {
            linktype,
            snaplen,
            packets: Vec::new(),
        }
    }

    pub fn push(&mut self, packet: CapturedPacket) {
        self.packets.push(packet);
    }

    pub fn packets(&self) -> &[CapturedPacket] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.packets.iter().map(|p| p.data.len() as u64).sum()
    }
}
