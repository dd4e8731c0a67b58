use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use pcap::{Capture, Device};
use pcap_file::pcap::PcapReader;
use tracing::{debug, trace, warn};

use lookout_core::StopSignal;

use crate::error::CaptureError;
use crate::packet::{CapturedPacket, CapturedTraffic};

/// A capture primitive: blocks for (at most) one window and returns what it saw.
///
/// Implementations must return promptly once `stop` is triggered, at the
/// latest after one internal read timeout. Whatever was collected so far is
/// returned; the caller decides whether a stopped window is worth keeping.
pub trait PacketSource: Send + Sync {
    fn capture(&self, window: Duration, stop: &StopSignal) -> Result<CapturedTraffic, CaptureError>;
}

/// Live capture from a network interface through libpcap.
#[derive(Debug, Clone)]
pub struct LiveCapture {
    pub interface: String,
    pub promiscuous: bool,
    pub snaplen: u32,
    pub buffer_size: usize,
    /// libpcap read timeout; also bounds how long a stop request waits mid-window.
    pub read_timeout_ms: u32,
}

impl LiveCapture {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            promiscuous: true,
            snaplen: 65535,
            buffer_size: 1_048_576,
            read_timeout_ms: 1000,
        }
    }
}

impl PacketSource for LiveCapture {
    fn capture(&self, window: Duration, stop: &StopSignal) -> Result<CapturedTraffic, CaptureError> {
        // List available devices and select the one matching the interface name.
        let device = Device::list()?
            .into_iter()
            .find(|d| d.name == self.interface)
            .ok_or_else(|| CaptureError::DeviceNotFound(self.interface.clone()))?;

        let mut cap = Capture::from_device(device)?
            .promisc(self.promiscuous)
            .snaplen(self.snaplen as i32)
            .buffer_size(self.buffer_size as i32)
            .timeout(self.read_timeout_ms as i32)
            .open()?;

        let linktype = cap.get_datalink().0 as u32;
        let mut traffic = CapturedTraffic::new(linktype, self.snaplen);
        let deadline = Instant::now() + window;

        debug!(interface = %self.interface, ?window, "Capture window opened");

        while Instant::now() < deadline && !stop.is_triggered() {
            match cap.next_packet() {
                Ok(packet) => {
                    let ts = packet.header.ts;
                    let timestamp =
                        Duration::new(ts.tv_sec as u64, (ts.tv_usec as u32).saturating_mul(1000));
                    trace!("Captured packet: {} bytes", packet.data.len());
                    traffic.push(CapturedPacket::new(
                        timestamp,
                        packet.header.len,
                        packet.data.to_vec(),
                    ));
                }
                Err(pcap::Error::TimeoutExpired) => {
                    // No packet within the read timeout; re-check deadline and stop flag.
                    continue;
                }
                Err(e) => {
                    warn!("Capture on {} aborted: {e}", self.interface);
                    return Err(e.into());
                }
            }
        }

        debug!(packets = traffic.len(), "Capture window closed");
        Ok(traffic)
    }
}

/// Replays a recorded `.pcap` file as if it were one capture window.
///
/// Each call returns the whole file immediately; `window` is ignored. Useful
/// for running the live loop on hosts without capture privileges.
#[derive(Debug, Clone)]
pub struct ReplayCapture {
    pub path: PathBuf,
}

impl ReplayCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PacketSource for ReplayCapture {
    fn capture(&self, _window: Duration, stop: &StopSignal) -> Result<CapturedTraffic, CaptureError> {
        let file = File::open(&self.path)?;
        let mut reader = PcapReader::new(BufReader::new(file))?;
        let header = reader.header();

        let mut traffic = CapturedTraffic::new(u32::from(header.datalink), header.snaplen);

        while let Some(packet) = reader.next_packet() {
            if stop.is_triggered() {
                break;
            }
            let packet = packet?;
            traffic.push(CapturedPacket::new(
                packet.timestamp,
                packet.orig_len,
                packet.data.into_owned(),
            ));
        }

        debug!(path = %self.path.display(), packets = traffic.len(), "Replayed capture file");
        Ok(traffic)
    }
}
