//! lookout‑capture
//!
//! Traffic acquisition for the live detection loop.
//!
//! - `capture`: the `PacketSource` seam plus the libpcap live source and a
//!   file replay source
//! - `savefile`: persisting a capture window as a timestamped `.pcap`

pub mod capture;
pub mod error;
pub mod packet;
pub mod savefile;

pub use capture::{LiveCapture, PacketSource, ReplayCapture};
pub use error::CaptureError;
pub use packet::{CapturedPacket, CapturedTraffic};
