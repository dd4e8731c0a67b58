//! Persisting a capture window as a classic `.pcap` savefile.
//!
//! File names are `capture_<YYYY-MM-DD_HH-MM-SS>.pcap` so a directory listing
//! sorts chronologically. Files are created with create-new semantics; if a
//! name is taken (two windows in the same second) a `_<n>` suffix is added.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;
use tracing::{debug, warn};

use crate::error::CaptureError;
use crate::packet::CapturedTraffic;

const MAX_NAME_ATTEMPTS: usize = 1000;

/// Base file stem for a capture taken at `at`.
pub fn capture_stem<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("capture_{}", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Create a fresh, uniquely named capture file in `dir`.
pub fn create_capture_file<Tz: TimeZone>(
    dir: &Path,
    at: &DateTime<Tz>,
) -> Result<(File, PathBuf), CaptureError>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir)?;
    let stem = capture_stem(at);

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{stem}.pcap")
        } else {
            format!("{stem}_{attempt}.pcap")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(CaptureError::NameExhausted(stem))
}

/// Write `traffic` as a pcap stream. Returns the number of packets written.
pub fn write_savefile<W: Write>(writer: W, traffic: &CapturedTraffic) -> Result<usize, CaptureError> {
    let header = PcapHeader {
        datalink: DataLink::from(traffic.linktype),
        snaplen: traffic.snaplen,
        ..Default::default()
    };

    let mut pcap_writer = PcapWriter::with_header(BufWriter::new(writer), header)?;
    for packet in traffic.packets() {
        pcap_writer.write_packet(&PcapPacket::new(
            packet.timestamp,
            packet.orig_len,
            &packet.data,
        ))?;
    }

    pcap_writer.into_writer().flush()?;
    Ok(traffic.len())
}

/// Persist one window under a timestamped name in `dir`; returns the file path.
///
/// A partially written file is removed before the error is returned.
pub fn persist<Tz: TimeZone>(
    dir: &Path,
    traffic: &CapturedTraffic,
    at: &DateTime<Tz>,
) -> Result<PathBuf, CaptureError>
where
    Tz::Offset: std::fmt::Display,
{
    let (file, path) = create_capture_file(dir, at)?;

    match write_savefile(file, traffic) {
        Ok(count) => {
            debug!(path = %path.display(), packets = count, "Capture persisted");
            Ok(path)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&path) {
                warn!("Failed to remove partial capture {}: {remove_err}", path.display());
            }
            Err(e)
        }
    }
}
