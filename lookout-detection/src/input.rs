//! Classifying pipeline inputs by file extension.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `.pcap` / `.pcapng` savefile; the pipeline extracts flows first.
    Capture,
    /// `.csv` of pre-extracted flow features.
    Features,
}

impl InputKind {
    /// `None` for anything the pipeline does not accept.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pcap" | "pcapng" => Some(InputKind::Capture),
            "csv" => Some(InputKind::Features),
            _ => None,
        }
    }

    pub fn is_raw_capture(self) -> bool {
        self == InputKind::Capture
    }

    /// Short name reported to API clients.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Capture => "pcap",
            InputKind::Features => "csv",
        }
    }
}
