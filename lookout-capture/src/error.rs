use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device '{0}' not found")]
    DeviceNotFound(String),

    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),

    #[error("pcap file error: {0}")]
    Savefile(#[from] pcap_file::PcapError),

    #[error("No free capture file name for '{0}'")]
    NameExhausted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
