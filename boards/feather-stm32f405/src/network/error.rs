//! Network error types

use defmt::Format;

/// Network operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// W5500 did not respond during bring-up
    DeviceInit,
    /// DNS resolution failed
    DnsError,
    /// Socket bind/send/receive error
    SocketError,
    /// Request timeout
    Timeout,
    /// Short packet, wrong sender or wrong mode
    InvalidResponse,
    /// Server error (e.g., invalid stratum for NTP)
    ServerError,
    /// All configured servers failed
    AllServersFailed,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DeviceInit => write!(f, "Ethernet device init failed"),
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::Timeout => write!(f, "Request timeout"),
            Self::InvalidResponse => write!(f, "Invalid response"),
            Self::ServerError => write!(f, "Server error"),
            Self::AllServersFailed => write!(f, "All servers failed"),
        }
    }
}

impl core::error::Error for NetworkError {}
