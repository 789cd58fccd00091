//! Network configuration structures

/// SNTP client configuration
#[derive(Debug, Clone)]
pub struct SntpConfig {
    /// NTP servers to try (in order)
    pub servers: &'static [&'static str],
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum accepted stratum level (1-15)
    pub max_stratum: u8,
}

impl Default for SntpConfig {
    fn default() -> Self {
        Self {
            servers: &["pool.ntp.org", "time.google.com", "time.cloudflare.com"],
            timeout_ms: 5000,
            max_stratum: 3,
        }
    }
}

/// Network stack configuration
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// MAC address for Ethernet
    pub mac_addr: [u8; 6],
    /// Random seed for network stack
    pub seed: u64,
    /// How long one connect attempt waits for a DHCP lease
    pub dhcp_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mac_addr: [0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
            seed: 0x1234_5678_u64,
            dhcp_timeout_ms: 10_000,
        }
    }
}
