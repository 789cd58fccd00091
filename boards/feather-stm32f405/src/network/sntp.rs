//! SNTP client (RFC 4330) over a raw UDP socket

use defmt::{info, warn, Debug2Format};
use embassy_futures::select::{select, Either};
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Instant, Timer};
use hal_abstractions::{CalendarTimestamp, TimeService};

use super::config::SntpConfig;
use super::error::NetworkError;

/// NTP epoch offset (1900-01-01 to 1970-01-01 in seconds)
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;
const NTP_PORT: u16 = 123;
const NTP_PACKET_LEN: usize = 48;
/// LI=0, VN=3, Mode=3 (client)
const CLIENT_REQUEST: u8 = 0x1B;
const MODE_SERVER: u8 = 4;

/// Server transmit time with the round-trip correction applied
#[derive(Debug, Clone, Copy)]
struct NtpTime {
    unix_secs: u64,
    micros: u32,
}

impl NtpTime {
    fn from_ntp(ntp_secs: u64, ntp_frac: u32) -> Self {
        Self {
            unix_secs: ntp_secs.saturating_sub(NTP_UNIX_OFFSET),
            // NTP fraction is in units of 2^-32 seconds
            micros: ((ntp_frac as u64 * 1_000_000) >> 32) as u32,
        }
    }

    fn add_micros(mut self, micros: u64) -> Self {
        let total = self.micros as u64 + micros;
        self.unix_secs = self.unix_secs.saturating_add(total / 1_000_000);
        self.micros = (total % 1_000_000) as u32;
        self
    }

    /// Whole seconds, rounded to nearest
    fn rounded_secs(&self) -> u64 {
        self.unix_secs + u64::from(self.micros >= 500_000)
    }
}

pub struct SntpClient {
    stack: Stack<'static>,
    config: SntpConfig,
}

impl SntpClient {
    pub fn new(stack: Stack<'static>, config: SntpConfig) -> Self {
        Self { stack, config }
    }

    /// One request to one server
    async fn request(&self, server: &str) -> Result<NtpTime, NetworkError> {
        let server_ip = self
            .stack
            .dns_query(server, DnsQueryType::A)
            .await
            .map_err(|_| NetworkError::DnsError)?
            .first()
            .copied()
            .ok_or(NetworkError::DnsError)?;

        let server_endpoint = IpEndpoint::new(server_ip, NTP_PORT);
        info!("Resolved {} to {}", server, Debug2Format(&server_endpoint));

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; 64];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_buffer = [0u8; 64];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| NetworkError::SocketError)?;

        let mut request = [0u8; NTP_PACKET_LEN];
        request[0] = CLIENT_REQUEST;
        let transmit_time = Instant::now();
        socket
            .send_to(&request, server_endpoint)
            .await
            .map_err(|_| NetworkError::SocketError)?;

        let mut response = [0u8; NTP_PACKET_LEN];
        let timeout = Timer::after(Duration::from_millis(self.config.timeout_ms));
        let (recv_len, from) = match select(timeout, socket.recv_from(&mut response)).await {
            Either::First(_) => return Err(NetworkError::Timeout),
            Either::Second(result) => result.map_err(|_| NetworkError::SocketError)?,
        };
        let rtt = Instant::now().duration_since(transmit_time);

        if recv_len < NTP_PACKET_LEN || from.endpoint.addr != server_ip {
            return Err(NetworkError::InvalidResponse);
        }
        if response[0] & 0x07 != MODE_SERVER {
            return Err(NetworkError::InvalidResponse);
        }

        let stratum = response[1];
        if stratum == 0 || stratum > self.config.max_stratum {
            warn!(
                "Invalid stratum {} (max {})",
                stratum, self.config.max_stratum
            );
            return Err(NetworkError::ServerError);
        }

        let tx_secs =
            u32::from_be_bytes([response[40], response[41], response[42], response[43]]) as u64;
        let tx_frac =
            u32::from_be_bytes([response[44], response[45], response[46], response[47]]);
        if tx_secs == 0 {
            return Err(NetworkError::InvalidResponse);
        }

        let time = NtpTime::from_ntp(tx_secs, tx_frac).add_micros(rtt.as_micros() / 2);
        info!(
            "NTP time {}.{:06} from stratum {} (RTT {} us)",
            time.unix_secs,
            time.micros,
            stratum,
            rtt.as_micros()
        );
        Ok(time)
    }
}

impl TimeService for SntpClient {
    type Error = NetworkError;

    async fn fetch_utc_now(&mut self) -> Result<CalendarTimestamp, NetworkError> {
        for server in self.config.servers {
            match self.request(server).await {
                Ok(time) => return Ok(CalendarTimestamp::from_unix(time.rounded_secs())),
                Err(e) => warn!("SNTP request to {} failed: {:?}", server, e),
            }
        }
        Err(NetworkError::AllServersFailed)
    }
}
