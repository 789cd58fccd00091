//! Network side of the clock
//!
//! - **`config`**: configuration structs with `Default` implementations
//! - **`connector`**: DHCP link bring-up behind `NetworkConnector`
//! - **`error`**: error enum for network operations
//! - **`sntp`**: raw-UDP SNTP client behind `TimeService`
//!
//! Both collaborators borrow the same `embassy_net::Stack`; the stack and
//! its runners live in the clock task.

pub mod config;
pub mod connector;
pub mod error;
pub mod sntp;

pub use config::{NetworkConfig, SntpConfig};
pub use connector::EthernetConnector;
pub use error::NetworkError;
pub use sntp::SntpClient;
