//! Clock and alarm configuration structures

use core::fmt;

use crate::dst::DstRule;
use crate::time_of_day::SecondsOfDay;
use crate::trigger::TriggerPolicy;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Alarm time is not a valid "HHMM" string or second of the day
    InvalidAlarmTime,
    /// Alarm must sound for at least one second
    ZeroDuration,
    /// UTC offset outside -14..=12 hours (west-positive)
    InvalidUtcOffset,
    /// Poll interval, polls per second or toggle cadence is zero
    InvalidCadence,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAlarmTime => write!(f, "Invalid alarm time"),
            Self::ZeroDuration => write!(f, "Alarm duration must be non-zero"),
            Self::InvalidUtcOffset => write!(f, "UTC offset out of range"),
            Self::InvalidCadence => write!(f, "Poll cadence must be non-zero"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// When the alarm sounds and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    /// Local time the alarm starts
    pub trigger: SecondsOfDay,
    /// Seconds the alarm sounds unless cancelled
    pub duration_secs: u32,
}

impl AlarmConfig {
    pub fn new(trigger_secs: u32, duration_secs: u32) -> Result<Self, ConfigError> {
        let trigger = SecondsOfDay::new(trigger_secs).ok_or(ConfigError::InvalidAlarmTime)?;
        Self::with_trigger(trigger, duration_secs)
    }

    /// Parse a 24-hour `"HHMM"` alarm time such as `"0530"`
    pub fn from_hhmm(hhmm: &str, duration_secs: u32) -> Result<Self, ConfigError> {
        let bytes = hhmm.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(ConfigError::InvalidAlarmTime);
        }
        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[2] - b'0') * 10 + (bytes[3] - b'0');
        let trigger =
            SecondsOfDay::from_hms(hour, minute, 0).ok_or(ConfigError::InvalidAlarmTime)?;
        Self::with_trigger(trigger, duration_secs)
    }

    fn with_trigger(trigger: SecondsOfDay, duration_secs: u32) -> Result<Self, ConfigError> {
        if duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(Self {
            trigger,
            duration_secs,
        })
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            trigger: SecondsOfDay::wrapping(19_800), // 05:30
            duration_secs: 300,
        }
    }
}

/// Time-keeping and poll-loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Hours behind UTC, west-positive (8 = Pacific)
    pub utc_offset_hours: i8,
    /// Daylight-saving rule, evaluated on the UTC date at each sync
    pub dst_rule: DstRule,
    /// Local time of the daily network resync
    pub resync_at: SecondsOfDay,
    /// Delay between poll cycles
    pub poll_interval_ms: u32,
    /// Poll cycles per second; gates display refresh and sync checks
    pub polls_per_second: u32,
    /// Poll cycles between LED/buzzer toggles while the alarm sounds
    pub toggle_every_polls: u32,
    /// How the alarm and resync instants are detected
    pub trigger_policy: TriggerPolicy,
    /// Wait after a failed connect or fetch before retrying
    pub retry_backoff_ms: u32,
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-14..=12).contains(&self.utc_offset_hours) {
            return Err(ConfigError::InvalidUtcOffset);
        }
        if self.poll_interval_ms == 0 || self.polls_per_second == 0 || self.toggle_every_polls == 0
        {
            return Err(ConfigError::InvalidCadence);
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 8,
            dst_rule: DstRule::UnitedStates,
            resync_at: SecondsOfDay::NOON,
            poll_interval_ms: 10,
            polls_per_second: 100,
            toggle_every_polls: 50,
            trigger_policy: TriggerPolicy::Crossing,
            retry_backoff_ms: 5000,
        }
    }
}
