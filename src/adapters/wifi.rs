//! WiFi station-mode link.
//!
//! [`WifiLink`] owns the credentials, the connection state and the
//! reconnect schedule.  The radio itself sits behind [`WifiDriver`] so the
//! policy can be exercised on the host.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspWifiDriver`] wraps `BlockingWifi`.
//! - **all other targets**: only the policy and the trait are compiled.
//!
//! ## Reconnection policy
//!
//! After a failed attempt or a lost link the next attempt waits an
//! exponential backoff (2 s → 4 s → 8 s … capped at 60 s).  A successful
//! connect resets the backoff.

use core::fmt;

use heapless::String;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

/// Radio operations the link policy needs.
pub trait WifiDriver {
    /// Blocking connect; returns once the interface has an address.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

// ── Validation ────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_credentials(ssid: &str, password: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ── Backoff ───────────────────────────────────────────────────

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current_ms: u32,
}

impl Backoff {
    pub const fn new() -> Self {
        Self { current_ms: INITIAL_BACKOFF_MS }
    }

    /// Delay before the next attempt; doubles the one after.
    pub fn next_delay_ms(&mut self) -> u32 {
        let delay = self.current_ms;
        self.current_ms = self.current_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        delay
    }

    pub fn reset(&mut self) {
        self.current_ms = INITIAL_BACKOFF_MS;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

// ── Link ──────────────────────────────────────────────────────

pub struct WifiLink<D> {
    driver: D,
    ssid: String<32>,
    password: String<64>,
    state: WifiState,
    backoff: Backoff,
    retry_at_ms: u64,
}

impl<D: WifiDriver> WifiLink<D> {
    pub fn new(driver: D, ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        validate_credentials(ssid, password)?;
        let mut s = String::new();
        s.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        let mut p = String::new();
        p.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(Self {
            driver,
            ssid: s,
            password: p,
            state: WifiState::Disconnected,
            backoff: Backoff::new(),
            retry_at_ms: 0,
        })
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    /// First connection attempt.  On failure the link moves to
    /// `Reconnecting` and [`poll`](Self::poll) takes over.
    pub fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        info!("WiFi: connecting to '{}'", self.ssid);
        self.attempt(now_ms, 0)
    }

    /// Drive the reconnect schedule.  Call periodically.
    pub fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected => {
                if !self.driver.is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(now_ms, 0);
                }
            }
            WifiState::Reconnecting { attempt } if now_ms >= self.retry_at_ms => {
                info!("WiFi: reconnect attempt {}", attempt + 1);
                // failure is already logged and rescheduled
                let _ = self.attempt(now_ms, attempt);
            }
            _ => {}
        }
    }

    fn attempt(&mut self, now_ms: u64, attempt: u32) -> Result<(), ConnectivityError> {
        match self.driver.connect(&self.ssid, &self.password) {
            Ok(()) => {
                self.state = WifiState::Connected;
                self.backoff.reset();
                info!("WiFi: connected to '{}'", self.ssid);
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.schedule_retry(now_ms, attempt + 1);
                Err(e)
            }
        }
    }

    fn schedule_retry(&mut self, now_ms: u64, attempt: u32) {
        let delay = self.backoff.next_delay_ms();
        self.retry_at_ms = now_ms + u64::from(delay);
        self.state = WifiState::Reconnecting { attempt };
        info!("WiFi: next attempt in {}ms", delay);
    }
}

// ── ESP-IDF driver ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspWifiDriver;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{ConnectivityError, WifiDriver};

    pub struct EspWifiDriver {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl EspWifiDriver {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
        ) -> Result<Self, EspError> {
            let esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
            let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
            Ok(Self { wifi })
        }

        fn try_connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
            let auth_method = if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
                password: password.try_into().map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });

            let failed = |e: EspError| {
                warn!("WiFi(espidf): {}", e);
                ConnectivityError::ConnectionFailed
            };
            self.wifi.set_configuration(&config).map_err(failed)?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(failed)?;
            }
            self.wifi.connect().map_err(failed)?;
            self.wifi.wait_netif_up().map_err(failed)?;

            if let Ok(ip) = self.wifi.wifi().sta_netif().get_ip_info() {
                info!("WiFi(espidf): IP {}", ip.ip);
            }
            Ok(())
        }
    }

    impl WifiDriver for EspWifiDriver {
        fn connect(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
            self.try_connect(ssid, password)
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
