//! SoilGuard firmware entry point
//!
//! Hexagonal architecture: one control task owns the sensor and relay,
//! the button task and HTTP handlers talk to it through static signals.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (Sensor+Actuator) (EventSink)    (Config)     (TimePort)      │
//! │  WifiLink          WebController  PumpKillSwitch               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          IrrigationService (pure logic)                │    │
//! │  │  sample · decide · pump hold · publish                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  OVERRIDE / STOP (AtomicBool)      STATUS (snapshot cell)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use soilguard::adapters::hardware::{self, EspGpio, HardwareAdapter};
use soilguard::adapters::log_sink::LogEventSink;
use soilguard::adapters::nvs::NvsAdapter;
use soilguard::adapters::time::Esp32TimeAdapter;
use soilguard::adapters::web::{self, WebController};
use soilguard::adapters::wifi::{EspWifiDriver, WifiLink};
use soilguard::app::ports::{ConfigPort, TimePort};
use soilguard::app::service::{Channels, IrrigationService};
use soilguard::app::signals::{OverrideRequest, StopRequest};
use soilguard::app::status::StatusPublisher;
use soilguard::config::{self, SystemConfig};
use soilguard::drivers::button::{ButtonDriver, ButtonEvent};
use soilguard::drivers::hw_init;
use soilguard::drivers::pump::PumpKillSwitch;
use soilguard::drivers::watchdog::Watchdog;
use soilguard::scheduler::Cadence;

// ── Shared channels ───────────────────────────────────────────

static OVERRIDE: OverrideRequest = OverrideRequest::new();
static STOP: StopRequest = StopRequest::new();
static STATUS: StatusPublisher = StatusPublisher::new();

const CONTROL_STACK: usize = 8 * 1024;
const BUTTON_STACK: usize = 4 * 1024;
const BUTTON_POLL_MS: u64 = 20;
const WIFI_POLL_SECS: u64 = 5;

fn channels() -> Channels<'static> {
    Channels {
        override_request: &OVERRIDE,
        stop_request: &STOP,
        status: &STATUS,
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SoilGuard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = load_config();
    config.validate().map_err(soilguard::error::Error::from)?;
    info!(
        "Config: {:?}, threshold {:.1}% ± {:.1}%, pump {} s, poll {} ms",
        config.sensor,
        config.threshold_percent,
        config.band_percent,
        config.pump_duration_secs,
        config.poll_interval_ms
    );

    // ── 3. Control task ───────────────────────────────────────
    let control_config = config.clone();
    thread::Builder::new()
        .name("control".into())
        .stack_size(CONTROL_STACK)
        .spawn(move || {
            if let Err(e) = control_task(&control_config) {
                error!("control task failed: {e:?}");
            }
        })?;

    // ── 4. Button task ────────────────────────────────────────
    let button_config = config.clone();
    thread::Builder::new()
        .name("button".into())
        .stack_size(BUTTON_STACK)
        .spawn(move || {
            if let Err(e) = button_task(&button_config) {
                error!("button task failed: {e:?}");
            }
        })?;

    // ── 5. Network (optional) ─────────────────────────────────
    if !config.wifi_enabled() {
        info!("No WiFi SSID configured, running standalone");
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let driver = EspWifiDriver::new(peripherals.modem, sysloop, nvs)?;
    let mut link = WifiLink::new(driver, &config.wifi_ssid, &config.wifi_password)?;
    let clock = Esp32TimeAdapter::new();
    if let Err(e) = link.connect(clock.now_ms()) {
        warn!("WiFi: initial connect failed ({}), will retry", e);
    }

    let kill = PumpKillSwitch::new(EspGpio, hardware::relay_line(&config), &STOP);
    let controller: &'static WebController<'static, EspGpio> =
        Box::leak(Box::new(WebController::new(&OVERRIDE, &STATUS, kill)));
    let _server = web::start_server(controller)?;

    loop {
        link.poll(clock.now_ms());
        thread::sleep(Duration::from_secs(WIFI_POLL_SECS));
    }
}

fn load_config() -> SystemConfig {
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            None
        }
    };
    let mut cfg = match nvs.as_ref().map(NvsAdapter::load) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    if cfg.seed_wifi(config::BUILD_WIFI_SSID, config::BUILD_WIFI_PASSWORD) {
        info!("WiFi: using build-time credentials for \"{}\"", cfg.wifi_ssid);
        if let Some(nvs) = &nvs {
            if let Err(e) = nvs.save(&cfg) {
                warn!("NVS: could not persist WiFi credentials ({})", e);
            }
        }
    }
    cfg
}

// ── Tasks ─────────────────────────────────────────────────────

fn control_task(config: &SystemConfig) -> Result<()> {
    let mut hw = HardwareAdapter::from_config(config)?;
    let mut clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut service =
        IrrigationService::new(config, channels()).map_err(soilguard::error::Error::from)?;
    let mut cadence = Cadence::new(config.poll_interval_ms);

    service.start(&mut hw, &mut clock, &mut sink);

    let watchdog = Watchdog::new(config.watchdog_timeout_ms());
    info!("System ready. Entering control loop.");
    loop {
        service.cycle(&mut hw, &mut clock, &mut sink, &mut cadence);
        watchdog.feed();
    }
}

fn button_task(config: &SystemConfig) -> Result<()> {
    hw_init::init_button_isr(config.button_gpio).map_err(soilguard::error::Error::from)?;
    let mut button = ButtonDriver::new(config.button_gpio);
    let mut kill = PumpKillSwitch::new(EspGpio, hardware::relay_line(config), &STOP);
    let clock = Esp32TimeAdapter::new();

    loop {
        let pressed = !hw_init::gpio_read(button.gpio()).is_high();
        match button.tick(clock.now_ms() as u32, pressed) {
            Some(ButtonEvent::ShortPress) => {
                info!("Button: short press, manual watering requested");
                OVERRIDE.request();
            }
            Some(ButtonEvent::LongPress) => {
                warn!("Button: long press, emergency stop");
                if let Err(e) = kill.trip() {
                    error!("Button: emergency stop failed: {}", e);
                }
            }
            None => {}
        }
        thread::sleep(Duration::from_millis(BUTTON_POLL_MS));
    }
}
