//! Raw peripheral access: oneshot ADC, GPIO, the DHT single-wire line
//! and the button edge interrupt.
//!
//! Everything here is a thin shim over ESP-IDF sys calls.  The host
//! build swaps each call for a simulation backed by static atomics so
//! adapters and drivers can be exercised under `cargo test`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::{Level, PinMode};
use crate::error::{ActuatorError, SensorError};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::AdcInitFailed(_) => "ADC1 init failed",
            HwInitError::GpioConfigFailed(_) => "GPIO config failed",
            HwInitError::IsrInstallFailed(_) => "GPIO ISR service install failed",
        })
    }
}

fn pin_mask(pin: i32) -> Option<u64> {
    (0..64).contains(&pin).then(|| 1u64 << pin)
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// Create the ADC1 oneshot unit and configure `channel` at 12 dB / 12 bit.
#[cfg(target_os = "espidf")]
pub fn init_adc(channel: u32) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot, before the
    // control task that reads it is spawned.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: handle initialised above.
    let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, channel as adc_channel_t, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured", channel);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc(_channel: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once in init_adc() before the
    // control task starts; only that task reads the ADC.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, channel as adc_channel_t, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    match sim::ADC_RAW.load(core::sync::atomic::Ordering::Acquire) {
        sim::ADC_FAILED => Err(SensorError::AdcReadFailed),
        raw => Ok(raw as u16),
    }
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_configure(pin: i32, mode: PinMode) -> Result<(), ActuatorError> {
    let pin_bit_mask = pin_mask(pin).ok_or(ActuatorError::GpioConfigFailed)?;
    let (mode, pull_up_en) = match mode {
        PinMode::Input => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
        PinMode::InputPullUp => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_ENABLE),
        PinMode::Output => (gpio_mode_t_GPIO_MODE_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
    };
    let cfg = gpio_config_t {
        pin_bit_mask,
        mode,
        pull_up_en,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        ..Default::default()
    };
    // SAFETY: plain register configuration of a validated pin number.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        log::warn!("hw_init: GPIO{} config failed (rc={})", pin, ret);
        return Err(ActuatorError::GpioConfigFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_configure(pin: i32, mode: PinMode) -> Result<(), ActuatorError> {
    use core::sync::atomic::Ordering;

    let mask = pin_mask(pin).ok_or(ActuatorError::GpioConfigFailed)?;
    if mode == PinMode::Output {
        sim::OUTPUTS.fetch_and(!mask, Ordering::AcqRel);
    }
    if mode == PinMode::InputPullUp {
        sim::PULL_UPS.fetch_or(mask, Ordering::AcqRel);
    } else {
        sim::PULL_UPS.fetch_and(!mask, Ordering::AcqRel);
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, level: Level) -> Result<(), ActuatorError> {
    // SAFETY: gpio_set_level on a configured output; the driver checks
    // the pin number and returns an error code for anything else.
    let ret = unsafe { gpio_set_level(pin, u32::from(level.is_high())) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, level: Level) -> Result<(), ActuatorError> {
    use core::sync::atomic::Ordering;

    let mask = pin_mask(pin).ok_or(ActuatorError::GpioWriteFailed)?;
    if sim::WRITE_FAULTS.load(Ordering::Acquire) & mask != 0 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    if level.is_high() {
        sim::OUTPUTS.fetch_or(mask, Ordering::AcqRel);
    } else {
        sim::OUTPUTS.fetch_and(!mask, Ordering::AcqRel);
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> Level {
    // SAFETY: read-only register access.
    Level::from(unsafe { gpio_get_level(pin) } != 0)
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> Level {
    let mask = pin_mask(pin).unwrap_or(0);
    Level::from(sim::INPUTS_LOW.load(core::sync::atomic::Ordering::Acquire) & mask == 0)
}

// ── DHT single-wire line ──────────────────────────────────────

/// Configure the DHT data pin as open-drain with pull-up, released high.
#[cfg(target_os = "espidf")]
pub fn init_dht_line(pin: i32) -> Result<(), HwInitError> {
    let pin_bit_mask = pin_mask(pin).ok_or(HwInitError::GpioConfigFailed(pin))?;
    let cfg = gpio_config_t {
        pin_bit_mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        ..Default::default()
    };
    // SAFETY: boot-time configuration of a validated pin.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    // SAFETY: pin configured above.
    unsafe { gpio_set_level(pin, 1) };
    info!("hw_init: DHT line on GPIO{}", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_dht_line(_pin: i32) -> Result<(), HwInitError> {
    Ok(())
}

/// Busy-wait while the line sits at `high`.  Returns the time spent, or
/// `None` once `timeout_us` elapses.
#[cfg(target_os = "espidf")]
fn wait_while(pin: i32, high: bool, timeout_us: i64) -> Option<i64> {
    // SAFETY: monotonic timer and input register reads.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let level = unsafe { gpio_get_level(pin) } != 0;
        let elapsed = unsafe { esp_timer_get_time() } - start;
        if level != high {
            return Some(elapsed);
        }
        if elapsed > timeout_us {
            return None;
        }
    }
}

/// Host start pulse, sensor handshake, then 40 data bits.  A bit is a
/// ~50 µs low followed by a high of ~27 µs (0) or ~70 µs (1).
#[cfg(target_os = "espidf")]
pub fn dht_read_frame(pin: i32, start_signal_us: u32) -> Result<[u8; 5], SensorError> {
    // SAFETY: open-drain line owned by the control task.
    unsafe {
        gpio_set_level(pin, 0);
        esp_rom_delay_us(start_signal_us);
        gpio_set_level(pin, 1);
        esp_rom_delay_us(30);
    }

    wait_while(pin, true, 100).ok_or(SensorError::NoResponse)?;
    wait_while(pin, false, 100).ok_or(SensorError::NoResponse)?;
    wait_while(pin, true, 100).ok_or(SensorError::NoResponse)?;

    let mut frame = [0u8; 5];
    for bit in 0..40 {
        wait_while(pin, false, 75).ok_or(SensorError::Timeout)?;
        let high_us = wait_while(pin, true, 100).ok_or(SensorError::Timeout)?;
        if high_us > 40 {
            frame[bit / 8] |= 0x80 >> (bit % 8);
        }
    }
    Ok(frame)
}

#[cfg(not(target_os = "espidf"))]
pub fn dht_read_frame(_pin: i32, _start_signal_us: u32) -> Result<[u8; 5], SensorError> {
    let packed = sim::DHT_FRAME.load(core::sync::atomic::Ordering::Acquire);
    if packed & sim::DHT_PRESENT == 0 {
        return Err(SensorError::NoResponse);
    }
    let b = packed.to_be_bytes();
    Ok([b[3], b[4], b[5], b[6], b[7]])
}

// ── Button edge interrupt ─────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::button::button_isr_handler(now_ms);
}

/// Configure the button as a pulled-up input, install the GPIO ISR
/// service and hook the button's falling edge.
#[cfg(target_os = "espidf")]
pub fn init_button_isr(pin: i32) -> Result<(), HwInitError> {
    gpio_configure(pin, PinMode::InputPullUp).map_err(|_| HwInitError::GpioConfigFailed(pin))?;
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already
    // installed.  The handler only stores into an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        let ret = gpio_isr_handler_add(pin, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pin);
    }
    info!("hw_init: button ISR on GPIO{}", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr(pin: i32) -> Result<(), HwInitError> {
    gpio_configure(pin, PinMode::InputPullUp).map_err(|_| HwInitError::GpioConfigFailed(pin))?;
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

/// Knobs for the host build.  State is process-global, so tests that
/// use it pick distinct pins.
#[cfg(not(target_os = "espidf"))]
pub mod sim {
    use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    use crate::app::ports::Level;

    pub(super) const ADC_FAILED: u32 = u32::MAX;
    pub(super) const DHT_PRESENT: u64 = 1 << 63;

    pub(super) static ADC_RAW: AtomicU32 = AtomicU32::new(0);
    pub(super) static OUTPUTS: AtomicU64 = AtomicU64::new(0);
    pub(super) static INPUTS_LOW: AtomicU64 = AtomicU64::new(0);
    pub(super) static WRITE_FAULTS: AtomicU64 = AtomicU64::new(0);
    pub(super) static PULL_UPS: AtomicU64 = AtomicU64::new(0);
    pub(super) static DHT_FRAME: AtomicU64 = AtomicU64::new(0);

    /// Next ADC conversion result; `None` makes reads fail.
    pub fn set_adc(raw: Option<u16>) {
        ADC_RAW.store(raw.map_or(ADC_FAILED, u32::from), Ordering::Release);
    }

    pub fn set_dht_frame(frame: Option<[u8; 5]>) {
        let packed = frame.map_or(0, |f| {
            DHT_PRESENT | u64::from_be_bytes([0, 0, 0, f[0], f[1], f[2], f[3], f[4]])
        });
        DHT_FRAME.store(packed, Ordering::Release);
    }

    pub fn output_level(pin: i32) -> Level {
        let mask = super::pin_mask(pin).unwrap_or(0);
        Level::from(OUTPUTS.load(Ordering::Acquire) & mask != 0)
    }

    pub fn set_input(pin: i32, level: Level) {
        let mask = super::pin_mask(pin).unwrap_or(0);
        if level.is_high() {
            INPUTS_LOW.fetch_and(!mask, Ordering::AcqRel);
        } else {
            INPUTS_LOW.fetch_or(mask, Ordering::AcqRel);
        }
    }

    pub fn pulled_up(pin: i32) -> bool {
        let mask = super::pin_mask(pin).unwrap_or(0);
        PULL_UPS.load(Ordering::Acquire) & mask != 0
    }

    /// Make every write to `pin` fail until cleared.
    pub fn fail_writes(pin: i32, fail: bool) {
        let mask = super::pin_mask(pin).unwrap_or(0);
        if fail {
            WRITE_FAULTS.fetch_or(mask, Ordering::AcqRel);
        } else {
            WRITE_FAULTS.fetch_and(!mask, Ordering::AcqRel);
        }
    }
}
