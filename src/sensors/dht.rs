//! DHT11 / DHT22 single-wire frame decoding.
//!
//! The sensor answers a host start pulse with 40 bits:
//!
//! ```text
//!   byte 0..1  humidity      (DHT22: u16 / 10, DHT11: integer + tenths)
//!   byte 2..3  temperature   (DHT22: sign-magnitude u16 / 10)
//!   byte 4     checksum      (low byte of the sum of bytes 0..=3)
//! ```
//!
//! Bit timing lives behind [`DhtBus`] so the decode path is host-testable.

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DhtModel {
    Dht11,
    #[default]
    Dht22,
}

impl DhtModel {
    /// Length of the host's low start pulse.
    pub fn start_signal_us(self) -> u32 {
        match self {
            Self::Dht11 => 18_000,
            Self::Dht22 => 1_100,
        }
    }

    /// Minimum spacing between conversions the part tolerates.
    pub fn min_interval_ms(self) -> u64 {
        match self {
            Self::Dht11 => 1_000,
            Self::Dht22 => 2_000,
        }
    }
}

/// Decoded sensor output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub humidity: f32,
    pub temperature_c: f32,
}

/// Raw 40-bit frame transfer.
pub trait DhtBus {
    fn read_frame(&mut self, gpio: i32, model: DhtModel) -> Result<[u8; 5], SensorError>;
}

pub fn decode_frame(frame: [u8; 5], model: DhtModel) -> Result<DhtReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let reading = match model {
        DhtModel::Dht11 => {
            let humidity = f32::from(frame[0]) + f32::from(frame[1]) * 0.1;
            let mut temperature_c = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) * 0.1;
            if frame[3] & 0x80 != 0 {
                temperature_c = -temperature_c;
            }
            DhtReading { humidity, temperature_c }
        }
        DhtModel::Dht22 => {
            let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
            let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
            let temperature_c = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
            DhtReading { humidity, temperature_c }
        }
    };
    Ok(reading)
}
