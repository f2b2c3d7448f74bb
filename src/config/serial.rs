use serde::{Deserialize, Serialize};

use crate::config::types::{DataBits, Parity, RtsType, StopBits};

/// Serial port parameters for the RTU/ASCII link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,

    /// RTS line behaviour around a transmit, for half-duplex RS-485 adapters.
    pub rts_type: RtsType,
    pub rts_delay_us: u64,

    /// Whether to flush the serial port after writing a frame.
    pub flush_after_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            rts_type: RtsType::default(),
            rts_delay_us: 3500,
            flush_after_write: true,
        }
    }
}

impl Config {
    pub fn serial_port_info(&self) -> String {
        format!(
            "{} ({} baud, {} data bits, {} parity, {} stop bits)",
            self.device, self.baud_rate, self.data_bits, self.parity, self.stop_bits
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.device.trim().is_empty() {
            return Err("serial device path must not be empty".to_string());
        }
        if self.baud_rate == 0 {
            return Err("baud rate must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_baud_rate() {
        let mut config = Config::default();
        config.baud_rate = 0;
        assert!(config.validate().is_err());
    }
}
