//! TSL2591 high-dynamic-range light sensor.
//!
//! Two photodiode channels sampled over I2C: CH0 (full spectrum) and
//! CH1 (infrared).  Lux is derived from both with the vendor's empirical
//! formula.
//!
//! ## Dual-target design
//!
//! The driver is generic over [`embedded_hal::i2c::I2c`], so the same code
//! runs on the ESP32 I2C peripheral and against a register mock in host
//! tests.
//!
//! ## Register map (command bit `0xA0` | address)
//!
//! | Reg    | Name      | Use                                  |
//! |--------|-----------|--------------------------------------|
//! | `0x00` | ENABLE    | power + ALS enable                   |
//! | `0x01` | CONTROL   | gain (bits 5:4), integration (2:0)   |
//! | `0x12` | ID        | reads `0x50`                         |
//! | `0x14` | C0DATAL   | CH0 low byte, CH0 high follows       |
//! | `0x16` | C1DATAL   | CH1 low byte, CH1 high follows       |

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{SensorError, SensorPort};

pub const DEFAULT_ADDRESS: u8 = 0x29;

const COMMAND_BIT: u8 = 0xA0;
const REG_ENABLE: u8 = 0x00;
const REG_CONTROL: u8 = 0x01;
const REG_DEVICE_ID: u8 = 0x12;
const REG_C0DATAL: u8 = 0x14;
const REG_C1DATAL: u8 = 0x16;

const DEVICE_ID: u8 = 0x50;

const ENABLE_POWEROFF: u8 = 0x00;
/// PON | AEN | AIEN | NPIEN
const ENABLE_POWERON: u8 = 0x93;

/// Lux coefficient (device factor).
const LUX_DF: f32 = 408.0;

/// A channel reading of `0xFFFF` means the ADC saturated.
const CHANNEL_SATURATED: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    /// 1x
    Low = 0x00,
    /// 25x
    Medium = 0x10,
    /// 428x
    High = 0x20,
    /// 9876x
    Max = 0x30,
}

impl Gain {
    fn multiplier(self) -> f32 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 25.0,
            Self::High => 428.0,
            Self::Max => 9876.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationTime {
    Ms100 = 0x00,
    Ms200 = 0x01,
    Ms300 = 0x02,
    Ms400 = 0x03,
    Ms500 = 0x04,
    Ms600 = 0x05,
}

impl IntegrationTime {
    fn millis(self) -> f32 {
        (self as u8 as f32 + 1.0) * 100.0
    }
}

pub struct Tsl2591<I2C> {
    i2c: I2C,
    address: u8,
    gain: Gain,
    integration: IntegrationTime,
    ready: bool,
}

impl<I2C: I2c> Tsl2591<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            gain: Gain::Medium,
            integration: IntegrationTime::Ms100,
            ready: false,
        }
    }

    /// Probe the device, power it on and apply medium gain with 100 ms
    /// integration.  Until this succeeds every read reports
    /// [`SensorError::NotFound`].
    pub fn begin(&mut self) -> Result<(), SensorError> {
        let id = self.read8(REG_DEVICE_ID)?;
        if id != DEVICE_ID {
            warn!("TSL2591: unexpected device id 0x{:02x}, check wiring", id);
            return Err(SensorError::NotFound);
        }
        self.write8(REG_ENABLE, ENABLE_POWERON)?;
        self.configure(Gain::Medium, IntegrationTime::Ms100)?;
        self.ready = true;
        info!("TSL2591: sensor found (gain=25x, integration=100ms)");
        Ok(())
    }

    pub fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> Result<(), SensorError> {
        self.write8(REG_CONTROL, integration as u8 | gain as u8)?;
        self.gain = gain;
        self.integration = integration;
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<(), SensorError> {
        self.ready = false;
        self.write8(REG_ENABLE, ENABLE_POWEROFF)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Raw `(full, infrared)` channel counts from the last integration.
    pub fn read_channels(&mut self) -> Result<(u16, u16), SensorError> {
        let full = self.read16(REG_C0DATAL)?;
        let ir = self.read16(REG_C1DATAL)?;
        Ok((full, ir))
    }

    /// Convert channel counts to lux with the current gain and timing.
    pub fn calculate_lux(&self, full: u16, ir: u16) -> Result<f32, SensorError> {
        if full == CHANNEL_SATURATED || ir == CHANNEL_SATURATED {
            return Err(SensorError::Overflow);
        }
        if full == 0 {
            return Ok(0.0);
        }
        let ch0 = f32::from(full);
        let ch1 = f32::from(ir);
        let cpl = self.integration.millis() * self.gain.multiplier() / LUX_DF;
        Ok((ch0 - ch1) * (1.0 - ch1 / ch0) / cpl)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read8(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }

    fn read16(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[COMMAND_BIT | reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write8(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[COMMAND_BIT | reg, value])
            .map_err(|_| SensorError::Bus)
    }
}

impl<I2C: I2c> SensorPort for Tsl2591<I2C> {
    fn read_lux(&mut self) -> Result<f32, SensorError> {
        if !self.ready {
            return Err(SensorError::NotFound);
        }
        let (full, ir) = self.read_channels()?;
        self.calculate_lux(full, ir)
    }
}
