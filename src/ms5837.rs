//! TE MS5837 pressure sensor over I2C
//!
//! Reads the factory calibration once at start up and converts pressure and
//! temperature with first and second order compensation.

use core::fmt::Debug;

use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};
use thiserror::Error;

use crate::bsp::DepthSensor;
use crate::info;

pub const ADDRESS: u8 = 0x76;

const CMD_RESET: u8 = 0x1E;
const CMD_ADC_READ: u8 = 0x00;
const CMD_PROM_READ: u8 = 0xA0;
const CMD_CONVERT_D1_OSR8192: u8 = 0x4A;
const CMD_CONVERT_D2_OSR8192: u8 = 0x5A;

const RESET_DELAY_MS: u8 = 10;
/// Conversion time at OSR 8192
const CONVERSION_DELAY_MS: u8 = 20;

/// Standard atmosphere at sea level, Pa
const SURFACE_PRESSURE_PA: f32 = 101_300.0;
const GRAVITY: f32 = 9.80665;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// 30 bar, down to about 290 m
    Ms5837_30Ba,
    /// 2 bar, altimetry and shallow water
    Ms5837_02Ba,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: Debug> {
    #[error("I2C bus error: {0:?}")]
    Bus(E),

    #[error("calibration PROM CRC mismatch: stored {stored}, computed {computed}")]
    Crc { stored: u8, computed: u8 },
}

/// Compensated pressure and temperature
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    pub pressure_mbar: f32,
    pub temperature_c: f32,
}

impl Measurement {
    /// Water column above the sensor for a fluid of the given density in kg/m3
    pub fn depth(&self, fluid_density: f32) -> f32 {
        (self.pressure_mbar * 100.0 - SURFACE_PRESSURE_PA) / (fluid_density * GRAVITY)
    }
}

pub struct Ms5837<I2C, D> {
    i2c: I2C,
    delay: D,
    model: Model,
    fluid_density: f32,
    prom: [u16; 7],
    last: Measurement,
}

impl<I2C, D, E> Ms5837<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u8>,
    E: Debug,
{
    /// Reset the sensor and load its calibration
    pub fn new(i2c: I2C, delay: D, model: Model, fluid_density: f32) -> Result<Self, Error<E>> {
        let mut sensor = Ms5837 {
            i2c,
            delay,
            model,
            fluid_density,
            prom: [0; 7],
            last: Measurement::default(),
        };

        sensor.i2c.write(ADDRESS, &[CMD_RESET]).map_err(Error::Bus)?;
        sensor.delay.delay_ms(RESET_DELAY_MS);

        for i in 0..sensor.prom.len() {
            let mut word = [0u8; 2];
            sensor
                .i2c
                .write_read(ADDRESS, &[CMD_PROM_READ + 2 * i as u8], &mut word)
                .map_err(Error::Bus)?;
            sensor.prom[i] = u16::from_be_bytes(word);
        }

        let stored = (sensor.prom[0] >> 12) as u8;
        let computed = crc4(&sensor.prom);
        if stored != computed {
            return Err(Error::Crc { stored, computed });
        }

        info!("MS5837 calibration loaded");
        Ok(sensor)
    }

    pub fn measurement(&self) -> Measurement {
        self.last
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn convert(&mut self, command: u8) -> Result<u32, Error<E>> {
        self.i2c.write(ADDRESS, &[command]).map_err(Error::Bus)?;
        self.delay.delay_ms(CONVERSION_DELAY_MS);

        let mut raw = [0u8; 3];
        self.i2c.write_read(ADDRESS, &[CMD_ADC_READ], &mut raw).map_err(Error::Bus)?;
        Ok(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
    }

    pub fn measure(&mut self) -> Result<Measurement, Error<E>> {
        let d1 = self.convert(CMD_CONVERT_D1_OSR8192)?;
        let d2 = self.convert(CMD_CONVERT_D2_OSR8192)?;
        self.last = compensate(self.model, &self.prom, d1, d2);
        Ok(self.last)
    }
}

impl<I2C, D, E> DepthSensor for Ms5837<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u8>,
    E: Debug,
{
    type Error = Error<E>;

    fn read(&mut self) -> Result<(), Self::Error> {
        self.measure().map(|_| ())
    }

    fn depth(&self) -> f32 {
        self.last.depth(self.fluid_density)
    }
}

/// CRC-4 over the calibration words, the stored nibble is masked out
fn crc4(prom: &[u16; 7]) -> u8 {
    let mut words = [0u16; 8];
    words[..7].copy_from_slice(prom);
    words[0] &= 0x0FFF;

    let mut remainder: u16 = 0;
    for i in 0..16 {
        let byte = if i % 2 == 1 { words[i >> 1] & 0x00FF } else { words[i >> 1] >> 8 };
        remainder ^= byte;
        for _ in 0..8 {
            remainder = if remainder & 0x8000 != 0 { (remainder << 1) ^ 0x3000 } else { remainder << 1 };
        }
    }

    ((remainder >> 12) & 0x000F) as u8
}

/// Datasheet conversion of raw pressure `d1` and temperature `d2`
fn compensate(model: Model, prom: &[u16; 7], d1: u32, d2: u32) -> Measurement {
    let c = |i: usize| i64::from(prom[i]);
    let d1 = i64::from(d1);
    let d_t = i64::from(d2) - c(5) * 256;

    let (mut sens, mut off) = match model {
        Model::Ms5837_02Ba => (c(1) * 65536 + (c(3) * d_t) / 128, c(2) * 131_072 + (c(4) * d_t) / 64),
        Model::Ms5837_30Ba => (c(1) * 32768 + (c(3) * d_t) / 256, c(2) * 65536 + (c(4) * d_t) / 128),
    };
    let mut temp = 2000 + d_t * c(6) / 8_388_608;

    let low = (temp - 2000) * (temp - 2000);
    let (temp_i, off_i, sens_i) = match model {
        Model::Ms5837_02Ba if temp / 100 < 20 => (11 * d_t * d_t / 34_359_738_368, 31 * low / 8, 63 * low / 32),
        Model::Ms5837_02Ba => (0, 0, 0),
        Model::Ms5837_30Ba if temp / 100 < 20 => {
            let (mut off_i, mut sens_i) = (3 * low / 2, 5 * low / 8);
            if temp / 100 < -15 {
                let very_low = (temp + 1500) * (temp + 1500);
                off_i += 7 * very_low;
                sens_i += 4 * very_low;
            }
            (3 * d_t * d_t / 8_589_934_592, off_i, sens_i)
        }
        Model::Ms5837_30Ba => (2 * d_t * d_t / 137_438_953_472, low / 16, 0),
    };

    off -= off_i;
    sens -= sens_i;
    temp -= temp_i;

    let (pressure, mbar_divisor) = match model {
        Model::Ms5837_02Ba => ((d1 * sens / 2_097_152 - off) / 32768, 100.0),
        Model::Ms5837_30Ba => ((d1 * sens / 2_097_152 - off) / 8192, 10.0),
    };

    Measurement {
        pressure_mbar: pressure as f32 / mbar_divisor,
        temperature_c: temp as f32 / 100.0,
    }
}
