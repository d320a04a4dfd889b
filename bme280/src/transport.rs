//! Register-level bus access.
//!
//! The driver only needs "read N bytes at register R" and "write N bytes at
//! register R". Both the I2C and the SPI implementation send multi-byte
//! writes as register/data pairs, since the BME280 does not auto-increment
//! on write.

use embedded_hal::i2c::I2c;
use embedded_hal::spi::{Operation, SpiDevice};
use heapless::Vec;

/// Most registers written in a single call.
pub const MAX_WRITE_LEN: usize = 4;

/// SPI read flag in the control byte.
const SPI_READ: u8 = 0x80;
/// SPI register address mask. Bit 7 is the RW bit.
const SPI_ADDR_MASK: u8 = 0x7F;

/// Register access to a BME280.
pub trait Transport {
    type Error;

    /// Read `buf.len()` consecutive registers starting at `reg`.
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` to consecutive registers starting at `reg`.
    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(reg, buf)
    }

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(reg, data)
    }
}

/// Transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// Bus error from the HAL.
    Bus(E),
    /// More than [`MAX_WRITE_LEN`] registers in one write.
    WriteTooLong,
}

/// I2C device address, selected by the level of the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// SDO connected to GND.
    SdoGnd = 0x76,
    /// SDO connected to V<sub>DDIO</sub>.
    SdoVddio = 0x77,
}

/// `[reg, data[0], reg + 1, data[1], ...]`, each address passed through `map`.
fn register_pairs(
    reg: u8,
    data: &[u8],
    map: impl Fn(u8) -> u8,
) -> Option<Vec<u8, { 2 * MAX_WRITE_LEN }>> {
    if data.len() > MAX_WRITE_LEN {
        return None;
    }
    let mut buf = Vec::new();
    for (offset, byte) in data.iter().enumerate() {
        let addr = map(reg.wrapping_add(offset as u8));
        buf.extend_from_slice(&[addr, *byte]).ok()?;
    }
    Some(buf)
}

/// BME280 on an I2C bus.
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: Address) -> Self {
        I2cTransport {
            i2c,
            address: address as u8,
        }
    }

    /// Free the I2C bus.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Transport for I2cTransport<I2C> {
    type Error = TransportError<I2C::Error>;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(TransportError::Bus)
    }

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        let buf = register_pairs(reg, data, |addr| addr).ok_or(TransportError::WriteTooLong)?;
        self.i2c
            .write(self.address, &buf)
            .map_err(TransportError::Bus)
    }
}

/// BME280 on an SPI bus, 4-wire, mode 0 or 3.
///
/// Chip select is handled by the [`SpiDevice`].
pub struct SpiTransport<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        SpiTransport { spi }
    }

    /// Free the SPI device.
    pub fn free(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> Transport for SpiTransport<SPI> {
    type Error = TransportError<SPI::Error>;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi
            .transaction(&mut [Operation::Write(&[reg | SPI_READ]), Operation::Read(buf)])
            .map_err(TransportError::Bus)
    }

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        let buf = register_pairs(reg, data, |addr| addr & SPI_ADDR_MASK)
            .ok_or(TransportError::WriteTooLong)?;
        self.spi.write(&buf).map_err(TransportError::Bus)
    }
}

/// Re-issue failed transactions, up to `attempts` tries in total.
///
/// Only the error of the last attempt is returned.
pub struct Retry<T> {
    inner: T,
    attempts: u8,
}

impl<T: Transport> Retry<T> {
    /// `attempts` is clamped to at least one.
    pub fn new(inner: T, attempts: u8) -> Self {
        Retry {
            inner,
            attempts: attempts.max(1),
        }
    }

    pub fn free(self) -> T {
        self.inner
    }

    fn retry<R>(
        &mut self,
        mut op: impl FnMut(&mut T) -> Result<R, T::Error>,
    ) -> Result<R, T::Error> {
        let mut attempt = 1;
        loop {
            match op(&mut self.inner) {
                Ok(r) => return Ok(r),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(_) => {
                    trace!("bus transaction failed, attempt {}", attempt);
                    attempt += 1;
                }
            }
        }
    }
}

impl<T: Transport> Transport for Retry<T> {
    type Error = T::Error;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.retry(|inner| inner.read(reg, buf))
    }

    fn write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.retry(|inner| inner.write(reg, data))
    }
}
