//! Weather station: a BME280 sampled once a second, readings logged over RTT.

#![no_std]
#![no_main]

#[cfg(all(feature = "i2c", feature = "spi"))]
compile_error!("enable only one of the `i2c` and `spi` features");
#[cfg(not(any(feature = "i2c", feature = "spi")))]
compile_error!("enable one of the `i2c` and `spi` features");

mod sensor;

use bme280::MeasurementSchedule;
use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker};
use {defmt_rtt as _, panic_probe as _};

/// Measurement period in milliseconds.
const PERIOD_MS: u32 = 1000;

pub static SCHEDULE: MeasurementSchedule = MeasurementSchedule::new(PERIOD_MS);

/// Millisecond time base driving the measurement schedule.
#[embassy_executor::task]
async fn tick() {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        SCHEDULE.on_tick();
    }
}

#[cfg(feature = "i2c")]
fn bus(p: embassy_stm32::Peripherals) -> sensor::Bus {
    use bme280::{Address, I2cTransport};
    use embassy_stm32::i2c::I2c;
    use embassy_stm32::time::Hertz;

    let i2c = I2c::new_blocking(p.I2C3, p.PA8, p.PC9, Hertz(100_000), Default::default());
    I2cTransport::new(i2c, Address::SdoVddio)
}

#[cfg(feature = "spi")]
fn bus(p: embassy_stm32::Peripherals) -> sensor::Bus {
    use bme280::SpiTransport;
    use embassy_stm32::gpio::{Level, Output, Speed};
    use embassy_stm32::spi::{Config, Spi};
    use embassy_stm32::time::Hertz;
    use embassy_time::Delay;
    use embedded_hal_bus::spi::ExclusiveDevice;

    let mut config = Config::default();
    config.frequency = Hertz(1_000_000);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, config);
    let cs = Output::new(p.PD14, Level::High, Speed::VeryHigh);

    let device = match ExclusiveDevice::new(spi, cs, Delay) {
        Ok(device) => device,
        Err(e) => match e {},
    };
    SpiTransport::new(device)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Hello BME280!");
    let p = embassy_stm32::init(Default::default());

    let bme = sensor::sensor(bus(p));

    unwrap!(spawner.spawn(tick()));
    unwrap!(spawner.spawn(sensor::run(bme)));
    unwrap!(spawner.spawn(sensor::report()));
}
