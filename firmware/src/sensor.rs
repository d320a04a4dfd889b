use bme280::{
    format, Averages, Bme280, ConfigStatus, MeasurementState, MeasurementTime, Options,
    Reading, Retry, Settings, Transport, Variant,
};
use defmt::*;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel as MessageChannel;
use embassy_time::{Duration, Timer};

use crate::SCHEDULE;

pub const VARIANT: Variant = Variant::Bme280;

/// Reference site, 205 m above sea level.
const SITE_ALTITUDE_M: i32 = 205;

/// Number of samples in the temperature and humidity averages.
const WINDOW: usize = 10;

/// Attempts per bus transaction before giving up on the cycle.
const BUS_ATTEMPTS: u8 = 3;

pub const OPTIONS: Options = Options::new(VARIANT)
    .with_status_check(true)
    .with_averaging(true)
    .with_site_altitude(SITE_ALTITUDE_M);

/// ×16 on every channel in forced mode, one conversion per period.
pub const SETTINGS: Settings = Settings::new();

/// Back-off after a latched configuration failure.
const RECONFIGURE_DELAY: Duration = Duration::from_millis(1000);
const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct Bme280Message {
    pub reading: Reading,
    pub averages: Averages,
}

pub static READINGS: MessageChannel<ThreadModeRawMutex, Bme280Message, 2> = MessageChannel::new();

#[cfg(feature = "i2c")]
pub type Bus = bme280::I2cTransport<
    embassy_stm32::i2c::I2c<'static, embassy_stm32::mode::Blocking>,
>;

#[cfg(feature = "spi")]
pub type Bus = bme280::SpiTransport<
    embedded_hal_bus::spi::ExclusiveDevice<
        embassy_stm32::spi::Spi<'static, embassy_stm32::mode::Blocking>,
        embassy_stm32::gpio::Output<'static>,
        embassy_time::Delay,
    >,
>;

pub type Sensor = Bme280<Retry<Bus>>;

pub fn sensor(bus: Bus) -> Sensor {
    Bme280::new(Retry::new(bus, BUS_ATTEMPTS), OPTIONS)
}

/// Configure the sensor, retrying until it succeeds.
async fn configure<T: Transport>(bme: &mut Bme280<T>) {
    loop {
        match bme.configure(SETTINGS, &SCHEDULE) {
            Ok(ConfigStatus::Ready) => {
                info!(
                    "BME280 ready, conversion takes up to {} ms",
                    SETTINGS.measurement_time_ms(MeasurementTime::Max)
                );
                return;
            }
            Ok(ConfigStatus::RetryAfterReset) => Timer::after(POLL_INTERVAL).await,
            Err(e) => {
                error!("BME280 configuration failed, code {}", e.configure_code());
                Timer::after(RECONFIGURE_DELAY).await;
            }
        }
    }
}

#[embassy_executor::task]
pub async fn run(mut bme: Sensor) {
    match bme.chip_id() {
        Ok(id) if id == VARIANT.chip_id() => debug!("chip id {:#x}", id),
        Ok(id) => error!("BME280 chipid mismatch: {:#x}", id),
        Err(e) => error!("chip id read failed, code {}", e.measurement_code()),
    }

    let mut state: MeasurementState<WINDOW> = MeasurementState::new();
    loop {
        configure(&mut bme).await;

        loop {
            if !SCHEDULE.take_due() {
                Timer::after(POLL_INTERVAL).await;
                continue;
            }

            match bme.read_measurement(&mut state) {
                Ok(reading) => {
                    READINGS
                        .send(Bme280Message {
                            reading,
                            averages: state.averages,
                        })
                        .await;
                }
                Err(e) if e.is_transient() => {
                    warn!("measurement skipped, code {}", e.measurement_code());
                }
                // not configured or bus lost, start over with a reset
                Err(e) => {
                    error!("measurement failed, code {}", e.measurement_code());
                    break;
                }
            }
        }
    }
}

#[embassy_executor::task]
pub async fn report() {
    loop {
        let Bme280Message { reading, averages } = READINGS.receive().await;

        info!("T: {} C", format::temperature(reading.temperature).as_str());
        if let Some(pressure) = reading.pressure {
            info!(
                "P: {} hPa",
                format::pressure(pressure, VARIANT.pressure_precision()).as_str()
            );
        }
        if let Some(sea_level) = reading.sea_level_pressure {
            info!("P sea level: {} hPa", format::pressure_hpa(sea_level).as_str());
        }
        if let Some(humidity) = reading.humidity {
            info!("H: {} %", format::humidity(humidity).as_str());
        }
        if let Some(avg) = averages.temperature_display() {
            info!("T avg: {} C", format::parts(avg).as_str());
        }
        if let Some(avg) = averages.humidity_display() {
            info!("H avg: {} %", format::parts(avg).as_str());
        }
    }
}
