//! Raw ADC counts and their boundary check.

/// Burst length with humidity: press\[3\], temp\[3\], hum\[2\].
pub const BURST_LEN_TPH: usize = 8;
/// Burst length without humidity: press\[3\], temp\[3\].
pub const BURST_LEN_TP: usize = 6;

/// Conversion limits from the vendor API. Counts at or beyond either limit
/// are stale or garbage and must not reach the compensation formulas.
pub const ADC_T_MIN: u32 = 0x0_0000;
pub const ADC_T_MAX: u32 = 0xF_FFF0;
pub const ADC_P_MIN: u32 = 0x0_0000;
pub const ADC_P_MAX: u32 = 0xF_FFF0;
pub const ADC_H_MIN: u16 = 0x0000;
pub const ADC_H_MAX: u16 = 0xFFFF;

/// Uncompensated readings from one burst read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// 20-bit pressure count.
    pub adc_p: u32,
    /// 20-bit temperature count.
    pub adc_t: u32,
    /// 16-bit humidity count, present on the BME280 only.
    pub adc_h: Option<u16>,
}

/// Measurement channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Temperature,
    Pressure,
    Humidity,
}

/// Which side of the conversion range was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Limit {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundaryViolation {
    pub channel: Channel,
    pub limit: Limit,
}

/// Boundary flags for every channel of one sample.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoundaryFlags {
    pub temperature: Option<Limit>,
    pub pressure: Option<Limit>,
    pub humidity: Option<Limit>,
}

impl BoundaryFlags {
    pub fn is_clear(&self) -> bool {
        self.first_violation().is_none()
    }

    /// The first violation in temperature, pressure, humidity order.
    pub fn first_violation(&self) -> Option<BoundaryViolation> {
        [
            (Channel::Temperature, self.temperature),
            (Channel::Pressure, self.pressure),
            (Channel::Humidity, self.humidity),
        ]
        .into_iter()
        .find_map(|(channel, limit)| limit.map(|limit| BoundaryViolation { channel, limit }))
    }
}

fn check<T: PartialOrd>(value: T, min: T, max: T) -> Option<Limit> {
    if value <= min {
        Some(Limit::Lower)
    } else if value >= max {
        Some(Limit::Upper)
    } else {
        None
    }
}

impl RawSample {
    /// Unpack a burst read starting at `press_msb`.
    ///
    /// 20-bit fields are `msb << 12 | lsb << 4 | xlsb >> 4`, the humidity
    /// field is `msb << 8 | lsb`. Humidity is decoded only from an 8-byte burst.
    pub fn from_burst(buf: &[u8]) -> Self {
        // msb [7:0] = x[19:12]
        // lsb [7:0] = x[11:4]
        // xlsb[7:4] = x[3:0]
        let read20 = |b: &[u8]| ((b[0] as u32) << 12) | ((b[1] as u32) << 4) | ((b[2] as u32) >> 4);

        RawSample {
            adc_p: read20(&buf[0..3]),
            adc_t: read20(&buf[3..6]),
            adc_h: (buf.len() >= BURST_LEN_TPH).then(|| ((buf[6] as u16) << 8) | buf[7] as u16),
        }
    }

    /// Classify every channel against its conversion limits.
    pub fn check_boundaries(&self) -> BoundaryFlags {
        BoundaryFlags {
            temperature: check(self.adc_t, ADC_T_MIN, ADC_T_MAX),
            pressure: check(self.adc_p, ADC_P_MIN, ADC_P_MAX),
            humidity: self.adc_h.and_then(|h| check(h, ADC_H_MIN, ADC_H_MAX)),
        }
    }
}
