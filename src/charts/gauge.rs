use crate::source::SensorField;

/// The four metrics rendered as gauges on each site tab, each with a fixed
/// display maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    Ph,
    Height,
}

impl Metric {
    pub const ALL: [Self; 4] = [Self::Temperature, Self::Humidity, Self::Ph, Self::Height];

    /// Fixed full-scale value for the gauge dial.
    #[must_use]
    pub fn max(self) -> f64 {
        match self {
            Self::Temperature => 50.0,
            Self::Humidity => 100.0,
            Self::Ph => 14.0,
            Self::Height => 100.0,
        }
    }

    /// The reading column this gauge displays.
    #[must_use]
    pub fn field(self) -> SensorField {
        match self {
            Self::Temperature => SensorField::Temperature,
            Self::Humidity => SensorField::Humidity,
            Self::Ph => SensorField::Ph,
            Self::Height => SensorField::HeightCm,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.field().label()
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Ph => "ph",
            Self::Height => "height",
        }
    }
}

/// Map a raw value to a 0–100 display percentage of the metric's maximum.
///
/// Overflow saturates at 100 and negative values floor at 0: a sensor past
/// its dial is shown pinned, not treated as an error. Non-finite input
/// displays as 0.
#[must_use]
pub fn gauge_percentage(value: f64, max: f64) -> f64 {
    if !value.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (value / max * 100.0).clamp(0.0, 100.0)
}

/// Color band for a gauge at a given fill percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    Nominal,
    Warning,
    Alert,
}

impl GaugeBand {
    /// Banding: above 80% alert, 60–80% warning, below 60% nominal.
    #[must_use]
    pub fn for_percentage(percent: f64) -> Self {
        if percent > 80.0 {
            Self::Alert
        } else if percent >= 60.0 {
            Self::Warning
        } else {
            Self::Nominal
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Nominal => "#27ae60",
            Self::Warning => "#f39c12",
            Self::Alert => "#c0392b",
        }
    }
}
