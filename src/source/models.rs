use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// One monitored growing chamber, as stored in the remote `sites` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Site {
    pub id: i64,
    pub name: String,
}

/// One timestamped sensor/actuator sample from the remote `readings` table.
///
/// Sensor columns are ingested leniently: the store occasionally delivers
/// numbers as text, and field firmware has been seen writing placeholder
/// strings. Anything that does not parse as a number becomes `None` here,
/// so rendering code never has to coerce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reading {
    pub site_id: i64,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ph: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub motor1_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub motor2_power: Option<f64>,
}

/// Names one sensor column of a reading, for code that selects fields
/// dynamically (gauges, scatter pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    Temperature,
    Humidity,
    Ph,
    HeightCm,
    Motor1Power,
    Motor2Power,
}

impl SensorField {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature (°C)",
            Self::Humidity => "Humidity (%)",
            Self::Ph => "pH",
            Self::HeightCm => "Height (cm)",
            Self::Motor1Power => "Motor 1 power (W)",
            Self::Motor2Power => "Motor 2 power (W)",
        }
    }

    /// Short identifier used in canvas ids.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Ph => "ph",
            Self::HeightCm => "height",
            Self::Motor1Power => "motor1",
            Self::Motor2Power => "motor2",
        }
    }
}

impl Reading {
    /// Value of the named sensor column, if the sample carried one.
    #[must_use]
    pub fn field(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
            SensorField::Ph => self.ph,
            SensorField::HeightCm => self.height_cm,
            SensorField::Motor1Power => self.motor1_power,
            SensorField::Motor2Power => self.motor2_power,
        }
    }
}

/// Accepts a JSON number, a numeric string, or anything else (which maps to
/// `None`). Unparsable values are data to recover from, not errors.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
