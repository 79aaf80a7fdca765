use crate::source::{Reading, SensorField};

/// Two reading columns plotted against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScatterPair {
    pub x: SensorField,
    pub y: SensorField,
}

impl ScatterPair {
    #[must_use]
    pub const fn new(x: SensorField, y: SensorField) -> Self {
        Self { x, y }
    }
}

/// The scatter plots rendered for each site tab.
pub const SCATTER_PAIRS: [ScatterPair; 3] = [
    ScatterPair::new(SensorField::Temperature, SensorField::Humidity),
    ScatterPair::new(SensorField::Ph, SensorField::HeightCm),
    ScatterPair::new(SensorField::Motor1Power, SensorField::Motor2Power),
];

/// Collect plottable points from a historical window.
///
/// Readings where either field is missing or did not parse are dropped
/// silently; partial data is expected from real sensors.
#[must_use]
pub fn collect_points(history: &[Reading], pair: ScatterPair) -> Vec<[f64; 2]> {
    history
        .iter()
        .filter_map(|r| Some([r.field(pair.x)?, r.field(pair.y)?]))
        .collect()
}
