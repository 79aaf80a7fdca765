use crate::dashboard::snapshot::SiteSnapshot;

/// Rated draw of one irrigation motor. Shares of installed capacity are
/// computed against this.
pub const MOTOR_MAX_POWER_W: f64 = 250.0;

/// Below this draw a motor is considered idle rather than running.
pub const MOTOR_RUNNING_THRESHOLD_W: f64 = 5.0;

/// A three-slice breakdown for the summary pie charts. Shares are
/// percentages and sum to 100 when any data is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub labels: Vec<String>,
    pub shares: Vec<f64>,
}

impl Distribution {
    fn new(labels: [&str; 3], shares: [f64; 3]) -> Self {
        Self {
            labels: labels.iter().map(ToString::to_string).collect(),
            shares: shares.to_vec(),
        }
    }
}

/// How the installed motor capacity is being used across all sites:
/// motor 1 draw, motor 2 draw, and unused headroom.
///
/// Capacity counts only sites that reported a latest reading this cycle;
/// with no reporting sites every share is zero.
#[must_use]
pub fn energy_distribution(snapshots: &[SiteSnapshot]) -> Distribution {
    let mut motor1 = 0.0;
    let mut motor2 = 0.0;
    let mut reporting = 0usize;

    for snapshot in snapshots {
        if let Some(latest) = &snapshot.latest {
            reporting += 1;
            motor1 += latest.motor1_power.unwrap_or(0.0).max(0.0);
            motor2 += latest.motor2_power.unwrap_or(0.0).max(0.0);
        }
    }

    let capacity = reporting as f64 * 2.0 * MOTOR_MAX_POWER_W;
    if capacity <= 0.0 {
        return Distribution::new(["Motor 1 draw", "Motor 2 draw", "Headroom"], [0.0, 0.0, 0.0]);
    }

    let share1 = (motor1 / capacity * 100.0).min(100.0);
    let share2 = (motor2 / capacity * 100.0).min(100.0 - share1);
    let headroom = (100.0 - share1 - share2).max(0.0);

    Distribution::new(
        ["Motor 1 draw", "Motor 2 draw", "Headroom"],
        [share1, share2, headroom],
    )
}

/// Motor slot status across all sites: running, idle, or unreported.
///
/// Every site contributes two slots. A slot is unreported when the site has
/// no latest reading or the power column did not parse.
#[must_use]
pub fn motor_distribution(snapshots: &[SiteSnapshot]) -> Distribution {
    let mut running = 0usize;
    let mut idle = 0usize;
    let mut unreported = 0usize;

    for snapshot in snapshots {
        let powers = match &snapshot.latest {
            Some(latest) => [latest.motor1_power, latest.motor2_power],
            None => [None, None],
        };
        for power in powers {
            match power {
                Some(p) if p > MOTOR_RUNNING_THRESHOLD_W => running += 1,
                Some(_) => idle += 1,
                None => unreported += 1,
            }
        }
    }

    let total = (running + idle + unreported) as f64;
    if total <= 0.0 {
        return Distribution::new(["Running", "Idle", "Unreported"], [0.0, 0.0, 0.0]);
    }

    Distribution::new(
        ["Running", "Idle", "Unreported"],
        [
            running as f64 / total * 100.0,
            idle as f64 / total * 100.0,
            unreported as f64 / total * 100.0,
        ],
    )
}
