// src/insights.rs - Gait phase annotations keyed by position in the L-R cycle
use std::fmt;

/// Length of one full left-right gait cycle, in seconds.
pub const CYCLE_PERIOD: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightStatus {
    Normal,
    Good,
    Symmetrical,
    Stable,
    Unknown,
}

impl fmt::Display for InsightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InsightStatus::Normal => "Normal",
            InsightStatus::Good => "Good",
            InsightStatus::Symmetrical => "Symmetrical",
            InsightStatus::Stable => "Stable",
            InsightStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightRecord {
    pub title: &'static str,
    pub finding: &'static str,
    pub status: InsightStatus,
}

/// Half-open window `[start, end)` of cycle time.
#[derive(Debug, Clone, Copy)]
pub struct InsightWindow {
    pub start: f64,
    pub end: f64,
    pub record: InsightRecord,
}

impl InsightWindow {
    fn contains(&self, cycle_time: f64) -> bool {
        self.start <= cycle_time && cycle_time < self.end
    }
}

const GAIT_WINDOWS: [InsightWindow; 6] = [
    InsightWindow {
        start: 0.0,
        end: 0.2,
        record: InsightRecord {
            title: "Right Heel Strike",
            finding: "Initiating stance phase on the right leg. Hip is flexed (~25°), knee is near full extension to accept weight.",
            status: InsightStatus::Normal,
        },
    },
    InsightWindow {
        start: 0.2,
        end: 0.8,
        record: InsightRecord {
            title: "Left Swing Phase",
            finding: "Left leg is in swing. Peak knee flexion (~65°) and ankle dorsiflexion ensure adequate ground clearance.",
            status: InsightStatus::Normal,
        },
    },
    InsightWindow {
        start: 0.8,
        end: 1.3,
        record: InsightRecord {
            title: "Right Push-Off",
            finding: "Powerful ankle plantarflexion detected on the right side, propelling the body forward. This is a key indicator of propulsive force.",
            status: InsightStatus::Good,
        },
    },
    InsightWindow {
        start: 1.3,
        end: 1.5,
        record: InsightRecord {
            title: "Left Heel Strike",
            finding: "Symmetry check: Left leg makes initial contact. Comparing angles to the right side shows good bilateral symmetry.",
            status: InsightStatus::Symmetrical,
        },
    },
    InsightWindow {
        start: 1.5,
        end: 2.0,
        record: InsightRecord {
            title: "Right Swing Phase",
            finding: "Right leg is now in swing. Hip flexion is increasing towards its peak.",
            status: InsightStatus::Normal,
        },
    },
    InsightWindow {
        start: 2.0,
        end: CYCLE_PERIOD,
        record: InsightRecord {
            title: "Overall Assessment",
            finding: "Gait pattern appears stable and rhythmic. Cadence is estimated at ~110 steps/minute.",
            status: InsightStatus::Stable,
        },
    },
];

const UNAVAILABLE: InsightRecord = InsightRecord {
    title: "No Data",
    finding: "The playback position is not a valid time.",
    status: InsightStatus::Unknown,
};

/// Maps playback time to a phase annotation.
///
/// The last window doubles as the fallback, so every finite time resolves
/// to exactly one record.
#[derive(Debug, Clone)]
pub struct InsightRules {
    period: f64,
    windows: Vec<InsightWindow>,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self::gait()
    }
}

impl InsightRules {
    pub fn gait() -> Self {
        Self {
            period: CYCLE_PERIOD,
            windows: GAIT_WINDOWS.to_vec(),
        }
    }

    /// Position of `t` inside the cycle, always in `[0, period)`.
    pub fn cycle_time(&self, t: f64) -> f64 {
        let cycle_time = t.rem_euclid(self.period);
        // rem_euclid rounds tiny negative inputs up to exactly `period`
        if cycle_time >= self.period {
            0.0
        } else {
            cycle_time
        }
    }

    pub fn lookup(&self, t: f64) -> InsightRecord {
        if !t.is_finite() {
            return UNAVAILABLE;
        }
        let cycle_time = self.cycle_time(t);
        self.windows
            .iter()
            .find(|w| w.contains(cycle_time))
            .or_else(|| self.windows.last())
            .map(|w| w.record)
            .unwrap_or(UNAVAILABLE)
    }
}
