// src/signals.rs - Synthetic gait joint angles and CSV export
use std::f64::consts::PI;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::error::{DashboardError, Result};

/// Seconds per full gait cycle of one leg.
const GAIT_CYCLE_SECONDS: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Channel {
    /// Plot order: hips, knees, ankles; left before right.
    pub const ALL: [Channel; 6] = [
        Channel::LeftHip,
        Channel::RightHip,
        Channel::LeftKnee,
        Channel::RightKnee,
        Channel::LeftAnkle,
        Channel::RightAnkle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::LeftHip => "Left Hip Flexion",
            Channel::RightHip => "Right Hip Flexion",
            Channel::LeftKnee => "Left Knee Flexion",
            Channel::RightKnee => "Right Knee Flexion",
            Channel::LeftAnkle => "Left Ankle Dorsiflexion",
            Channel::RightAnkle => "Right Ankle Dorsiflexion",
        }
    }

    pub fn value(self, sample: &Sample) -> f64 {
        match self {
            Channel::LeftHip => sample.left_hip,
            Channel::RightHip => sample.right_hip,
            Channel::LeftKnee => sample.left_knee,
            Channel::RightKnee => sample.right_knee,
            Channel::LeftAnkle => sample.left_ankle,
            Channel::RightAnkle => sample.right_ankle,
        }
    }
}

/// One row of joint angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Left Hip Flexion")]
    pub left_hip: f64,
    #[serde(rename = "Right Hip Flexion")]
    pub right_hip: f64,
    #[serde(rename = "Left Knee Flexion")]
    pub left_knee: f64,
    #[serde(rename = "Right Knee Flexion")]
    pub right_knee: f64,
    #[serde(rename = "Left Ankle Dorsiflexion")]
    pub left_ankle: f64,
    #[serde(rename = "Right Ankle Dorsiflexion")]
    pub right_ankle: f64,
}

impl Sample {
    fn at(t: f64) -> Self {
        let w = 2.0 * PI / GAIT_CYCLE_SECONDS;
        let phase = w * t;

        // Hip flexion, positive = flexion
        let right_hip = -18.0 * phase.cos() + 12.0;
        let left_hip = -18.0 * (phase + PI).cos() + 12.0;

        // Knee flexion: major swing peak plus a smaller stance bump
        let right_knee = 35.0 * (1.0 - (phase + 0.2).cos()) / 2.0 + 15.0 * (phase - 0.5).sin().powi(4);
        let left_knee =
            35.0 * (1.0 - (phase + PI + 0.2).cos()) / 2.0 + 15.0 * (phase + PI - 0.5).sin().powi(4);

        // Ankle, positive = dorsiflexion
        let right_ankle = 12.0 * (phase - PI * 0.45).sin() - 5.0;
        let left_ankle = 12.0 * (phase + PI - PI * 0.45).sin() - 5.0;

        Self {
            time: t,
            left_hip,
            right_hip,
            left_knee,
            right_knee,
            left_ankle,
            right_ankle,
        }
    }
}

/// Immutable, evenly spaced joint angle samples covering `[0, duration]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    duration: f64,
    samples: Vec<Sample>,
}

impl SignalTable {
    /// Generates `num_points` samples, the first at 0 and the last at `duration`.
    pub fn generate(duration: f64, num_points: usize) -> Result<Self> {
        if num_points < 2 {
            return Err(DashboardError::invalid(format!(
                "signal table needs at least 2 points, got {num_points}"
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(DashboardError::invalid(format!(
                "signal table duration must be positive, got {duration}"
            )));
        }

        let step = duration / (num_points - 1) as f64;
        let samples = (0..num_points)
            .map(|i| {
                let t = if i == num_points - 1 {
                    duration
                } else {
                    i as f64 * step
                };
                Sample::at(t)
            })
            .collect();

        Ok(Self { duration, samples })
    }

    /// One sample every `1 / sample_rate` seconds, both ends included.
    pub fn for_rate(duration: f64, sample_rate: f64) -> Result<Self> {
        let points = (duration * sample_rate).round();
        if !points.is_finite() || points < 1.0 {
            return Err(DashboardError::invalid(format!(
                "{sample_rate} Hz over {duration} s yields no samples"
            )));
        }
        Self::generate(duration, points as usize + 1)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples with `time <= t`, in order.
    pub fn up_to(&self, t: f64) -> &[Sample] {
        let end = self.samples.partition_point(|s| s.time <= t);
        &self.samples[..end]
    }

    pub fn series(&self, channel: Channel) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.samples.iter().map(move |s| [s.time, channel.value(s)])
    }

    /// Lowest and highest value of a channel over the whole table.
    pub fn range(&self, channel: Channel) -> (f64, f64) {
        self.samples
            .iter()
            .map(|s| channel.value(s))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// Writes a table to CSV with a `Time` column followed by the six channels.
pub fn export_csv(table: &SignalTable, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = Writer::from_writer(file);
    for sample in table.samples() {
        writer.serialize(sample)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = table.len(), "exported joint angles");
    Ok(path.to_path_buf())
}

pub fn default_export_name() -> String {
    format!("gait_data_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rate_based_table_includes_both_ends() {
        let table = SignalTable::for_rate(6.0, 30.0).unwrap();
        assert_eq!(table.len(), 181);
        assert_eq!(table.samples()[0].time, 0.0);
        assert_eq!(table.samples()[180].time, 6.0);
        assert!(close(table.samples()[90].time, 3.0));
        assert!(close(table.samples()[1].time, 1.0 / 30.0));
    }

    #[test]
    fn generation_is_deterministic() {
        let a = SignalTable::generate(6.0, 181).unwrap();
        let b = SignalTable::generate(6.0, 181).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fewer_than_two_points_is_invalid() {
        for n in [0, 1] {
            let err = SignalTable::generate(6.0, n).unwrap_err();
            assert!(matches!(err, DashboardError::InvalidArgument(_)));
        }
        assert!(SignalTable::generate(6.0, 2).is_ok());
        assert!(SignalTable::generate(0.0, 10).is_err());
    }

    #[test]
    fn first_sample_matches_closed_form() {
        let table = SignalTable::generate(6.0, 181).unwrap();
        let s = table.samples()[0];
        assert!(close(s.right_hip, -6.0));
        assert!(close(s.left_hip, 30.0));
        let right_knee = 35.0 * (1.0 - 0.2_f64.cos()) / 2.0 + 15.0 * (-0.5_f64).sin().powi(4);
        assert!(close(s.right_knee, right_knee));
        assert!(close(s.right_ankle, 12.0 * (-PI * 0.45).sin() - 5.0));
        assert!(close(s.left_ankle, 12.0 * (PI * 0.55).sin() - 5.0));
    }

    #[test]
    fn channel_magnitudes_stay_in_expected_bands() {
        let table = SignalTable::generate(6.0, 600).unwrap();
        let (lo, hi) = table.range(Channel::RightHip);
        assert!(lo >= -6.0 - 1e-9 && hi <= 30.0 + 1e-9);
        let (lo, hi) = table.range(Channel::LeftKnee);
        assert!(lo >= 0.0 && hi <= 50.0);
        let (lo, hi) = table.range(Channel::RightAnkle);
        assert!(lo >= -17.0 - 1e-9 && hi <= 7.0 + 1e-9);
    }

    #[test]
    fn up_to_is_inclusive_of_cursor() {
        let table = SignalTable::for_rate(6.0, 30.0).unwrap();
        assert_eq!(table.up_to(-1.0).len(), 0);
        assert_eq!(table.up_to(0.0).len(), 1);
        assert_eq!(table.up_to(6.0).len(), 181);
        assert_eq!(table.up_to(100.0).len(), 181);
        let half = table.up_to(3.01);
        assert!(half.last().unwrap().time <= 3.01);
        assert_eq!(half.len(), 91);
    }

    #[test]
    fn series_pairs_time_with_channel_value() {
        let table = SignalTable::generate(2.0, 5).unwrap();
        let points: Vec<[f64; 2]> = table.series(Channel::LeftAnkle).collect();
        assert_eq!(points.len(), 5);
        assert_eq!(points[4][0], 2.0);
        assert_eq!(points[2][1], table.samples()[2].left_ankle);
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = SignalTable::generate(1.0, 3).unwrap();
        let path = export_csv(&table, dir.path().join("nested").join("gait.csv")).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Time,Left Hip Flexion,Right Hip Flexion,Left Knee Flexion,Right Knee Flexion,\
             Left Ankle Dorsiflexion,Right Ankle Dorsiflexion"
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn export_name_is_timestamped_csv() {
        let name = default_export_name();
        assert!(name.starts_with("gait_data_"));
        assert!(name.ends_with(".csv"));
    }
}
