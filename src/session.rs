// src/session.rs - One playback session: clock, data sources and the per-cycle snapshot
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::insights::{InsightRecord, InsightRules};
use crate::playback::{EndBehavior, PlaybackClock, PlaybackMode};
use crate::signals::{Sample, SignalTable};
use crate::video::{Frame, FrameSource};

/// User input accepted from the presenter. These are the only mutators of
/// playback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    TogglePlay,
    Reset,
    Seek(f64),
    SetEndBehavior(EndBehavior),
}

/// Everything the presenter needs to draw one cycle.
pub struct Snapshot<'a> {
    pub cursor: f64,
    pub mode: PlaybackMode,
    pub sample_index: usize,
    pub sample: &'a Sample,
    pub primary_frame: Option<Frame>,
    pub overlay_frame: Option<Frame>,
    pub insight: InsightRecord,
    /// Samples at or before the cursor.
    pub history: &'a [Sample],
}

pub struct Session {
    clock: PlaybackClock,
    table: SignalTable,
    rules: InsightRules,
    primary: Box<dyn FrameSource>,
    overlay: Box<dyn FrameSource>,
}

impl Session {
    pub fn new(
        clock: PlaybackClock,
        table: SignalTable,
        rules: InsightRules,
        primary: Box<dyn FrameSource>,
        overlay: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            clock,
            table,
            rules,
            primary,
            overlay,
        }
    }

    /// Builds the clock and signal table described by `config` around two
    /// already opened videos.
    pub fn from_config(
        config: &DashboardConfig,
        primary: Box<dyn FrameSource>,
        overlay: Box<dyn FrameSource>,
    ) -> Result<Self> {
        config.validate()?;
        for source in [&primary, &overlay] {
            if source.content_duration() + 1e-9 < config.duration {
                tracing::warn!(
                    path = %source.path().display(),
                    content = source.content_duration(),
                    duration = config.duration,
                    "video is shorter than the analysed duration; late frames will be missing"
                );
            }
        }
        let table = SignalTable::for_rate(config.duration, config.sample_rate)?;
        let clock = PlaybackClock::new(config.duration, config.tick_step())
            .with_end_behavior(config.end_behavior);
        tracing::info!(
            duration = config.duration,
            samples = table.len(),
            primary_frames = primary.frame_count(),
            overlay_frames = overlay.frame_count(),
            "session ready"
        );
        Ok(Self::new(clock, table, InsightRules::gait(), primary, overlay))
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn table(&self) -> &SignalTable {
        &self.table
    }

    pub fn apply(&mut self, control: Control) {
        tracing::debug!(?control, cursor = self.clock.cursor(), "control");
        match control {
            Control::TogglePlay => self.clock.toggle_play(),
            Control::Reset => self.clock.reset(),
            Control::Seek(t) => {
                self.clock.seek(t);
            }
            Control::SetEndBehavior(end_behavior) => self.clock.set_end_behavior(end_behavior),
        }
    }

    /// Reads the current state and performs every derived lookup.
    ///
    /// Both videos are asked for the same cursor; the two decodes run on
    /// separate threads and are joined before returning.
    pub fn snapshot(&self) -> Snapshot<'_> {
        let cursor = self.clock.cursor();
        let sample_index = self.clock.sample_index(self.table.len());
        let samples = self.table.samples();

        let primary = self.primary.as_ref();
        let overlay = self.overlay.as_ref();
        let (primary_frame, overlay_frame) = std::thread::scope(|scope| {
            let overlay_job = scope.spawn(move || overlay.frame_at(cursor));
            let primary_frame = primary.frame_at(cursor);
            let overlay_frame = overlay_job.join().unwrap_or_else(|_| {
                tracing::warn!("overlay decoder panicked");
                None
            });
            (primary_frame, overlay_frame)
        });

        Snapshot {
            cursor,
            mode: self.clock.mode(),
            sample_index,
            sample: &samples[sample_index],
            primary_frame,
            overlay_frame,
            insight: self.rules.lookup(cursor),
            history: self.table.up_to(cursor),
        }
    }

    /// Ends a cycle: advances a running clock by one step. Returns whether
    /// another cycle should be scheduled.
    pub fn finish_cycle(&mut self) -> bool {
        if !self.clock.is_running() {
            return false;
        }
        self.clock.advance();
        if !self.clock.is_running() {
            tracing::info!(cursor = self.clock.cursor(), "playback reached the end");
        }
        self.clock.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::InsightStatus;
    use crate::video::EagerFrameSource;
    use image::{Rgb, RgbImage};

    fn frames(count: usize, shade: u8) -> Vec<Frame> {
        (0..count)
            .map(|i| RgbImage::from_pixel(2, 2, Rgb([shade, i as u8, 0])))
            .collect()
    }

    fn session_with(primary_frames: usize, overlay_frames: usize) -> Session {
        let config = DashboardConfig::default();
        let primary = EagerFrameSource::from_frames("video_1.mp4", frames(primary_frames, 10), 30.0);
        let overlay = EagerFrameSource::from_frames("video_2.mp4", frames(overlay_frames, 20), 30.0);
        Session::from_config(&config, Box::new(primary), Box::new(overlay)).unwrap()
    }

    #[test]
    fn snapshot_at_start() {
        let session = session_with(180, 180);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.cursor, 0.0);
        assert_eq!(snapshot.mode, PlaybackMode::Paused);
        assert_eq!(snapshot.sample_index, 0);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.insight.title, "Right Heel Strike");
        assert_eq!(snapshot.primary_frame.unwrap().get_pixel(0, 0), &Rgb([10, 0, 0]));
        assert_eq!(snapshot.overlay_frame.unwrap().get_pixel(0, 0), &Rgb([20, 0, 0]));
    }

    #[test]
    fn both_videos_follow_the_same_cursor() {
        let mut session = session_with(180, 180);
        session.apply(Control::Seek(3.0));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.sample_index, 90);
        assert!((snapshot.sample.time - 3.0).abs() < 1e-9);
        let primary = snapshot.primary_frame.unwrap();
        let overlay = snapshot.overlay_frame.unwrap();
        assert_eq!(primary.get_pixel(0, 0)[1], 90);
        assert_eq!(overlay.get_pixel(0, 0)[1], 90);
        assert!(snapshot.history.iter().all(|s| s.time <= 3.0));
    }

    #[test]
    fn short_video_renders_without_its_frame() {
        let mut session = session_with(180, 60);
        session.apply(Control::Seek(5.0));
        let snapshot = session.snapshot();
        assert!(snapshot.primary_frame.is_some());
        assert!(snapshot.overlay_frame.is_none());
        assert_eq!(snapshot.insight.status, InsightStatus::Normal);
    }

    #[test]
    fn cycles_run_to_the_end_and_stop() {
        let mut session = session_with(180, 180);
        session.apply(Control::TogglePlay);
        let mut cycles = 0;
        while session.finish_cycle() {
            let snapshot = session.snapshot();
            assert!(snapshot.cursor <= 6.0);
            cycles += 1;
            assert!(cycles < 500);
        }
        assert_eq!(session.clock().cursor(), 6.0);
        assert_eq!(session.clock().mode(), PlaybackMode::Paused);
        assert!(!session.finish_cycle());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.sample_index, 180);
        assert_eq!(snapshot.history.len(), 181);
        assert!(snapshot.primary_frame.is_some());
    }

    #[test]
    fn seek_interrupts_playback_and_reset_rewinds() {
        let mut session = session_with(180, 180);
        session.apply(Control::TogglePlay);
        assert!(session.finish_cycle());
        session.apply(Control::Seek(2.3));
        assert!(!session.finish_cycle());
        assert_eq!(session.snapshot().insight.title, "Right Heel Strike");

        session.apply(Control::Reset);
        assert_eq!(session.clock().cursor(), 0.0);
        assert_eq!(session.clock().mode(), PlaybackMode::Paused);
    }

    #[test]
    fn loop_toggle_keeps_playing_past_the_end() {
        let mut session = session_with(180, 180);
        session.apply(Control::SetEndBehavior(EndBehavior::Loop));
        session.apply(Control::Seek(5.99));
        session.apply(Control::TogglePlay);
        assert!(session.finish_cycle());
        assert!(session.finish_cycle());
        assert_eq!(session.clock().cursor(), 0.0);
    }
}
