/// Sleep-resistance game: keep the screen from going dark until time runs out.
use super::{FrameDriven, FrameLoop, FrameOutcome};
use crate::schema::config::SleepTuning;

#[derive(Debug, Clone, Default)]
pub struct SleepGame {
    pub active: bool,
    /// Set after a loss until the player restarts or skips.
    pub failed: bool,
    /// 0.0 = eyes open, 1.0 = asleep.
    pub darkness: f64,
    /// Darkness added per frame; grows every frame.
    pub speed: f64,
    pub elapsed_ms: u64,
    pub attempts: u32,
    tuning: SleepTuning,
    pub(crate) frames: FrameLoop,
}

impl SleepGame {
    pub fn start(&mut self, tuning: &SleepTuning) {
        self.tuning = tuning.clone();
        self.active = true;
        self.failed = false;
        self.darkness = 0.0;
        self.speed = tuning.initial_speed;
        self.elapsed_ms = 0;
        self.frames.session += 1;
    }

    /// Push the darkness back by one action's worth. Returns false when idle.
    pub fn relieve(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.darkness = (self.darkness - self.tuning.relief).max(0.0);
        true
    }

    /// Eyelid closure in [0,1], once darkness passes the threshold.
    pub fn eyelid_closure(&self) -> Option<f64> {
        let threshold = self.tuning.eyelid_threshold;
        if self.darkness < threshold || threshold >= 1.0 {
            return None;
        }
        Some(((self.darkness - threshold) / (1.0 - threshold)).min(1.0))
    }

    pub(crate) fn stop(&mut self) {
        self.active = false;
        self.failed = false;
        self.darkness = 0.0;
        self.frames.session += 1;
    }

    /// Record a loss and return the attempt count.
    pub(crate) fn fail(&mut self) -> u32 {
        self.active = false;
        self.failed = true;
        self.attempts += 1;
        self.frames.session += 1;
        self.attempts
    }
}

impl FrameDriven for SleepGame {
    fn is_active(&self) -> bool {
        self.active
    }

    fn tick(&mut self, frame_ms: u64) -> FrameOutcome {
        if !self.active {
            return FrameOutcome::Running;
        }
        self.elapsed_ms += frame_ms;
        self.darkness += self.speed;
        self.speed += self.tuning.acceleration;

        if self.darkness >= 1.0 {
            return FrameOutcome::Lost;
        }
        if self.elapsed_ms >= self.tuning.duration_ms {
            return FrameOutcome::Won;
        }
        FrameOutcome::Running
    }

    fn frame_loop(&mut self) -> &mut FrameLoop {
        &mut self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> SleepGame {
        let mut game = SleepGame::default();
        game.start(&SleepTuning::default());
        game
    }

    #[test]
    fn idle_player_falls_asleep_before_time_runs_out() {
        let mut game = started();
        let outcome = loop {
            match game.tick(16) {
                FrameOutcome::Running => continue,
                other => break other,
            }
        };
        assert_eq!(outcome, FrameOutcome::Lost);
        assert!(game.darkness >= 1.0);
        assert!(game.elapsed_ms < SleepTuning::default().duration_ms);
    }

    #[test]
    fn steady_relief_survives_to_the_end() {
        let mut game = started();
        let mut frame = 0u32;
        let outcome = loop {
            frame += 1;
            if frame % 5 == 0 {
                assert!(game.relieve());
            }
            match game.tick(16) {
                FrameOutcome::Running => continue,
                other => break other,
            }
        };
        assert_eq!(outcome, FrameOutcome::Won);
        assert!(game.darkness < 1.0);
    }

    #[test]
    fn speed_accelerates_each_frame() {
        let mut game = started();
        let before = game.speed;
        game.tick(16);
        game.tick(16);
        assert!((game.speed - (before + 2.0 * 0.00002)).abs() < 1e-12);
    }

    #[test]
    fn relief_floors_at_zero() {
        let mut game = started();
        game.tick(16);
        game.relieve();
        assert_eq!(game.darkness, 0.0);
    }

    #[test]
    fn eyelids_follow_darkness_past_half() {
        let mut game = started();
        game.darkness = 0.4;
        assert_eq!(game.eyelid_closure(), None);
        game.darkness = 0.75;
        assert!((game.eyelid_closure().unwrap() - 0.5).abs() < 1e-9);
        game.darkness = 1.0;
        assert_eq!(game.eyelid_closure(), Some(1.0));
    }

    #[test]
    fn fail_counts_attempts() {
        let mut game = started();
        assert_eq!(game.fail(), 1);
        assert!(!game.active);
        assert!(game.failed);
        assert!(!game.relieve());
        game.start(&SleepTuning::default());
        assert_eq!(game.fail(), 2);
    }
}
