/// Dogs-appeasement game: keep every dog's rage below the limit.
use super::{FrameDriven, FrameLoop, FrameOutcome};
use crate::schema::config::DogsTuning;

#[derive(Debug, Clone, Default)]
pub struct DogsGame {
    pub active: bool,
    pub failed: bool,
    /// Rage per dog, in [0, max_rage].
    pub rage: Vec<f64>,
    pub elapsed_ms: u64,
    pub attempts: u32,
    tuning: DogsTuning,
    pub(crate) frames: FrameLoop,
}

impl DogsGame {
    pub fn start(&mut self, tuning: &DogsTuning) {
        self.tuning = tuning.clone();
        self.active = true;
        self.failed = false;
        self.rage = vec![0.0; tuning.count];
        self.elapsed_ms = 0;
        self.frames.session += 1;
    }

    /// Calm one dog. Returns false when idle or the index is out of range.
    pub fn calm(&mut self, index: usize) -> bool {
        if !self.active {
            return false;
        }
        let calm_amount = self.tuning.calm_amount;
        match self.rage.get_mut(index) {
            Some(rage) => {
                *rage = (*rage - calm_amount).max(0.0);
                true
            }
            None => false,
        }
    }

    /// Rage of each dog as a fraction of the maximum, capped at 1.
    pub fn rage_levels(&self) -> Vec<f64> {
        let max = self.tuning.max_rage;
        self.rage.iter().map(|r| (r / max).min(1.0)).collect()
    }

    pub fn max_rage(&self) -> f64 {
        self.tuning.max_rage
    }

    pub(crate) fn stop(&mut self) {
        self.active = false;
        self.failed = false;
        self.frames.session += 1;
    }

    pub(crate) fn fail(&mut self) -> u32 {
        self.active = false;
        self.failed = true;
        self.attempts += 1;
        self.frames.session += 1;
        self.attempts
    }
}

impl FrameDriven for DogsGame {
    fn is_active(&self) -> bool {
        self.active
    }

    fn tick(&mut self, frame_ms: u64) -> FrameOutcome {
        if !self.active {
            return FrameOutcome::Running;
        }
        self.elapsed_ms += frame_ms;
        let growth = self.tuning.rage_per_second * frame_ms as f64 / 1000.0;
        for rage in self.rage.iter_mut() {
            *rage += growth;
        }

        if self.rage.iter().any(|&r| r >= self.tuning.max_rage) {
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

    fn run(game: &mut DogsGame, mut each_frame: impl FnMut(u32, &mut DogsGame)) -> FrameOutcome {
        let mut frame = 0;
        loop {
            frame += 1;
            each_frame(frame, game);
            match game.tick(16) {
                FrameOutcome::Running => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn rage_grows_per_second() {
        let mut game = DogsGame::default();
        game.start(&DogsTuning::default());
        for _ in 0..125 {
            game.tick(16);
        }
        // 125 frames * 16ms = 2s at 12 rage/s
        for rage in &game.rage {
            assert!((rage - 24.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unattended_pack_loses() {
        let mut game = DogsGame::default();
        game.start(&DogsTuning::default());
        assert_eq!(run(&mut game, |_, _| {}), FrameOutcome::Lost);
        assert!(game.elapsed_ms < DogsTuning::default().duration_ms);
    }

    #[test]
    fn calming_one_dog_protects_only_that_dog() {
        let mut game = DogsGame::default();
        game.start(&DogsTuning::default());
        let outcome = run(&mut game, |frame, g| {
            if frame % 40 == 0 {
                g.calm(0);
            }
        });
        assert_eq!(outcome, FrameOutcome::Lost);
        assert!(game.rage[0] < game.max_rage());
        assert!(game.rage[1] >= game.max_rage());
        assert!(game.rage[2] >= game.max_rage());
    }

    #[test]
    fn calming_every_dog_wins() {
        let mut game = DogsGame::default();
        game.start(&DogsTuning::default());
        let outcome = run(&mut game, |frame, g| {
            if frame % 40 == 0 {
                for i in 0..3 {
                    g.calm(i);
                }
            }
        });
        assert_eq!(outcome, FrameOutcome::Won);
    }

    #[test]
    fn calm_floors_at_zero_and_checks_bounds() {
        let mut game = DogsGame::default();
        game.start(&DogsTuning::default());
        assert!(game.calm(1));
        assert_eq!(game.rage[1], 0.0);
        assert!(!game.calm(7));
    }

    #[test]
    fn idle_game_ignores_clicks() {
        let mut game = DogsGame::default();
        assert!(!game.calm(0));
    }
}
