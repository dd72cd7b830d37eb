/// Minigame controllers and their wiring into the engine.
///
/// Each game is a plain state machine (`sleep`, `dogs`, `evidence`); this
/// module owns the parts that touch the scheduler and the rest of the
/// playback state: frame loops, win/lose handling, restart and skip.
pub mod dogs;
pub mod evidence;
pub mod sleep;

use log::{debug, trace};

use crate::core::engine::{StoryEngine, Task};
use crate::core::particles::ParticleField;
use crate::core::render::{Layer, RenderCommand, RenderSink};
use crate::core::scheduler::TimerHandle;
use crate::schema::scene::{MinigameKind, MinigameSpec};

/// Result of advancing a timed minigame by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Running,
    Won,
    Lost,
}

/// Frame-loop bookkeeping shared by the timed games.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    /// Bumped whenever the game starts or stops; frames from an older
    /// session are ignored.
    pub(crate) session: u64,
    pub(crate) frame: Option<TimerHandle>,
}

/// A minigame advanced by fixed-length frames.
pub trait FrameDriven {
    fn is_active(&self) -> bool;
    fn tick(&mut self, frame_ms: u64) -> FrameOutcome;
    fn frame_loop(&mut self) -> &mut FrameLoop;
}

impl<S: RenderSink, P: ParticleField> StoryEngine<S, P> {
    /// Launch the minigame of the current scene, replacing any other game.
    pub(crate) fn start_minigame(&mut self, spec: &MinigameSpec) {
        self.abort_minigames();
        let kind = spec.kind();
        debug!("starting {} minigame", kind.name());

        self.emit(RenderCommand::Hide(Layer::TextBox));
        self.emit(RenderCommand::Hide(Layer::DialogueBox));
        self.emit(RenderCommand::OpenMinigame(kind));

        match spec {
            MinigameSpec::Sleep => {
                self.state.sleep.start(&self.config.sleep);
                self.emit_visuals(kind);
                self.schedule_frame(kind);
            }
            MinigameSpec::Dogs => {
                self.state.dogs.start(&self.config.dogs);
                self.emit_visuals(kind);
                self.schedule_frame(kind);
            }
            MinigameSpec::Evidence { hotspots } => {
                let spots = hotspots
                    .clone()
                    .unwrap_or_else(|| self.config.evidence.default_hotspots.clone());
                self.state.evidence.start(spots.clone());
                self.emit(RenderCommand::ShowHotspots(spots));
            }
        }
    }

    fn schedule_frame(&mut self, kind: MinigameKind) {
        let frame_ms = self.config.timing.frame_ms;
        let Some(game) = self.state.timed_game(kind) else {
            return;
        };
        let session = game.frame_loop().session;
        let handle = self
            .scheduler
            .schedule(frame_ms, Task::MinigameFrame { game: kind, session });
        if let Some(old) = self.state.timed_game(kind).and_then(|g| g.frame_loop().frame.replace(handle)) {
            self.scheduler.cancel(old);
        }
    }

    fn cancel_frame(&mut self, kind: MinigameKind) {
        if let Some(handle) = self.state.timed_game(kind).and_then(|g| g.frame_loop().frame.take()) {
            self.scheduler.cancel(handle);
        }
    }

    pub(crate) fn run_minigame_frame(&mut self, kind: MinigameKind, session: u64) {
        let frame_ms = self.config.timing.frame_ms;
        let Some(game) = self.state.timed_game(kind) else {
            return;
        };
        if !game.is_active() || game.frame_loop().session != session {
            trace!("stale {} frame dropped", kind.name());
            return;
        }
        game.frame_loop().frame = None;
        let outcome = game.tick(frame_ms);
        self.emit_visuals(kind);

        match outcome {
            FrameOutcome::Running => self.schedule_frame(kind),
            FrameOutcome::Won => self.win_minigame(kind),
            FrameOutcome::Lost => self.lose_minigame(kind),
        }
    }

    fn emit_visuals(&mut self, kind: MinigameKind) {
        let command = match kind {
            MinigameKind::Sleep => RenderCommand::SleepVisuals {
                darkness: self.state.sleep.darkness.min(1.0),
                eyelids: self.state.sleep.eyelid_closure(),
            },
            MinigameKind::Dogs => RenderCommand::DogsVisuals(self.state.dogs.rage_levels()),
            MinigameKind::Evidence => return,
        };
        self.emit(command);
    }

    fn win_minigame(&mut self, kind: MinigameKind) {
        debug!("{} minigame won", kind.name());
        self.cancel_frame(kind);
        match kind {
            MinigameKind::Sleep => self.state.sleep.stop(),
            MinigameKind::Dogs => self.state.dogs.stop(),
            MinigameKind::Evidence => self.state.evidence.stop(),
        }
        self.state.completed.set(kind);
        self.emit(RenderCommand::CloseMinigame(kind));
        self.next_step();
    }

    fn lose_minigame(&mut self, kind: MinigameKind) {
        self.cancel_frame(kind);
        let attempts = match kind {
            MinigameKind::Sleep => self.state.sleep.fail(),
            MinigameKind::Dogs => self.state.dogs.fail(),
            MinigameKind::Evidence => return,
        };
        debug!("{} minigame lost (attempt {})", kind.name(), attempts);
        self.emit(RenderCommand::ShowMinigameFailure { game: kind, attempts });
    }

    /// Stop every running or failed minigame without completing it.
    pub(crate) fn abort_minigames(&mut self) {
        for kind in [MinigameKind::Sleep, MinigameKind::Dogs, MinigameKind::Evidence] {
            let open = match kind {
                MinigameKind::Sleep => self.state.sleep.active || self.state.sleep.failed,
                MinigameKind::Dogs => self.state.dogs.active || self.state.dogs.failed,
                MinigameKind::Evidence => self.state.evidence.active,
            };
            if !open {
                continue;
            }
            self.cancel_frame(kind);
            match kind {
                MinigameKind::Sleep => self.state.sleep.stop(),
                MinigameKind::Dogs => self.state.dogs.stop(),
                MinigameKind::Evidence => self.state.evidence.stop(),
            }
            self.emit(RenderCommand::CloseMinigame(kind));
        }
    }

    /// Player action in the sleep game: push the darkness back.
    pub fn sleep_relief(&mut self) -> bool {
        if !self.state.sleep.relieve() {
            return false;
        }
        self.emit_visuals(MinigameKind::Sleep);
        self.emit(RenderCommand::PulseInstruction(MinigameKind::Sleep));
        true
    }

    /// Player clicked dog `index`.
    pub fn calm_dog(&mut self, index: usize) -> bool {
        if !self.state.dogs.calm(index) {
            return false;
        }
        self.emit_visuals(MinigameKind::Dogs);
        self.emit(RenderCommand::PulseInstruction(MinigameKind::Dogs));
        true
    }

    /// Player clicked evidence hotspot `index`.
    pub fn inspect_hotspot(&mut self, index: usize) -> bool {
        let Some(description) = self.state.evidence.inspect(index).map(str::to_string) else {
            return false;
        };
        self.emit(RenderCommand::RemoveHotspot(index));
        self.emit(RenderCommand::ShowEvidenceDescription(description));
        true
    }

    /// Dismiss the evidence description; the last dismissal wins the game.
    pub fn dismiss_evidence(&mut self) -> bool {
        let Some(progress) = self.state.evidence.dismiss() else {
            return false;
        };
        self.emit(RenderCommand::HideEvidenceDescription);
        if progress == evidence::Progress::Solved {
            self.win_minigame(MinigameKind::Evidence);
        }
        true
    }

    /// The restart button of a failed minigame.
    pub fn restart_minigame(&mut self, kind: MinigameKind) -> bool {
        match kind {
            MinigameKind::Sleep => {
                if self.state.sleep.active || !self.state.sleep.failed {
                    return false;
                }
                self.state.sleep.stop();
                self.emit(RenderCommand::CloseMinigame(kind));
                // re-enter the scene so the game restarts after the fade
                if let Some(current) = self.state.current_scene.clone() {
                    self.transition_to_scene(current, true);
                }
                true
            }
            MinigameKind::Dogs => {
                if self.state.dogs.active || !self.state.dogs.failed {
                    return false;
                }
                self.start_minigame(&MinigameSpec::Dogs);
                true
            }
            MinigameKind::Evidence => false,
        }
    }

    /// The skip button of a failed minigame: counts as completed.
    pub fn skip_minigame(&mut self, kind: MinigameKind) -> bool {
        let failed = match kind {
            MinigameKind::Sleep => !self.state.sleep.active && self.state.sleep.failed,
            MinigameKind::Dogs => !self.state.dogs.active && self.state.dogs.failed,
            MinigameKind::Evidence => false,
        };
        if !failed {
            return false;
        }
        debug!("{} minigame skipped", kind.name());
        match kind {
            MinigameKind::Sleep => self.state.sleep.stop(),
            MinigameKind::Dogs => self.state.dogs.stop(),
            MinigameKind::Evidence => {}
        }
        self.state.completed.set(kind);
        self.emit(RenderCommand::CloseMinigame(kind));
        self.next_step();
        true
    }
}
