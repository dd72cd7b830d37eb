/// Playback state: the single mutable record the engine and minigames share.
///
/// Everything that can go stale is tracked here: the navigation epoch that
/// invalidates in-flight transitions, one timer slot per timer kind, and the
/// installed choice binding.
use crate::core::minigame::dogs::DogsGame;
use crate::core::minigame::evidence::EvidenceGame;
use crate::core::minigame::sleep::SleepGame;
use crate::core::minigame::FrameDriven;
use crate::core::scheduler::TimerHandle;
use crate::schema::scene::{ChoicePair, MinigameKind, SceneId};

/// Navigation generation. Deferred navigation work captures the epoch when
/// scheduled and only takes effect if it is still current when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NavEpoch(u64);

impl NavEpoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Timer kinds that allow at most one pending timer each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Choice,
    Intro,
    IntroFade,
    Transition,
}

#[derive(Debug, Clone, Default)]
pub struct TimerSlots {
    choice: Option<TimerHandle>,
    intro: Option<TimerHandle>,
    intro_fade: Option<TimerHandle>,
    transition: Option<TimerHandle>,
}

impl TimerSlots {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Choice => &mut self.choice,
            TimerKind::Intro => &mut self.intro,
            TimerKind::IntroFade => &mut self.intro_fade,
            TimerKind::Transition => &mut self.transition,
        }
    }

    pub fn get(&self, kind: TimerKind) -> Option<TimerHandle> {
        match kind {
            TimerKind::Choice => self.choice,
            TimerKind::Intro => self.intro,
            TimerKind::IntroFade => self.intro_fade,
            TimerKind::Transition => self.transition,
        }
    }

    /// Store `handle`, returning the previous one so the caller can cancel it.
    pub fn replace(&mut self, kind: TimerKind, handle: TimerHandle) -> Option<TimerHandle> {
        self.slot(kind).replace(handle)
    }

    pub fn take(&mut self, kind: TimerKind) -> Option<TimerHandle> {
        self.slot(kind).take()
    }

    /// Clear the slot if it still holds `handle` (the timer has fired).
    pub fn release(&mut self, kind: TimerKind, handle: TimerHandle) {
        let slot = self.slot(kind);
        if *slot == Some(handle) {
            *slot = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.choice.is_none()
            && self.intro.is_none()
            && self.intro_fade.is_none()
            && self.transition.is_none()
    }
}

/// The pointer binding installed while choices are on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceBinding {
    pub scene: SceneId,
    pub choices: ChoicePair,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionFlags {
    pub sleep: bool,
    pub dogs: bool,
    pub evidence: bool,
}

impl CompletionFlags {
    pub fn is_set(&self, kind: MinigameKind) -> bool {
        match kind {
            MinigameKind::Sleep => self.sleep,
            MinigameKind::Dogs => self.dogs,
            MinigameKind::Evidence => self.evidence,
        }
    }

    pub fn set(&mut self, kind: MinigameKind) {
        match kind {
            MinigameKind::Sleep => self.sleep = true,
            MinigameKind::Dogs => self.dogs = true,
            MinigameKind::Evidence => self.evidence = true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// `None` only while a restart is in progress.
    pub current_scene: Option<SceneId>,
    pub text_index: usize,
    pub history: Vec<SceneId>,
    pub is_text_started: bool,
    pub waiting_for_choice: bool,
    pub choice_ready: bool,
    pub is_transitioning: bool,
    pub is_item_showing: bool,
    pub intro_showing: bool,
    pub ending_showing: bool,
    nav_id: NavEpoch,
    pub timers: TimerSlots,
    pub choice_binding: Option<ChoiceBinding>,
    pub sleep: SleepGame,
    pub dogs: DogsGame,
    pub evidence: EvidenceGame,
    pub completed: CompletionFlags,
}

impl PlaybackState {
    pub fn new(initial: SceneId) -> Self {
        Self {
            current_scene: Some(initial),
            text_index: 0,
            history: Vec::new(),
            is_text_started: false,
            waiting_for_choice: false,
            choice_ready: false,
            is_transitioning: false,
            is_item_showing: false,
            intro_showing: false,
            ending_showing: false,
            nav_id: NavEpoch::default(),
            timers: TimerSlots::default(),
            choice_binding: None,
            sleep: SleepGame::default(),
            dogs: DogsGame::default(),
            evidence: EvidenceGame::default(),
            completed: CompletionFlags::default(),
        }
    }

    /// Start a new navigation generation and return it.
    pub fn bump_epoch(&mut self) -> NavEpoch {
        self.nav_id = NavEpoch(self.nav_id.0 + 1);
        self.nav_id
    }

    pub fn epoch(&self) -> NavEpoch {
        self.nav_id
    }

    pub fn is_current(&self, epoch: NavEpoch) -> bool {
        self.nav_id == epoch
    }

    pub fn any_minigame_active(&self) -> bool {
        self.sleep.active || self.dogs.active || self.evidence.active
    }

    /// The frame-driven game of `kind`; the evidence game has no frames.
    pub fn timed_game(&mut self, kind: MinigameKind) -> Option<&mut dyn FrameDriven> {
        match kind {
            MinigameKind::Sleep => Some(&mut self.sleep),
            MinigameKind::Dogs => Some(&mut self.dogs),
            MinigameKind::Evidence => None,
        }
    }

    /// Return every field to its initial value. The epoch and the minigame
    /// frame sessions keep counting so nothing scheduled earlier can match.
    pub fn reset(&mut self, initial: SceneId) {
        let nav_id = self.nav_id;
        let mut sleep = SleepGame::default();
        sleep.frames.session = self.sleep.frames.session + 1;
        let mut dogs = DogsGame::default();
        dogs.frames.session = self.dogs.frames.session + 1;

        *self = Self::new(initial);
        self.nav_id = nav_id;
        self.sleep = sleep;
        self.dogs = dogs;
    }
}
