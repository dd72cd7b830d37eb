/// The navigation engine: scene transitions, the text/choice/item reveal
/// sequence, intros, endings and restart.
///
/// All deferred work goes through the scheduler as a [`Task`]. Tasks that can
/// be superseded by a later navigation hold a timer slot and capture the
/// navigation epoch, and check both when they fire.
use log::{debug, trace, warn};
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

use crate::core::input::{translate, Command, InputEvent};
use crate::core::particles::{ParticleField, ParticleSystem};
use crate::core::render::{Layer, LoadTicket, RenderCommand, RenderSink, TextStyle};
use crate::core::scheduler::{Scheduler, TimerHandle};
use crate::core::state::{ChoiceBinding, NavEpoch, PlaybackState, TimerKind};
use crate::schema::config::{ConfigError, PlayerConfig};
use crate::schema::scene::{
    Ending, IntroImage, Item, MinigameKind, MinigameSpec, Narrative, ParticleConfig, Scene,
    SceneError, SceneId, SceneKind, SceneTable, Side,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("initial scene '{0}' is not in the scene table")]
    MissingInitialScene(SceneId),
}

/// A background image the host could not load.
#[derive(Debug, Clone, Error)]
#[error("failed to load '{path}': {reason}")]
pub struct AssetError {
    pub path: String,
    pub reason: String,
}

/// Deferred engine work.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    Transition {
        epoch: NavEpoch,
        target: SceneId,
        from_history: bool,
    },
    IntroAdvance {
        epoch: NavEpoch,
        scene: SceneId,
    },
    IntroFadeOut {
        epoch: NavEpoch,
        scene: SceneId,
    },
    HideIntroOverlay,
    RevealChoices {
        epoch: NavEpoch,
        scene: SceneId,
    },
    BackgroundFadeIn {
        epoch: NavEpoch,
    },
    MinigameFrame {
        game: MinigameKind,
        session: u64,
    },
}

/// The background load the engine is waiting on.
#[derive(Debug, Clone)]
struct PendingBackground {
    ticket: LoadTicket,
    scene: SceneId,
    path: String,
    /// A minigame that starts once the background is up.
    then: Option<MinigameSpec>,
}

/// The story player. Built via `StoryEngine::builder()`.
pub struct StoryEngine<S = Vec<RenderCommand>, P = ParticleSystem> {
    scenes: Rc<SceneTable>,
    pub(crate) config: PlayerConfig,
    pub(crate) state: PlaybackState,
    pub(crate) scheduler: Scheduler<Task>,
    sink: S,
    particles: P,
    background: Option<PendingBackground>,
    next_ticket: u64,
}

/// Builder for constructing a `StoryEngine`.
pub struct StoryEngineBuilder {
    scenes_path: Option<String>,
    config_path: Option<String>,
    /// Directly provided scenes (for testing without files).
    scenes: Option<SceneTable>,
    /// Directly provided config (for testing without files).
    config: Option<PlayerConfig>,
    particle_seed: u64,
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder {
            scenes_path: None,
            config_path: None,
            scenes: None,
            config: None,
            particle_seed: 0,
        }
    }
}

impl StoryEngineBuilder {
    pub fn scenes_path(mut self, path: &str) -> Self {
        self.scenes_path = Some(path.to_string());
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide scenes directly. A `scenes_path` file is merged over them.
    pub fn with_scenes(mut self, scenes: SceneTable) -> Self {
        self.scenes = Some(scenes);
        self
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn particle_seed(mut self, seed: u64) -> Self {
        self.particle_seed = seed;
        self
    }

    /// Build with the recording sink and the bundled particle system.
    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let particles = ParticleSystem::new(self.particle_seed, 1280.0, 720.0);
        self.build_with(Vec::new(), particles)
    }

    pub fn build_with<S: RenderSink, P: ParticleField>(
        self,
        sink: S,
        particles: P,
    ) -> Result<StoryEngine<S, P>, EngineError> {
        let mut scenes = self.scenes.unwrap_or_default();
        if let Some(ref path) = self.scenes_path {
            scenes.merge(SceneTable::load_from_ron(Path::new(path))?);
        }

        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => PlayerConfig::load_from_ron(Path::new(&path))?,
            (None, None) => PlayerConfig::default(),
        };

        if !scenes.contains(&config.initial_scene) {
            return Err(EngineError::MissingInitialScene(config.initial_scene));
        }
        debug!(
            "story engine built with {} scenes, starting at '{}'",
            scenes.len(),
            config.initial_scene
        );

        Ok(StoryEngine {
            scenes: Rc::new(scenes),
            state: PlaybackState::new(config.initial_scene.clone()),
            config,
            scheduler: Scheduler::new(),
            sink,
            particles,
            background: None,
            next_ticket: 0,
        })
    }
}

impl<S: RenderSink, P: ParticleField> StoryEngine<S, P> {
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scenes(&self) -> &SceneTable {
        &self.scenes
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn particles(&self) -> &P {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut P {
        &mut self.particles
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// The ticket of the background load the engine is waiting on.
    pub fn pending_background(&self) -> Option<LoadTicket> {
        self.background.as_ref().map(|b| b.ticket)
    }

    pub(crate) fn emit(&mut self, command: RenderCommand) {
        self.sink.emit(command);
    }

    /// Begin the session: navigate to the initial scene.
    pub fn start(&mut self) {
        let initial = self.config.initial_scene.clone();
        debug!("session start at '{}'", initial);
        self.transition_to_scene(initial, true);
    }

    /// Move virtual time forward by `ms`, running every task that falls due.
    pub fn advance(&mut self, ms: u64) {
        let until = self.scheduler.now().saturating_add(ms);
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            self.run_task(handle, task);
        }
        self.scheduler.set_now(until);
    }

    pub(crate) fn run_task(&mut self, handle: TimerHandle, task: Task) {
        match task {
            Task::Transition {
                epoch,
                target,
                from_history,
            } => {
                self.state.timers.release(TimerKind::Transition, handle);
                if !self.state.is_current(epoch) {
                    trace!("stale transition to '{}' dropped", target);
                    return;
                }
                self.render_scene(target, from_history);
                self.emit(RenderCommand::Hide(Layer::Fade));
                self.state.is_transitioning = false;
            }
            Task::IntroAdvance { epoch, scene } => {
                self.state.timers.release(TimerKind::Intro, handle);
                if self.is_stale(epoch, &scene) {
                    trace!("stale intro advance for '{}' dropped", scene);
                    return;
                }
                self.begin_intro_fade(epoch, scene);
            }
            Task::IntroFadeOut { epoch, scene } => {
                self.state.timers.release(TimerKind::IntroFade, handle);
                if self.is_stale(epoch, &scene) {
                    trace!("stale intro fade for '{}' dropped", scene);
                    return;
                }
                self.finish_intro(&scene);
            }
            Task::HideIntroOverlay => {
                if !self.state.intro_showing {
                    self.emit(RenderCommand::Hide(Layer::IntroOverlay));
                }
            }
            Task::RevealChoices { epoch, scene } => {
                self.state.timers.release(TimerKind::Choice, handle);
                if self.is_stale(epoch, &scene) {
                    trace!("stale choice reveal for '{}' dropped", scene);
                    return;
                }
                self.reveal_choices();
            }
            Task::BackgroundFadeIn { epoch } => {
                if self.state.is_current(epoch) && !self.state.is_transitioning {
                    self.emit(RenderCommand::Hide(Layer::Fade));
                }
            }
            Task::MinigameFrame { game, session } => self.run_minigame_frame(game, session),
        }
    }

    fn is_stale(&self, epoch: NavEpoch, scene: &SceneId) -> bool {
        !self.state.is_current(epoch) || self.state.current_scene.as_ref() != Some(scene)
    }

    fn set_timer(&mut self, kind: TimerKind, delay: u64, task: Task) {
        let handle = self.scheduler.schedule(delay, task);
        if let Some(old) = self.state.timers.replace(kind, handle) {
            self.scheduler.cancel(old);
        }
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        if let Some(handle) = self.state.timers.take(kind) {
            self.scheduler.cancel(handle);
        }
    }

    /// Route an input event. Returns false when it meant nothing right now.
    pub fn dispatch(&mut self, event: &InputEvent) -> bool {
        match translate(&self.state, event) {
            Some(command) => self.execute(command),
            None => false,
        }
    }

    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Advance => {
                self.next_step();
                true
            }
            Command::SkipIntro => self.skip_intro(),
            Command::GoBack => self.go_back(),
            Command::HoverChoice(side) => self.hover_choice(side),
            Command::SelectChoice(side) => self.select_choice(side),
            Command::SleepRelief => self.sleep_relief(),
            Command::CalmDog(index) => self.calm_dog(index),
            Command::InspectHotspot(index) => self.inspect_hotspot(index),
            Command::DismissEvidence => self.dismiss_evidence(),
            Command::RestartMinigame(kind) => self.restart_minigame(kind),
            Command::SkipMinigame(kind) => self.skip_minigame(kind),
            Command::ReturnFromEnding => self.return_from_ending(),
        }
    }

    /// Fade out and, unless a newer navigation supersedes it, render `target`
    /// once the transition delay has passed. An unknown target changes nothing.
    pub fn transition_to_scene(&mut self, target: SceneId, from_history: bool) {
        if !self.scenes.contains(&target) {
            warn!("scene '{}' not found; staying put", target);
            return;
        }
        self.cancel_timer(TimerKind::Transition);
        let epoch = self.state.bump_epoch();
        debug!(
            "transition to '{}' (epoch {}, from history: {})",
            target,
            epoch.value(),
            from_history
        );
        self.state.is_transitioning = true;
        // choices of the scene being left must not replace this navigation
        self.teardown_choice_binding();

        if self.state.intro_showing {
            self.state.intro_showing = false;
            self.emit(RenderCommand::FadeOut(Layer::IntroOverlay));
            self.scheduler
                .schedule(self.config.timing.intro_overlay_hide_ms, Task::HideIntroOverlay);
        }
        self.cancel_timer(TimerKind::Intro);
        self.cancel_timer(TimerKind::IntroFade);

        self.emit(RenderCommand::Show(Layer::Fade));
        self.set_timer(
            TimerKind::Transition,
            self.config.timing.transition_ms,
            Task::Transition {
                epoch,
                target,
                from_history,
            },
        );
    }

    /// Tear down the previous scene and set up `id`.
    pub(crate) fn render_scene(&mut self, id: SceneId, from_history: bool) {
        self.teardown_choice_binding();
        self.cancel_timer(TimerKind::Choice);
        self.cancel_timer(TimerKind::Intro);
        self.cancel_timer(TimerKind::IntroFade);

        let scenes = Rc::clone(&self.scenes);
        let Some(scene) = scenes.get(&id) else {
            warn!("scene '{}' not found", id);
            return;
        };

        if self.state.is_item_showing {
            self.hide_item();
        }
        self.abort_minigames();

        if let SceneKind::Ending(ref ending) = scene.kind {
            self.render_ending(scene, ending);
            return;
        }

        if !from_history {
            if let Some(previous) = self.state.current_scene.clone() {
                self.state.history.push(previous);
            }
        }
        self.state.current_scene = Some(id.clone());
        self.state.text_index = 0;
        self.state.is_text_started = false;
        self.state.waiting_for_choice = false;
        self.state.choice_ready = false;

        self.emit(RenderCommand::SceneEntered(id.clone()));
        self.emit(RenderCommand::ClearText);
        self.emit(RenderCommand::Hide(Layer::TextBox));
        self.emit(RenderCommand::Hide(Layer::DialogueBox));
        if self.state.ending_showing {
            self.state.ending_showing = false;
            self.emit(RenderCommand::Hide(Layer::EndingOverlay));
        }
        self.apply_particles(scene.particles);

        let pending_game = match scene.kind {
            SceneKind::Minigame { ref game, .. } if !self.state.completed.is_set(game.kind()) => {
                Some(game)
            }
            _ => None,
        };
        // the dogs game starts right away, the others wait for the background
        let deferred = pending_game
            .filter(|game| game.kind() != MinigameKind::Dogs)
            .cloned();
        self.request_background(&id, &scene.background, deferred);

        match scene.kind {
            SceneKind::Intro(ref intro) => self.show_intro(&id, intro),
            SceneKind::Minigame { .. } if pending_game.is_some() => {
                if let Some(game) = pending_game.filter(|game| game.kind() == MinigameKind::Dogs) {
                    self.start_minigame(game);
                }
            }
            _ => self.emit(RenderCommand::Hide(Layer::IntroOverlay)),
        }
    }

    fn apply_particles(&mut self, config: Option<ParticleConfig>) {
        match config {
            Some(config) => self.particles.start(&config),
            None => self.particles.stop(),
        }
    }

    fn request_background(&mut self, scene: &SceneId, path: &str, then: Option<MinigameSpec>) {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.background = Some(PendingBackground {
            ticket,
            scene: scene.clone(),
            path: path.to_string(),
            then,
        });
        self.emit(RenderCommand::LoadBackground {
            path: path.to_string(),
            ticket,
        });
    }

    /// The host finished (or failed) loading a background. A failure is
    /// handled like a success so the player never stalls on a blank screen.
    pub fn background_loaded(&mut self, ticket: LoadTicket, result: Result<(), AssetError>) -> bool {
        if self.background.as_ref().map(|b| b.ticket) != Some(ticket) {
            trace!("stale background load {:?} ignored", ticket);
            return false;
        }
        let Some(pending) = self.background.take() else {
            return false;
        };
        if let Err(err) = result {
            warn!("{}; showing the scene anyway", err);
        }

        self.emit(RenderCommand::SetBackground(pending.path));
        self.emit(RenderCommand::Show(Layer::Fade));
        let epoch = self.state.epoch();
        self.scheduler.schedule(
            self.config.timing.background_fade_ms,
            Task::BackgroundFadeIn { epoch },
        );

        if let Some(game) = pending.then {
            let still_here = self.state.current_scene.as_ref() == Some(&pending.scene);
            if still_here
                && !self.state.is_transitioning
                && !self.state.completed.is_set(game.kind())
                && !self.state.any_minigame_active()
            {
                self.start_minigame(&game);
            }
        }
        true
    }

    fn show_intro(&mut self, id: &SceneId, intro: &IntroImage) {
        self.state.intro_showing = true;
        self.emit(RenderCommand::ShowIntroImage(intro.image.clone()));
        self.emit(RenderCommand::Show(Layer::IntroOverlay));
        let delay = intro
            .show_duration_ms
            .unwrap_or(self.config.timing.intro_show_ms);
        let epoch = self.state.epoch();
        self.set_timer(
            TimerKind::Intro,
            delay,
            Task::IntroAdvance {
                epoch,
                scene: id.clone(),
            },
        );
    }

    fn begin_intro_fade(&mut self, epoch: NavEpoch, scene: SceneId) {
        self.emit(RenderCommand::FadeOut(Layer::IntroOverlay));
        self.set_timer(
            TimerKind::IntroFade,
            self.config.timing.intro_fade_ms,
            Task::IntroFadeOut { epoch, scene },
        );
    }

    fn finish_intro(&mut self, scene: &SceneId) {
        let next = match self.scenes.get(scene).map(|s| &s.kind) {
            Some(SceneKind::Intro(intro)) => intro.next.clone(),
            _ => None,
        }
        .unwrap_or_else(|| self.config.intro_fallback.clone());

        self.state.intro_showing = false;
        self.emit(RenderCommand::Hide(Layer::IntroOverlay));
        self.transition_to_scene(next, false);
    }

    /// Cut an intro image short. Goes through the same gated fade as the
    /// timed advance.
    pub fn skip_intro(&mut self) -> bool {
        if !self.state.intro_showing || self.state.is_transitioning {
            return false;
        }
        if self.state.timers.get(TimerKind::IntroFade).is_some() {
            // already fading out
            return false;
        }
        let Some(scene) = self.state.current_scene.clone() else {
            return false;
        };
        self.cancel_timer(TimerKind::Intro);
        let epoch = self.state.epoch();
        self.begin_intro_fade(epoch, scene);
        true
    }

    /// The advance action: one step of text, choices, item or onward link.
    pub fn next_step(&mut self) {
        if self.state.is_transitioning || self.state.ending_showing {
            return;
        }
        if self.state.any_minigame_active() {
            trace!("advance ignored while a minigame is running");
            return;
        }

        let scenes = Rc::clone(&self.scenes);
        let Some(scene) = self.state.current_scene.as_ref().and_then(|id| scenes.get(id)) else {
            return;
        };
        if let SceneKind::Minigame { ref game, .. } = scene.kind {
            if !self.state.completed.is_set(game.kind()) {
                return;
            }
        }
        let Some(narrative) = scene.narrative() else {
            return;
        };
        if narrative.block(self.state.text_index).is_none() {
            return;
        }

        if self.state.is_item_showing {
            self.hide_item();
            if let Some(ref next) = narrative.next {
                self.transition_to_scene(next.clone(), false);
            }
            return;
        }

        if !self.state.is_text_started {
            self.state.is_text_started = true;
            self.render_text_block(narrative);
            return;
        }

        if self.state.text_index + 1 < narrative.text.len() {
            self.state.text_index += 1;
            self.render_text_block(narrative);
            return;
        }

        if self.state.waiting_for_choice && narrative.choices.is_some() {
            self.reveal_choices();
            return;
        }

        if narrative.choices.is_some() && !self.state.choice_ready {
            self.show_choices_with_delay(narrative.choice_delay_ms);
            return;
        }

        if let Some(ref item) = narrative.item {
            if !self.state.is_item_showing {
                self.show_item(item);
                return;
            }
        }

        if let Some(ref next) = narrative.next {
            self.transition_to_scene(next.clone(), false);
        }
    }

    fn render_text_block(&mut self, narrative: &Narrative) {
        let index = self.state.text_index;
        let Some(block) = narrative.block(index) else {
            return;
        };
        let (show, hide, style) = if narrative.is_dialogue(index) {
            (Layer::DialogueBox, Layer::TextBox, TextStyle::Dialogue)
        } else {
            (Layer::TextBox, Layer::DialogueBox, TextStyle::Narration)
        };
        self.emit(RenderCommand::Show(show));
        self.emit(RenderCommand::Hide(hide));
        self.emit(RenderCommand::ShowText {
            style,
            lines: block.clone(),
        });
    }

    fn show_choices_with_delay(&mut self, delay: u64) {
        let Some(scene) = self.state.current_scene.clone() else {
            return;
        };
        self.state.waiting_for_choice = true;
        self.state.choice_ready = false;
        let epoch = self.state.epoch();
        self.set_timer(TimerKind::Choice, delay, Task::RevealChoices { epoch, scene });
    }

    /// Show the current scene's choices and install the pointer binding.
    pub(crate) fn reveal_choices(&mut self) {
        self.cancel_timer(TimerKind::Choice);
        if self.state.choice_ready {
            return;
        }
        let Some(id) = self.state.current_scene.clone() else {
            return;
        };
        let Some(choices) = self
            .scenes
            .get(&id)
            .and_then(|scene| scene.narrative())
            .and_then(|narrative| narrative.choices.clone())
        else {
            return;
        };

        self.state.waiting_for_choice = false;
        self.state.choice_ready = true;
        self.emit(RenderCommand::ShowChoices {
            left: choices.label(Side::Left).to_string(),
            right: choices.label(Side::Right).to_string(),
        });
        self.state.choice_binding = Some(ChoiceBinding { scene: id, choices });
    }

    fn teardown_choice_binding(&mut self) {
        if self.state.choice_binding.take().is_some() {
            self.emit(RenderCommand::HighlightChoice(None));
            self.emit(RenderCommand::HideChoices);
        }
    }

    pub fn hover_choice(&mut self, side: Side) -> bool {
        if self.state.is_transitioning || self.state.choice_binding.is_none() {
            return false;
        }
        self.emit(RenderCommand::HighlightChoice(Some(side)));
        true
    }

    pub fn select_choice(&mut self, side: Side) -> bool {
        if self.state.is_transitioning {
            return false;
        }
        let Some(target) = self
            .state
            .choice_binding
            .as_ref()
            .and_then(|binding| binding.choices.get(side))
            .map(|choice| choice.next.clone())
        else {
            return false;
        };
        if !self.scenes.contains(&target) {
            warn!("choice {:?} leads to missing scene '{}'", side, target);
            return false;
        }
        debug!("choice {:?} selected -> '{}'", side, target);
        self.teardown_choice_binding();
        self.transition_to_scene(target, false);
        true
    }

    /// Return to the previous scene without recording a new history entry.
    pub fn go_back(&mut self) -> bool {
        if self.state.is_transitioning {
            return false;
        }
        let Some(previous) = self.state.history.pop() else {
            return false;
        };
        self.transition_to_scene(previous, true);
        true
    }

    fn show_item(&mut self, item: &Item) {
        self.state.is_item_showing = true;
        self.emit(RenderCommand::ShowItem(item.clone()));
        self.emit(RenderCommand::StartItemStars);
    }

    fn hide_item(&mut self) {
        self.state.is_item_showing = false;
        self.emit(RenderCommand::StopItemStars);
        self.emit(RenderCommand::HideItem);
    }

    fn render_ending(&mut self, scene: &Scene, ending: &Ending) {
        debug!("ending '{}' reached", scene.id);
        // a load still in flight would overwrite the ending background
        self.background = None;
        self.state.ending_showing = true;

        self.emit(RenderCommand::SetBackground(scene.background.clone()));
        self.emit(RenderCommand::ClearText);
        self.emit(RenderCommand::Hide(Layer::TextBox));
        self.emit(RenderCommand::Hide(Layer::DialogueBox));
        self.apply_particles(scene.particles);
        self.emit(RenderCommand::ShowEnding {
            frame: ending.frame.clone(),
            return_button: ending.return_button.clone(),
        });
        self.emit(RenderCommand::Show(Layer::EndingOverlay));
    }

    pub fn return_from_ending(&mut self) -> bool {
        if !self.state.ending_showing {
            return false;
        }
        self.restart();
        true
    }

    /// Throw away all progress and start over from the initial scene.
    pub fn restart(&mut self) {
        debug!("restart");
        self.state.current_scene = None;
        self.state.bump_epoch();
        self.scheduler.cancel_all();

        self.abort_minigames();
        self.teardown_choice_binding();
        if self.state.is_item_showing {
            self.hide_item();
        }
        if self.state.ending_showing {
            self.emit(RenderCommand::Hide(Layer::EndingOverlay));
        }
        if self.state.intro_showing {
            self.emit(RenderCommand::Hide(Layer::IntroOverlay));
        }
        self.particles.stop();
        self.background = None;

        let initial = self.config.initial_scene.clone();
        self.state.reset(initial.clone());
        self.transition_to_scene(initial, true);
    }
}

impl<P: ParticleField> StoryEngine<Vec<RenderCommand>, P> {
    /// Take every command recorded since the last drain.
    pub fn drain_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::Key;

    const SCENES: &str = r#"#![enable(implicit_some)]
    {
        "scene_1": Scene(
            background: "bg/one.jpg",
            text: [["First."], ["Second."]],
            dialogue: [1],
            next: "scene_2",
        ),
        "scene_2": Scene(
            background: "bg/two.jpg",
            text: [["Two."]],
            choices: (
                left: (label: "Left", next: "scene_1"),
                right: (label: "Right", next: "scene_3"),
            ),
        ),
        "scene_3": Scene(
            background: "bg/three.jpg",
            text: [["Three."]],
            next: "missing",
        ),
    }"#;

    fn engine() -> StoryEngine {
        let mut engine = StoryEngine::builder()
            .with_scenes(SceneTable::parse_ron(SCENES).unwrap())
            .build()
            .unwrap();
        engine.start();
        engine.advance(1000);
        engine
    }

    #[test]
    fn missing_initial_scene_fails_build() {
        let mut config = PlayerConfig::default();
        config.initial_scene = SceneId::from("nowhere");
        let result = StoryEngine::builder()
            .with_scenes(SceneTable::parse_ron(SCENES).unwrap())
            .with_config(config)
            .build();
        assert!(matches!(result, Err(EngineError::MissingInitialScene(_))));
    }

    #[test]
    fn start_renders_initial_scene_without_history() {
        let engine = engine();
        assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_1")));
        assert!(engine.state().history.is_empty());
        assert!(!engine.state().is_transitioning);
    }

    #[test]
    fn stale_transition_task_is_ignored() {
        let mut engine = engine();
        let stale = engine.state().epoch();
        engine.state.bump_epoch();
        let task = Task::Transition {
            epoch: stale,
            target: SceneId::from("scene_2"),
            from_history: false,
        };
        let handle = engine.scheduler.schedule(0, task.clone());
        engine.scheduler.cancel(handle);
        engine.drain_commands();
        engine.run_task(handle, task);
        assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_1")));
        assert!(engine.drain_commands().is_empty());
    }

    #[test]
    fn text_blocks_route_to_their_box() {
        let mut engine = engine();
        engine.drain_commands();
        engine.next_step();
        let first = engine.drain_commands();
        assert!(first.contains(&RenderCommand::ShowText {
            style: TextStyle::Narration,
            lines: vec!["First.".to_string()],
        }));
        engine.next_step();
        let second = engine.drain_commands();
        assert!(second.contains(&RenderCommand::Show(Layer::DialogueBox)));
        assert_eq!(engine.state().text_index, 1);
    }

    #[test]
    fn choices_bind_and_select() {
        let mut engine = engine();
        engine.next_step();
        engine.next_step();
        engine.next_step();
        engine.advance(1000);
        assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_2")));

        engine.next_step();
        engine.next_step();
        assert!(engine.state().waiting_for_choice);
        engine.advance(0);
        assert!(engine.state().choice_ready);
        assert!(engine.state().choice_binding.is_some());

        assert!(engine.dispatch(&InputEvent::Click { x: 900.0, width: 1000.0 }));
        assert!(engine.state().choice_binding.is_none());
        engine.advance(1000);
        assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_3")));
    }

    #[test]
    fn missing_target_is_a_silent_noop() {
        let mut engine = engine();
        engine.transition_to_scene(SceneId::from("scene_3"), false);
        engine.advance(1000);
        engine.next_step();
        engine.next_step();
        engine.advance(1000);
        assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_3")));
        assert!(!engine.state().is_transitioning);
        assert_eq!(engine.pending_timers(), 0);
        // still responsive afterwards
        assert!(engine.dispatch(&InputEvent::KeyDown(Key::Back)));
    }

    #[test]
    fn choice_to_missing_scene_keeps_choices_usable() {
        let input = r#"#![enable(implicit_some)]
        {
            "scene_1": Scene(
                background: "bg/one.jpg",
                text: [["Pick one."]],
                choices: (
                    left: (label: "Nowhere", next: "nowhere"),
                    right: (label: "Again", next: "scene_1"),
                ),
            ),
        }"#;
        let mut engine = StoryEngine::builder()
            .with_scenes(SceneTable::parse_ron(input).unwrap())
            .build()
            .unwrap();
        engine.start();
        engine.advance(1000);
        engine.next_step();
        engine.next_step();
        engine.advance(0);
        assert!(engine.state().choice_binding.is_some());

        assert!(!engine.dispatch(&InputEvent::Click { x: 10.0, width: 1000.0 }));
        assert!(!engine.state().is_transitioning);
        assert!(engine.state().choice_ready);
        assert!(engine.state().choice_binding.is_some());

        assert!(engine.dispatch(&InputEvent::Click { x: 900.0, width: 1000.0 }));
        assert!(engine.state().is_transitioning);
    }

    #[test]
    fn stale_background_load_is_ignored() {
        let mut engine = engine();
        let first = engine.pending_background().unwrap();
        engine.transition_to_scene(SceneId::from("scene_2"), false);
        engine.advance(1000);
        let second = engine.pending_background().unwrap();
        assert_ne!(first, second);
        assert!(!engine.background_loaded(first, Ok(())));
        let failure = AssetError {
            path: "bg/two.jpg".to_string(),
            reason: "404".to_string(),
        };
        assert!(engine.background_loaded(second, Err(failure)));
        assert!(engine
            .drain_commands()
            .contains(&RenderCommand::SetBackground("bg/two.jpg".to_string())));
    }
}
