/// Render commands — the side effects the engine emits for the host to draw.
///
/// The engine owns no rendering logic: it describes what changed and the host
/// (the WASM bindings, a test, the preview shell) decides how to show it.
use serde::{Deserialize, Serialize};

use crate::schema::scene::{Hotspot, Item, MinigameKind, SceneId, Side};

/// Identifies one background load request so stale completions can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket(pub u64);

/// Toggleable screen layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    TextBox,
    DialogueBox,
    /// Full-screen black layer used for scene transitions.
    Fade,
    IntroOverlay,
    EndingOverlay,
}

/// Which box a text block goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextStyle {
    Narration,
    Dialogue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Start loading a background; the host answers with `background_loaded`.
    LoadBackground { path: String, ticket: LoadTicket },
    SetBackground(String),
    Show(Layer),
    Hide(Layer),
    /// Start fading a layer's opacity to zero without unmounting it.
    FadeOut(Layer),
    ClearText,
    ShowText { style: TextStyle, lines: Vec<String> },
    ShowIntroImage(String),
    ShowChoices { left: String, right: String },
    HighlightChoice(Option<Side>),
    HideChoices,
    ShowItem(Item),
    HideItem,
    /// Start the star burst behind a shown item; it runs until stopped.
    StartItemStars,
    StopItemStars,
    ShowEnding {
        frame: Option<String>,
        return_button: Option<String>,
    },
    OpenMinigame(MinigameKind),
    CloseMinigame(MinigameKind),
    /// Restart the instruction pulse animation after a player action.
    PulseInstruction(MinigameKind),
    ShowMinigameFailure { game: MinigameKind, attempts: u32 },
    /// Darkness opacity and, past the threshold, eyelid closure in [0,1].
    SleepVisuals { darkness: f64, eyelids: Option<f64> },
    /// Per-dog rage as a fraction of the maximum.
    DogsVisuals(Vec<f64>),
    ShowHotspots(Vec<Hotspot>),
    RemoveHotspot(usize),
    ShowEvidenceDescription(String),
    HideEvidenceDescription,
    /// Informational: the engine entered a scene.
    SceneEntered(SceneId),
}

/// Destination for render commands.
pub trait RenderSink {
    fn emit(&mut self, command: RenderCommand);
}

impl RenderSink for Vec<RenderCommand> {
    fn emit(&mut self, command: RenderCommand) {
        self.push(command);
    }
}

/// A sink that discards everything, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn emit(&mut self, _command: RenderCommand) {}
}
