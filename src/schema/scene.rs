/// Scene table — typed scene records, RON loading, and reference linting.
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("scene '{scene}' marks text block {index} as dialogue but has only {len} blocks")]
    DialogueOutOfRange {
        scene: SceneId,
        index: usize,
        len: usize,
    },
    #[error("scene '{0}' declares an evidence game with an empty hotspot list")]
    EmptyHotspots(SceneId),
}

/// Newtype wrapper for scene identifiers (e.g. `"scene_1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One text block: the lines shown together on a single advance.
pub type TextBlock = Vec<String>;

/// Which side of the screen a choice lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// A single branch offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub next: SceneId,
}

/// The left/right choice pair of a scene. Either side may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoicePair {
    #[serde(default)]
    pub left: Option<Choice>,
    #[serde(default)]
    pub right: Option<Choice>,
}

impl ChoicePair {
    pub fn get(&self, side: Side) -> Option<&Choice> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn label(&self, side: Side) -> &str {
        self.get(side).map(|c| c.label.as_str()).unwrap_or("")
    }
}

/// An item shown as a terminal interstitial after a scene's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub image: String,
    #[serde(default)]
    pub aura: Option<String>,
}

/// Visual flavour of the ambient particle field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Dreamy,
}

/// Particle field configuration declared by a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    #[serde(default)]
    pub kind: ParticleKind,
    #[serde(default = "default_particle_count")]
    pub count: usize,
}

fn default_particle_count() -> usize {
    50
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            kind: ParticleKind::default(),
            count: default_particle_count(),
        }
    }
}

/// A clickable evidence location, positioned in CSS units over the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub x: String,
    pub y: String,
    pub description: String,
}

/// The three minigame tags a scene may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinigameKind {
    Sleep,
    Dogs,
    Evidence,
}

impl MinigameKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Dogs => "dogs",
            Self::Evidence => "evidence",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sleep" => Some(Self::Sleep),
            "dogs" => Some(Self::Dogs),
            "evidence" => Some(Self::Evidence),
            _ => None,
        }
    }
}

/// A minigame gating a scene, with its scene-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MinigameSpec {
    Sleep,
    Dogs,
    /// `None` falls back to the configured default hotspot set.
    Evidence { hotspots: Option<Vec<Hotspot>> },
}

impl MinigameSpec {
    pub fn kind(&self) -> MinigameKind {
        match self {
            Self::Sleep => MinigameKind::Sleep,
            Self::Dogs => MinigameKind::Dogs,
            Self::Evidence { .. } => MinigameKind::Evidence,
        }
    }
}

/// Text, choices and onward links of a scene that is read block by block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Narrative {
    pub text: Vec<TextBlock>,
    /// Indices of text blocks rendered in the dialogue box.
    pub dialogue: FxHashSet<usize>,
    pub choices: Option<ChoicePair>,
    pub item: Option<Item>,
    pub choice_delay_ms: u64,
    pub next: Option<SceneId>,
}

impl Narrative {
    pub fn block(&self, index: usize) -> Option<&TextBlock> {
        self.text.get(index)
    }

    pub fn is_dialogue(&self, index: usize) -> bool {
        self.dialogue.contains(&index)
    }
}

/// A full-bleed image that auto-advances after a fixed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroImage {
    pub image: String,
    /// `None` uses the configured default duration.
    pub show_duration_ms: Option<u64>,
    /// `None` uses the configured fallback scene.
    pub next: Option<SceneId>,
}

/// Terminal scene markers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ending {
    pub frame: Option<String>,
    pub return_button: Option<String>,
}

/// What a scene does once rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneKind {
    Narrative(Narrative),
    Intro(IntroImage),
    Minigame {
        game: MinigameSpec,
        narrative: Narrative,
    },
    Ending(Ending),
}

/// An immutable scene record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub background: String,
    pub particles: Option<ParticleConfig>,
    pub kind: SceneKind,
}

impl Scene {
    /// The block-by-block text of the scene, if it has one.
    pub fn narrative(&self) -> Option<&Narrative> {
        match &self.kind {
            SceneKind::Narrative(narrative) => Some(narrative),
            SceneKind::Minigame { narrative, .. } => Some(narrative),
            SceneKind::Intro(_) | SceneKind::Ending(_) => None,
        }
    }

    pub fn is_ending(&self) -> bool {
        matches!(self.kind, SceneKind::Ending(_))
    }

    pub fn is_intro(&self) -> bool {
        matches!(self.kind, SceneKind::Intro(_))
    }

    /// Every scene id this scene can lead to.
    pub fn outgoing(&self) -> Vec<&SceneId> {
        let mut out = Vec::new();
        match &self.kind {
            SceneKind::Narrative(narrative) | SceneKind::Minigame { narrative, .. } => {
                if let Some(ref choices) = narrative.choices {
                    out.extend(choices.left.iter().map(|c| &c.next));
                    out.extend(choices.right.iter().map(|c| &c.next));
                }
                out.extend(narrative.next.iter());
            }
            SceneKind::Intro(intro) => out.extend(intro.next.iter()),
            SceneKind::Ending(_) => {}
        }
        out
    }
}

// RON deserialization helpers — scene files are flat records with optional
// fields; they are folded into `SceneKind` at load time.

#[derive(Debug, Default, Deserialize)]
enum RonSceneType {
    #[default]
    Story,
    Ending,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Scene")]
struct RonScene {
    #[serde(default, rename = "type")]
    scene_type: RonSceneType,
    background: String,
    #[serde(default)]
    text: Vec<TextBlock>,
    #[serde(default)]
    dialogue: Vec<usize>,
    #[serde(default)]
    choices: Option<ChoicePair>,
    #[serde(default)]
    choice_delay: Option<u64>,
    #[serde(default)]
    item: Option<Item>,
    #[serde(default)]
    minigame: Option<MinigameKind>,
    #[serde(default)]
    hotspots: Option<Vec<Hotspot>>,
    #[serde(default)]
    intro_image: Option<String>,
    #[serde(default)]
    show_duration: Option<u64>,
    #[serde(default)]
    particles: Option<ParticleConfig>,
    #[serde(default)]
    ending_frame: Option<String>,
    #[serde(default)]
    return_button: Option<String>,
    #[serde(default)]
    next: Option<SceneId>,
}

impl RonScene {
    fn into_scene(self, id: SceneId) -> Result<Scene, SceneError> {
        let kind = match self.scene_type {
            RonSceneType::Ending => SceneKind::Ending(Ending {
                frame: self.ending_frame,
                return_button: self.return_button,
            }),
            RonSceneType::Story => {
                if let Some(image) = self.intro_image {
                    if let Some(tag) = self.minigame {
                        log::warn!(
                            "scene '{}' declares both an intro image and the {} minigame; the intro image wins",
                            id,
                            tag.name()
                        );
                    }
                    SceneKind::Intro(IntroImage {
                        image,
                        show_duration_ms: self.show_duration,
                        next: self.next,
                    })
                } else {
                    for &index in &self.dialogue {
                        if index >= self.text.len() {
                            return Err(SceneError::DialogueOutOfRange {
                                scene: id,
                                index,
                                len: self.text.len(),
                            });
                        }
                    }
                    let narrative = Narrative {
                        text: self.text,
                        dialogue: self.dialogue.into_iter().collect(),
                        choices: self.choices,
                        item: self.item,
                        choice_delay_ms: self.choice_delay.unwrap_or(0),
                        next: self.next,
                    };
                    match self.minigame {
                        None => SceneKind::Narrative(narrative),
                        Some(tag) => {
                            let game = match tag {
                                MinigameKind::Sleep => MinigameSpec::Sleep,
                                MinigameKind::Dogs => MinigameSpec::Dogs,
                                MinigameKind::Evidence => {
                                    if matches!(self.hotspots, Some(ref spots) if spots.is_empty()) {
                                        return Err(SceneError::EmptyHotspots(id));
                                    }
                                    MinigameSpec::Evidence {
                                        hotspots: self.hotspots,
                                    }
                                }
                            };
                            SceneKind::Minigame { game, narrative }
                        }
                    }
                }
            }
        };

        Ok(Scene {
            id,
            background: self.background,
            particles: self.particles,
            kind,
        })
    }
}

/// A problem found by [`SceneTable::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneIssue {
    /// A `next` or choice target that is not in the table.
    DanglingReference { from: SceneId, to: SceneId },
    /// A scene no path from the initial scene reaches.
    Unreachable(SceneId),
    /// A narrative scene with no text, choices, item or `next`.
    DeadEnd(SceneId),
}

impl fmt::Display for SceneIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference { from, to } => {
                write!(f, "scene '{}' references missing scene '{}'", from, to)
            }
            Self::Unreachable(id) => write!(f, "scene '{}' is unreachable", id),
            Self::DeadEnd(id) => write!(f, "scene '{}' has no way forward", id),
        }
    }
}

/// The immutable scene-id → scene mapping.
#[derive(Debug, Clone, Default)]
pub struct SceneTable {
    scenes: FxHashMap<SceneId, Scene>,
}

impl SceneTable {
    /// Load a scene table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<SceneTable, SceneError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a scene table from a RON string.
    pub fn parse_ron(input: &str) -> Result<SceneTable, SceneError> {
        let raw: FxHashMap<String, RonScene> = ron::from_str(input)?;
        let mut scenes = FxHashMap::default();

        for (name, ron_scene) in raw {
            let id = SceneId(name);
            let scene = ron_scene.into_scene(id.clone())?;
            scenes.insert(id, scene);
        }

        Ok(SceneTable { scenes })
    }

    /// Merge another table into this one. Scenes from `other` override
    /// scenes in `self` with the same id.
    pub fn merge(&mut self, other: SceneTable) {
        for (id, scene) in other.scenes {
            self.scenes.insert(id, scene);
        }
    }

    pub fn insert(&mut self, scene: Scene) {
        self.scenes.insert(scene.id.clone(), scene);
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene ids in sorted order.
    pub fn ids(&self) -> Vec<&SceneId> {
        let mut ids: Vec<&SceneId> = self.scenes.keys().collect();
        ids.sort();
        ids
    }

    /// Check references and reachability starting from `initial`.
    ///
    /// `fallback` is where intro images without `next` go; restart always
    /// leads back to `initial`, so endings need no outgoing link.
    pub fn lint(&self, initial: &SceneId, fallback: &SceneId) -> Vec<SceneIssue> {
        let mut issues = Vec::new();

        for id in self.ids() {
            let scene = &self.scenes[id];
            for target in scene.outgoing() {
                if !self.contains(target) {
                    issues.push(SceneIssue::DanglingReference {
                        from: id.clone(),
                        to: target.clone(),
                    });
                }
            }
            if let SceneKind::Intro(ref intro) = scene.kind {
                if intro.next.is_none() && !self.contains(fallback) {
                    issues.push(SceneIssue::DanglingReference {
                        from: id.clone(),
                        to: fallback.clone(),
                    });
                }
            }
            if let SceneKind::Narrative(ref narrative) = scene.kind {
                if narrative.text.is_empty() {
                    // nextStep never gets past an empty scene
                    issues.push(SceneIssue::DeadEnd(id.clone()));
                } else if narrative.choices.is_none()
                    && narrative.item.is_none()
                    && narrative.next.is_none()
                {
                    issues.push(SceneIssue::DeadEnd(id.clone()));
                }
            }
        }

        let mut seen: FxHashSet<&SceneId> = FxHashSet::default();
        let mut stack = vec![initial];
        while let Some(id) = stack.pop() {
            let Some(scene) = self.scenes.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            stack.extend(scene.outgoing());
            if let SceneKind::Intro(ref intro) = scene.kind {
                if intro.next.is_none() {
                    stack.push(fallback);
                }
            }
        }
        for id in self.ids() {
            if !seen.contains(id) {
                issues.push(SceneIssue::Unreachable(id.clone()));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"#![enable(implicit_some)]
    {
        "scene_1": Scene(
            background: "bg/porch.jpg",
            intro_image: "intro/title.png",
            show_duration: 3000,
            next: "scene_2",
        ),
        "scene_2": Scene(
            background: "bg/kitchen.jpg",
            text: [["The kettle hisses."], ["\"You're late,\" she says.", "She does not look up."]],
            dialogue: [1],
            choices: (
                left: (label: "Apologise", next: "scene_3"),
                right: (label: "Say nothing", next: "ending"),
            ),
            choice_delay: 400,
            particles: (count: 20),
        ),
        "scene_3": Scene(
            background: "bg/yard.jpg",
            minigame: Evidence,
            text: [["The yard is quiet now."]],
            next: "ending",
        ),
        "ending": Scene(
            type: Ending,
            background: "bg/dawn.jpg",
            ending_frame: "ui/frame.png",
            return_button: "ui/return.png",
        ),
    }"#;

    #[test]
    fn parse_sample_table() {
        let table = SceneTable::parse_ron(SAMPLE).unwrap();
        assert_eq!(table.len(), 4);

        let intro = table.get(&SceneId::from("scene_1")).unwrap();
        match &intro.kind {
            SceneKind::Intro(image) => {
                assert_eq!(image.image, "intro/title.png");
                assert_eq!(image.show_duration_ms, Some(3000));
                assert_eq!(image.next, Some(SceneId::from("scene_2")));
            }
            other => panic!("expected intro, got {:?}", other),
        }

        let kitchen = table.get(&SceneId::from("scene_2")).unwrap();
        let narrative = kitchen.narrative().unwrap();
        assert_eq!(narrative.text.len(), 2);
        assert!(narrative.is_dialogue(1));
        assert!(!narrative.is_dialogue(0));
        assert_eq!(narrative.choice_delay_ms, 400);
        let choices = narrative.choices.as_ref().unwrap();
        assert_eq!(choices.label(Side::Left), "Apologise");
        assert_eq!(choices.get(Side::Right).unwrap().next, SceneId::from("ending"));
        assert_eq!(kitchen.particles.unwrap().count, 20);
    }

    #[test]
    fn minigame_and_ending_kinds() {
        let table = SceneTable::parse_ron(SAMPLE).unwrap();

        let yard = table.get(&SceneId::from("scene_3")).unwrap();
        assert!(matches!(
            yard.kind,
            SceneKind::Minigame {
                game: MinigameSpec::Evidence { hotspots: None },
                ..
            }
        ));
        assert!(yard.narrative().is_some());

        let ending = table.get(&SceneId::from("ending")).unwrap();
        assert!(ending.is_ending());
        assert!(ending.narrative().is_none());
    }

    #[test]
    fn intro_image_wins_over_minigame() {
        let input = r#"#![enable(implicit_some)]
        {
            "a": Scene(background: "x.jpg", intro_image: "i.png", minigame: Sleep),
        }"#;
        let table = SceneTable::parse_ron(input).unwrap();
        assert!(table.get(&SceneId::from("a")).unwrap().is_intro());
    }

    #[test]
    fn dialogue_index_out_of_range_rejected() {
        let input = r#"{
            "a": Scene(background: "x.jpg", text: [["one"]], dialogue: [3]),
        }"#;
        let err = SceneTable::parse_ron(input).unwrap_err();
        assert!(matches!(err, SceneError::DialogueOutOfRange { index: 3, len: 1, .. }));
    }

    #[test]
    fn empty_hotspot_list_rejected() {
        let input = r#"#![enable(implicit_some)]
        {
            "a": Scene(background: "x.jpg", minigame: Evidence, hotspots: []),
        }"#;
        assert!(matches!(
            SceneTable::parse_ron(input),
            Err(SceneError::EmptyHotspots(_))
        ));
    }

    #[test]
    fn invalid_ron_is_an_error() {
        assert!(matches!(
            SceneTable::parse_ron("{ \"a\": Scene("),
            Err(SceneError::Ron(_))
        ));
    }

    #[test]
    fn merge_overrides() {
        let mut base = SceneTable::parse_ron(SAMPLE).unwrap();
        let patch = SceneTable::parse_ron(
            r#"#![enable(implicit_some)]
            { "scene_3": Scene(background: "bg/other.jpg", text: [["Changed."]], next: "ending") }"#,
        )
        .unwrap();
        base.merge(patch);
        assert_eq!(base.len(), 4);
        let scene = base.get(&SceneId::from("scene_3")).unwrap();
        assert_eq!(scene.background, "bg/other.jpg");
        assert!(matches!(scene.kind, SceneKind::Narrative(_)));
    }

    #[test]
    fn lint_clean_table() {
        let table = SceneTable::parse_ron(SAMPLE).unwrap();
        let issues = table.lint(&SceneId::from("scene_1"), &SceneId::from("scene_2"));
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn lint_reports_dangling_and_unreachable() {
        let input = r#"#![enable(implicit_some)]
        {
            "start": Scene(background: "a.jpg", text: [["Hi."]], next: "nowhere"),
            "orphan": Scene(background: "b.jpg", text: [["Alone."]], next: "start"),
        }"#;
        let table = SceneTable::parse_ron(input).unwrap();
        let issues = table.lint(&SceneId::from("start"), &SceneId::from("start"));
        assert!(issues.contains(&SceneIssue::DanglingReference {
            from: SceneId::from("start"),
            to: SceneId::from("nowhere"),
        }));
        assert!(issues.contains(&SceneIssue::Unreachable(SceneId::from("orphan"))));
    }
}
