/// Input dispatcher: raw keyboard and pointer events to engine commands.
///
/// Routing depends on what is on screen, so `translate` reads the playback
/// state but never mutates it.
use serde::{Deserialize, Serialize};

use crate::core::state::PlaybackState;
use crate::schema::scene::{MinigameKind, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Space or Enter.
    Advance,
    /// Backspace.
    Back,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` / `code` name.
    pub fn from_name(name: &str) -> Key {
        match name {
            " " | "Space" | "Spacebar" | "Enter" => Key::Advance,
            "Backspace" => Key::Back,
            _ => Key::Other,
        }
    }
}

impl Side {
    /// The screen half under a pointer at `x` in a viewport `width` wide.
    pub fn from_pointer(x: f64, width: f64) -> Side {
        if x < width / 2.0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    PointerMove { x: f64, width: f64 },
    Click { x: f64, width: f64 },
    DogClick(usize),
    HotspotClick(usize),
    RestartMinigame(MinigameKind),
    SkipMinigame(MinigameKind),
    EndingReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Advance,
    SkipIntro,
    GoBack,
    HoverChoice(Side),
    SelectChoice(Side),
    SleepRelief,
    CalmDog(usize),
    InspectHotspot(usize),
    DismissEvidence,
    RestartMinigame(MinigameKind),
    SkipMinigame(MinigameKind),
    ReturnFromEnding,
}

/// Decide what an input event means in the current state, if anything.
pub fn translate(state: &PlaybackState, event: &InputEvent) -> Option<Command> {
    match *event {
        InputEvent::KeyDown(key) => translate_key(state, key),
        InputEvent::PointerMove { .. } | InputEvent::Click { .. } if state.is_transitioning => None,
        InputEvent::PointerMove { x, width } => state
            .choice_binding
            .as_ref()
            .map(|_| Command::HoverChoice(Side::from_pointer(x, width))),
        InputEvent::Click { x, width } => {
            let binding = state.choice_binding.as_ref()?;
            let side = Side::from_pointer(x, width);
            binding.choices.get(side).map(|_| Command::SelectChoice(side))
        }
        InputEvent::DogClick(index) => state.dogs.active.then_some(Command::CalmDog(index)),
        InputEvent::HotspotClick(index) => (state.evidence.active && !state.evidence.is_describing())
            .then_some(Command::InspectHotspot(index)),
        InputEvent::RestartMinigame(kind) => Some(Command::RestartMinigame(kind)),
        InputEvent::SkipMinigame(kind) => Some(Command::SkipMinigame(kind)),
        InputEvent::EndingReturn => state.ending_showing.then_some(Command::ReturnFromEnding),
    }
}

fn translate_key(state: &PlaybackState, key: Key) -> Option<Command> {
    if state.sleep.active {
        return (key == Key::Advance).then_some(Command::SleepRelief);
    }
    if state.evidence.is_describing() {
        return (key == Key::Advance).then_some(Command::DismissEvidence);
    }
    if state.ending_showing {
        return None;
    }
    match key {
        Key::Advance if state.intro_showing => Some(Command::SkipIntro),
        Key::Advance => Some(Command::Advance),
        Key::Back => Some(Command::GoBack),
        Key::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ChoiceBinding;
    use crate::schema::config::SleepTuning;
    use crate::schema::scene::{Choice, ChoicePair, Hotspot, SceneId};

    fn state() -> PlaybackState {
        PlaybackState::new(SceneId::from("scene_1"))
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::from_name(" "), Key::Advance);
        assert_eq!(Key::from_name("Enter"), Key::Advance);
        assert_eq!(Key::from_name("Backspace"), Key::Back);
        assert_eq!(Key::from_name("a"), Key::Other);
    }

    #[test]
    fn plain_keys() {
        let s = state();
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Advance)), Some(Command::Advance));
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Back)), Some(Command::GoBack));
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Other)), None);
    }

    #[test]
    fn advance_skips_intro() {
        let mut s = state();
        s.intro_showing = true;
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Advance)), Some(Command::SkipIntro));
    }

    #[test]
    fn sleep_game_captures_keys() {
        let mut s = state();
        s.sleep.start(&SleepTuning::default());
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Advance)), Some(Command::SleepRelief));
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Back)), None);
    }

    #[test]
    fn evidence_description_captures_keys() {
        let mut s = state();
        s.evidence.start(vec![Hotspot {
            x: "10%".to_string(),
            y: "10%".to_string(),
            description: "A clue.".to_string(),
        }]);
        assert_eq!(translate(&s, &InputEvent::HotspotClick(0)), Some(Command::InspectHotspot(0)));
        s.evidence.inspect(0);
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Advance)), Some(Command::DismissEvidence));
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Back)), None);
        assert_eq!(translate(&s, &InputEvent::HotspotClick(0)), None);
    }

    #[test]
    fn ending_ignores_keys() {
        let mut s = state();
        s.ending_showing = true;
        assert_eq!(translate(&s, &InputEvent::KeyDown(Key::Advance)), None);
        assert_eq!(translate(&s, &InputEvent::EndingReturn), Some(Command::ReturnFromEnding));
    }

    #[test]
    fn pointer_needs_binding() {
        let mut s = state();
        let click = InputEvent::Click { x: 100.0, width: 1000.0 };
        assert_eq!(translate(&s, &click), None);

        s.choice_binding = Some(ChoiceBinding {
            scene: SceneId::from("scene_1"),
            choices: ChoicePair {
                left: Some(Choice {
                    label: "Stay".to_string(),
                    next: SceneId::from("a"),
                }),
                right: None,
            },
        });
        assert_eq!(translate(&s, &click), Some(Command::SelectChoice(Side::Left)));
        // no right-hand choice to select
        assert_eq!(translate(&s, &InputEvent::Click { x: 900.0, width: 1000.0 }), None);
        assert_eq!(
            translate(&s, &InputEvent::PointerMove { x: 900.0, width: 1000.0 }),
            Some(Command::HoverChoice(Side::Right))
        );
    }

    #[test]
    fn pointer_ignored_while_transitioning() {
        let mut s = state();
        s.choice_binding = Some(ChoiceBinding {
            scene: SceneId::from("scene_1"),
            choices: ChoicePair {
                left: Some(Choice {
                    label: "Stay".to_string(),
                    next: SceneId::from("a"),
                }),
                right: None,
            },
        });
        s.is_transitioning = true;
        assert_eq!(translate(&s, &InputEvent::Click { x: 100.0, width: 1000.0 }), None);
        assert_eq!(translate(&s, &InputEvent::PointerMove { x: 100.0, width: 1000.0 }), None);
    }

    #[test]
    fn midpoint_belongs_to_right() {
        assert_eq!(Side::from_pointer(499.9, 1000.0), Side::Left);
        assert_eq!(Side::from_pointer(500.0, 1000.0), Side::Right);
    }
}
