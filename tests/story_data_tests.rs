/// Story data tests — the bundled scene table and player config load, lint
/// clean, and can be played from title to ending.
use story_engine::core::engine::StoryEngine;
use story_engine::core::input::{InputEvent, Key};
use story_engine::schema::config::PlayerConfig;
use story_engine::schema::scene::{SceneId, SceneKind, SceneTable};

#[test]
fn bundled_scenes_load() {
    let path = std::path::Path::new("story_data/scenes.ron");
    let table = SceneTable::load_from_ron(path).unwrap();
    assert!(table.contains(&SceneId::from("scene_1")));
    assert!(table.get(&SceneId::from("scene_1")).unwrap().is_intro());
    assert!(table.get(&SceneId::from("ending")).unwrap().is_ending());

    let minigames = table
        .ids()
        .into_iter()
        .filter(|id| matches!(table.get(id).unwrap().kind, SceneKind::Minigame { .. }))
        .count();
    assert_eq!(minigames, 3);
}

#[test]
fn bundled_scenes_lint_clean() {
    let table = SceneTable::load_from_ron(std::path::Path::new("story_data/scenes.ron")).unwrap();
    let config = PlayerConfig::load_from_ron(std::path::Path::new("story_data/player.ron")).unwrap();
    let issues = table.lint(&config.initial_scene, &config.intro_fallback);
    assert!(issues.is_empty(), "lint issues: {:?}", issues);
}

#[test]
fn fixture_lints_clean() {
    let table = SceneTable::load_from_ron(std::path::Path::new("tests/fixtures/story.ron")).unwrap();
    let issues = table.lint(&SceneId::from("scene_1"), &SceneId::from("scene_2"));
    assert!(issues.is_empty(), "lint issues: {:?}", issues);
}

#[test]
fn bundled_config_matches_defaults() {
    let config = PlayerConfig::load_from_ron(std::path::Path::new("story_data/player.ron")).unwrap();
    assert_eq!(config, PlayerConfig::default());
}

#[test]
fn bundled_story_plays_to_the_end() {
    let mut engine = StoryEngine::builder()
        .scenes_path("story_data/scenes.ron")
        .config_path("story_data/player.ron")
        .build()
        .unwrap();
    engine.start();

    let mut steps = 0;
    while !engine.state().ending_showing {
        steps += 1;
        assert!(steps < 10_000, "playthrough stuck at {:?}", engine.state().current_scene);

        if let Some(ticket) = engine.pending_background() {
            engine.background_loaded(ticket, Ok(()));
        }

        let state = engine.state();
        let (sleeping, dogs, evidence) = (state.sleep.active, state.dogs.active, state.evidence.active);
        let describing = state.evidence.is_describing();
        let hotspots = state.evidence.hotspots.len();
        let choosing = state.choice_binding.is_some();

        if sleeping {
            engine.dispatch(&InputEvent::KeyDown(Key::Advance));
        } else if dogs {
            for index in 0..3 {
                engine.dispatch(&InputEvent::DogClick(index));
            }
        } else if evidence && !describing {
            for index in 0..hotspots {
                if engine.dispatch(&InputEvent::HotspotClick(index)) {
                    break;
                }
            }
        } else if choosing {
            // right half: stay the night
            engine.dispatch(&InputEvent::Click { x: 900.0, width: 1000.0 });
        } else {
            engine.dispatch(&InputEvent::KeyDown(Key::Advance));
        }
        engine.advance(80);
    }

    let state = engine.state();
    assert!(state.completed.sleep);
    assert!(state.completed.dogs);
    assert!(state.completed.evidence);
    assert!(state.history.contains(&SceneId::from("guest_room")));

    assert!(engine.dispatch(&InputEvent::EndingReturn));
    engine.advance(1000);
    assert_eq!(engine.state().current_scene, Some(SceneId::from("scene_1")));
    assert!(engine.state().history.is_empty());
}
