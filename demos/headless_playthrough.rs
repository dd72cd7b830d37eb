/// Headless playthrough — plays the bundled story from title to ending
/// without a browser, printing the text as it appears.
///
/// At the guest-room fork it takes the right-hand choice; minigames are
/// played by a simple bot (steady relief presses, calming every dog,
/// clicking hotspots in order).
///
/// Run with: cargo run --example headless_playthrough
use story_engine::core::engine::StoryEngine;
use story_engine::core::input::{InputEvent, Key};
use story_engine::core::render::RenderCommand;

const FRAME_MS: u64 = 80;
const WIDTH: f64 = 1280.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut engine = StoryEngine::builder()
        .scenes_path("story_data/scenes.ron")
        .config_path("story_data/player.ron")
        .particle_seed(2026)
        .build()
        .expect("Failed to build story engine");

    engine.start();

    let mut steps = 0u32;
    while !engine.state().ending_showing {
        steps += 1;
        if steps > 20_000 {
            eprintln!("Playthrough stalled at {:?}", engine.state().current_scene);
            std::process::exit(1);
        }

        if let Some(ticket) = engine.pending_background() {
            engine.background_loaded(ticket, Ok(()));
        }

        let state = engine.state();
        let event = if state.sleep.active {
            Some(InputEvent::KeyDown(Key::Advance))
        } else if state.dogs.active {
            let dog = steps as usize % state.dogs.rage.len().max(1);
            Some(InputEvent::DogClick(dog))
        } else if state.evidence.active && !state.evidence.is_describing() {
            (0..state.evidence.hotspots.len())
                .find(|&i| !state.evidence.is_found(i))
                .map(InputEvent::HotspotClick)
        } else if state.choice_binding.is_some() {
            Some(InputEvent::Click {
                x: WIDTH * 0.75,
                width: WIDTH,
            })
        } else if !state.is_transitioning {
            Some(InputEvent::KeyDown(Key::Advance))
        } else {
            None
        };

        if let Some(event) = event {
            engine.dispatch(&event);
        }
        engine.advance(FRAME_MS);

        for command in engine.drain_commands() {
            match command {
                RenderCommand::SceneEntered(id) => println!("\n--- {} ---", id),
                RenderCommand::ShowText { lines, .. } => {
                    for line in lines {
                        println!("{}", line);
                    }
                }
                RenderCommand::ShowChoices { left, right } => {
                    println!("[{}] / [{}]", left, right);
                }
                RenderCommand::ShowEvidenceDescription(text) => println!("* {}", text),
                RenderCommand::ShowItem(item) => println!("(item: {})", item.image),
                RenderCommand::CloseMinigame(game) => println!("({} complete)", game.name()),
                _ => {}
            }
        }
    }

    let state = engine.state();
    println!("\n=== Playthrough Report ===");
    println!("  Virtual time:  {} ms", engine.now());
    println!("  Steps:         {}", steps);
    println!("  Scenes seen:   {}", state.history.len() + 1);
    println!("  Sleep:         {}", state.completed.sleep);
    println!("  Dogs:          {}", state.completed.dogs);
    println!("  Evidence:      {}", state.completed.evidence);
}
