/// Preview — interactive headless shell for stepping through a story.
///
/// Usage: preview --scenes <path> [--config <path>] [--seed <n>] [--fail-assets]
///
/// Commands:
///   next | space        — press the advance key
///   back                — press the back key
///   left | right        — click a screen half (choices)
///   hover <left|right>  — move the pointer over a half
///   dog <i>             — click a dog zone
///   spot <i>            — click an evidence hotspot
///   restart <game>      — minigame restart button
///   skip <game>         — minigame skip button
///   return              — ending return button
///   wait <ms>           — advance virtual time
///   goto <scene>        — transition directly to a scene
///   state               — print playback state
///   reset               — restart the whole story
///   help                — list commands
///   quit                — exit
use story_engine::core::engine::{AssetError, StoryEngine};
use story_engine::core::input::{InputEvent, Key};
use story_engine::core::render::RenderCommand;
use story_engine::schema::scene::{MinigameKind, SceneId};
use std::io::{self, BufRead, Write};

const VIEWPORT_WIDTH: f64 = 1280.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut scenes_path = None;
    let mut config_path = None;
    let mut seed: u64 = 42;
    let mut fail_assets = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenes" if i + 1 < args.len() => {
                i += 1;
                scenes_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--fail-assets" => fail_assets = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(scenes_path) = scenes_path else {
        eprintln!("ERROR: --scenes is required");
        std::process::exit(1);
    };

    let mut builder = StoryEngine::builder()
        .scenes_path(&scenes_path)
        .particle_seed(seed);
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} scenes", engine.scenes().len());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    engine.start();
    let transition_ms = engine.config().timing.transition_ms;
    settle(&mut engine, fail_assets, transition_ms);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview [{}ms]> ", engine.now());
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        let handled = match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "state" => {
                print_state(&engine);
                continue;
            }
            "next" | "space" | "n" => engine.dispatch(&InputEvent::KeyDown(Key::Advance)),
            "back" | "b" => engine.dispatch(&InputEvent::KeyDown(Key::Back)),
            "left" => engine.dispatch(&InputEvent::Click {
                x: VIEWPORT_WIDTH * 0.25,
                width: VIEWPORT_WIDTH,
            }),
            "right" => engine.dispatch(&InputEvent::Click {
                x: VIEWPORT_WIDTH * 0.75,
                width: VIEWPORT_WIDTH,
            }),
            "hover" => {
                let x = match parts.get(1) {
                    Some(&"left") => VIEWPORT_WIDTH * 0.25,
                    Some(&"right") => VIEWPORT_WIDTH * 0.75,
                    _ => {
                        println!("Usage: hover <left|right>");
                        continue;
                    }
                };
                engine.dispatch(&InputEvent::PointerMove {
                    x,
                    width: VIEWPORT_WIDTH,
                })
            }
            "dog" | "spot" => {
                let Some(index) = parts.get(1).and_then(|s| s.parse::<usize>().ok()) else {
                    println!("Usage: {} <index>", cmd);
                    continue;
                };
                if cmd == "dog" {
                    engine.dispatch(&InputEvent::DogClick(index))
                } else {
                    engine.dispatch(&InputEvent::HotspotClick(index))
                }
            }
            "restart" | "skip" => {
                let Some(game) = parts.get(1).and_then(|s| MinigameKind::from_name(s)) else {
                    println!("Usage: {} <sleep|dogs|evidence>", cmd);
                    continue;
                };
                if cmd == "restart" {
                    engine.dispatch(&InputEvent::RestartMinigame(game))
                } else {
                    engine.dispatch(&InputEvent::SkipMinigame(game))
                }
            }
            "return" => engine.dispatch(&InputEvent::EndingReturn),
            "wait" | "w" => {
                let ms = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(1000);
                settle(&mut engine, fail_assets, ms);
                continue;
            }
            "goto" => {
                let Some(id) = parts.get(1) else {
                    println!("Usage: goto <scene>");
                    continue;
                };
                engine.transition_to_scene(SceneId::from(*id), false);
                true
            }
            "reset" => {
                engine.restart();
                true
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for commands.", cmd);
                continue;
            }
        };

        if !handled {
            println!("(nothing happens)");
        }
        print_commands(&engine.drain_commands());
    }
}

/// Advance time, answering background loads as they are requested.
fn settle(engine: &mut StoryEngine, fail_assets: bool, ms: u64) {
    let end = engine.now() + ms;
    while engine.now() < end {
        let step = (end - engine.now()).min(engine.config().timing.frame_ms.max(1));
        engine.advance(step);
        if let Some(ticket) = engine.pending_background() {
            let result = if fail_assets {
                Err(AssetError {
                    path: "(preview)".to_string(),
                    reason: "asset loading disabled".to_string(),
                })
            } else {
                Ok(())
            };
            engine.background_loaded(ticket, result);
        }
        print_commands(&engine.drain_commands());
    }
}

fn print_commands(commands: &[RenderCommand]) {
    for command in commands {
        match command {
            RenderCommand::ShowText { style, lines } => {
                println!("  [{:?}]", style);
                for line in lines {
                    println!("    {}", line);
                }
            }
            RenderCommand::ShowChoices { left, right } => {
                println!("  <- {}   |   {} ->", left, right);
            }
            RenderCommand::SceneEntered(id) => println!("\n=== {} ===", id),
            RenderCommand::ShowEvidenceDescription(text) => println!("  (evidence) {}", text),
            RenderCommand::ShowMinigameFailure { game, attempts } => {
                println!(
                    "  {} lost (attempt {}). Try 'restart {}' or 'skip {}'.",
                    game.name(),
                    attempts,
                    game.name(),
                    game.name()
                );
            }
            // per-frame visuals would flood the shell
            RenderCommand::SleepVisuals { .. } | RenderCommand::DogsVisuals(_) => {}
            other => println!("  {:?}", other),
        }
    }
}

fn print_state(engine: &StoryEngine) {
    let state = engine.state();
    println!("--- Playback State ---");
    println!("  scene:        {:?}", state.current_scene);
    println!("  text index:   {}", state.text_index);
    println!("  history:      {:?}", state.history);
    println!("  epoch:        {}", state.epoch().value());
    println!(
        "  flags:        started={} waiting={} ready={} transitioning={} item={} intro={} ending={}",
        state.is_text_started,
        state.waiting_for_choice,
        state.choice_ready,
        state.is_transitioning,
        state.is_item_showing,
        state.intro_showing,
        state.ending_showing
    );
    println!(
        "  sleep:        active={} darkness={:.3} attempts={}",
        state.sleep.active, state.sleep.darkness, state.sleep.attempts
    );
    println!(
        "  dogs:         active={} rage={:?} attempts={}",
        state.dogs.active,
        state.dogs.rage_levels(),
        state.dogs.attempts
    );
    println!(
        "  evidence:     active={} found={}/{}",
        state.evidence.active,
        state.evidence.hotspots_found,
        state.evidence.hotspots.len()
    );
    println!("  completed:    {:?}", state.completed);
    println!("  timers:       {} pending", engine.pending_timers());
    println!("----------------------");
}

fn print_usage() {
    println!("Preview — interactive headless shell for stepping through a story.");
    println!();
    println!("Usage: preview --scenes <path> [--config <path>] [--seed <n>] [--fail-assets]");
    println!();
    println!("  --scenes <path>   Path to the scene table (RON)");
    println!("  --config <path>   Path to the player config (optional)");
    println!("  --seed <n>        Particle RNG seed (default: 42)");
    println!("  --fail-assets     Report every background load as failed");
}

fn print_help() {
    println!("Commands:");
    println!("  next | space        Press the advance key");
    println!("  back                Press the back key");
    println!("  left | right        Click a screen half");
    println!("  hover <left|right>  Move the pointer over a half");
    println!("  dog <i>             Click a dog zone");
    println!("  spot <i>            Click an evidence hotspot");
    println!("  restart <game>      Minigame restart button");
    println!("  skip <game>         Minigame skip button");
    println!("  return              Ending return button");
    println!("  wait <ms>           Advance virtual time (default 1000)");
    println!("  goto <scene>        Transition to a scene");
    println!("  state               Print playback state");
    println!("  reset               Restart the story");
    println!("  help                Show this help");
    println!("  quit                Exit");
    println!();
    println!("Games: sleep, dogs, evidence");
}
