/// Scene Linter — validates scene references, reachability and content sanity.
///
/// Usage: scene_linter <scenes_file_or_dir> [--config <player.ron>]
use story_engine::schema::config::PlayerConfig;
use story_engine::schema::scene::{SceneIssue, SceneKind, SceneTable, Side};
use std::path::Path;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: scene_linter <scenes_file_or_dir> [--config <player.ron>]");
        process::exit(0);
    }

    let scenes_arg = &args[1];
    let mut config_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            i += 1;
            config_path = Some(args[i].clone());
        }
        i += 1;
    }

    let mut table = SceneTable::default();
    let scenes_path = Path::new(scenes_arg);

    if scenes_path.is_file() {
        match SceneTable::load_from_ron(scenes_path) {
            Ok(loaded) => table.merge(loaded),
            Err(e) => {
                eprintln!("ERROR: Failed to load scene file: {}", e);
                process::exit(1);
            }
        }
    } else if scenes_path.is_dir() {
        load_scenes_recursive(scenes_path, &mut table);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", scenes_arg);
        process::exit(1);
    }

    let config = match config_path {
        Some(ref path) => match PlayerConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => PlayerConfig::default(),
    };

    println!("Loaded {} scenes", table.len());

    let (errors, warnings) = lint_scenes(&table, &config);

    println!("\n=== Scene Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_scenes_recursive(dir: &Path, table: &mut SceneTable) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_scenes_recursive(&path, table);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match SceneTable::load_from_ron(&path) {
                    Ok(loaded) => {
                        println!("  Loaded: {}", path.display());
                        table.merge(loaded);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn lint_scenes(table: &SceneTable, config: &PlayerConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !table.contains(&config.initial_scene) {
        errors.push(format!(
            "initial scene '{}' is not defined",
            config.initial_scene
        ));
    }

    for issue in table.lint(&config.initial_scene, &config.intro_fallback) {
        match issue {
            SceneIssue::DanglingReference { .. } => errors.push(issue.to_string()),
            SceneIssue::Unreachable(_) | SceneIssue::DeadEnd(_) => warnings.push(issue.to_string()),
        }
    }

    for id in table.ids() {
        let Some(scene) = table.get(id) else {
            continue;
        };

        if scene.background.is_empty() {
            warnings.push(format!("scene '{}' has no background", id));
        }

        match scene.kind {
            SceneKind::Minigame { ref game, ref narrative } => {
                // after a win the player advances through this text; without
                // it the scene can never be left
                if narrative.text.is_empty() {
                    errors.push(format!(
                        "scene '{}' gates on the {} minigame but has no text to continue with",
                        id,
                        game.kind().name()
                    ));
                }
            }
            SceneKind::Intro(ref intro) => {
                if intro.show_duration_ms == Some(0) {
                    warnings.push(format!("intro '{}' has a zero show duration", id));
                }
            }
            SceneKind::Narrative(_) | SceneKind::Ending(_) => {}
        }

        if let Some(narrative) = scene.narrative() {
            if let Some(ref choices) = narrative.choices {
                if choices.left.is_none() && choices.right.is_none() {
                    errors.push(format!("scene '{}' declares an empty choice pair", id));
                }
                for side in [Side::Left, Side::Right] {
                    if choices.get(side).is_some() && choices.label(side).trim().is_empty() {
                        warnings.push(format!("scene '{}' has an unlabeled {:?} choice", id, side));
                    }
                }
                if narrative.next.is_some() {
                    warnings.push(format!(
                        "scene '{}' has both choices and next; advancing past the choices skips them",
                        id
                    ));
                }
            }
            for (index, block) in narrative.text.iter().enumerate() {
                if block.is_empty() {
                    warnings.push(format!("scene '{}' text block {} is empty", id, index));
                }
            }
        }
    }

    (errors, warnings)
}
