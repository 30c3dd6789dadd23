use sars::game::EntityKind;
use sars::input::{Finger, InputEvent, InputState, Key};
use sars::present::{LogPresenter, Sfx};
use sars::*;

/// Keys for a lazy square patrol around the middle of the screen.
fn patrol(t: u64) -> InputState {
    match (t / 1500) % 4 {
        0 => InputState { right: true, ..Default::default() },
        1 => InputState { up: true, ..Default::default() },
        2 => InputState { left: true, ..Default::default() },
        _ => InputState { down: true, ..Default::default() },
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Optional TOML config path as the first argument
    let cfg = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GameConfig { seed: Some(0x5a25), ..GameConfig::default() },
    };

    let mut game = match Game::new(cfg, LogPresenter::new()) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Failed to start game: {}", e);
            std::process::exit(1);
        }
    };

    let frame_ms = 16u64;
    let minutes = 2u64;
    let mut rounds = 1;
    let mut t = 0u64;
    while t < minutes * 60_000 {
        // Second half of every 12 s steers by touch toward the bottom-left
        let phase_in_cycle = t % 12_000;
        let finger = Finger { touch_id: 0, finger_id: 0, x: 0.1, y: 0.9 };
        if phase_in_cycle == 6_000 {
            game.dispatch(&InputEvent::FingerDown(finger));
        } else if phase_in_cycle == 9_008 {
            game.dispatch(&InputEvent::FingerUp(finger));
        }

        game.update(t, &patrol(t));

        if game.phase().is_waiting() {
            println!(
                "round {}: {:?} at {:.1}s, rescues={} score={} hoard={}",
                rounds,
                game.phase(),
                t as f32 / 1000.0,
                game.rescues(),
                game.score(),
                game.hoard()
            );
            rounds += 1;
            if game.dispatch(&InputEvent::KeyDown(Key::Other)) == Dispatch::Quit {
                break;
            }
        }
        t += frame_ms;
    }

    let viruses = game
        .entities()
        .filter(|(_, e)| e.active && matches!(e.kind, EntityKind::Virus { .. }))
        .count();
    let stats = game.index().debug_stats();
    let sounds = &game.presenter().sounds;
    println!(
        "after {} round(s): phase={:?} babies={} active_viruses={} index={:?}",
        rounds,
        game.phase(),
        game.babies(),
        viruses,
        stats
    );
    println!(
        "sfx: infected={} rescued={} mask_hits={} textures={}",
        sounds.iter().filter(|&&s| s == Sfx::BabyInfected).count(),
        sounds.iter().filter(|&&s| s == Sfx::BabyRescued).count(),
        sounds.iter().filter(|&&s| s == Sfx::AdultMaskHit).count(),
        game.presenter().textures_loaded()
    );
}
