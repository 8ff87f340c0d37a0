//! Pal Merge entry point
//!
//! Natively this runs a headless autoplay session: a bot drops pieces at
//! random positions until the field overflows or the time limit runs out.
//! Usage: `pal-merge [seed] [seconds]`. The high score is kept in
//! `pal_merge_highscore.json` in the working directory.
//!
//! On the web the page drives `platform::web::WebGame` directly.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pal_merge::highscores::FileStore;
    use pal_merge::input::InputPort;
    use pal_merge::platform::{init_logging, now_ms};
    use pal_merge::sim::TierTable;
    use pal_merge::{Game, Tuning};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    init_logging();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| now_ms() as u64);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(300.0);

    let tuning = match std::env::var("PAL_MERGE_TUNING") {
        Ok(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        Err(_) => Tuning::default(),
    };
    let width = tuning.field_width;

    log::info!("Pal Merge (native autoplay) starting, seed {}", seed);
    let store = FileStore::new("pal_merge_highscore.json");
    let mut game = Game::new(tuning, TierTable::default(), seed, Box::new(store));
    let mut bot = Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);

    let step = 1000.0 / 60.0;
    let mut now = 0.0;
    let mut drops = 0u32;
    while now < seconds * 1000.0 && !game.is_game_over() {
        if let Err(e) = game.frame(now) {
            log::error!("Frame failed: {}", e);
            std::process::exit(1);
        }
        if game.sim.has_active_piece() && !game.sim.release_pending() {
            let x = bot.random_range(0.0..width);
            let dropped = game
                .pointer_down(x)
                .and_then(|_| game.pointer_up(x))
                .unwrap_or(false);
            if dropped {
                drops += 1;
            }
        }
        now += step;
    }

    let state = &game.sim.state;
    log::info!(
        "Finished after {:.1}s: {} drops, {} pieces, {} tiers discovered",
        now / 1000.0,
        drops,
        state.pieces.len(),
        state.discovered.len()
    );
    match game.game_over_summary() {
        Some(summary) if summary.new_record => {
            log::info!("Game over with a new record: {}", summary.score)
        }
        Some(summary) => log::info!(
            "Game over: score {}, high score {}",
            summary.score,
            summary.high_score
        ),
        None => log::info!(
            "Time limit reached: score {}, high score {}",
            game.score(),
            game.high_score()
        ),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::WebGame, this is just to satisfy the compiler
}
