//! Decoherence entry point
//!
//! Natively this runs today's daily seed headless under the autopilot and
//! prints the result. Browser hosts embed the library and drive a
//! `Session` themselves.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use decoherence::consts::TARGET_FPS;
    use decoherence::hud::format_clock;
    use decoherence::persistence::FileStorage;
    use decoherence::session::Collaborators;
    use decoherence::sim::Autopilot;
    use decoherence::sim::rng::fnv1a;
    use decoherence::{MetaState, Result, Session, Tuning, platform};

    /// Run length cap when none is given
    const DEFAULT_SECONDS: f32 = 180.0;

    /// `decoherence [tuning.json] [seconds]`
    pub fn run() -> Result<()> {
        platform::init_logging(env::var_os("DECOHERENCE_VERBOSE").is_some());

        let mut args = env::args().skip(1);
        let tuning = match args.next() {
            Some(path) => {
                log::info!("Loading tuning from {}", path);
                Tuning::from_json(&fs::read_to_string(&path)?)?
            }
            None => Tuning::default(),
        };
        let seconds = args
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_SECONDS);
        let data_dir = env::var_os("DECOHERENCE_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let date = platform::utc_date_key();
        let seed = fnv1a(&date);
        log::info!("Decoherence (headless) starting: daily run {}", date);

        let storage = FileStorage::new(&data_dir);
        let mut session = Session::new(
            Collaborators::headless(Box::new(storage)),
            tuning,
            seed,
        );
        session.finish_loading();
        session.start()?;

        let mut pilot = Autopilot::new();
        let frame_ms = 1000.0 / TARGET_FPS as f64;
        let max_frames = (seconds * TARGET_FPS) as u64;
        let mut frames = 0;
        while frames < max_frames && !session.meta().is_in(MetaState::GameOver) {
            let input = pilot.plan(session.sim());
            session.frame(frame_ms, &input);
            frames += 1;
        }

        match session.last_summary() {
            Some(summary) => {
                println!("Run over on {}", date);
                println!("  Score      {}", summary.score.floor() as u64);
                println!("  Survived   {}", format_clock(summary.stats.time_alive));
                println!("  Tier       {}", summary.tier);
                println!("  Near-misses {}", summary.stats.near_misses);
                if let Some(rank) = session.last_rank() {
                    println!("  New high score: #{}", rank);
                }
            }
            None => {
                let state = session.sim().state();
                println!(
                    "Still alive after {} with {} points (not recorded)",
                    format_clock(state.time_since_start),
                    state.score.floor() as u64
                );
            }
        }

        let board = session.high_scores();
        if !board.is_empty() {
            println!("\nHigh Scores");
            for (i, run) in board.top(5).iter().enumerate() {
                println!(
                    "  #{:<2} {:>8}  T{} • {} near-misses",
                    i + 1,
                    run.score,
                    run.tier,
                    run.stats.near_misses
                );
            }
        }

        session.shutdown();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = headless::run() {
        log::error!("{}", e);
        eprintln!("decoherence: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts drive a Session through the library
}
