// beatline: headless chart player.
//
// Loads a chart, plays it with autoplay or a recorded replay and prints the
// final score as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use beatline_bin::{DEFAULT_STEP_MS, load_chart, simulate};
use beatline_play::{PlayConfig, read_replay, write_replay};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "beatline", about = "Headless rhythm chart simulator")]
struct Args {
    /// Chart JSON file.
    chart: PathBuf,

    /// Play config JSON file.
    #[arg(long, env = "BEATLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Replay JSON used as input (implies autoplay).
    #[arg(long, conflicts_with = "autoplay")]
    replay: Option<PathBuf>,

    /// Generate input that scores every note COOL.
    #[arg(long)]
    autoplay: bool,

    /// Write the input stream that was played to this file.
    #[arg(long)]
    write_replay: Option<PathBuf>,

    /// Milliseconds of wall time per simulated frame.
    #[arg(long, default_value_t = DEFAULT_STEP_MS)]
    step_ms: f64,

    /// Override the configured song rate.
    #[arg(long)]
    rate: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let config = PlayConfig::read(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            info!("Loaded config {}", path.display());
            config
        }
        None => PlayConfig::default(),
    };
    if args.autoplay {
        config.mods.autoplay = true;
    }
    if let Some(rate) = args.rate {
        config.song_rate = rate;
        config.validate();
    }

    let chart = load_chart(&args.chart)?;
    info!(
        "Chart {}: {} notes, {} keys",
        args.chart.display(),
        chart.notes.len(),
        chart.key_count
    );

    let replay = args
        .replay
        .as_deref()
        .map(read_replay)
        .transpose()?;

    let report = simulate(chart, config, replay, args.step_ms)?;

    if let Some(path) = &args.write_replay {
        write_replay(path, &report.replay)?;
        info!("Wrote {} replay events to {}", report.replay.len(), path.display());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
