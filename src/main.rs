use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use stackblocks::GraphConfig;
use stackblocks::script::{ScriptRunner, load_script};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a block-graph edit script and print the graph as JSON", long_about = None)]
struct Cli {
    /// JSON edit script (an array of steps)
    #[arg(value_name = "SCRIPT")]
    script: Utf8PathBuf,

    /// JSON graph config (scale, snap_radius, history_depth)
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Log every structural change
    #[arg(short, long)]
    verbose: bool,

    /// Include the render notifications in the output
    #[arg(long)]
    events: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => GraphConfig::load(path)?,
        None => GraphConfig::default(),
    };
    let steps = load_script(&cli.script)?;
    log::info!("replaying {} step(s) from {}", steps.len(), cli.script);

    let mut runner = ScriptRunner::new(config);
    runner
        .run(&steps)
        .with_context(|| format!("Failed to replay {}", cli.script))?;

    let json = serde_json::to_string_pretty(&runner.snapshot(cli.events))?;
    println!("{}", json);
    Ok(())
}
