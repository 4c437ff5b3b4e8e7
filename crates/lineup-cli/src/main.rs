// Lineup entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout carries only the report)
// 3. Copy missing config files from defaults/, then load config
// 4. Dispatch: recommend, audit or init

use lineup_cli::app::{self, RunOptions};
use lineup_cli::config;
use lineup_cli::report;
use lineup_cli::sources;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lineup_core::valuation::PitchCondition;
use lineup_core::{SelectionMode, Strategy};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "lineup")]
#[command(about = "Fantasy cricket player valuation and squad selection")]
struct Cli {
    /// Directory holding defaults/, config/ and the data files.
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Value both sides and recommend a squad per strategy
    Recommend(RecommendArgs),
    /// Check a hand-picked squad (CSV of side,name) against the constraints
    Audit(AuditArgs),
    /// Copy missing config files from defaults/ and exit
    Init,
}

#[derive(Args)]
struct MatchArgs {
    /// Host side
    #[arg(long)]
    home: String,

    /// Visiting side
    #[arg(long)]
    away: String,

    #[arg(long)]
    venue: Option<String>,

    /// batting, bowling, balanced or spin
    #[arg(long)]
    pitch: Option<String>,
}

#[derive(Args)]
struct RecommendArgs {
    #[command(flatten)]
    fixture: MatchArgs,

    /// Report one strategy only (aggressive, balanced, risk_averse)
    #[arg(long)]
    strategy: Option<String>,

    /// Override the configured selection mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Enable jitter with this seed
    #[arg(long)]
    seed: Option<u64>,

    /// Disable jitter even if the config enables it
    #[arg(long)]
    no_jitter: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AuditArgs {
    #[command(flatten)]
    fixture: MatchArgs,

    /// CSV file with side,name columns
    #[arg(long)]
    picks: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Constrained,
    Greedy,
}

impl From<ModeArg> for SelectionMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Constrained => SelectionMode::Constrained,
            ModeArg::Greedy => SelectionMode::Greedy,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> anyhow::Result<()> {
    // 1. Parse arguments
    let cli = Cli::parse();

    // 2. Initialize tracing
    init_tracing()?;
    info!("lineup starting up");

    // 3. Load config
    let copied = config::ensure_config_files(&cli.base_dir)
        .context("failed to initialize config files")?;
    for path in &copied {
        info!("Copied default config to {}", path.display());
    }

    // 4. Dispatch
    match cli.command {
        Command::Init => Ok(()),
        Command::Recommend(args) => {
            let config = config::load_config_in(&cli.base_dir)
                .context("failed to load configuration")?;
            info!(
                "Config loaded: budget {}, squad of {}, max {} per side ({})",
                config.constraints.budget,
                config.constraints.squad_size,
                config.constraints.max_per_side,
                config::describe_roles(&config.constraints)
            );
            recommend(&config, &cli.base_dir, args)
        }
        Command::Audit(args) => {
            let config = config::load_config_in(&cli.base_dir)
                .context("failed to load configuration")?;
            audit(&config, &cli.base_dir, args)
        }
    }
}

fn run_options(fixture: MatchArgs) -> anyhow::Result<RunOptions> {
    let pitch = match fixture.pitch.as_deref() {
        Some(p) => Some(
            PitchCondition::from_str_pitch(p).ok_or_else(|| anyhow!("unknown pitch '{p}'"))?,
        ),
        None => None,
    };
    Ok(RunOptions {
        home: fixture.home,
        away: fixture.away,
        venue: fixture.venue,
        pitch,
        ..Default::default()
    })
}

fn recommend(config: &config::Config, base_dir: &Path, args: RecommendArgs) -> anyhow::Result<()> {
    let strategy = match args.strategy.as_deref() {
        Some(s) => {
            Some(Strategy::from_str_strategy(s).ok_or_else(|| anyhow!("unknown strategy '{s}'"))?)
        }
        None => None,
    };
    let opts = RunOptions {
        strategy,
        mode: args.mode.map(SelectionMode::from),
        seed: args.seed,
        no_jitter: args.no_jitter,
        ..run_options(args.fixture)?
    };

    let report = app::run(config, base_dir, &opts, chrono::Utc::now())?;
    let rendered = match args.format {
        Format::Json => report::render_json(&report).context("failed to serialize report")?,
        Format::Text => report::render_text(&report),
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn audit(config: &config::Config, base_dir: &Path, args: AuditArgs) -> anyhow::Result<()> {
    let picks = sources::load_picks(&args.picks).context("failed to load picks")?;
    let opts = run_options(args.fixture)?;
    let outcome = app::audit(config, base_dir, &opts, &picks)?;
    let summary = outcome.squad.summary();
    println!(
        "{} players, cost {:.1} of {:.1}, expected points {:.1}",
        summary.players,
        summary.budget_used,
        config.constraints.budget,
        summary.score
    );
    if outcome.is_legal() {
        println!("squad is legal");
        return Ok(());
    }
    for v in &outcome.violations {
        println!("{v}");
    }
    Err(anyhow!("squad breaks {} rule(s)", outcome.violations.len()))
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup=info,lineup_cli=info,lineup_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
