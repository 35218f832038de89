//! cbtest CLI — edit, compile and submit convertible-bond backtest strategies.
//!
//! Commands:
//! - `defaults` — print the default state document as TOML
//! - `show` — human-readable summary of a state (rates as percent)
//! - `compile` — apply edits and print the engine payload as JSON
//! - `submit` — compile and send to the backtest engine
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only output.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use cbtest_core::input::{coerce_percent, fraction_to_percent};
use cbtest_core::{compile, Category, DateField, Scalar, StrategyState};
use cbtest_runner::{
    compile_and_submit, ApiConfig, EngineResult, HttpEngine, Session, StateDocument,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TOKEN_VAR: &str = "CBTEST_TOKEN";

#[derive(Parser)]
#[command(
    name = "cbtest",
    about = "cbtest — convertible-bond backtest strategy compiler"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default state document as TOML.
    Defaults,
    /// Show a state in human-readable form.
    Show {
        #[command(flatten)]
        source: StateSource,

        #[command(flatten)]
        edits: Edits,
    },
    /// Apply edits, compile, and print the payload JSON.
    Compile {
        #[command(flatten)]
        source: StateSource,

        #[command(flatten)]
        edits: Edits,

        /// Single-line JSON instead of pretty-printed.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Compile and submit to the backtest engine.
    Submit {
        #[command(flatten)]
        source: StateSource,

        #[command(flatten)]
        edits: Edits,

        /// Bearer token. Falls back to $CBTEST_TOKEN.
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args)]
struct StateSource {
    /// State document (.toml, or .json). Defaults to the built-in snapshot.
    #[arg(long)]
    state: Option<PathBuf>,
}

impl StateSource {
    fn load(&self) -> Result<StrategyState> {
        match &self.state {
            Some(path) => StrategyState::from_file(path)
                .with_context(|| format!("loading {}", path.display())),
            None => Ok(StrategyState::default()),
        }
    }
}

/// Edits applied on top of the loaded state, in the order listed here.
#[derive(Args)]
struct Edits {
    /// Start date (YYYY-MM-DD, or "" to clear).
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD, or "" to clear).
    #[arg(long)]
    end: Option<String>,

    /// Enable an exclusion group: price, duration or volume.
    #[arg(long, value_name = "CAT")]
    enable: Vec<Category>,

    /// Disable an exclusion group: price, duration or volume.
    #[arg(long, value_name = "CAT")]
    disable: Vec<Category>,

    /// Number of bonds to hold.
    #[arg(long)]
    hold_num: Option<u32>,

    /// Stop-profit threshold in percent (3 means 0.03).
    #[arg(long, value_name = "P")]
    stop_profit_pct: Option<String>,

    /// Fee rate in percent (0.2 means 0.002).
    #[arg(long, value_name = "P")]
    fee_rate_pct: Option<String>,

    /// Set a factor weight by position, e.g. `--weight 1=12.5`.
    #[arg(long, value_name = "I=V", value_parser = parse_weight)]
    weight: Vec<(usize, String)>,
}

impl Edits {
    fn apply(&self, state: &mut StrategyState) -> Result<()> {
        if let Some(start) = &self.start {
            state.set_date_field(DateField::Start, start)?;
        }
        if let Some(end) = &self.end {
            state.set_date_field(DateField::End, end)?;
        }
        for &category in &self.enable {
            state.toggle_group(category, true);
        }
        for &category in &self.disable {
            state.toggle_group(category, false);
        }
        if let Some(n) = self.hold_num {
            state.set_scalar(Scalar::HoldNum(n));
        }
        if let Some(text) = &self.stop_profit_pct {
            state.set_scalar(Scalar::StopProfit(coerce_percent(text)));
        }
        if let Some(text) = &self.fee_rate_pct {
            state.set_scalar(Scalar::FeeRate(coerce_percent(text)));
        }
        for (index, text) in &self.weight {
            state.set_weight_text(*index, text)?;
        }
        Ok(())
    }
}

fn parse_weight(s: &str) -> Result<(usize, String), String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got '{s}'"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("weight index must be a non-negative integer, got '{index}'"))?;
    Ok((index, value.to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Defaults => run_defaults(),
        Commands::Show { source, edits } => run_show(&source, &edits),
        Commands::Compile {
            source,
            edits,
            compact,
        } => run_compile(&source, &edits, compact),
        Commands::Submit {
            source,
            edits,
            token,
        } => run_submit(&source, &edits, token),
    }
}

fn edited_state(source: &StateSource, edits: &Edits) -> Result<StrategyState> {
    let mut state = source.load()?;
    edits.apply(&mut state)?;
    if state.dates().is_ordered() == Some(false) {
        warn!(
            start = %state.dates().start_date,
            end = %state.dates().end_date,
            "start date is after end date; the engine may reject this range"
        );
    }
    Ok(state)
}

fn run_defaults() -> Result<()> {
    print!("{}", StrategyState::default().to_toml()?);
    Ok(())
}

fn run_show(source: &StateSource, edits: &Edits) -> Result<()> {
    let state = edited_state(source, edits)?;
    print_state(&state);
    Ok(())
}

fn run_compile(source: &StateSource, edits: &Edits, compact: bool) -> Result<()> {
    let state = edited_state(source, edits)?;
    let payload = compile(&state)?;
    let json = if compact {
        payload.to_json()?
    } else {
        payload.to_json_pretty()?
    };
    println!("{json}");
    Ok(())
}

fn run_submit(source: &StateSource, edits: &Edits, token: Option<String>) -> Result<()> {
    let state = edited_state(source, edits)?;

    let token = token.or_else(|| std::env::var(TOKEN_VAR).ok());
    let mut session = match token {
        Some(token) => Session::with_token(token),
        None => Session::anonymous(),
    };
    if !session.is_authenticated() {
        bail!("no credential: pass --token or set {TOKEN_VAR}");
    }

    let config = ApiConfig::from_env()?;
    info!(
        app = config.environment.app_name(),
        environment = %config.environment,
        api = %config.api_url,
        "using backend"
    );
    let engine = HttpEngine::new(&config)?;

    let submission = compile_and_submit(&state, &engine, &mut session)?;
    print_result(&submission.result);
    Ok(())
}

fn print_state(state: &StrategyState) {
    let dates = state.dates();
    let show_date = |d: &str| if d.is_empty() { "(unset)".to_string() } else { d.to_string() };

    println!();
    println!("=== Strategy ===");
    println!(
        "Period:         {} to {}",
        show_date(&dates.start_date),
        show_date(&dates.end_date)
    );
    println!();
    println!("--- Exclusions ---");
    for (category, group) in state.groups().iter() {
        let status = if group.enabled { "on " } else { "off" };
        let conditions: Vec<String> = group
            .conditions
            .iter()
            .map(|c| format!("{} {}", c.comparator, c.threshold))
            .collect();
        println!(
            "[{status}] {:<9} {}",
            category.label(),
            if conditions.is_empty() {
                "(none)".to_string()
            } else {
                conditions.join(", ")
            }
        );
    }
    println!();
    println!("--- Scoring ---");
    for (index, (factor, weight)) in state.factors().pairs().enumerate() {
        println!("{index}: {factor:<14} {weight}");
    }
    println!();
    let settings = state.settings();
    println!("Hold:           {}", settings.hold_num);
    println!("Stop Profit:    {}%", fraction_to_percent(settings.stop_profit));
    println!("Fee Rate:       {}%", fraction_to_percent(settings.fee_rate));
    println!();
}

fn print_result(result: &EngineResult) {
    println!();
    println!("=== Backtest Result ===");
    if let Some(message) = &result.message {
        println!("{message}");
    }
    match result.summary() {
        Some(summary) => {
            println!();
            println!("--- Performance ---");
            println!("Annual Return:  {:.2}%", summary.annual_return * 100.0);
            println!("Max Drawdown:   {:.2}%", summary.max_drawdown * 100.0);
            println!("Sharpe:         {:.3}", summary.sharpe_ratio);
            println!("Sortino:        {:.3}", summary.sortino_ratio);
            println!("Win Rate:       {:.1}%", summary.win_rate * 100.0);
            println!("Trades:         {}", summary.trade_count);
            println!("Avg Hold Days:  {:.1}", summary.avg_hold_days);
        }
        None if !result.performance.is_null() => {
            // Per-strategy maps and other shapes are printed raw.
            match serde_json::to_string_pretty(&result.performance) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{}", result.performance),
            }
        }
        None => {}
    }
    println!();
}
