//! Pi CLI
//!
//! Prints π to a requested number of thousands of decimal digits.
//! Digits go to stdout; progress dots and timing go to stderr.

use clap::{CommandFactory, Parser as ClapParser};
use clap_complete::{Shell, generate};
use pi_core::{Dots, PiConfig, PiError, Plan, ProgressObserver, Silent};
use std::io::{self, BufWriter};
use std::process;
use std::time::Instant;
use tracing::debug;

#[derive(ClapParser)]
#[command(name = "pi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compute pi to thousands of decimal digits", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Precision in thousands of decimal digits
    thousands: Option<String>,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Do not print progress dots
    #[arg(short, long)]
    quiet: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging (stderr, silent unless RUST_LOG asks for more)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Some(shell) = cli.completions {
        run_completions(shell);
        return;
    }

    let Some(thousands) = cli.thousands else {
        eprintln!("{}", Cli::command().render_usage());
        return;
    };

    let plan = match build_plan(&thousands, cli.threads) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    run(&plan, cli.quiet);
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pi", &mut io::stdout());
}

fn build_plan(thousands: &str, threads: Option<usize>) -> Result<Plan, PiError> {
    let mut config = PiConfig::parse_thousands(thousands)?;
    if let Some(threads) = threads {
        config = config.with_threads(threads);
    }
    config.plan()
}

fn run(plan: &Plan, quiet: bool) {
    let start = Instant::now();
    let progress: &dyn ProgressObserver = if quiet { &Silent } else { &Dots };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match pi_core::compute(plan, progress, &mut out) {
        Ok(summary) => debug!(?summary, "done"),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    eprintln!("exec time: {:.3} s", start.elapsed().as_secs_f64());
}
