//! convertd - watch a directory tree, convert finished audio files and
//! carry their tags over.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use convertd::config::{ConfigLoader, DaemonConfig};
use convertd::daemon::{self, Action, DaemonError, DEFAULT_STOP_TIMEOUT};
use convertd::display;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Start,
    Stop,
    Restart,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Start => Action::Start,
            ActionArg::Stop => Action::Stop,
            ActionArg::Restart => Action::Restart,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "convertd",
    about = "Convert newly written audio files and copy their tags",
    version
)]
struct Cli {
    /// Write the pid to FILE (absolute path).
    #[arg(short, long, value_name = "FILE")]
    pidfile: Option<PathBuf>,

    /// Append logs to FILE (absolute path).
    #[arg(short, long, value_name = "FILE")]
    logfile: Option<PathBuf>,

    /// Watch directory DIR and everything below it (absolute path).
    #[arg(short, long, value_name = "DIR")]
    watchdir: Option<PathBuf>,

    /// Lifecycle action.
    #[arg(short, long, value_enum, default_value_t = ActionArg::Start)]
    action: ActionArg,

    /// Read configuration from FILE instead of the default locations.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    fn resolve_config(&self) -> Result<DaemonConfig, DaemonError> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::with_path(path.clone()),
            None => ConfigLoader::new(),
        };
        let mut config = loader.load()?;

        if let Some(pid_file) = &self.pidfile {
            config.pid_file.clone_from(pid_file);
        }
        if let Some(log_file) = &self.logfile {
            config.log_file.clone_from(log_file);
        }
        if let Some(watch_dir) = &self.watchdir {
            config.watch_dir.clone_from(watch_dir);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbosity: u8, log_file: &Path) -> std::io::Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    Ok(())
}

async fn run(config: &DaemonConfig, action: Action) -> Result<(), DaemonError> {
    match action {
        Action::Start => {
            display::print_starting(&config.watch_dir, &config.log_file);
            let stats = daemon::start(config).await?;
            display::print_summary(&stats);
        }
        Action::Stop => {
            let outcome = daemon::stop(&config.pid_file, DEFAULT_STOP_TIMEOUT).await?;
            display::print_stop_outcome(outcome);
        }
        Action::Restart => {
            let outcome = daemon::stop(&config.pid_file, DEFAULT_STOP_TIMEOUT).await?;
            display::print_stop_outcome(outcome);
            display::print_starting(&config.watch_dir, &config.log_file);
            let stats = daemon::start(config).await?;
            display::print_summary(&stats);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration problems stop us before anything is watched.
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_tracing(cli.verbose, &config.log_file) {
        display::print_error(&format!(
            "Cannot open log file {}: {e}",
            config.log_file.display()
        ));
        return ExitCode::from(2);
    }

    match run(&config, cli.action.into()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal");
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
