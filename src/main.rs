//! rload - restart a program whenever the files it is built from change.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rload::config::{ConfigLoader, ConfigOverrides, ReloadConfig};
use rload::display;
use rload::events::EventKind;
use rload::process::Target;
use rload::supervisor::Reloader;
use rload::watcher::Preset;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Python,
    Rust,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Python => Preset::Python,
            PresetArg::Rust => Preset::Rust,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "rload",
    about = "Restart a program whenever its files change",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `run` and `watch`.
#[derive(Args, Debug)]
struct WatchArgs {
    /// Path to a config file (default: .rload.toml, then the user config dir).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Seconds to sleep between polls.
    #[arg(short, long, value_name = "SECONDS")]
    delay: Option<f64>,
    /// Directory name to ignore at any depth (repeatable).
    #[arg(short, long = "ignore", value_name = "DIR")]
    ignore: Vec<String>,
    /// Only watch files with this extension (repeatable).
    #[arg(short, long = "ext", value_name = "EXT")]
    ext: Vec<String>,
    /// Language preset (python, rust).
    #[arg(short, long, value_enum)]
    preset: Option<PresetArg>,
}

impl WatchArgs {
    /// Load the config file with command-line values layered on top.
    fn load_config(
        self,
        watch: Option<PathBuf>,
        grace_period: Option<f64>,
    ) -> Result<ReloadConfig, String> {
        let loader = self
            .config
            .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
        let overrides = ConfigOverrides {
            watch,
            delay: self.delay,
            grace_period,
            ignored_paths: self.ignore,
            extensions: self.ext,
            preset: self.preset.map(Into::into),
        };
        let loaded = loader.load(overrides).map_err(|e| e.to_string())?;

        match &loaded.source {
            Some(path) => tracing::info!(path = %path.display(), "Loaded config"),
            None => tracing::info!("Using default config"),
        }
        Ok(loaded.config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program and restart it on changes.
    Run {
        #[command(flatten)]
        watch_args: WatchArgs,
        /// File or directory to watch (default: current directory).
        #[arg(short, long, value_name = "PATH")]
        watch: Option<PathBuf>,
        /// Seconds to wait after SIGINT before killing the program.
        #[arg(long, value_name = "SECONDS")]
        grace_period: Option<f64>,
        /// Program to run.
        program: String,
        /// Arguments passed to the program.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print changes without running anything.
    Watch {
        #[command(flatten)]
        watch_args: WatchArgs,
        /// File or directory to watch (default: current directory).
        path: Option<PathBuf>,
    },
    /// Print version information.
    Version,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Register the console printer for every event.
fn attach_display(reloader: &mut Reloader) {
    for kind in [EventKind::Change, EventKind::Reload, EventKind::Reloaded] {
        reloader.on(kind, |event| {
            display::print_event(event);
            Ok(())
        });
    }
}

async fn run(command: Commands) -> Result<(), String> {
    match command {
        Commands::Run {
            watch_args,
            watch,
            grace_period,
            program,
            args,
        } => {
            let config = watch_args.load_config(watch, grace_period)?;

            let target = Target::resolve(&program)
                .map_err(|e| e.to_string())?
                .args(args);

            display::print_banner();
            tracing::info!(
                target = %target.name(),
                path = %target.path().display(),
                watch = %config.watch_target().root().display(),
                delay = ?config.delay(),
                "Starting reload loop"
            );

            let mut reloader = Reloader::from_config(&config);
            attach_display(&mut reloader);
            let stats = reloader.run(&target).await.map_err(|e| e.to_string())?;
            tracing::info!(?stats, "Reload loop finished");
        }
        Commands::Watch { watch_args, path } => {
            let config = watch_args.load_config(path, None)?;
            display::print_banner();

            let mut reloader = Reloader::from_config(&config);
            attach_display(&mut reloader);
            let stats = reloader.watch().await.map_err(|e| e.to_string())?;
            tracing::info!(?stats, "Watch loop finished");
        }
        Commands::Version => display::print_version(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            display::print_error(&message);
            ExitCode::FAILURE
        }
    }
}
