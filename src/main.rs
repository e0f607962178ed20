use clap::Parser;
use tracing_subscriber::EnvFilter;

use gex_levels::analyze;
use gex_levels::config::FocusWindow;
use gex_levels::schema;

mod cli;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn window(size: Option<usize>, preset: Option<FocusWindow>) -> Option<usize> {
    size.or(preset.map(FocusWindow::size))
}

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        cli::Command::Schema { kind } => schema::run(kind),
        cli::Command::Analyze {
            files,
            last_prices,
            assets,
            as_of,
            zero_dte,
            flip_point,
            window: size,
            window_preset,
            config,
            processed_dir,
            no_artifacts,
            output,
            pine,
        } => analyze::run(&analyze::AnalyzeConfig {
            files,
            last_prices,
            assets,
            as_of,
            zero_dte,
            flip_point,
            window: window(size, window_preset),
            config_path: config,
            processed_dir: (!no_artifacts).then_some(processed_dir),
            output,
            pine,
            verbose: cli.verbose,
        }),
        cli::Command::FromArtifact {
            files,
            window: size,
            window_preset,
            config,
            output,
            pine,
        } => analyze::run_from_artifacts(&analyze::ArtifactConfig {
            files,
            window: window(size, window_preset),
            config_path: config,
            output,
            pine,
        }),
    }
}
