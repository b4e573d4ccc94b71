use clap::Parser;
use curtail_cli::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Update {
            source,
            data_dir,
            start,
            refresh_last,
            offline,
            company_map,
            audit,
        } => commands::update::handle(
            source,
            data_dir,
            start,
            *refresh_last,
            *offline,
            company_map.as_deref(),
            *audit,
        ),
        Commands::Check {
            source,
            data_dir,
            baseline,
            candidate,
            tolerance,
        } => commands::check::handle(
            source,
            data_dir,
            baseline.as_deref(),
            candidate.as_deref(),
            *tolerance,
        ),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
