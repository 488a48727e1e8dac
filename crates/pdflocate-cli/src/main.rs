mod annotate_cmd;
mod batch_cmd;
mod cli;
mod locate_cmd;
mod plan_cmd;
mod shared;
mod tags_cmd;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        cli::Commands::Locate {
            ref file,
            ref report,
            ref file_name,
            format,
            ref extract,
        } => locate_cmd::run(
            file,
            report,
            file_name.as_deref(),
            format,
            extract.to_options(),
        ),
        cli::Commands::Tags {
            ref file,
            format,
            ref extract,
        } => tags_cmd::run(file, format, extract.to_options()),
        cli::Commands::Plan {
            ref file,
            ref report,
            page,
            focus,
            ref file_name,
            format,
            ref extract,
        } => plan_cmd::run(
            plan_cmd::PlanArgs {
                file,
                report,
                page,
                focus,
                file_name: file_name.as_deref(),
            },
            format,
            extract.to_options(),
        ),
        cli::Commands::Annotate {
            ref file,
            ref report,
            ref output,
            focus,
            ref file_name,
            ref extract,
        } => annotate_cmd::run(
            annotate_cmd::AnnotateArgs {
                file,
                report,
                output: output.as_deref(),
                focus,
                file_name: file_name.as_deref(),
            },
            extract.to_options(),
        ),
        cli::Commands::Batch {
            ref report,
            format,
            ref extract,
        } => batch_cmd::run(report, format, extract.to_options()),
    };

    if let Err(code) = result {
        tracing::debug!(code, "command failed");
        std::process::exit(code);
    }
}
