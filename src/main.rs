//! Astarte CR migration: rewrite `Astarte` resources from v1alpha2 to v1alpha3.

mod commands;
mod error;
mod migration;
mod server;
mod tools;
mod types;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertCommand, ValidateCommand};
use migration::diagnostics::TRACING_TARGET;

/// Migrate Astarte custom resources from v1alpha2 to v1alpha3
#[derive(Parser)]
#[command(
    name = "astarte-cr-migrate",
    version,
    about = "Migrate Astarte custom resources from v1alpha2 to v1alpha3",
    long_about = "Rewrite an Astarte custom resource from api.astarte-platform.org/v1alpha2 to\n\
                  api.astarte-platform.org/v1alpha3.\n\n\
                  The migration is one-way and lossy: settings of dependencies the operator no\n\
                  longer deploys and plain-text credentials are dropped. Read the diagnostics\n\
                  printed on stderr and patch the manifest before applying it."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a v1alpha2 resource to v1alpha3
    Convert(ConvertCommand),

    /// Validate a migrated v1alpha3 manifest
    Validate(ValidateCommand),

    /// Print how v1alpha2 fields map to v1alpha3
    Mappings,

    /// Serve the migration tools over MCP (stdio)
    Serve,
}

/// Builds the log filter. `RUST_LOG` directives take precedence over the `-v` default.
fn env_filter(verbose: u8, rust_log: Option<&str>) -> Result<EnvFilter> {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(rust_log.unwrap_or_default());
    if verbose == 0 {
        // Diagnostics are already printed as the conversion transcript.
        filter = filter.add_directive(format!("{TRACING_TARGET}=off").parse()?);
    }
    Ok(filter)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose, rust_log.as_deref())?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Convert(cmd) => cmd.run(),
        Commands::Validate(cmd) => cmd.run(),
        Commands::Mappings => {
            println!("{}", tools::reference::list_field_mappings_json());
            Ok(())
        }
        Commands::Serve => server::serve().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_env_filter_defaults_to_verbosity() {
        let filter = env_filter(0, None).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
        let filter = env_filter(2, None).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_env_filter_rust_log_overrides_default() {
        let filter = env_filter(0, Some("debug")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
