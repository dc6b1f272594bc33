use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::migration::diagnostics::{Diagnostics, Level};
use crate::migration::operator::{NonInteractive, OperatorInput, TerminalOperator};
use crate::migration::{convert, Conversion};
use crate::tools;

/// Convert a v1alpha2 Astarte resource to v1alpha3
#[derive(Debug, Args)]
pub struct ConvertCommand {
    /// Astarte v1alpha2 resource (YAML)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the v1alpha3 manifest; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Never prompt; values that need an operator are left unset
    #[arg(long, env = "ASTARTE_MIGRATE_NON_INTERACTIVE")]
    pub non_interactive: bool,
}

impl ConvertCommand {
    pub fn run(&self) -> Result<()> {
        let mut terminal = TerminalOperator::new();
        let mut unattended = NonInteractive;
        let operator: &mut dyn OperatorInput = if self.non_interactive {
            &mut unattended
        } else {
            &mut terminal
        };

        let conversion = convert_file(&self.input, operator)?;
        print_diagnostics(&conversion.diagnostics);

        let yaml = tools::migrate::to_yaml(&conversion.document).map_err(anyhow::Error::msg)?;
        match &self.output {
            Some(path) => {
                fs::write(path, &yaml)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("{} Wrote {}", "✓".green().bold(), path.display());
            }
            None => print!("{yaml}"),
        }
        Ok(())
    }
}

/// Reads, parses and converts a resource file. Nothing is written on failure.
pub fn convert_file(path: &Path, operator: &mut dyn OperatorInput) -> Result<Conversion> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = tools::migrate::parse_resource(&yaml)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!(input = %path.display(), "converting resource");
    convert(&source, operator).with_context(|| format!("Cannot convert {}", path.display()))
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        eprintln!("{}", d.colored());
    }
    if diagnostics.is_empty() {
        return;
    }
    let summary = format!(
        "{} errors, {} warnings: review them and patch the manifest before applying it",
        diagnostics.count(Level::Error),
        diagnostics.count(Level::Warn)
    );
    if diagnostics.has_errors() {
        eprintln!("{}", summary.red());
    } else {
        eprintln!("{}", summary.yellow());
    }
}

/// Validate a migrated v1alpha3 manifest
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Manifest to validate
    pub file: PathBuf,
}

impl ValidateCommand {
    pub fn run(&self) -> Result<()> {
        let yaml = fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        match tools::manifest::validate_astarte_manifest(&yaml) {
            Ok(()) => {
                println!("{}", "Manifest is valid.".green());
                Ok(())
            }
            Err(errors) => {
                for e in &errors {
                    eprintln!("{} {}", "✗".red().bold(), e);
                }
                bail!("{} has {} validation error(s)", self.file.display(), errors.len())
            }
        }
    }
}
