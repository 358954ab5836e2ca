//! CLI tool for xlfill - detects template fields and fills templates
//!
//! Usage:
//!   xlfill_cli detect <template.xlsx> [--template-id ID] [-o schema.json]
//!   xlfill_cli fill <template.xlsx> --values values.json [--signatures DIR] -o out.xlsx
//!
//! Logging follows `RUST_LOG` (default `info`).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use xlfill::assets::{DirectoryAssets, NoAssets, SignatureResolver};
use xlfill::detect::{Detector, DetectorConfig};
use xlfill::error::{FillError, Result};
use xlfill::registry::SchemaRegistry;
use xlfill::render::{self, RenderOptions};
use xlfill::types::{FieldValues, TemplateSchema};

#[derive(Parser)]
#[command(name = "xlfill_cli", version, about = "Detect and fill spreadsheet form templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the field schema of a template as JSON
    Detect {
        template: PathBuf,
        /// Registered template id; unknown ids use heuristic detection
        #[arg(long, default_value = "auto")]
        template_id: String,
        /// Detector configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Extra registered schemas (`{template_id: [sections]}`)
        #[arg(long)]
        registry: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write values (and signatures) into a template
    Fill {
        template: PathBuf,
        /// Form data JSON or a flat `{field_id: value}` map
        #[arg(long)]
        values: PathBuf,
        #[arg(long, default_value = "auto", conflicts_with = "schema")]
        template_id: String,
        /// Use this schema instead of detecting one
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        registry: Option<PathBuf>,
        /// Directory of `<asset_id>.png|.jpg` signature images
        #[arg(long)]
        signatures: Option<PathBuf>,
        /// Render options JSON
        #[arg(long)]
        options: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| FillError::Parse(format!("{}: {e}", path.display())))
}

fn detector(config: Option<&Path>, registry: Option<&Path>) -> Result<Detector> {
    let config = match config {
        Some(path) => DetectorConfig::from_json(&read_text(path)?)?,
        None => DetectorConfig::default(),
    };
    let mut schemas = SchemaRegistry::builtin();
    if let Some(path) = registry {
        let added = schemas.merge_json(&read_text(path)?)?;
        log::info!("registered {added} templates from {}", path.display());
    }
    Ok(Detector::new(config, schemas))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Detect {
            template,
            template_id,
            config,
            registry,
            output,
        } => {
            let workbook = xlfill::parser::parse(&fs::read(&template)?)?;
            let schema = detector(config.as_deref(), registry.as_deref())?.detect(&template_id, &workbook);
            let json = serde_json::to_string_pretty(&schema)?;
            match output {
                Some(path) => {
                    fs::write(&path, &json)?;
                    eprintln!("Written: {}", path.display());
                }
                None => {
                    io::stdout().write_all(json.as_bytes())?;
                    println!();
                }
            }
        }
        Command::Fill {
            template,
            values,
            template_id,
            schema,
            config,
            registry,
            signatures,
            options,
            output,
        } => {
            let workbook = xlfill::parser::parse(&fs::read(&template)?)?;
            let schema: TemplateSchema = match schema {
                Some(path) => serde_json::from_str(&read_text(&path)?)?,
                None => detector(config.as_deref(), registry.as_deref())?.detect(&template_id, &workbook),
            };
            let values = FieldValues::from_json(&read_text(&values)?)?;
            let options = match options {
                Some(path) => RenderOptions::from_json(&read_text(&path)?)?,
                None => RenderOptions::default(),
            };
            let resolver: Box<dyn SignatureResolver> = match signatures {
                Some(dir) => Box::new(DirectoryAssets::new(dir)),
                None => Box::new(NoAssets),
            };

            let rendered = render::render(&workbook, &schema, &values, resolver.as_ref(), &options)?;
            for warning in &rendered.warnings {
                log::warn!("{warning}");
            }
            fs::write(&output, &rendered.bytes)?;
            log::info!(
                "{} fields written, {} warnings",
                rendered.fields_written,
                rendered.warnings.len()
            );
            eprintln!("Written: {}", output.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
