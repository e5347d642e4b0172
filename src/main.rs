use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug, info};

use vision_bot::{
    AnnotationEngine, AnnotationOutcome, BotConfig, DetectionInstance, DispatchProtocol,
    OperationKind, OperationTable, Selection,
};

#[derive(Parser)]
#[command(name = "vision-bot")]
#[command(about = "Annotate detected faces on images and inspect selection tokens")]
struct Cli {
    /// Path to the JSON config file (defaults to ./config.json when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the label font
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render detection records onto an image
    Annotate {
        #[arg(long, value_name = "IMAGE")]
        image: PathBuf,

        /// JSON array of detection records
        #[arg(long, value_name = "JSON")]
        detections: PathBuf,

        /// Operation label, name or code
        #[arg(long)]
        operation: String,

        #[arg(long, value_name = "JPEG")]
        output: PathBuf,

        /// Write the text report here instead of stdout
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Encode or decode selection tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// List the operation catalogue
    Operations,
}

#[derive(Subcommand)]
enum TokenAction {
    Encode { operation: String, reference: String },
    Decode { token: String },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut config = BotConfig::load_or_default(args.config.as_deref())?;
    if let Some(font) = args.font {
        config.font_path = font;
    }
    init_logging(args.verbose || config.is_verbose);
    debug!(?config, "Configuration loaded");

    let protocol = DispatchProtocol::new(Arc::new(OperationTable::standard()?));
    let engine = AnnotationEngine::new(Arc::new(config.render_context()?));

    match args.command {
        Command::Annotate {
            image,
            detections,
            operation,
            output,
            report,
        } => {
            let operation = resolve_operation(&protocol, &operation)?;
            annotate(&engine, &image, &detections, operation, &output, report.as_deref())?;
        }
        Command::Token { action } => match action {
            TokenAction::Encode {
                operation,
                reference,
            } => {
                let operation = resolve_operation(&protocol, &operation)?;
                println!("{}", protocol.encode(operation, &reference)?);
            }
            TokenAction::Decode { token } => match protocol.parse(&token)? {
                Selection::Cancel => println!("cancel"),
                Selection::Operation {
                    operation,
                    reference,
                } => println!("{}\t{}", operation, reference),
            },
        },
        Command::Operations => {
            for op in protocol.table().operations() {
                let code = protocol.table().code(*op).unwrap_or('?');
                println!("{}\t{}\t{}", code, op.name(), op.label());
            }
        }
    }

    Ok(())
}

/// A single character is looked up as a code, anything else as a name or label.
fn resolve_operation(protocol: &DispatchProtocol, raw: &str) -> anyhow::Result<OperationKind> {
    let mut chars = raw.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(op) = protocol.table().operation(c) {
            return Ok(op);
        }
    }
    raw.parse::<OperationKind>().map_err(anyhow::Error::msg)
}

fn annotate(
    engine: &AnnotationEngine,
    image: &Path,
    detections: &Path,
    operation: OperationKind,
    output: &Path,
    report: Option<&Path>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(detections)
        .with_context(|| format!("Failed to read detections {:?}", detections))?;
    let instances: Vec<DetectionInstance> = serde_json::from_str(&content)?;
    info!(count = instances.len(), %operation, "Loaded detections");

    let bytes =
        std::fs::read(image).with_context(|| format!("Failed to read image {:?}", image))?;

    match engine.annotate_bytes(&bytes, &instances, operation)? {
        AnnotationOutcome::Empty => println!("nothing detected"),
        AnnotationOutcome::Rendered(result) => {
            std::fs::write(output, engine.encode(&result.image)?)
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!(path = ?output, "Annotated image written");

            if let Some(text) = result.report {
                match report {
                    Some(path) => std::fs::write(path, text)?,
                    None => println!("{}", text),
                }
            }
        }
    }
    Ok(())
}
