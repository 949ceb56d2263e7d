//! Vehicle deregistration CLI
//!
//! Extracts fields from OCR output, normalizes them into a case summary and
//! renders the government forms. JSON results go to stdout, logs to stderr.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use case_core::validate_case_summary;
use case_pipeline::{CaseProcessor, FileOcrProvider, InMemoryCaseRepository, OcrProvider};
use clap::{Parser, Subcommand};
use form_engine::{PdfEngine, TemplateRegistry};
use serde_json::json;
use shared_types::{CaseSummary, DocumentType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "dereg-cli")]
#[command(version, about = "Vehicle export deregistration: OCR fields to filled PDF forms")]
struct Cli {
    /// TOML configuration file (default: ./dereg.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract structured fields from one OCR output file
    Extract {
        /// VEHICLE_REGISTRATION, ID_CARD, DELEGATION_FORM or INVOICE
        #[arg(long)]
        doc_type: String,
        /// OCR output: .json document or plain text
        #[arg(long)]
        ocr: PathBuf,
        /// Original upload name, used as a plate hint
        #[arg(long)]
        filename: Option<String>,
    },
    /// Render a case summary JSON onto a template
    Render {
        #[arg(long)]
        template: String,
        #[arg(long)]
        summary: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Extract, normalize and optionally render in one go
    Process {
        #[arg(long)]
        doc_type: String,
        #[arg(long)]
        ocr: PathBuf,
        #[arg(long)]
        template: Option<String>,
        /// Output PDF (default: <output dir>/<case id>-<template>.pdf)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Names the case in logs and the default output file. Cases are
        /// kept in memory, so every run starts a new one (default: random UUID)
        #[arg(long)]
        case_id: Option<String>,
    },
}

fn build_processor(config: &Config) -> CaseProcessor {
    let mut engine = PdfEngine::new(TemplateRegistry::new(&config.templates.root));
    if let Some(font) = &config.fonts.cjk {
        engine = engine.with_cjk_font(font);
    }
    CaseProcessor::new(
        Arc::new(FileOcrProvider),
        Arc::new(InMemoryCaseRepository::new()),
        Arc::new(engine),
    )
}

fn default_output(config: &Config, case_id: &str, template_id: &str) -> PathBuf {
    config
        .output
        .dir
        .join(format!("{}-{}.pdf", case_id, template_id))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

async fn extract(doc_type: &str, ocr_path: &Path, filename: Option<&str>) -> anyhow::Result<()> {
    let ocr = FileOcrProvider
        .recognize(ocr_path)
        .await
        .with_context(|| format!("Failed to read OCR output: {}", ocr_path.display()))?;
    let filename = filename.or_else(|| ocr_path.file_name().and_then(|name| name.to_str()));

    let result = extraction_engine::map_fields_by_document_type(
        &DocumentType::parse(doc_type),
        &ocr,
        filename,
    );
    print_json(&result)
}

async fn render(
    config: &Config,
    template_id: &str,
    summary_path: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(summary_path)
        .with_context(|| format!("Failed to read case summary: {}", summary_path.display()))?;
    let summary: CaseSummary = serde_json::from_str(&content)
        .with_context(|| format!("Invalid case summary: {}", summary_path.display()))?;

    let bytes = build_processor(config)
        .render_summary(summary, template_id, out)
        .await
        .with_context(|| format!("Failed to render template '{}'", template_id))?;

    print_json(&json!({
        "template": template_id,
        "output": out,
        "bytes": bytes.len(),
    }))
}

async fn process(
    config: &Config,
    doc_type: &str,
    ocr_path: &Path,
    template_id: Option<&str>,
    out: Option<&Path>,
    case_id: Option<&str>,
) -> anyhow::Result<()> {
    let case_id = case_id
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let processor = build_processor(config);

    let processed = processor
        .process_document(&case_id, &DocumentType::parse(doc_type), ocr_path)
        .await
        .with_context(|| format!("Failed to process {}", ocr_path.display()))?;
    let validation = validate_case_summary(&processed.summary);

    let output = match template_id {
        Some(template_id) => {
            let out = out
                .map(Path::to_path_buf)
                .unwrap_or_else(|| default_output(config, &case_id, template_id));
            processor
                .render(&case_id, template_id, &out)
                .await
                .with_context(|| format!("Failed to render template '{}'", template_id))?;
            Some(out)
        }
        None => None,
    };

    print_json(&json!({
        "caseId": case_id,
        "extraction": processed.extraction,
        "summary": processed.summary,
        "validation": validation,
        "output": output,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries JSON results only
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    match &cli.command {
        Command::Extract {
            doc_type,
            ocr,
            filename,
        } => extract(doc_type, ocr, filename.as_deref()).await,
        Command::Render {
            template,
            summary,
            out,
        } => render(&config, template, summary, out).await,
        Command::Process {
            doc_type,
            ocr,
            template,
            out,
            case_id,
        } => {
            process(
                &config,
                doc_type,
                ocr,
                template.as_deref(),
                out.as_deref(),
                case_id.as_deref(),
            )
            .await
        }
    }
}
