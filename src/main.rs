//! Folio Ingest
//!
//! Ingests OCR files for a set of canvases into an in-memory store and
//! prints the resulting IIIF annotation documents.
//!
//! Usage: `folio-ingest <canvas-pid>=<ocr-file> ...`

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_iiif::annotations::{Canvas, MemoryStore};
use folio_iiif::config::Config;
use folio_iiif::iiif::{self, IiifVersion, Resolver};
use folio_iiif::ingest::{IngestConfig, IngestService};
use folio_iiif::source::LocalSource;

/// `pid=path` command line argument
fn parse_target(arg: &str) -> anyhow::Result<(String, String)> {
    match arg.split_once('=') {
        Some((pid, path)) if !pid.trim().is_empty() && !path.trim().is_empty() => {
            Ok((pid.trim().to_string(), path.trim().to_string()))
        }
        _ => bail!("expected <canvas-pid>=<ocr-file>, got '{}'", arg),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "folio_iiif=debug,folio_ingest=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let targets = std::env::args()
        .skip(1)
        .map(|arg| parse_target(&arg))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if targets.is_empty() {
        bail!("usage: folio-ingest <canvas-pid>=<ocr-file> ...");
    }

    tracing::info!("Starting folio-ingest v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("OCR root: {}", config.ocr.root.display());

    let store = Arc::new(MemoryStore::new());
    for (position, (pid, path)) in targets.iter().enumerate() {
        let canvas = Canvas::new(pid, &config.iiif.manifest, position as u32 + 1, &config.resource_id(pid))
            .with_ocr_file(path);
        store.add_canvas(canvas);
    }

    let source = Arc::new(LocalSource::new(config.ocr.root.clone(), config.ocr.timeout()));
    let service = IngestService::new(
        source,
        store.clone(),
        IngestConfig {
            default_granularity: config.ocr.granularity,
            language: config.ocr.language.clone(),
        },
    );

    let report = service.rebuild_manifest(&config.iiif.manifest).await;
    for failure in &report.failed {
        tracing::warn!("Canvas {} failed: {}", failure.canvas, failure.error);
    }

    let resolver = Resolver::new(&config.iiif.base_url, store.as_ref());
    let mut documents = Vec::new();
    for (pid, _) in &targets {
        let document = match config.iiif.version {
            IiifVersion::V2 => iiif::annotation_list(pid, &[], &resolver),
            IiifVersion::V3 => iiif::annotation_page(pid, &[], &resolver),
        }
        .with_context(|| format!("Failed to serialize annotations for canvas {}", pid))?;
        documents.push(document);
    }

    println!("{}", serde_json::to_string_pretty(&documents)?);
    tracing::info!(
        "Ingested {} canvases ({} skipped, {} failed)",
        report.rebuilt.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(())
}
