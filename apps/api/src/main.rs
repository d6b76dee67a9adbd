mod acquisition;
mod assembly;
mod config;
mod errors;
mod extract;
mod extraction;
mod llm_client;
mod models;
mod ner;
mod pipeline;
mod routes;
mod state;
mod storage;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::acquisition::ocr::TesseractOcr;
use crate::acquisition::pdf::PdfExtractBackend;
use crate::acquisition::{TextAcquisitionSelector, Thresholds};
use crate::assembly::RecordAssembler;
use crate::config::Config;
use crate::extraction::{
    AiExtractor, CityDictionary, ExperienceBlockSplitter, ExtractionStrategy, FieldExtractor,
    LocalityHints, RuleBasedExtractor, SkillDictionary,
};
use crate::llm_client::{LlmClient, RetryPolicy};
use crate::ner::{GazetteerNameModel, NameRecognizer};
use crate::pipeline::{BatchRunner, Pipeline};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or inconsistent env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV extraction API v{}", env!("CARGO_PKG_VERSION"));

    // Name model: loaded once, read-only for every worker
    let names: Arc<dyn NameRecognizer> = Arc::new(GazetteerNameModel::load());

    if !TesseractOcr::tools_available() {
        warn!("pdftoppm/tesseract not found; pages needing OCR will come back empty");
    }
    let acquisition = TextAcquisitionSelector::new(
        Arc::new(PdfExtractBackend),
        Arc::new(TesseractOcr::new(&config.ocr)),
        Thresholds::from(&config.ocr),
    );

    let hints: Arc<dyn LocalityHints> = Arc::new(CityDictionary::default());
    let skills = SkillDictionary::standard();
    let rules = RuleBasedExtractor::new(hints.clone(), skills);
    let strategy = match ai_extractor(&config)? {
        Some(ai) => ExtractionStrategy::new(vec![ai], rules),
        None => ExtractionStrategy::rules_only(rules),
    };

    let pipeline = Arc::new(Pipeline::new(
        acquisition,
        ExperienceBlockSplitter::new(hints.clone()),
        strategy,
        RecordAssembler::new(names, hints, skills),
    ));

    // Initialize S3 / MinIO
    let storage = Arc::new(S3Storage::connect(&config).await);
    info!(bucket = %config.s3_bucket, "S3 client initialized");

    let batch = BatchRunner::new(
        pipeline.clone(),
        storage.clone(),
        storage,
        config.worker_count,
    );
    info!(workers = config.worker_count, "Worker pool configured");

    let state = AppState {
        pipeline,
        batch: Arc::new(batch),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The model-assisted extractor, when enabled and a credential is present.
fn ai_extractor(config: &Config) -> Result<Option<Arc<dyn FieldExtractor>>> {
    let api_key = match (&config.ai.api_key, config.ai.enabled) {
        (Some(key), true) => key.clone(),
        _ => {
            info!("AI extraction disabled; every block uses the rule-based extractor");
            return Ok(None);
        }
    };

    let llm = LlmClient::new(
        api_key,
        config.ai.model.clone(),
        RetryPolicy::new(config.ai.max_retries),
    )
    .context("Failed to build the model client")?;
    info!(model = %config.ai.model, max_attempts = config.ai.max_retries, "AI extraction enabled");
    let ai: Arc<dyn FieldExtractor> = Arc::new(AiExtractor::new(Arc::new(llm)));
    Ok(Some(ai))
}
