//! Bounded worker pool over many documents. Each document runs on its own
//! task behind a semaphore permit; outcomes are reported per document, in
//! input order.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::{Pipeline, PipelineError};
use crate::models::{Document, SourceInfo};
use crate::storage::{DocumentSource, RecordSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Ok,
    FetchFailed,
    ParseFailed,
    PersistFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub file_id: String,
    pub status: DocumentStatus,
    pub record_key: Option<String>,
    pub error: Option<String>,
}

impl DocumentReport {
    fn new(file_id: String, status: DocumentStatus) -> Self {
        Self {
            file_id,
            status,
            record_key: None,
            error: None,
        }
    }
}

pub struct BatchRunner {
    pipeline: Arc<Pipeline>,
    source: Arc<dyn DocumentSource>,
    sink: Arc<dyn RecordSink>,
    workers: usize,
}

impl BatchRunner {
    pub fn new(
        pipeline: Arc<Pipeline>,
        source: Arc<dyn DocumentSource>,
        sink: Arc<dyn RecordSink>,
        workers: usize,
    ) -> Self {
        Self {
            pipeline,
            source,
            sink,
            workers: workers.max(1),
        }
    }

    pub async fn run(&self, file_ids: Vec<String>, today: NaiveDate) -> Vec<DocumentReport> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        info!(documents = file_ids.len(), workers = self.workers, "Batch started");

        let handles: Vec<_> = file_ids
            .iter()
            .cloned()
            .map(|file_id| {
                let semaphore = Arc::clone(&semaphore);
                let pipeline = Arc::clone(&self.pipeline);
                let source = Arc::clone(&self.source);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    process_one(file_id, &pipeline, source.as_ref(), sink.as_ref(), today).await
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (file_id, handle) in file_ids.into_iter().zip(handles) {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    let e = PipelineError::from_join(e);
                    error!(file_id = %file_id, error = %e, "Document worker aborted");
                    DocumentReport {
                        error: Some(e.to_string()),
                        ..DocumentReport::new(file_id, DocumentStatus::ParseFailed)
                    }
                }
            };
            reports.push(report);
        }

        let ok = reports.iter().filter(|r| r.status == DocumentStatus::Ok).count();
        info!(ok, failed = reports.len() - ok, "Batch finished");
        reports
    }
}

async fn process_one(
    file_id: String,
    pipeline: &Pipeline,
    source: &dyn DocumentSource,
    sink: &dyn RecordSink,
    today: NaiveDate,
) -> DocumentReport {
    let fetched = match source.fetch(&file_id).await {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!(file_id = %file_id, error = %e, "Fetch failed");
            return DocumentReport {
                error: Some(e.to_string()),
                ..DocumentReport::new(file_id, DocumentStatus::FetchFailed)
            };
        }
    };

    let info = SourceInfo {
        file_id: fetched.file_id,
        file_name: fetched.file_name,
    };
    let record = pipeline
        .process(Document::new(fetched.bytes, fetched.kind), &info, today)
        .await;

    // Failed records are still persisted so the raw text is not lost.
    let parse_error = record.metadata.error.clone();
    match sink.persist(&record).await {
        Ok(key) => {
            let status = if parse_error.is_some() {
                DocumentStatus::ParseFailed
            } else {
                DocumentStatus::Ok
            };
            info!(file_id = %file_id, key = %key, ?status, "Document done");
            DocumentReport {
                file_id,
                status,
                record_key: Some(key),
                error: parse_error,
            }
        }
        Err(e) => {
            error!(file_id = %file_id, error = %e, "Persist failed");
            DocumentReport {
                error: Some(e.to_string()),
                ..DocumentReport::new(file_id, DocumentStatus::PersistFailed)
            }
        }
    }
}
