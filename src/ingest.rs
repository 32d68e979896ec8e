use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use roxmltree::Document;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::IngestConfig;
use crate::database::{HansardStore, IngestedDocument};
use crate::errors::ParseError;
use crate::events::{EventBus, IngestEvent};
use crate::file_utils::FileManager;
use crate::hansard::{extract_talkers, House, ParsedTranscript, Talker, TranscriptParser};

// @module: Transcript ingestion service

/// What happened to one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Parsed and stored
    Ingested,
    /// Content hash already recorded; nothing done
    Unchanged,
}

/// Result of ingesting one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
    pub date: Option<NaiveDate>,
    pub part_count: usize,
    pub talker_count: usize,
    pub speech_ids: BTreeSet<String>,
    /// Speeches dropped under the skip-speech policy
    pub rejected_speeches: usize,
}

impl DocumentReport {
    fn unchanged(path: &Path, date: NaiveDate) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: DocumentOutcome::Unchanged,
            date: Some(date),
            part_count: 0,
            talker_count: 0,
            speech_ids: BTreeSet::new(),
            rejected_speeches: 0,
        }
    }
}

/// Result of ingesting several documents
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub ingested: usize,
    pub unchanged: usize,
    /// Files that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
    /// Every speech id touched by the batch
    pub speech_ids: BTreeSet<String>,
    pub part_count: usize,
    pub duration: Duration,
}

impl BatchReport {
    fn record(&mut self, report: DocumentReport) {
        match report.outcome {
            DocumentOutcome::Ingested => self.ingested += 1,
            DocumentOutcome::Unchanged => self.unchanged += 1,
        }
        self.part_count += report.part_count;
        self.speech_ids.extend(report.speech_ids);
    }
}

/// Parses transcripts and hands the results to the store and the event bus
pub struct Ingestor {
    // @field: Storage collaborator
    store: Arc<dyn HansardStore>,
    // @field: Notification boundary
    events: EventBus,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: Arc<dyn HansardStore>, events: EventBus, config: IngestConfig) -> Self {
        Self { store, events, config }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &Arc<dyn HansardStore> {
        &self.store
    }

    /// Parse one transcript file and store its parts and talkers
    pub async fn ingest_file(&self, house: House, path: &Path) -> Result<DocumentReport> {
        if !FileManager::file_exists(path) {
            return Err(anyhow::anyhow!("Transcript file does not exist: {:?}", path));
        }

        let bytes = FileManager::read_bytes(path)?;
        let content_hash = FileManager::hash_bytes(&bytes);
        if self.config.skip_unchanged {
            if let Some(previous) = self.store.find_document_by_hash(house, &content_hash).await? {
                info!("Skipping unchanged transcript {:?} (sitting {})", path, previous.session_date);
                return Ok(DocumentReport::unchanged(path, previous.session_date));
            }
        }

        let content = String::from_utf8(bytes).with_context(|| format!("Transcript is not valid UTF-8: {:?}", path))?;
        let policy = self.config.on_structural_error;
        let (transcript, talkers) = tokio::task::spawn_blocking(move || parse_document(&content, house, policy))
            .await
            .context("Parser task panicked")?
            .with_context(|| format!("Failed to parse transcript {:?}", path))?;

        debug!(
            "Parsed {:?}: {} parts, {} speeches, {} talkers",
            path,
            transcript.parts.len(),
            transcript.speech_ids.len(),
            talkers.len()
        );

        self.store.upsert_parts(&transcript.parts).await?;
        self.store.save_talkers(&talkers).await?;
        self.store
            .record_document(&IngestedDocument::new(
                path.display().to_string(),
                content_hash,
                house,
                transcript.date,
                transcript.parts.len() as i64,
                transcript.speech_ids.len() as i64,
            ))
            .await?;

        self.events.emit_lossy(IngestEvent::document_ingested(
            path.to_path_buf(),
            transcript.parts.len(),
            transcript.speech_ids.len(),
        ));

        Ok(DocumentReport {
            path: path.to_path_buf(),
            outcome: DocumentOutcome::Ingested,
            date: Some(transcript.date),
            part_count: transcript.parts.len(),
            talker_count: talkers.len(),
            rejected_speeches: transcript.rejected_speeches.len(),
            speech_ids: transcript.speech_ids,
        })
    }

    /// Ingest files in order, carrying on past failures.
    /// One `ParserCompleted` event is emitted for the whole batch.
    pub async fn ingest_many(&self, house: House, paths: &[PathBuf]) -> Result<BatchReport> {
        self.ingest_paths(house, paths, None).await
    }

    /// Ingest every transcript file found under `dir`
    pub async fn ingest_folder(&self, house: House, dir: &Path) -> Result<BatchReport> {
        if !FileManager::dir_exists(dir) {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", dir));
        }

        let files = FileManager::find_transcripts(dir, &self.config.file_prefix, &self.config.file_extension)?;
        if files.is_empty() {
            return Err(anyhow::anyhow!(
                "No transcript files ({}*.{}) found in directory: {:?}",
                self.config.file_prefix,
                self.config.file_extension,
                dir
            ));
        }

        let progress = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);
        progress.set_message("Ingesting transcripts");

        let report = self.ingest_paths(house, &files, Some(&progress)).await;
        progress.finish_with_message("Ingestion complete");
        report
    }

    async fn ingest_paths(&self, house: House, paths: &[PathBuf], progress: Option<&ProgressBar>) -> Result<BatchReport> {
        let start_time = Instant::now();
        let mut batch = BatchReport::default();

        for path in paths {
            if let Some(progress) = progress {
                let file_name = path
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                progress.set_message(format!("Ingesting: {}", file_name));
            }

            match self.ingest_file(house, path).await {
                Ok(report) => batch.record(report),
                Err(e) => {
                    error!("Error ingesting {:?}: {:#}", path, e);
                    batch.failed.push((path.clone(), format!("{:#}", e)));
                }
            }

            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        batch.duration = start_time.elapsed();
        info!(
            "Ingestion completed: {} ingested, {} unchanged, {} errors, {} speeches touched",
            batch.ingested,
            batch.unchanged,
            batch.failed.len(),
            batch.speech_ids.len()
        );

        if batch.speech_ids.is_empty() {
            debug!("No speeches touched, not announcing parser completion");
        } else {
            self.events
                .emit_lossy(IngestEvent::parser_completed(house, batch.speech_ids.clone()));
        }

        if !batch.failed.is_empty() && batch.ingested == 0 && batch.unchanged == 0 {
            warn!("Every transcript in the batch failed");
        }

        Ok(batch)
    }
}

fn parse_document(
    content: &str,
    house: House,
    policy: crate::hansard::StructuralErrorPolicy,
) -> Result<(ParsedTranscript, Vec<Talker>), ParseError> {
    let document = Document::parse(content)?;
    let transcript = TranscriptParser::new(house, policy).parse(&document)?;
    let talkers = extract_talkers(&document);
    Ok((transcript, talkers))
}
