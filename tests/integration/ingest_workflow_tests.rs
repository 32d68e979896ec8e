/*!
 * Integration tests for the transcript ingestion workflow
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::broadcast::error::TryRecvError;

use hansard::app_config::IngestConfig;
use hansard::database::{DatabaseConnection, HansardStore, Repository};
use hansard::events::{EventBus, IngestEvent};
use hansard::file_utils::FileManager;
use hansard::hansard::{House, PartKind, StructuralErrorPolicy};
use hansard::ingest::{DocumentOutcome, Ingestor};
use crate::common;

fn skip_speech_config() -> IngestConfig {
    IngestConfig {
        on_structural_error: StructuralErrorPolicy::SkipSpeech,
        ..IngestConfig::default()
    }
}

/// Test that ingesting a sitting stores its parts, talkers and document record
#[tokio::test]
async fn test_ingest_file_withFullSitting_shouldStoreEverything() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let path = common::test_resource_path(common::FULL_SITTING);

    let report = ingestor.ingest_file(House::Hor, &path).await?;

    assert_eq!(report.outcome, DocumentOutcome::Ingested);
    assert_eq!(report.date, NaiveDate::from_ymd_opt(2025, 10, 9));
    assert_eq!(report.part_count, 7);
    assert_eq!(report.talker_count, 2);
    assert_eq!(report.speech_ids.len(), 4);

    assert_eq!(store.list_parts(None).await?.len(), 7);
    assert_eq!(store.list_parts(Some(PartKind::FirstReading)).await?.len(), 1);
    assert_eq!(store.list_talkers().await?.len(), 2);
    assert_eq!(store.latest_ingested_date(House::Hor).await?, NaiveDate::from_ymd_opt(2025, 10, 9));
    assert_eq!(store.latest_ingested_date(House::Senate).await?, None);

    let speech = store
        .load_speech("2025-10-09_hor_main_0_0_1_0")
        .await?
        .expect("speech should be stored");
    assert_eq!(speech.parts().len(), 3);

    Ok(())
}

/// Test that re-ingesting the same content is skipped unless forced
#[tokio::test]
async fn test_ingest_file_twice_shouldSkipUnchangedAndStayIdempotent() -> Result<()> {
    let store: Arc<dyn HansardStore> = Arc::new(Repository::new_in_memory()?);
    let path = common::test_resource_path(common::FULL_SITTING);

    let ingestor = Ingestor::new(Arc::clone(&store), EventBus::new(8), IngestConfig::default());
    ingestor.ingest_file(House::Hor, &path).await?;
    let second = ingestor.ingest_file(House::Hor, &path).await?;

    assert_eq!(second.outcome, DocumentOutcome::Unchanged);
    assert_eq!(second.date, NaiveDate::from_ymd_opt(2025, 10, 9));
    assert_eq!(second.part_count, 0);

    let forced = Ingestor::new(
        Arc::clone(&store),
        EventBus::new(8),
        IngestConfig {
            skip_unchanged: false,
            ..IngestConfig::default()
        },
    );
    let third = forced.ingest_file(House::Hor, &path).await?;

    assert_eq!(third.outcome, DocumentOutcome::Ingested);
    assert_eq!(store.list_parts(None).await?.len(), 7);

    Ok(())
}

/// Test that the same content ingested for the other house is not treated as unchanged
#[tokio::test]
async fn test_ingest_file_forOtherHouse_shouldIngestAgain() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let path = common::test_resource_path(common::TWO_BILLS);

    ingestor.ingest_file(House::Hor, &path).await?;
    let report = ingestor.ingest_file(House::Senate, &path).await?;

    assert_eq!(report.outcome, DocumentOutcome::Ingested);
    assert_eq!(store.list_parts(None).await?.len(), 8);
    assert_eq!(store.latest_ingested_date(House::Senate).await?, NaiveDate::from_ymd_opt(2025, 10, 10));

    Ok(())
}

/// Test that the stored document hash is taken from the bytes that were parsed
#[tokio::test]
async fn test_ingest_file_shouldRecordHashOfFileContent() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let path = common::test_resource_path(common::CONSECUTIVE_BILLS);

    let report = ingestor.ingest_file(House::Hor, &path).await?;
    assert_eq!(report.part_count, 5);

    let expected_hash = FileManager::hash_bytes(&std::fs::read(&path)?);
    let document = store
        .find_document_by_hash(House::Hor, &expected_hash)
        .await?
        .expect("document should be recorded under its content hash");
    assert_eq!(document.session_date, NaiveDate::from_ymd_opt(2025, 10, 12).unwrap());

    Ok(())
}

/// Test that a transcript that is not UTF-8 fails without storing anything
#[tokio::test]
async fn test_ingest_file_withInvalidUtf8_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("hansard-2025-10-13.xml");
    std::fs::write(&path, [0x3c, 0xff, 0xfe, 0x3e])?;

    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let result = ingestor.ingest_file(House::Hor, &path).await;

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("not valid UTF-8"));
    assert!(store.list_parts(None).await?.is_empty());
    assert_eq!(store.latest_ingested_date(House::Hor).await?, None);

    Ok(())
}

/// Test that a batch announces every touched speech in one event
#[tokio::test]
async fn test_ingest_many_withTwoSittings_shouldEmitOneParserCompleted() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let mut events = ingestor.events().subscribe();
    let paths = vec![
        common::test_resource_path(common::FULL_SITTING),
        common::test_resource_path(common::TWO_BILLS),
    ];

    let report = ingestor.ingest_many(House::Hor, &paths).await?;

    assert_eq!(report.ingested, 2);
    assert!(report.failed.is_empty());
    assert_eq!(report.part_count, 11);
    assert_eq!(report.speech_ids.len(), 5);

    let mut document_events = 0;
    let mut completed: Vec<BTreeSet<String>> = Vec::new();
    loop {
        match events.try_recv() {
            Ok(IngestEvent::DocumentIngested { .. }) => document_events += 1,
            Ok(IngestEvent::ParserCompleted { house, speech_ids, .. }) => {
                assert_eq!(house, House::Hor);
                completed.push(speech_ids);
            }
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("unexpected receive error: {:?}", e),
        }
    }
    assert_eq!(document_events, 2);
    assert_eq!(completed, vec![report.speech_ids.clone()]);

    let ids: Vec<String> = report.speech_ids.iter().cloned().collect();
    let parts = store.list_speech_parts_by_speeches(&ids).await?;
    assert_eq!(parts.len(), 10);
    assert!(parts.iter().all(|p| p.kind() == PartKind::Speech));

    Ok(())
}

/// Test that a batch touching no speeches stays silent
#[tokio::test]
async fn test_ingest_many_withOnlyUnchangedFiles_shouldNotAnnounce() -> Result<()> {
    let (ingestor, _store) = common::create_test_ingestor(IngestConfig::default())?;
    let paths = vec![common::test_resource_path(common::TWO_BILLS)];
    ingestor.ingest_many(House::Hor, &paths).await?;

    let mut events = ingestor.events().subscribe();
    let report = ingestor.ingest_many(House::Hor, &paths).await?;

    assert_eq!(report.unchanged, 1);
    assert!(report.speech_ids.is_empty());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

/// Test that a structurally broken file fails alone under the abort policy
#[tokio::test]
async fn test_ingest_many_withBrokenFileAndAbortPolicy_shouldReportFailure() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(IngestConfig::default())?;
    let broken = common::test_resource_path(common::BROKEN_SPEECH);
    let paths = vec![broken.clone(), common::test_resource_path(common::TWO_BILLS)];

    let report = ingestor.ingest_many(House::Hor, &paths).await?;

    assert_eq!(report.ingested, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, broken);
    assert!(report.failed[0].1.contains("interjection found before any speech part"));
    assert_eq!(store.list_parts(None).await?.len(), 4);
    assert_eq!(store.latest_ingested_date(House::Hor).await?, NaiveDate::from_ymd_opt(2025, 10, 10));

    Ok(())
}

/// Test that the skip policy stores the rest of a broken file
#[tokio::test]
async fn test_ingest_file_withBrokenFileAndSkipPolicy_shouldStoreRemainder() -> Result<()> {
    let (ingestor, store) = common::create_test_ingestor(skip_speech_config())?;
    let path = common::test_resource_path(common::BROKEN_SPEECH);

    let report = ingestor.ingest_file(House::Hor, &path).await?;

    assert_eq!(report.outcome, DocumentOutcome::Ingested);
    assert_eq!(report.rejected_speeches, 1);
    assert_eq!(report.part_count, 1);
    let parts = store.list_parts(None).await?;
    assert_eq!(parts[0].speech_id(), "2025-10-11_hor_main_0_0_none_1");

    Ok(())
}

/// Test that a folder is scanned for transcripts and ingested into a file database
#[tokio::test]
async fn test_ingest_folder_withTranscripts_shouldIngestMatchingFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("transcripts");
    std::fs::create_dir_all(&input)?;
    common::copy_resource_to(&input, common::FULL_SITTING)?;
    common::copy_resource_to(&input, common::TWO_BILLS)?;
    common::copy_resource_to(&input, common::BROKEN_SPEECH)?;
    common::create_test_file(&input, "README.txt", "not a transcript")?;

    let repository = Arc::new(Repository::new(DatabaseConnection::new(temp_dir.path().join("hansard.db"))?));
    let store: Arc<dyn HansardStore> = repository.clone();
    let ingestor = Ingestor::new(store, EventBus::new(8), skip_speech_config());

    let report = ingestor.ingest_folder(House::Hor, &input).await?;

    assert_eq!(report.ingested, 3);
    assert!(report.failed.is_empty());
    assert_eq!(report.part_count, 12);

    let stats = repository.stats()?;
    assert_eq!(stats.document_count, 3);
    assert_eq!(stats.part_count, 12);
    assert_eq!(stats.speech_count, 6);
    assert_eq!(stats.talker_count, 5);
    assert!(temp_dir.path().join("hansard.db").exists());

    Ok(())
}

/// Test that a folder without transcripts is an error
#[tokio::test]
async fn test_ingest_folder_withoutTranscripts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.xml", "<hansard/>")?;
    let (ingestor, _store) = common::create_test_ingestor(IngestConfig::default())?;

    assert!(ingestor.ingest_folder(House::Hor, temp_dir.path()).await.is_err());
    assert!(ingestor.ingest_folder(House::Hor, &temp_dir.path().join("missing")).await.is_err());

    Ok(())
}

/// Test the configured wiring from conf.json to a stored speech, driven from a sync context
#[test]
fn test_configured_ingest_withConfigFile_shouldUseConfiguredDatabase() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("data").join("senate.db");
    let config_json = format!(
        r#"{{"house": "senate", "storage": {{"database_path": {:?}}}}}"#,
        db_path.to_string_lossy()
    );
    let config_path = common::create_test_file(temp_dir.path(), "conf.json", &config_json)?;

    let config = hansard::Config::load_or_create(&config_path)?;
    config.validate()?;
    let db = DatabaseConnection::new(config.storage.resolved_database_path()?)?;
    let store: Arc<dyn HansardStore> = Arc::new(Repository::new(db));
    let ingestor = Ingestor::new(Arc::clone(&store), EventBus::new(config.ingest.event_capacity), config.ingest.clone());
    let path = common::test_resource_path(common::TWO_BILLS);

    let speech = tokio_test::block_on(async {
        ingestor.ingest_file(config.house, &path).await?;
        store.load_speech("2025-10-10_senate_main_0_0_0_0").await
    })?;

    assert!(db_path.exists());
    let speech = speech.expect("senate speech should be stored");
    assert_eq!(speech.talker_id(), "e5d");
    assert_eq!(speech.parts().len(), 4);

    Ok(())
}
