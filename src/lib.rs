/*!
 * # hansard - parliamentary transcript segmentation
 *
 * A Rust library that turns Australian Hansard XML transcripts into
 * structured, speaker-attributed segments and stores them for analysis.
 *
 * ## Features
 *
 * - Single-pass segmentation of debates, subdebates and speeches into parts
 * - Interjection and continuation handling with deterministic identifiers
 * - Speaker (talker) extraction and deduplication
 * - SQLite storage with idempotent upserts
 * - Batch ingestion of files and folders, with change detection
 * - Broadcast notification of touched speeches
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `hansard`: Document model and segmentation engine:
 *   - `hansard::parser`: Tree walk and per-speech state machine
 *   - `hansard::talker`: Speaker extraction
 *   - `hansard::speech`: Speech grouping and rendering
 *   - `hansard::ids`: Part and speech identifiers
 * - `database`: SQLite persistence behind the `HansardStore` trait
 * - `events`: Ingestion notification bus
 * - `ingest`: Ingestion service wiring parser, store and events
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod errors;
pub mod events;
pub mod file_utils;
pub mod hansard;
pub mod ingest;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ParseError, SegmentationError, SpeechError, TalkerError};
pub use events::{EventBus, IngestEvent};
pub use hansard::{House, Part, ParsedTranscript, Speech, Talker, TalkerList, parse_transcript};
pub use ingest::{BatchReport, DocumentReport, Ingestor};
