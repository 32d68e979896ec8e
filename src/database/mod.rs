/*!
 * Database module for persistent storage of segmented transcripts.
 *
 * This module provides SQLite-based persistence for:
 * - Parts, keyed by part id
 * - Talkers, keyed by talker id
 * - Ingested documents, keyed by content hash and house
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{DatabaseStats, IngestedDocument};
pub use repository::{HansardStore, Repository};
