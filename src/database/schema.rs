/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the segmented transcript store
 * and handles schema migrations for version upgrades.
 */

use anyhow::{Context, Result};
use rusqlite::Connection;
use log::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL keeps readers unblocked while an ingest is writing
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // One row per part; speech_seq, part_seq and the speech fields are NULL
    // for procedural parts
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            part_id TEXT PRIMARY KEY,
            speech_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            date TEXT NOT NULL,
            house TEXT NOT NULL,
            chamber TEXT NOT NULL,
            bill_ids TEXT,
            debate_category TEXT NOT NULL,
            debate_seq INTEGER NOT NULL,
            subdebate_1_title TEXT NOT NULL,
            subdebate_1_info TEXT,
            subdebate_1_seq INTEGER,
            subdebate_2_title TEXT,
            subdebate_2_info TEXT,
            subdebate_2_seq INTEGER,
            speech_seq INTEGER,
            part_seq INTEGER,
            talker_id TEXT,
            speech_content TEXT,
            speech_part_type TEXT,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_parts_speech ON parts(speech_id, part_seq);
        CREATE INDEX IF NOT EXISTS idx_parts_kind ON parts(kind);
        CREATE INDEX IF NOT EXISTS idx_parts_house_date ON parts(house, date);
        CREATE INDEX IF NOT EXISTS idx_parts_talker ON parts(talker_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS talkers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            electorate TEXT,
            party TEXT,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ingested_documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_path TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            house TEXT NOT NULL,
            session_date TEXT NOT NULL,
            part_count INTEGER NOT NULL,
            speech_count INTEGER NOT NULL,
            ingested_at TEXT NOT NULL,
            UNIQUE(content_hash, house)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_house_date ON ingested_documents(house, session_date);
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}

/// Drop all tables (for testing purposes only)
#[cfg(test)]
pub fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS parts;
        DROP TABLE IF EXISTS talkers;
        DROP TABLE IF EXISTS ingested_documents;
        DROP TABLE IF EXISTS schema_version;
        "#,
    )?;
    Ok(())
}
