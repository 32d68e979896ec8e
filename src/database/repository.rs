/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 * `HansardStore` is the storage contract the ingestion service depends on;
 * `Repository` implements it over SQLite.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{DatabaseStats, IngestedDocument, PartRecord};
use crate::hansard::{House, Part, PartKind, Speech, Talker, TalkerList};

/// Persistence contract for segmented transcripts
#[async_trait]
pub trait HansardStore: Send + Sync {
    /// Insert or replace parts keyed by part id. Returns the number written.
    async fn upsert_parts(&self, parts: &[Part]) -> Result<usize>;

    /// Insert or replace talkers keyed by id. Talkers without an id are skipped.
    async fn save_talkers(&self, talkers: &[Talker]) -> Result<usize>;

    /// All parts, optionally of one kind, ordered by speech id then part seq
    async fn list_parts(&self, kind: Option<PartKind>) -> Result<Vec<Part>>;

    /// Speech parts of the given speeches, ordered by speech id then part seq
    async fn list_speech_parts_by_speeches(&self, speech_ids: &[String]) -> Result<Vec<Part>>;

    async fn list_talkers(&self) -> Result<TalkerList>;

    /// Remember that a document has been ingested
    async fn record_document(&self, document: &IngestedDocument) -> Result<()>;

    async fn find_document_by_hash(&self, house: House, content_hash: &str) -> Result<Option<IngestedDocument>>;

    /// Most recent sitting date ingested for the house
    async fn latest_ingested_date(&self, house: House) -> Result<Option<NaiveDate>>;

    /// Reassemble one stored speech
    async fn load_speech(&self, speech_id: &str) -> Result<Option<Speech>> {
        let parts = self.list_speech_parts_by_speeches(&[speech_id.to_string()]).await?;
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(Speech::from_parts(parts)?))
    }
}

const PART_COLUMNS: &str = "part_id, speech_id, kind, date, house, chamber, bill_ids, debate_category, debate_seq, \
     subdebate_1_title, subdebate_1_info, subdebate_1_seq, subdebate_2_title, subdebate_2_info, subdebate_2_seq, \
     speech_seq, part_seq, talker_id, speech_content, speech_part_type";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }

    fn parse_part_row(row: &rusqlite::Row) -> rusqlite::Result<PartRecord> {
        Ok(PartRecord {
            part_id: row.get(0)?,
            speech_id: row.get(1)?,
            kind: row.get(2)?,
            date: row.get(3)?,
            house: row.get(4)?,
            chamber: row.get(5)?,
            bill_ids: row.get(6)?,
            debate_category: row.get(7)?,
            debate_seq: row.get(8)?,
            subdebate_1_title: row.get(9)?,
            subdebate_1_info: row.get(10)?,
            subdebate_1_seq: row.get(11)?,
            subdebate_2_title: row.get(12)?,
            subdebate_2_info: row.get(13)?,
            subdebate_2_seq: row.get(14)?,
            speech_seq: row.get(15)?,
            part_seq: row.get(16)?,
            talker_id: row.get(17)?,
            speech_content: row.get(18)?,
            speech_part_type: row.get(19)?,
        })
    }

    /// Run a part query and rebuild the parts
    fn query_parts<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Part>> {
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::parse_part_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        records.into_iter().map(PartRecord::into_part).collect()
    }

    fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<DocumentRow> {
        Ok(DocumentRow {
            source_path: row.get(0)?,
            content_hash: row.get(1)?,
            house: row.get(2)?,
            session_date: row.get(3)?,
            part_count: row.get(4)?,
            speech_count: row.get(5)?,
            ingested_at: row.get(6)?,
        })
    }
}

/// Raw `ingested_documents` row before enum and date parsing
struct DocumentRow {
    source_path: String,
    content_hash: String,
    house: String,
    session_date: String,
    part_count: i64,
    speech_count: i64,
    ingested_at: String,
}

impl DocumentRow {
    fn into_document(self) -> Result<IngestedDocument> {
        Ok(IngestedDocument {
            house: self.house.parse()?,
            session_date: NaiveDate::parse_from_str(&self.session_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid stored session date '{}'", self.session_date))?,
            source_path: self.source_path,
            content_hash: self.content_hash,
            part_count: self.part_count,
            speech_count: self.speech_count,
            ingested_at: self.ingested_at,
        })
    }
}

#[async_trait]
impl HansardStore for Repository {
    async fn upsert_parts(&self, parts: &[Part]) -> Result<usize> {
        let records = parts
            .iter()
            .map(PartRecord::from_part)
            .collect::<Result<Vec<_>>>()?;

        self.db
            .transaction_async(move |tx| {
                let now = chrono::Utc::now().to_rfc3339();
                let mut stmt = tx.prepare(&format!(
                    r#"
                    INSERT INTO parts ({PART_COLUMNS}, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
                    ON CONFLICT(part_id) DO UPDATE SET
                        speech_id = excluded.speech_id,
                        kind = excluded.kind,
                        date = excluded.date,
                        house = excluded.house,
                        chamber = excluded.chamber,
                        bill_ids = excluded.bill_ids,
                        debate_category = excluded.debate_category,
                        debate_seq = excluded.debate_seq,
                        subdebate_1_title = excluded.subdebate_1_title,
                        subdebate_1_info = excluded.subdebate_1_info,
                        subdebate_1_seq = excluded.subdebate_1_seq,
                        subdebate_2_title = excluded.subdebate_2_title,
                        subdebate_2_info = excluded.subdebate_2_info,
                        subdebate_2_seq = excluded.subdebate_2_seq,
                        speech_seq = excluded.speech_seq,
                        part_seq = excluded.part_seq,
                        talker_id = excluded.talker_id,
                        speech_content = excluded.speech_content,
                        speech_part_type = excluded.speech_part_type,
                        updated_at = excluded.updated_at
                    "#
                ))?;

                for r in &records {
                    stmt.execute(params![
                        r.part_id,
                        r.speech_id,
                        r.kind,
                        r.date,
                        r.house,
                        r.chamber,
                        r.bill_ids,
                        r.debate_category,
                        r.debate_seq,
                        r.subdebate_1_title,
                        r.subdebate_1_info,
                        r.subdebate_1_seq,
                        r.subdebate_2_title,
                        r.subdebate_2_info,
                        r.subdebate_2_seq,
                        r.speech_seq,
                        r.part_seq,
                        r.talker_id,
                        r.speech_content,
                        r.speech_part_type,
                        now,
                    ])?;
                }

                debug!("Upserted {} parts", records.len());
                Ok(records.len())
            })
            .await
    }

    async fn save_talkers(&self, talkers: &[Talker]) -> Result<usize> {
        let talkers: Vec<Talker> = talkers.iter().filter(|t| t.id.is_some()).cloned().collect();

        self.db
            .transaction_async(move |tx| {
                let now = chrono::Utc::now().to_rfc3339();
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO talkers (id, name, electorate, party, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        electorate = excluded.electorate,
                        party = excluded.party,
                        updated_at = excluded.updated_at
                    "#,
                )?;

                for talker in &talkers {
                    stmt.execute(params![talker.id, talker.name, talker.electorate, talker.party, now])?;
                }

                debug!("Saved {} talkers", talkers.len());
                Ok(talkers.len())
            })
            .await
    }

    async fn list_parts(&self, kind: Option<PartKind>) -> Result<Vec<Part>> {
        let kind = kind.map(|k| k.to_string());

        self.db
            .execute_async(move |conn| match kind {
                Some(kind) => Self::query_parts(
                    conn,
                    &format!("SELECT {PART_COLUMNS} FROM parts WHERE kind = ?1 ORDER BY speech_id, part_seq"),
                    [kind],
                ),
                None => Self::query_parts(
                    conn,
                    &format!("SELECT {PART_COLUMNS} FROM parts ORDER BY speech_id, part_seq"),
                    [],
                ),
            })
            .await
    }

    async fn list_speech_parts_by_speeches(&self, speech_ids: &[String]) -> Result<Vec<Part>> {
        if speech_ids.is_empty() {
            return Ok(Vec::new());
        }
        let speech_ids = speech_ids.to_vec();

        self.db
            .execute_async(move |conn| {
                let placeholders = vec!["?"; speech_ids.len()].join(", ");
                let sql = format!(
                    "SELECT {PART_COLUMNS} FROM parts WHERE kind = 'speech' AND speech_id IN ({placeholders}) \
                     ORDER BY speech_id, part_seq"
                );
                Self::query_parts(conn, &sql, params_from_iter(speech_ids.iter()))
            })
            .await
    }

    async fn list_talkers(&self) -> Result<TalkerList> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare("SELECT id, name, electorate, party FROM talkers ORDER BY id")?;
                let talkers = stmt
                    .query_map([], |row| {
                        Ok(Talker {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            electorate: row.get(2)?,
                            party: row.get(3)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(TalkerList::new(talkers))
            })
            .await
    }

    async fn record_document(&self, document: &IngestedDocument) -> Result<()> {
        let document = document.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO ingested_documents (
                        source_path, content_hash, house, session_date, part_count, speech_count, ingested_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(content_hash, house) DO UPDATE SET
                        source_path = excluded.source_path,
                        session_date = excluded.session_date,
                        part_count = excluded.part_count,
                        speech_count = excluded.speech_count,
                        ingested_at = excluded.ingested_at
                    "#,
                    params![
                        document.source_path,
                        document.content_hash,
                        document.house.to_string(),
                        document.session_date.format("%Y-%m-%d").to_string(),
                        document.part_count,
                        document.speech_count,
                        document.ingested_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn find_document_by_hash(&self, house: House, content_hash: &str) -> Result<Option<IngestedDocument>> {
        let content_hash = content_hash.to_string();

        self.db
            .execute_async(move |conn| {
                let row = conn
                    .query_row(
                        r#"
                        SELECT source_path, content_hash, house, session_date, part_count, speech_count, ingested_at
                        FROM ingested_documents
                        WHERE content_hash = ?1 AND house = ?2
                        "#,
                        params![content_hash, house.to_string()],
                        Self::parse_document_row,
                    )
                    .optional()?;

                row.map(DocumentRow::into_document).transpose()
            })
            .await
    }

    async fn latest_ingested_date(&self, house: House) -> Result<Option<NaiveDate>> {
        self.db
            .execute_async(move |conn| {
                let latest: Option<String> = conn.query_row(
                    "SELECT MAX(session_date) FROM ingested_documents WHERE house = ?1",
                    [house.to_string()],
                    |row| row.get(0),
                )?;

                latest
                    .map(|date| {
                        NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                            .with_context(|| format!("Invalid stored session date '{}'", date))
                    })
                    .transpose()
            })
            .await
    }
}
