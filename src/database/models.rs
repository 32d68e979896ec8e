/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hansard::{House, Part, PartBody, PartContext, PartKind, SpeechContent};

/// Flat row of the `parts` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub part_id: String,
    pub speech_id: String,
    pub kind: String,
    /// ISO 8601 date
    pub date: String,
    pub house: String,
    pub chamber: String,
    /// JSON array of bill ids
    pub bill_ids: Option<String>,
    pub debate_category: String,
    pub debate_seq: i64,
    pub subdebate_1_title: String,
    pub subdebate_1_info: Option<String>,
    pub subdebate_1_seq: Option<i64>,
    pub subdebate_2_title: Option<String>,
    pub subdebate_2_info: Option<String>,
    pub subdebate_2_seq: Option<i64>,
    pub speech_seq: Option<i64>,
    pub part_seq: Option<i64>,
    pub talker_id: Option<String>,
    pub speech_content: Option<String>,
    pub speech_part_type: Option<String>,
}

impl PartRecord {
    /// Flatten a part into its table row
    pub fn from_part(part: &Part) -> Result<Self> {
        let ctx = &part.context;
        let bill_ids = ctx
            .bill_ids
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize bill ids")?;
        let content = part.content();

        Ok(Self {
            part_id: part.part_id(),
            speech_id: part.speech_id(),
            kind: part.kind().to_string(),
            date: ctx.date.format("%Y-%m-%d").to_string(),
            house: ctx.house.to_string(),
            chamber: ctx.chamber.to_string(),
            bill_ids,
            debate_category: ctx.debate_category.clone(),
            debate_seq: i64::from(ctx.debate_seq),
            subdebate_1_title: ctx.subdebate_1_title.clone(),
            subdebate_1_info: ctx.subdebate_1_info.clone(),
            subdebate_1_seq: ctx.subdebate_1_seq.map(i64::from),
            subdebate_2_title: ctx.subdebate_2_title.clone(),
            subdebate_2_info: ctx.subdebate_2_info.clone(),
            subdebate_2_seq: ctx.subdebate_2_seq.map(i64::from),
            speech_seq: content.map(|c| i64::from(c.speech_seq)),
            part_seq: content.map(|c| i64::from(c.part_seq)),
            talker_id: content.map(|c| c.talker_id.clone()),
            speech_content: content.map(|c| c.speech_content.clone()),
            speech_part_type: content.map(|c| c.speech_part_type.to_string()),
        })
    }

    /// Rebuild the part this row was stored from
    pub fn into_part(self) -> Result<Part> {
        let context = PartContext {
            date: NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
                .with_context(|| format!("Invalid stored date '{}' for part {}", self.date, self.part_id))?,
            house: self.house.parse()?,
            chamber: self.chamber.parse()?,
            bill_ids: self
                .bill_ids
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .with_context(|| format!("Invalid stored bill ids for part {}", self.part_id))?,
            debate_category: self.debate_category,
            debate_seq: to_u32(self.debate_seq)?,
            subdebate_1_title: self.subdebate_1_title,
            subdebate_1_info: self.subdebate_1_info,
            subdebate_1_seq: self.subdebate_1_seq.map(to_u32).transpose()?,
            subdebate_2_title: self.subdebate_2_title,
            subdebate_2_info: self.subdebate_2_info,
            subdebate_2_seq: self.subdebate_2_seq.map(to_u32).transpose()?,
        };

        let body = match self.kind.parse::<PartKind>()? {
            PartKind::FirstReading => PartBody::FirstReading,
            PartKind::Speech => PartBody::Speech(SpeechContent {
                speech_seq: to_u32(self.speech_seq.ok_or_else(|| missing("speech_seq", &self.part_id))?)?,
                part_seq: to_u32(self.part_seq.ok_or_else(|| missing("part_seq", &self.part_id))?)?,
                talker_id: self.talker_id.unwrap_or_default(),
                speech_content: self.speech_content.unwrap_or_default(),
                speech_part_type: self
                    .speech_part_type
                    .ok_or_else(|| missing("speech_part_type", &self.part_id))?
                    .parse()?,
            }),
        };

        Ok(Part { context, body })
    }
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("Stored sequence number out of range: {}", value))
}

fn missing(column: &str, part_id: &str) -> anyhow::Error {
    anyhow!("Speech part {} has no {}", part_id, column)
}

/// Record of a transcript document that has been ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedDocument {
    /// Path the document was read from
    pub source_path: String,
    /// SHA256 hash of the document content for change detection
    pub content_hash: String,
    pub house: House,
    /// Sitting date
    pub session_date: NaiveDate,
    pub part_count: i64,
    pub speech_count: i64,
    /// Ingestion timestamp (ISO 8601)
    pub ingested_at: String,
}

impl IngestedDocument {
    pub fn new(
        source_path: String,
        content_hash: String,
        house: House,
        session_date: NaiveDate,
        part_count: i64,
        speech_count: i64,
    ) -> Self {
        Self {
            source_path,
            content_hash,
            house,
            session_date,
            part_count,
            speech_count,
            ingested_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Number of ingested documents
    pub document_count: i64,
    /// Number of stored parts, procedural ones included
    pub part_count: i64,
    /// Number of distinct speeches
    pub speech_count: i64,
    /// Number of known talkers
    pub talker_count: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Documents: {}, Parts: {}, Speeches: {}, Talkers: {}, Size: {} KB",
            self.document_count,
            self.part_count,
            self.speech_count,
            self.talker_count,
            self.file_size_bytes / 1024
        )
    }
}
