/*!
 * Core document model for segmented Hansard transcripts.
 *
 * A `Part` is one paragraph-run attributed to a single talker (or a
 * procedural marker such as a first reading). Every part carries the
 * `PartContext` it was found in, which is also the traversal cursor the
 * parser threads through the document tree.
 */

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PartKey;

/// The house a sitting belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum House {
    /// House of Representatives
    #[default]
    Hor,
    Senate,
}

impl House {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hor => "hor",
            Self::Senate => "senate",
        }
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for House {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hor" => Ok(Self::Hor),
            "senate" => Ok(Self::Senate),
            _ => Err(anyhow::anyhow!("Invalid house: {}", s)),
        }
    }
}

/// Physical debating location within a sitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    Main,
    Federation,
    #[default]
    Unknown,
}

impl Chamber {
    /// Map a chamber section tag to its chamber
    pub fn from_section_tag(tag: &str) -> Self {
        match tag {
            "chamber.xscript" => Self::Main,
            "fedchamb.xscript" => Self::Federation,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Federation => "federation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Chamber {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main" => Ok(Self::Main),
            "federation" => Ok(Self::Federation),
            "unknown" => Ok(Self::Unknown),
            _ => Err(anyhow::anyhow!("Invalid chamber: {}", s)),
        }
    }
}

/// Whether a part is spoken content or a procedural marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Speech,
    FirstReading,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speech => write!(f, "speech"),
            Self::FirstReading => write!(f, "first_reading"),
        }
    }
}

impl std::str::FromStr for PartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "speech" => Ok(Self::Speech),
            "first_reading" => Ok(Self::FirstReading),
            _ => Err(anyhow::anyhow!("Invalid part kind: {}", s)),
        }
    }
}

/// Role of a speech part within its speech
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechPartType {
    /// Spoken by the primary talker
    Speech,
    /// Spoken by someone other than the primary talker
    Interjection,
    /// Primary talker resuming after an interruption
    Continuation,
}

impl fmt::Display for SpeechPartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speech => write!(f, "speech"),
            Self::Interjection => write!(f, "interjection"),
            Self::Continuation => write!(f, "continuation"),
        }
    }
}

impl std::str::FromStr for SpeechPartType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "speech" => Ok(Self::Speech),
            "interjection" => Ok(Self::Interjection),
            "continuation" => Ok(Self::Continuation),
            _ => Err(anyhow::anyhow!("Invalid speech part type: {}", s)),
        }
    }
}

/// Where in the transcript a part was found.
///
/// The parser derives a fresh context at each level of the tree walk and
/// passes it down by value, so no traversal state outlives a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartContext {
    pub date: NaiveDate,
    pub house: House,
    pub chamber: Chamber,

    /// Bills under discussion; only set when the debate category is "BILLS"
    pub bill_ids: Option<Vec<String>>,

    /// e.g. "BILLS" or "STATEMENTS BY MEMBERS"
    pub debate_category: String,
    pub debate_seq: u32,

    /// e.g. "Repeal Net Zero Bill 2025"
    pub subdebate_1_title: String,
    pub subdebate_1_info: Option<String>,
    pub subdebate_1_seq: Option<u32>,

    /// e.g. "Second Reading"
    pub subdebate_2_title: Option<String>,
    pub subdebate_2_info: Option<String>,
    pub subdebate_2_seq: Option<u32>,
}

impl PartContext {
    /// Context at the top of a chamber section, before any debate is entered
    pub fn new(date: NaiveDate, house: House, chamber: Chamber) -> Self {
        Self {
            date,
            house,
            chamber,
            bill_ids: None,
            debate_category: String::new(),
            debate_seq: 0,
            subdebate_1_title: String::new(),
            subdebate_1_info: None,
            subdebate_1_seq: None,
            subdebate_2_title: None,
            subdebate_2_info: None,
            subdebate_2_seq: None,
        }
    }

    /// Identifying fields of a part found in this context
    pub fn key(&self, speech_seq: Option<u32>, part_seq: Option<u32>) -> PartKey {
        PartKey {
            date: self.date,
            house: self.house,
            chamber: self.chamber,
            debate_seq: self.debate_seq,
            subdebate_1_seq: self.subdebate_1_seq,
            subdebate_2_seq: self.subdebate_2_seq,
            speech_seq,
            part_seq,
        }
    }

    /// Enter a debate
    pub fn with_debate(&self, category: &str, seq: u32) -> Self {
        Self {
            debate_category: category.to_string(),
            debate_seq: seq,
            bill_ids: None,
            subdebate_1_title: String::new(),
            subdebate_1_info: None,
            subdebate_1_seq: None,
            subdebate_2_title: None,
            subdebate_2_info: None,
            subdebate_2_seq: None,
            ..self.clone()
        }
    }

    /// Enter a first-level subdebate
    pub fn with_subdebate_1(
        &self,
        title: &str,
        info: Option<String>,
        seq: u32,
        bill_ids: Option<Vec<String>>,
    ) -> Self {
        Self {
            bill_ids,
            subdebate_1_title: title.to_string(),
            subdebate_1_info: info,
            subdebate_1_seq: Some(seq),
            subdebate_2_title: None,
            subdebate_2_info: None,
            subdebate_2_seq: None,
            ..self.clone()
        }
    }

    /// Enter a second-level subdebate
    pub fn with_subdebate_2(&self, title: &str, info: Option<String>, seq: u32) -> Self {
        Self {
            subdebate_2_title: Some(title.to_string()),
            subdebate_2_info: info,
            subdebate_2_seq: Some(seq),
            ..self.clone()
        }
    }
}

/// The attributed content of a speech part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechContent {
    /// Position of the enclosing speech within its subdebate
    pub speech_seq: u32,
    /// Position of this part within its speech
    pub part_seq: u32,
    /// Talker conducting this part; empty for unattributable interjections
    pub talker_id: String,
    pub speech_content: String,
    pub speech_part_type: SpeechPartType,
}

/// What a part carries beyond its context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartBody {
    Speech(SpeechContent),
    FirstReading,
}

/// One segment of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(flatten)]
    pub context: PartContext,
    #[serde(flatten)]
    pub body: PartBody,
}

impl Part {
    pub fn speech(context: PartContext, content: SpeechContent) -> Self {
        Self {
            context,
            body: PartBody::Speech(content),
        }
    }

    pub fn first_reading(context: PartContext) -> Self {
        Self {
            context,
            body: PartBody::FirstReading,
        }
    }

    pub fn kind(&self) -> PartKind {
        match self.body {
            PartBody::Speech(_) => PartKind::Speech,
            PartBody::FirstReading => PartKind::FirstReading,
        }
    }

    /// Speech fields, if this is a speech part
    pub fn content(&self) -> Option<&SpeechContent> {
        match &self.body {
            PartBody::Speech(content) => Some(content),
            PartBody::FirstReading => None,
        }
    }

    /// Identifying fields of this part
    pub fn key(&self) -> PartKey {
        let content = self.content();
        self.context.key(content.map(|c| c.speech_seq), content.map(|c| c.part_seq))
    }

    /// Unique identifier of this part
    pub fn part_id(&self) -> String {
        self.key().part_id()
    }

    /// Identifier of the speech this part belongs to
    pub fn speech_id(&self) -> String {
        self.key().speech_id()
    }
}
