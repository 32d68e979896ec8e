/*!
 * Speeches reassembled from stored parts.
 */

use std::collections::BTreeMap;

use super::model::{Part, SpeechContent};
use super::talker::TalkerList;
use crate::errors::SpeechError;

/// An ordered, non-empty group of speech parts sharing one speech id.
///
/// The first part (lowest `part_seq`) is authoritative for the id, title
/// and owning talker.
#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    parts: Vec<Part>,
}

impl Speech {
    /// Build a speech, sorting parts by `part_seq`
    pub fn from_parts(mut parts: Vec<Part>) -> Result<Self, SpeechError> {
        if parts.is_empty() {
            return Err(SpeechError::Empty);
        }
        if let Some(part) = parts.iter().find(|p| p.content().is_none()) {
            return Err(SpeechError::NotSpeechPart(part.part_id()));
        }
        parts.sort_by_key(|p| p.content().map_or(0, |c| c.part_seq));
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    fn first(&self) -> &Part {
        &self.parts[0]
    }

    pub fn id(&self) -> String {
        self.first().speech_id()
    }

    /// Title of the first-level subdebate, usually the bill name
    pub fn title(&self) -> &str {
        &self.first().context.subdebate_1_title
    }

    pub fn talker_id(&self) -> &str {
        self.first().content().map_or("", |c| c.talker_id.as_str())
    }

    fn contents(&self) -> impl Iterator<Item = &SpeechContent> {
        self.parts.iter().filter_map(Part::content)
    }

    /// Render the speech as a plain transcript, one block per part
    pub fn to_transcript(&self, talkers: &TalkerList) -> String {
        let mut out = format!("Bill being discussed: {}\n\n", self.title());
        for content in self.contents() {
            let block = match talkers.find(&content.talker_id) {
                Some(talker) => format!(
                    "{} ({}): {}\n\n",
                    talker.name,
                    talker.party.as_deref().unwrap_or(""),
                    content.speech_content
                ),
                None => format!("UNKNOWN: {}\n\n", content.speech_content),
            };
            out.push_str(&block);
        }
        out
    }
}

/// Group speech parts by speech id into speeches, ordered by speech id.
/// Procedural parts are ignored.
pub fn group_speeches<I>(parts: I) -> Vec<Speech>
where
    I: IntoIterator<Item = Part>,
{
    let mut groups: BTreeMap<String, Vec<Part>> = BTreeMap::new();
    for part in parts.into_iter().filter(|p| p.content().is_some()) {
        groups.entry(part.speech_id()).or_default().push(part);
    }
    groups
        .into_values()
        .filter_map(|group| Speech::from_parts(group).ok())
        .collect()
}
