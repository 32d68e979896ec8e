/*!
 * Deterministic identifiers for parts and speeches.
 *
 * A full part id looks like `2025-10-09_hor_main_3_1_none_0_0`; the speech id
 * is the same string without the final part sequence, so every part of a
 * speech shares its speech id as a prefix. Storage upserts are keyed on these
 * strings, which is what makes re-ingesting a document idempotent.
 */

use chrono::NaiveDate;

use super::model::{Chamber, House};

const NONE: &str = "none";

/// The fields that identify a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartKey {
    pub date: NaiveDate,
    pub house: House,
    pub chamber: Chamber,
    pub debate_seq: u32,
    pub subdebate_1_seq: Option<u32>,
    pub subdebate_2_seq: Option<u32>,
    /// None for procedural parts
    pub speech_seq: Option<u32>,
    /// None for procedural parts
    pub part_seq: Option<u32>,
}

impl PartKey {
    /// Identifier unique to one part
    pub fn part_id(&self) -> String {
        let mut segments = self.speech_segments();
        segments.push(or_none(self.part_seq));
        segments.join("_")
    }

    /// Identifier shared by every part of one speech
    pub fn speech_id(&self) -> String {
        self.speech_segments().join("_")
    }

    fn speech_segments(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.house.as_str().to_string(),
            self.chamber.as_str().to_string(),
            self.debate_seq.to_string(),
            or_none(self.subdebate_1_seq),
            or_none(self.subdebate_2_seq),
            or_none(self.speech_seq),
        ]
    }
}

fn or_none(value: Option<u32>) -> String {
    value.map_or_else(|| NONE.to_string(), |v| v.to_string())
}
