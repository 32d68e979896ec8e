/*!
 * Hansard transcript segmentation.
 *
 * This module turns one transcript document into speaker-attributed parts:
 * - `model`: parts, contexts and the enumerations they carry
 * - `ids`: deterministic part and speech identifiers
 * - `markup`: tree lookups over the parsed document
 * - `paragraph`: paragraph classification and label cleaning
 * - `parser`: the segmentation engine
 * - `talker`: speaker extraction
 * - `speech`: grouping stored parts back into speeches
 */

pub mod ids;
pub mod markup;
pub mod model;
pub mod paragraph;
pub mod parser;
pub mod speech;
pub mod talker;

pub use ids::PartKey;
pub use model::{Chamber, House, Part, PartBody, PartContext, PartKind, SpeechContent, SpeechPartType};
pub use parser::{
    ParsedTranscript, RejectedSpeech, StructuralErrorPolicy, TranscriptParser, parse_transcript, segment_speech,
};
pub use speech::{Speech, group_speeches};
pub use talker::{Talker, TalkerList, extract_talkers};
