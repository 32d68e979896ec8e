/*!
 * Error types for the hansard crate.
 *
 * Structural problems in a transcript (things the segmentation engine cannot
 * recover from) are typed here with thiserror. Application plumbing such as
 * storage and file handling uses anyhow and converts into `AppError` at the edge.
 */

use thiserror::Error;

/// Structural invariant violations found while segmenting a single speech
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    /// A continuation paragraph appeared before any part was opened
    #[error("continuation found before any speech part")]
    ContinuationBeforeSpeech,

    /// An attributable interjection appeared before any part was opened
    #[error("interjection found before any speech part")]
    InterjectionBeforeSpeech,

    /// The speech has no `talk.start` talker
    #[error("speech has no talk.start talker")]
    MissingTalkStart,

    /// The primary talker carries no `name.id`
    #[error("primary talker has no name.id")]
    MissingSpeakerId,
}

/// Errors that abort parsing of a whole transcript document
#[derive(Error, Debug)]
pub enum ParseError {
    /// The markup could not be parsed into a tree
    #[error("Malformed transcript markup: {0}")]
    Xml(#[from] roxmltree::Error),

    /// No `session.header/date` element
    #[error("Transcript has no session.header date")]
    MissingSessionDate,

    /// The session date is not an ISO date
    #[error("Invalid session date '{0}'")]
    InvalidSessionDate(String),

    /// A speech violated a structural invariant and the policy is to abort
    #[error("Structural error in {location}: {source}")]
    Segmentation {
        /// Human readable position of the speech in the document
        location: String,
        /// The violated invariant
        #[source]
        source: SegmentationError,
    },
}

/// Errors raised when building a `Speech` from parts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Speech cannot be empty. Need at least one part.")]
    Empty,

    #[error("Part {0} is not a speech part")]
    NotSpeechPart(String),
}

/// Talker validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TalkerError {
    /// A required field is absent or blank
    #[error("Talker missing required field: {0}")]
    MissingField(&'static str),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from transcript parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error from speech reconstruction
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// Error from the storage layer
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}
