/*!
 * Segmentation engine.
 *
 * Walks a parsed transcript tree in one pass:
 *
 * ```text
 * chamber.xscript | fedchamb.xscript
 *   debate                      (debate_seq, per chamber section)
 *     subdebate.1               (subdebate_1_seq, per debate)
 *       speech                  (speech_seq, per subdebate.1)
 *       subdebate.2             (subdebate_2_seq, per subdebate.1)
 *         speech                (speech_seq, per subdebate.2)
 *           p ...               (part_seq, per speech)
 * ```
 *
 * Each level derives a fresh `PartContext` from its parent and hands it down.
 * Within a speech, paragraphs drive a small state machine over the currently
 * open part: a paragraph either merges into the open part or closes it and
 * opens the next one.
 */

use chrono::NaiveDate;
use log::{debug, warn};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::markup;
use super::model::{Chamber, House, Part, PartContext, SpeechContent, SpeechPartType};
use super::paragraph::{self, ParagraphClass};
use super::talker;
use crate::errors::{ParseError, SegmentationError};

/// Debate category whose subdebates carry bill ids
pub const BILLS_CATEGORY: &str = "BILLS";

/// Second-level subdebate title that produces a procedural marker
pub const FIRST_READING_TITLE: &str = "First Reading";

/// Chamber section tags in processing order
const CHAMBER_SECTIONS: [&str; 2] = ["chamber.xscript", "fedchamb.xscript"];

/// What to do when a speech violates a structural invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StructuralErrorPolicy {
    /// Fail the whole document
    #[default]
    Abort,
    /// Drop the speech, record it and carry on
    SkipSpeech,
}

/// A speech dropped under `StructuralErrorPolicy::SkipSpeech`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSpeech {
    /// Speech id the speech would have had
    pub location: String,
    pub reason: SegmentationError,
}

/// Result of segmenting one transcript document
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTranscript {
    pub date: NaiveDate,
    pub house: House,
    /// Every part in document order
    pub parts: Vec<Part>,
    /// Distinct speech ids touched by `parts`
    pub speech_ids: BTreeSet<String>,
    pub rejected_speeches: Vec<RejectedSpeech>,
}

impl ParsedTranscript {
    fn new(date: NaiveDate, house: House) -> Self {
        Self {
            date,
            house,
            parts: Vec::new(),
            speech_ids: BTreeSet::new(),
            rejected_speeches: Vec::new(),
        }
    }

    /// Number of speech parts, excluding procedural markers
    pub fn speech_part_count(&self) -> usize {
        self.parts.iter().filter(|p| p.content().is_some()).count()
    }
}

/// Parse raw transcript markup and segment it
pub fn parse_transcript(
    xml: &str,
    house: House,
    policy: StructuralErrorPolicy,
) -> Result<ParsedTranscript, ParseError> {
    let document = Document::parse(xml)?;
    TranscriptParser::new(house, policy).parse(&document)
}

/// Sitting date from `session.header/date`
pub fn session_date(document: &Document) -> Result<NaiveDate, ParseError> {
    let header = markup::find(document.root(), "session.header").ok_or(ParseError::MissingSessionDate)?;
    let raw = markup::find_text(header, "date").ok_or(ParseError::MissingSessionDate)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| ParseError::InvalidSessionDate(raw))
}

/// Segments transcript documents for one house
#[derive(Debug, Clone, Copy)]
pub struct TranscriptParser {
    house: House,
    policy: StructuralErrorPolicy,
}

impl TranscriptParser {
    pub fn new(house: House, policy: StructuralErrorPolicy) -> Self {
        Self { house, policy }
    }

    /// Segment every speech in every chamber section of the document
    pub fn parse(&self, document: &Document) -> Result<ParsedTranscript, ParseError> {
        let date = session_date(document)?;
        let mut transcript = ParsedTranscript::new(date, self.house);

        let sections: Vec<Node> = CHAMBER_SECTIONS
            .iter()
            .filter_map(|tag| markup::find(document.root(), tag))
            .collect();
        if sections.is_empty() {
            warn!("No chamber sections found in transcript for {}", date);
        }

        for section in sections {
            let chamber = Chamber::from_section_tag(section.tag_name().name());
            let context = PartContext::new(date, self.house, chamber);
            self.parse_section(section, &context, &mut transcript)?;
        }

        debug!(
            "Segmented {} parts across {} speeches for {} ({})",
            transcript.parts.len(),
            transcript.speech_ids.len(),
            date,
            self.house
        );
        Ok(transcript)
    }

    fn parse_section(
        &self,
        section: Node,
        context: &PartContext,
        transcript: &mut ParsedTranscript,
    ) -> Result<(), ParseError> {
        let mut debate_seq = 0;
        for debate in markup::find_all(section, "debate") {
            let Some(category) = debate_category(debate) else {
                warn!(
                    "Skipping debate without a title in {} chamber (byte {})",
                    context.chamber,
                    debate.range().start
                );
                continue;
            };
            let context = context.with_debate(&category, debate_seq);
            self.parse_debate(debate, &context, transcript)?;
            debate_seq += 1;
        }
        Ok(())
    }

    fn parse_debate(
        &self,
        debate: Node,
        context: &PartContext,
        transcript: &mut ParsedTranscript,
    ) -> Result<(), ParseError> {
        let mut subdebate_seq = 0;
        for subdebate in markup::children(debate, "subdebate.1") {
            let Some(title) = subdebate_title(subdebate) else {
                warn!(
                    "Skipping subdebate.1 without a title in debate '{}' (byte {})",
                    context.debate_category,
                    subdebate.range().start
                );
                continue;
            };
            let bill_ids = if context.debate_category == BILLS_CATEGORY {
                bill_ids(subdebate)
            } else {
                None
            };
            let context = context.with_subdebate_1(&title, subdebate_info(subdebate), subdebate_seq, bill_ids);

            self.parse_speeches(&markup::children(subdebate, "speech"), &context, transcript)?;
            self.parse_subdebates(subdebate, &context, transcript)?;
            subdebate_seq += 1;
        }
        Ok(())
    }

    fn parse_subdebates(
        &self,
        parent: Node,
        context: &PartContext,
        transcript: &mut ParsedTranscript,
    ) -> Result<(), ParseError> {
        let mut subdebate_seq = 0;
        for subdebate in markup::find_all(parent, "subdebate.2") {
            let Some(title) = subdebate_title(subdebate) else {
                warn!(
                    "Skipping subdebate.2 without a title under '{}' (byte {})",
                    context.subdebate_1_title,
                    subdebate.range().start
                );
                continue;
            };
            let context = context.with_subdebate_2(&title, subdebate_info(subdebate), subdebate_seq);

            if title == FIRST_READING_TITLE {
                transcript.parts.push(Part::first_reading(context.clone()));
            }
            self.parse_speeches(&markup::children(subdebate, "speech"), &context, transcript)?;
            subdebate_seq += 1;
        }
        Ok(())
    }

    fn parse_speeches(
        &self,
        speeches: &[Node],
        context: &PartContext,
        transcript: &mut ParsedTranscript,
    ) -> Result<(), ParseError> {
        for (speech_seq, speech) in (0u32..).zip(speeches) {
            match segment_speech(*speech, context, speech_seq) {
                Ok(parts) => {
                    if parts.is_empty() {
                        warn!("Speech {} produced no parts", speech_location(context, speech_seq));
                    }
                    transcript.speech_ids.extend(parts.iter().map(Part::speech_id));
                    transcript.parts.extend(parts);
                }
                Err(reason) => {
                    let location = speech_location(context, speech_seq);
                    match self.policy {
                        StructuralErrorPolicy::Abort => {
                            return Err(ParseError::Segmentation { location, source: reason });
                        }
                        StructuralErrorPolicy::SkipSpeech => {
                            warn!("Skipping speech {}: {}", location, reason);
                            transcript.rejected_speeches.push(RejectedSpeech { location, reason });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn speech_location(context: &PartContext, speech_seq: u32) -> String {
    context.key(Some(speech_seq), None).speech_id()
}

fn debate_category(debate: Node) -> Option<String> {
    markup::child(debate, "debateinfo").and_then(|info| markup::find_text(info, "title"))
}

fn subdebate_title(subdebate: Node) -> Option<String> {
    markup::child(subdebate, "subdebateinfo").and_then(|info| markup::find_text(info, "title"))
}

/// `HPS-Normal` paragraphs of the subdebate's own text, joined by blank lines
fn subdebate_info(subdebate: Node) -> Option<String> {
    let text = markup::child(subdebate, "subdebate.text")?;
    let paragraphs: Vec<String> = markup::find_all_with_class(text, "p", "HPS-Normal")
        .into_iter()
        .map(markup::stripped_text)
        .filter(|t| !t.is_empty())
        .collect();
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn bill_ids(subdebate: Node) -> Option<Vec<String>> {
    let ids: Vec<String> = markup::find_all_with_attr(subdebate, "a", "type", "Bill")
        .into_iter()
        .filter_map(|a| a.attribute("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() { None } else { Some(ids) }
}

/// The part a speech is currently accumulating into
#[derive(Debug, Clone, PartialEq)]
enum OpenPart {
    Nothing,
    Open(SpeechContent),
}

struct SpeechSegmenter<'c> {
    context: &'c PartContext,
    speech_seq: u32,
    primary: String,
    interjectors: Vec<Option<String>>,
    next_interjector: usize,
    closed: Vec<Part>,
}

impl SpeechSegmenter<'_> {
    fn location(&self) -> String {
        speech_location(self.context, self.speech_seq)
    }

    fn close(&mut self, content: SpeechContent) {
        self.closed.push(Part::speech(self.context.clone(), content));
    }

    /// Close whatever is open and open a new part after it
    fn open(&mut self, state: OpenPart, part_type: SpeechPartType, talker_id: &str, text: String) -> OpenPart {
        let part_seq = match state {
            OpenPart::Nothing => 0,
            OpenPart::Open(previous) => {
                let next = previous.part_seq + 1;
                self.close(previous);
                next
            }
        };
        OpenPart::Open(SpeechContent {
            speech_seq: self.speech_seq,
            part_seq,
            talker_id: talker_id.to_string(),
            speech_content: text,
            speech_part_type: part_type,
        })
    }

    fn step(&mut self, state: OpenPart, p: Node) -> Result<OpenPart, SegmentationError> {
        match paragraph::classify(p) {
            ParagraphClass::Continuation => {
                let OpenPart::Open(open) = state else {
                    return Err(SegmentationError::ContinuationBeforeSpeech);
                };
                if open.talker_id == self.primary {
                    Ok(OpenPart::Open(merge(open, p)))
                } else {
                    let primary = self.primary.clone();
                    Ok(self.open(
                        OpenPart::Open(open),
                        SpeechPartType::Continuation,
                        &primary,
                        paragraph::cleaned_text(p),
                    ))
                }
            }
            ParagraphClass::Interjection(kind) if !kind.is_attributable() => {
                Ok(self.open(state, SpeechPartType::Interjection, "", String::new()))
            }
            ParagraphClass::Interjection(_) => {
                let OpenPart::Open(open) = state else {
                    return Err(SegmentationError::InterjectionBeforeSpeech);
                };
                let Some(slot) = self.interjectors.get(self.next_interjector).cloned() else {
                    warn!(
                        "Speech {} has more interjection paragraphs than interjection talkers",
                        self.location()
                    );
                    return Ok(OpenPart::Open(open));
                };
                self.next_interjector += 1;
                let Some(interjector) = slot else {
                    warn!("Interjection talker without name.id in speech {}", self.location());
                    return Ok(OpenPart::Open(open));
                };
                if open.talker_id == interjector {
                    Ok(OpenPart::Open(merge(open, p)))
                } else {
                    Ok(self.open(
                        OpenPart::Open(open),
                        SpeechPartType::Interjection,
                        &interjector,
                        paragraph::cleaned_text(p),
                    ))
                }
            }
            ParagraphClass::Ordinary => match state {
                OpenPart::Open(open) if open.talker_id == self.primary => Ok(OpenPart::Open(merge(open, p))),
                state => {
                    let primary = self.primary.clone();
                    Ok(self.open(state, SpeechPartType::Speech, &primary, paragraph::cleaned_text(p)))
                }
            },
        }
    }
}

fn merge(open: SpeechContent, p: Node) -> SpeechContent {
    SpeechContent {
        speech_content: format!("{}\n\n{}", open.speech_content, paragraph::raw_text(p)),
        ..open
    }
}

/// Segment one `speech` element into its ordered parts
pub fn segment_speech(
    speech: Node,
    context: &PartContext,
    speech_seq: u32,
) -> Result<Vec<Part>, SegmentationError> {
    let talk_start = markup::find(speech, "talk.start").ok_or(SegmentationError::MissingTalkStart)?;
    let primary_talker = markup::find(talk_start, "talker").ok_or(SegmentationError::MissingTalkStart)?;
    let primary = talker::talker_id(primary_talker).ok_or(SegmentationError::MissingSpeakerId)?;

    let interjectors = markup::find_all(speech, "interjection")
        .into_iter()
        .map(|interjection| markup::find(interjection, "talker").and_then(talker::talker_id))
        .collect();

    let mut segmenter = SpeechSegmenter {
        context,
        speech_seq,
        primary,
        interjectors,
        next_interjector: 0,
        closed: Vec::new(),
    };

    let mut state = OpenPart::Nothing;
    for p in markup::find_all(speech, "p") {
        state = segmenter.step(state, p)?;
    }
    if let OpenPart::Open(last) = state {
        segmenter.close(last);
    }
    Ok(segmenter.closed)
}
