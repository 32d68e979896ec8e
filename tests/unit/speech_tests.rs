/*!
 * Tests for speech grouping and rendering
 */

use anyhow::Result;
use hansard::hansard::{House, StructuralErrorPolicy, TalkerList, extract_talkers, group_speeches, parse_transcript};
use crate::common;

/// Test that parts of a sitting group into one speech per speech id
#[test]
fn test_group_speeches_withFullSitting_shouldIgnoreMarkers() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let speeches = group_speeches(transcript.parts.clone());

    assert_eq!(speeches.len(), transcript.speech_ids.len());
    let ids: Vec<String> = speeches.iter().map(|s| s.id()).collect();
    let expected: Vec<String> = transcript.speech_ids.iter().cloned().collect();
    assert_eq!(ids, expected);

    let interjected = speeches
        .iter()
        .find(|s| s.id() == "2025-10-09_hor_main_0_0_1_0")
        .expect("interjected speech should exist");
    assert_eq!(interjected.parts().len(), 3);
    assert_eq!(interjected.talker_id(), "IMW");
    assert_eq!(interjected.title(), "Repeal Net Zero Bill 2025");

    Ok(())
}

/// Test that a rendered speech names each talker with their party
#[test]
fn test_to_transcript_withKnownTalkers_shouldRenderNames() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let document = roxmltree::Document::parse(&xml)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;
    let talkers = TalkerList::new(extract_talkers(&document));

    let speech = group_speeches(transcript.parts)
        .into_iter()
        .find(|s| s.id() == "2025-10-09_hor_main_0_0_1_0")
        .expect("interjected speech should exist");

    let rendered = speech.to_transcript(&talkers);

    assert!(rendered.starts_with("Bill being discussed: Repeal Net Zero Bill 2025\n\n"));
    assert!(rendered.contains("Chalmers, Jim MP (ALP): Nonsense!\n\n"));
    assert!(rendered.ends_with("Wilson, Tim MP (LP): As I was saying, it matters.\n\n"));

    Ok(())
}

/// Test that an unknown talker is rendered as UNKNOWN
#[test]
fn test_to_transcript_withoutTalkers_shouldRenderUnknown() -> Result<()> {
    let xml = common::read_test_resource(common::TWO_BILLS)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let speech = group_speeches(transcript.parts).into_iter().next().expect("one speech");
    let rendered = speech.to_transcript(&TalkerList::default());

    assert!(rendered.contains("UNKNOWN: I support both bills.\n\n"));
    assert_eq!(rendered.matches("UNKNOWN: ").count(), 4);

    Ok(())
}
