/*!
 * Tests for transcript segmentation over complete sittings
 */

use anyhow::Result;
use hansard::errors::{ParseError, SegmentationError};
use hansard::hansard::{Chamber, House, PartKind, SpeechPartType, StructuralErrorPolicy, parse_transcript};
use crate::common;

/// Test that a full sitting is segmented into the expected parts
#[test]
fn test_parse_withFullSitting_shouldProduceAllParts() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    assert_eq!(transcript.date.to_string(), "2025-10-09");
    assert_eq!(transcript.parts.len(), 7);
    assert_eq!(transcript.speech_part_count(), 6);
    assert!(transcript.rejected_speeches.is_empty());

    let ids: Vec<&str> = transcript.speech_ids.iter().map(String::as_str).collect();
    assert_eq!(
        ids,
        vec![
            "2025-10-09_hor_federation_0_0_none_0",
            "2025-10-09_hor_main_0_0_1_0",
            "2025-10-09_hor_main_0_0_1_1",
            "2025-10-09_hor_main_1_0_none_0",
        ]
    );

    Ok(())
}

/// Test that the first reading marker comes first and carries the bill context
#[test]
fn test_parse_withFirstReading_shouldEmitMarkerBeforeSpeeches() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let marker = &transcript.parts[0];
    assert_eq!(marker.kind(), PartKind::FirstReading);
    assert_eq!(marker.part_id(), "2025-10-09_hor_main_0_0_0_none_none");
    assert_eq!(marker.context.bill_ids, Some(vec!["r7346".to_string()]));
    assert_eq!(
        marker.context.subdebate_2_info.as_deref(),
        Some("Bill and explanatory memorandum presented by Mr Wilson.")
    );

    Ok(())
}

/// Test that an interjected speech is split into speech, interjection and continuation
#[test]
fn test_parse_withInterjectedSpeech_shouldSplitIntoThreeParts() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let parts: Vec<_> = transcript
        .parts
        .iter()
        .filter(|p| p.speech_id() == "2025-10-09_hor_main_0_0_1_0")
        .filter_map(|p| p.content())
        .collect();

    assert_eq!(parts.len(), 3);

    assert_eq!(parts[0].talker_id, "IMW");
    assert_eq!(parts[0].speech_part_type, SpeechPartType::Speech);
    assert_eq!(
        parts[0].speech_content,
        "I move that this bill be now read a second time.\n\nThis bill matters to every household."
    );

    assert_eq!(parts[1].talker_id, "265991");
    assert_eq!(parts[1].speech_part_type, SpeechPartType::Interjection);
    assert_eq!(parts[1].speech_content, "Nonsense!");

    assert_eq!(parts[2].talker_id, "IMW");
    assert_eq!(parts[2].speech_part_type, SpeechPartType::Continuation);
    assert_eq!(parts[2].speech_content, "As I was saying, it matters.");

    let seqs: Vec<u32> = parts.iter().map(|c| c.part_seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);

    Ok(())
}

/// Test that speeches directly under a first-level subdebate carry no second-level fields
#[test]
fn test_parse_withDirectSpeech_shouldLeaveSecondLevelEmpty() -> Result<()> {
    let xml = common::read_test_resource(common::FULL_SITTING)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let statement = transcript
        .parts
        .iter()
        .find(|p| p.speech_id() == "2025-10-09_hor_main_1_0_none_0")
        .expect("statement part should exist");

    assert_eq!(statement.context.debate_category, "STATEMENTS BY MEMBERS");
    assert_eq!(statement.context.subdebate_1_title, "Goldstein Electorate: Local Businesses");
    assert_eq!(statement.context.subdebate_2_title, None);
    assert_eq!(statement.context.subdebate_2_seq, None);
    assert_eq!(statement.context.bill_ids, None);

    let federation = transcript
        .parts
        .iter()
        .find(|p| p.context.chamber == Chamber::Federation)
        .expect("federation chamber part should exist");
    assert_eq!(federation.context.debate_seq, 0);
    assert_eq!(
        federation.content().map(|c| c.speech_content.as_str()),
        Some("Congratulations to the Logan netball club.")
    );

    Ok(())
}

/// Test that a subdebate covering two bills keeps both ids in document order
#[test]
fn test_parse_withTwoBills_shouldKeepBothBillIds() -> Result<()> {
    let xml = common::read_test_resource(common::TWO_BILLS)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    assert_eq!(transcript.parts.len(), 4);
    for part in &transcript.parts {
        assert_eq!(part.context.bill_ids, Some(vec!["r7346".to_string(), "r7347".to_string()]));
        assert_eq!(
            part.context.subdebate_1_info.as_deref(),
            Some("Repeal Net Zero Bill 2025\n\nNuclear Power Bill 2025")
        );
    }

    Ok(())
}

/// Test that consecutive bill subdebates each carry only their own bill id
#[test]
fn test_parse_withConsecutiveBills_shouldKeepBillIdsPerSubdebate() -> Result<()> {
    let xml = common::read_test_resource(common::CONSECUTIVE_BILLS)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    assert_eq!(transcript.parts.len(), 5);
    for part in &transcript.parts {
        let expected = match part.context.subdebate_1_seq {
            Some(0) => "r7346",
            Some(1) => "r7347",
            other => panic!("unexpected subdebate.1 sequence {:?}", other),
        };
        assert_eq!(part.context.bill_ids, Some(vec![expected.to_string()]));
    }

    let ids: Vec<String> = transcript.parts.iter().map(|p| p.part_id()).collect();
    assert_eq!(
        ids,
        vec![
            "2025-10-12_hor_main_0_0_0_0_0",
            "2025-10-12_hor_main_0_0_0_1_0",
            "2025-10-12_hor_main_0_1_none_0_0",
            "2025-10-12_hor_main_0_1_0_0_0",
            "2025-10-12_hor_main_0_1_1_0_0",
        ]
    );

    Ok(())
}

/// Test that speech numbering restarts in every second-level subdebate
#[test]
fn test_parse_withDirectSpeechAndTwoStages_shouldRestartSpeechSeq() -> Result<()> {
    let xml = common::read_test_resource(common::CONSECUTIVE_BILLS)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let second_bill: Vec<_> = transcript
        .parts
        .iter()
        .filter(|p| p.context.subdebate_1_seq == Some(1))
        .map(|p| {
            (
                p.speech_id(),
                p.context.subdebate_2_title.as_deref(),
                p.content().map(|c| c.speech_seq),
            )
        })
        .collect();

    assert_eq!(
        second_bill,
        vec![
            ("2025-10-12_hor_main_0_1_none_0".to_string(), None, Some(0)),
            ("2025-10-12_hor_main_0_1_0_0".to_string(), Some("Second Reading"), Some(0)),
            ("2025-10-12_hor_main_0_1_1_0".to_string(), Some("Consideration in Detail"), Some(0)),
        ]
    );

    Ok(())
}

/// Test that general and office interjections are handled differently
#[test]
fn test_parse_withGeneralAndOfficeInterjections_shouldAttributeOnlyOffice() -> Result<()> {
    let xml = common::read_test_resource(common::TWO_BILLS)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort)?;

    let parts: Vec<_> = transcript
        .parts
        .iter()
        .filter_map(|p| p.content())
        .map(|c| (c.talker_id.as_str(), c.speech_part_type, c.speech_content.as_str()))
        .collect();

    assert_eq!(
        parts,
        vec![
            ("e5d", SpeechPartType::Speech, "I support both bills."),
            ("", SpeechPartType::Interjection, ""),
            ("10000", SpeechPartType::Interjection, "Order!"),
            ("e5d", SpeechPartType::Continuation, "Thank you, Speaker."),
        ]
    );

    Ok(())
}

/// Test that a speech opening with an interjection aborts the document by default
#[test]
fn test_parse_withBrokenSpeechAndAbortPolicy_shouldFail() -> Result<()> {
    let xml = common::read_test_resource(common::BROKEN_SPEECH)?;
    let result = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::Abort);

    match result {
        Err(ParseError::Segmentation { location, source }) => {
            assert_eq!(location, "2025-10-11_hor_main_0_0_none_0");
            assert_eq!(source, SegmentationError::InterjectionBeforeSpeech);
        }
        other => panic!("expected a structural error, got {:?}", other.map(|t| t.parts.len())),
    }

    Ok(())
}

/// Test that the skip policy drops only the broken speech and keeps its sequence slot
#[test]
fn test_parse_withBrokenSpeechAndSkipPolicy_shouldKeepOtherSpeeches() -> Result<()> {
    let xml = common::read_test_resource(common::BROKEN_SPEECH)?;
    let transcript = parse_transcript(&xml, House::Hor, StructuralErrorPolicy::SkipSpeech)?;

    assert_eq!(transcript.rejected_speeches.len(), 1);
    assert_eq!(transcript.rejected_speeches[0].location, "2025-10-11_hor_main_0_0_none_0");
    assert_eq!(transcript.parts.len(), 1);
    assert_eq!(transcript.parts[0].speech_id(), "2025-10-11_hor_main_0_0_none_1");

    Ok(())
}

/// Test that the house is taken from the caller, not the document
#[test]
fn test_parse_withSenateHouse_shouldUseSenateIds() -> Result<()> {
    let xml = common::read_test_resource(common::TWO_BILLS)?;
    let transcript = parse_transcript(&xml, House::Senate, StructuralErrorPolicy::Abort)?;

    assert_eq!(transcript.house, House::Senate);
    assert!(transcript.parts.iter().all(|p| p.part_id().starts_with("2025-10-10_senate_main_")));

    Ok(())
}

/// Test that malformed markup is reported as an XML error
#[test]
fn test_parse_withMalformedMarkup_shouldFail() {
    let result = parse_transcript("<hansard><session.header>", House::Hor, StructuralErrorPolicy::Abort);
    assert!(matches!(result, Err(ParseError::Xml(_))));
}
