use std::path::PathBuf;

use super::*;

fn classifier() -> LineClassifier {
    LineClassifier::new(DEFAULT_ITEM_PREFIX).expect("classifier should compile")
}

fn sample_document() -> String {
    [
        "USOAP CMA 2024 Protocol Questions",
        "Air Navigation Services (ANS)",
        "PQ No.",
        "Protocol Question",
        "Guidance for Review of Evidence",
        "ICAO References",
        "CE-2",
        "7.001",
        "Has the State promulgated regulations for air traffic services?",
        "√",
        "Review the regulations and verify that they are consistent with Annex 11.",
        "Annex 11, Chapter 2",
        "Doc 4444",
        "Page 3",
        "7.002",
        "Has the State established a process to certify",
        "aeronautical information service providers?",
        "Verify that the certification procedure is docu-",
        "mented and applied.",
        "Annex 15, 2.1",
        "7.003",
        "CE-4",
        "Does the State ensure that MET services are provided?",
        "On-site verification",
        "Check the arrangements with the MET provider.",
        "Annex 3",
    ]
    .join("\n")
}

#[test]
fn normalize_strips_control_and_format_characters() {
    let raw = "\u{feff}  Has the\u{200b} State\t established \u{7}rules? \r\n\n\u{c}Page 2";
    let document = normalize_document(raw);

    let texts = document
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(texts, vec!["Has the State established rules?", "Page 2"]);
    assert_eq!(document.lines[0].index, 0);
    assert_eq!(document.lines[1].index, 3);
}

#[test]
fn normalize_empty_input_yields_no_lines() {
    let document = normalize_document("");
    assert!(document.lines.is_empty());
    assert_eq!(document.raw_line_count, 0);
}

#[test]
fn normalize_joins_words_hyphenated_across_lines() {
    let document = normalize_document("Verify the regu-\nlation is published\nATS-\nATM");
    let texts = document
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(texts, vec!["Verify the regulation is published", "ATS-", "ATM"]);
    assert_eq!(document.dehyphenation_merges, 1);
}

#[test]
fn classify_line_respects_tag_priority() {
    let classifier = classifier();

    assert_eq!(classifier.classify_line("Page 12"), LineTag::Skip);
    assert_eq!(classifier.classify_line("PPQ"), LineTag::Skip);
    assert_eq!(classifier.classify_line("7.001"), LineTag::ItemBoundary);
    assert_ne!(classifier.classify_line("7.0011"), LineTag::ItemBoundary);
    assert_eq!(classifier.classify_line("8.001"), LineTag::ReferenceCitation);
    assert_eq!(classifier.classify_line("CE-3"), LineTag::CriticalElementTag);
    assert_eq!(classifier.classify_line("ce 5"), LineTag::CriticalElementTag);
    assert_eq!(classifier.classify_line("✓"), LineTag::PriorityMarker);
    assert_eq!(classifier.classify_line("OSV"), LineTag::OnSiteMarker);
    assert_eq!(classifier.classify_line("Annex 11, 3.3.1"), LineTag::ReferenceCitation);
    assert_eq!(classifier.classify_line("Doc 9859"), LineTag::ReferenceCitation);
    assert_eq!(
        classifier.classify_line("Review the SAR agreements"),
        LineTag::GuidanceStart
    );
    assert_eq!(
        classifier.classify_line("Has the State established an AIS?"),
        LineTag::QuestionStart
    );
    assert_eq!(classifier.classify_line("Reviewed annually"), LineTag::Content);
    assert_eq!(classifier.classify_line("and implemented"), LineTag::Content);
}

#[test]
fn classifier_honours_custom_item_prefix() {
    let classifier = LineClassifier::new("8").expect("classifier should compile");
    assert_eq!(classifier.classify_line("8.101"), LineTag::ItemBoundary);
    assert_ne!(classifier.classify_line("7.101"), LineTag::ItemBoundary);
}

#[test]
fn critical_element_label_is_normalized() {
    let classifier = classifier();
    assert_eq!(classifier.critical_element_label("CE – 6"), Some("CE-6".to_string()));
    assert_eq!(classifier.critical_element_label("CE-9"), None);
}

#[test]
fn parse_document_builds_records_with_sections_and_flags() {
    let outcome =
        parse_document(&sample_document(), &ParserConfig::default()).expect("parse should succeed");

    assert_eq!(outcome.accepted.len(), 3);

    let first = &outcome.accepted[0];
    assert_eq!(first.pq_number, "7.001");
    assert_eq!(
        first.question_en,
        "Has the State promulgated regulations for air traffic services?"
    );
    assert!(first.is_priority);
    assert!(!first.requires_on_site);
    assert!(first.guidance_en.starts_with("Review the regulations"));
    assert_eq!(first.references, "Annex 11, Chapter 2 Doc 4444");
    assert_eq!(first.critical_element.as_deref(), Some("CE-2"));

    let second = &outcome.accepted[1];
    assert_eq!(
        second.question_en,
        "Has the State established a process to certify aeronautical information service providers?"
    );
    assert_eq!(
        second.guidance_en,
        "Verify that the certification procedure is documented and applied."
    );
    assert_eq!(second.critical_element.as_deref(), Some("CE-2"));

    let third = &outcome.accepted[2];
    assert_eq!(third.critical_element.as_deref(), Some("CE-4"));
    assert!(third.requires_on_site);

    assert_eq!(outcome.counts.skipped_line_count, 7);
    assert_eq!(outcome.counts.dehyphenation_merges, 1);
}

#[test]
fn critical_element_tag_is_sticky_until_overridden() {
    let raw = [
        "CE-5",
        "7.010",
        "Has the State published its ANS regulations?",
        "7.011",
        "Has the State designated a MET authority?",
        "7.012",
        "CE-7",
        "Has the State resolved identified deficiencies?",
    ]
    .join("\n");

    let outcome = parse_document(&raw, &ParserConfig::default()).expect("parse should succeed");
    let tags = outcome
        .accepted
        .iter()
        .map(|question| question.critical_element.clone().unwrap_or_default())
        .collect::<Vec<String>>();
    assert_eq!(tags, vec!["CE-5", "CE-5", "CE-7"]);
}

#[test]
fn priority_marker_outside_header_is_ignored() {
    let raw = [
        "7.020",
        "Has the State established ATS units?",
        "Verify the list of ATS units.",
        "√",
    ]
    .join("\n");

    let outcome = parse_document(&raw, &ParserConfig::default()).expect("parse should succeed");
    assert_eq!(outcome.accepted.len(), 1);
    assert!(!outcome.accepted[0].is_priority);
}

#[test]
fn two_boundaries_with_following_record_yield_two_ordered_questions() {
    let mut lines = vec![
        "7.001".to_string(),
        "Has the State established a legislative framework for ANS?".to_string(),
        "7.002".to_string(),
        "Has the State established an ATS authority".to_string(),
    ];
    for index in 0..19 {
        lines.push(format!("continuation line {index} of the second record"));
    }

    let outcome =
        parse_document(&lines.join("\n"), &ParserConfig::default()).expect("parse should succeed");
    let keys = outcome
        .accepted
        .iter()
        .map(|question| question.pq_number.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(keys, vec!["7.001", "7.002"]);
    assert!(outcome.accepted.iter().all(|q| !q.question_en.is_empty()));
}

#[test]
fn validator_rejects_short_headers_and_keeps_first_duplicate() {
    let candidates = vec![
        CandidateRecord {
            item_key: "7.005".to_string(),
            header_text: "Has the State issued AIS procedures?".to_string(),
            ..CandidateRecord::default()
        },
        CandidateRecord {
            item_key: "7.002".to_string(),
            header_text: "Yes".to_string(),
            ..CandidateRecord::default()
        },
        CandidateRecord {
            item_key: "7.005".to_string(),
            header_text: "Duplicate occurrence of the same question".to_string(),
            ..CandidateRecord::default()
        },
        CandidateRecord {
            item_key: "7.003".to_string(),
            header_text: "Has the State approved MET procedures?".to_string(),
            ..CandidateRecord::default()
        },
    ];

    let outcome = validate_candidates(candidates, MIN_HEADER_CHARS);
    let keys = outcome
        .accepted
        .iter()
        .map(|question| question.pq_number.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(keys, vec!["7.003", "7.005"]);
    assert_eq!(outcome.accepted[1].question_en, "Has the State issued AIS procedures?");
    assert_eq!(outcome.rejected_short_header, vec!["7.002"]);
    assert_eq!(outcome.duplicates, vec!["7.005"]);
}

#[test]
fn validator_min_header_boundary_is_inclusive() {
    let make = |header: &str| CandidateRecord {
        item_key: "7.001".to_string(),
        header_text: header.to_string(),
        ..CandidateRecord::default()
    };

    let exact = validate_candidates(vec![make("abcdefghij")], 10);
    assert_eq!(exact.accepted.len(), 1);

    let short = validate_candidates(vec![make("abcdefghi")], 10);
    assert!(short.accepted.is_empty());
    assert_eq!(short.rejected_short_header.len(), 1);
}

#[test]
fn validator_sorts_numerically_not_lexically() {
    assert_eq!(item_sort_key("7.010"), Some((7, 10)));
    assert!(item_sort_key("7.01") < item_sort_key("7.100"));
    assert_eq!(item_sort_key("CNS"), None);

    let candidates = ["7.100", "7.020", "7.003"]
        .iter()
        .map(|key| CandidateRecord {
            item_key: key.to_string(),
            header_text: "Has the State established procedures?".to_string(),
            ..CandidateRecord::default()
        })
        .collect::<Vec<CandidateRecord>>();
    let outcome = validate_candidates(candidates, MIN_HEADER_CHARS);
    let keys = outcome
        .accepted
        .iter()
        .map(|question| question.pq_number.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(keys, vec!["7.003", "7.020", "7.100"]);
}

#[test]
fn validator_accepts_empty_input() {
    let outcome = validate_candidates(Vec::new(), MIN_HEADER_CHARS);
    assert!(outcome.accepted.is_empty());
    assert!(outcome.duplicates.is_empty());
}

#[test]
fn parse_is_deterministic_and_output_is_unique_and_sorted() {
    let mut raw = sample_document();
    raw.push_str("\n7.001\nHas the State promulgated a second copy of this question?");

    let first = parse_document(&raw, &ParserConfig::default()).expect("parse should succeed");
    let second = parse_document(&raw, &ParserConfig::default()).expect("parse should succeed");
    assert_eq!(first.accepted, second.accepted);
    assert_eq!(first.counts.duplicate_count, 1);

    let keys = first
        .accepted
        .iter()
        .filter_map(|question| item_sort_key(&question.pq_number))
        .collect::<Vec<(u32, u32)>>();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn look_ahead_mode_drops_index_table_markers() {
    let raw = [
        "7.001",
        "7.002",
        "7.003",
        "Page 1",
        "7.001",
        "Has the State established ATS airspace classification?",
        "7.002",
        "Has the State published aeronautical charts?",
    ]
    .join("\n");

    let sequential =
        parse_document(&raw, &ParserConfig::default()).expect("parse should succeed");
    assert_eq!(sequential.counts.candidate_count, 5);
    assert_eq!(sequential.counts.rejected_short_header_count, 3);

    let look_ahead = parse_document(
        &raw,
        &ParserConfig {
            mode: AssemblerMode::LookAhead,
            ..ParserConfig::default()
        },
    )
    .expect("parse should succeed");
    assert_eq!(look_ahead.counts.index_artifact_count, 3);
    assert_eq!(look_ahead.counts.candidate_count, 2);
    assert_eq!(look_ahead.accepted.len(), 2);
    assert_eq!(look_ahead.accepted[0].pq_number, "7.001");
}

#[test]
fn look_ahead_window_limits_the_scan() {
    let mut lines = vec!["7.001".to_string()];
    lines.extend((0..3).map(|index| format!("CE-{}", index + 1)));
    lines.push("7.002".to_string());
    lines.push("Has the State approved ATS procedures?".to_string());

    let classified = classifier().classify_lines(&normalize_document(&lines.join("\n")).lines);

    let narrow = assemble_records(&classified, AssemblerMode::LookAhead, 2);
    assert_eq!(narrow.index_artifact_count, 0);

    let wide = assemble_records(&classified, AssemblerMode::LookAhead, 6);
    assert_eq!(wide.index_artifact_count, 1);
}

#[test]
fn preamble_lines_before_first_boundary_are_counted() {
    let raw = "Introduction text\nMore preamble\n7.001\nHas the State designated an ANS authority?";
    let outcome = parse_document(raw, &ParserConfig::default()).expect("parse should succeed");
    assert_eq!(outcome.counts.preamble_line_count, 2);
    assert_eq!(outcome.accepted.len(), 1);
}

#[test]
fn drift_reports_added_removed_and_changed_keys() {
    let question = |key: &str, text: &str| AcceptedQuestion {
        pq_number: key.to_string(),
        question_en: text.to_string(),
        ..AcceptedQuestion::default()
    };
    let previous = vec![
        question("7.001", "Has the State established an ATS authority?"),
        question("7.002", "Has the State published an AIP?"),
        question("7.003", "Has the State designated a MET authority?"),
    ];
    let current = vec![
        question("7.001", "Has the State established an ATS authority?"),
        question("7.003", "Has the State designated a meteorological authority?"),
        question("7.004", "Has the State established SAR services?"),
    ];

    let report = compute_drift(&PathBuf::from("previous.json"), &previous, &current);
    assert_eq!(report.added, vec!["7.004"]);
    assert_eq!(report.removed, vec!["7.002"]);
    assert_eq!(report.changed, vec!["7.003"]);
    assert_eq!(report.unchanged_count, 1);
}

#[test]
fn run_writes_artifact_and_manifest() {
    let temp = tempfile::tempdir().expect("temp dir");
    let input = temp.path().join("pq.txt");
    fs::write(&input, sample_document()).expect("write input");

    let args = ParseArgs {
        cache_root: temp.path().join("cache"),
        input,
        output: None,
        parse_manifest_path: Some(temp.path().join("parse_manifest.json")),
        compare_with: None,
        item_prefix: DEFAULT_ITEM_PREFIX.to_string(),
        min_header_chars: MIN_HEADER_CHARS,
        assembler: AssemblerMode::Sequential,
        lookahead_window: LOOKAHEAD_WINDOW,
    };
    run(args).expect("parse run should succeed");

    let accepted: Vec<AcceptedQuestion> =
        read_json(&temp.path().join("cache").join("accepted_questions.json"))
            .expect("artifact should be readable");
    assert_eq!(accepted.len(), 3);

    let manifest: serde_json::Value =
        read_json(&temp.path().join("parse_manifest.json")).expect("manifest should be readable");
    assert_eq!(manifest["status"], "completed");
    assert_eq!(manifest["counts"]["accepted_count"], 3);
    assert_eq!(manifest["source"]["sha256"].as_str().map(str::len), Some(64));
}
