use super::*;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub item_prefix: String,
    pub min_header_chars: usize,
    pub mode: AssemblerMode,
    pub lookahead_window: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            item_prefix: DEFAULT_ITEM_PREFIX.to_string(),
            min_header_chars: MIN_HEADER_CHARS,
            mode: AssemblerMode::Sequential,
            lookahead_window: LOOKAHEAD_WINDOW,
        }
    }
}

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub accepted: Vec<AcceptedQuestion>,
    pub counts: ParseCounts,
    pub warnings: Vec<String>,
}

/// Runs normalize → classify → assemble → validate over raw document text.
pub fn parse_document(raw: &str, config: &ParserConfig) -> Result<ParseOutcome> {
    let classifier = LineClassifier::new(&config.item_prefix)?;

    let document = normalize_document(raw);
    let classified = classifier.classify_lines(&document.lines);
    let assembly = assemble_records(&classified, config.mode, config.lookahead_window);
    let candidate_count = assembly.candidates.len();
    let validation = validate_candidates(assembly.candidates, config.min_header_chars);

    let mut warnings = Vec::<String>::new();
    for key in &validation.rejected_short_header {
        warn!(pq_number = %key, min_chars = config.min_header_chars, "rejected record with short header");
        warnings.push(format!(
            "{key}: question text missing or shorter than {} characters",
            config.min_header_chars
        ));
    }
    for key in &validation.duplicates {
        warn!(pq_number = %key, "dropped duplicate record");
        warnings.push(format!("{key}: duplicate item key dropped, first occurrence kept"));
    }
    if assembly.index_artifact_count > 0 {
        info!(
            count = assembly.index_artifact_count,
            "ignored index-table boundary markers"
        );
    }

    let counts = ParseCounts {
        raw_line_count: document.raw_line_count,
        normalized_line_count: document.lines.len(),
        dehyphenation_merges: document.dehyphenation_merges,
        skipped_line_count: assembly.skipped_line_count,
        preamble_line_count: assembly.preamble_line_count,
        boundary_marker_count: assembly.boundary_marker_count,
        index_artifact_count: assembly.index_artifact_count,
        candidate_count,
        rejected_short_header_count: validation.rejected_short_header.len(),
        duplicate_count: validation.duplicates.len(),
        accepted_count: validation.accepted.len(),
        priority_count: validation.accepted.iter().filter(|q| q.is_priority).count(),
        on_site_count: validation
            .accepted
            .iter()
            .filter(|q| q.requires_on_site)
            .count(),
    };

    Ok(ParseOutcome {
        accepted: validation.accepted,
        counts,
        warnings,
    })
}

pub fn run(args: ParseArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = run_id_for("parse", started_ts);

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| cache_root.join(ACCEPTED_QUESTIONS_FILE));
    let parse_manifest_path = args.parse_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("parse_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(input = %args.input.display(), run_id = %run_id, "starting parse");

    let raw_bytes =
        fs::read(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;
    let raw = String::from_utf8_lossy(&raw_bytes);
    let source_sha256 = sha256_file(&args.input)?;

    let config = ParserConfig {
        item_prefix: args.item_prefix.clone(),
        min_header_chars: args.min_header_chars,
        mode: args.assembler,
        lookahead_window: args.lookahead_window,
    };
    let outcome = parse_document(&raw, &config)?;

    let drift = match args.compare_with.as_deref() {
        Some(previous_path) => {
            let previous: Vec<AcceptedQuestion> = read_json(previous_path)?;
            let report = compute_drift(previous_path, &previous, &outcome.accepted);
            info!(
                added = report.added.len(),
                removed = report.removed.len(),
                changed = report.changed.len(),
                "computed drift against previous question set"
            );
            Some(report)
        }
        None => None,
    };

    write_json_pretty(&output_path, &outcome.accepted)?;
    info!(path = %output_path.display(), accepted = outcome.accepted.len(), "wrote accepted questions");

    let manifest = ParseRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_parse_command(&args),
        assembler_mode: config.mode.as_str().to_string(),
        item_prefix: config.item_prefix.clone(),
        min_header_chars: config.min_header_chars,
        lookahead_window: config.lookahead_window,
        paths: ParsePaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            input_path: args.input.display().to_string(),
            output_path: output_path.display().to_string(),
        },
        source: InputSource {
            path: args.input.display().to_string(),
            sha256: source_sha256,
        },
        counts: outcome.counts.clone(),
        drift: drift.clone(),
        warnings: outcome.warnings.clone(),
    };
    write_json_pretty(&parse_manifest_path, &manifest)?;
    info!(path = %parse_manifest_path.display(), "wrote parse run manifest");

    print_parse_summary(&outcome, drift.as_ref());

    Ok(())
}

fn render_parse_command(args: &ParseArgs) -> String {
    let mut parts = vec![
        "pqtool parse".to_string(),
        format!("--cache-root {}", args.cache_root.display()),
        format!("--input {}", args.input.display()),
        format!("--item-prefix {}", args.item_prefix),
        format!("--min-header-chars {}", args.min_header_chars),
        format!("--assembler {}", args.assembler.as_str()),
        format!("--lookahead-window {}", args.lookahead_window),
    ];
    if let Some(output) = &args.output {
        parts.push(format!("--output {}", output.display()));
    }
    if let Some(previous) = &args.compare_with {
        parts.push(format!("--compare-with {}", previous.display()));
    }
    parts.join(" ")
}

fn print_parse_summary(outcome: &ParseOutcome, drift: Option<&DriftReport>) {
    let counts = &outcome.counts;
    println!("Parse summary");
    println!("  lines read:            {}", counts.raw_line_count);
    println!("  lines after normalize: {}", counts.normalized_line_count);
    println!("  boundary markers:      {}", counts.boundary_marker_count);
    println!("  index artifacts:       {}", counts.index_artifact_count);
    println!("  candidate records:     {}", counts.candidate_count);
    println!("  accepted:              {}", counts.accepted_count);
    println!("  rejected (short text): {}", counts.rejected_short_header_count);
    println!("  duplicates dropped:    {}", counts.duplicate_count);
    println!("  priority / on-site:    {} / {}", counts.priority_count, counts.on_site_count);

    if let Some(drift) = drift {
        println!(
            "  drift vs {}: +{} -{} ~{} ={}",
            drift.previous_path,
            drift.added.len(),
            drift.removed.len(),
            drift.changed.len(),
            drift.unchanged_count
        );
    }

    if !outcome.warnings.is_empty() {
        println!("Needs review ({}):", outcome.warnings.len());
        for warning in &outcome.warnings {
            println!("  - {warning}");
        }
    }
}
