use super::*;

pub fn run(args: MigrateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = run_id_for("migrate", started_ts);

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let manifest_path = args.migration_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "migration_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(db = %db_path.display(), run_id = %run_id, dry_run = args.dry_run, "starting migrate");

    let fallback = args
        .fallback_category
        .as_deref()
        .map(|code| {
            category_by_code(code)
                .with_context(|| format!("unknown fallback category '{code}'"))
        })
        .transpose()?;
    let rules = load_rules(args.rules.as_deref())?;
    let classifier = TaxonomyClassifier::from_rules(&rules)?;

    let mut connection = open_store(&db_path)?;
    let (questions, question_source) = load_migration_source(
        &connection,
        args.questions.as_deref(),
        &db_path,
        &args.questionnaire_kind,
    )?;

    let decisions = classifier.classify_all(&questions);
    let grouped = group_by_category(&questions, &decisions, fallback);
    let report = ClassificationReport::from_decisions(&question_source, decisions);
    let plan = MigrationPlan {
        questionnaire_kind: args.questionnaire_kind.clone(),
        grouped,
    };

    let mut warnings = Vec::new();
    if !report.unclassified.is_empty() {
        let message = match fallback {
            Some(category) => format!(
                "{} unclassified question(s) filed under {}",
                report.unclassified.len(),
                category.code
            ),
            None => {
                let responses = match primary_questionnaire_id(&connection, &args.questionnaire_kind)? {
                    Some(questionnaire_id) => {
                        count_responses_for_keys(&connection, questionnaire_id, &report.unclassified)?
                    }
                    None => 0,
                };
                dropped_questions_warning(report.unclassified.len(), responses)
            }
        };
        warn!(unclassified = report.unclassified.len(), "{message}");
        warnings.push(message);
    }
    if !report.low_confidence.is_empty() {
        warnings.push(format!(
            "{} question(s) placed by score tie",
            report.low_confidence.len()
        ));
    }

    let mut ledger = StepLedger::default();
    let result = migrate_store(&mut connection, &plan, args.dry_run, &mut ledger);

    let mut manifest = MigrationRunManifest {
        manifest_version: 1,
        run_id,
        status: String::new(),
        dry_run: args.dry_run,
        started_at,
        updated_at: now_utc_string(),
        command: render_migrate_command(&args),
        db_path: db_path.display().to_string(),
        questionnaire_kind: args.questionnaire_kind.clone(),
        question_source,
        completed_steps: ledger.completed.clone(),
        failed_step: ledger.failed_step.clone(),
        failure_reason: None,
        before: Vec::new(),
        after: Vec::new(),
        classified_count: report.classified_count(),
        placeholder_count: 0,
        unclassified: report.unclassified.clone(),
        low_confidence: report.low_confidence.clone(),
        warnings,
    };

    match result {
        Ok(outcome) => {
            manifest.status = if outcome.committed {
                "completed".to_string()
            } else {
                "dry_run_rolled_back".to_string()
            };
            manifest.before = outcome.before.clone();
            manifest.after = outcome.after.clone();
            manifest.placeholder_count = outcome.placeholder_count;
            write_json_pretty(&manifest_path, &manifest)?;
            info!(path = %manifest_path.display(), "wrote migration run manifest");

            print_migration_summary(&manifest, &outcome);
            Ok(())
        }
        Err(err) => {
            manifest.status = "rolled_back".to_string();
            manifest.failure_reason = Some(format!("{err:#}"));
            write_json_pretty(&manifest_path, &manifest)?;
            error!(
                path = %manifest_path.display(),
                last_completed_step = ledger.last_completed().unwrap_or("none"),
                "migration rolled back"
            );
            Err(err)
        }
    }
}

pub(super) fn dropped_questions_warning(questions: usize, responses: usize) -> String {
    format!(
        "{questions} unclassified question(s) and {responses} response(s) to them will be removed; \
         rerun with --fallback-category <CODE> to keep them"
    )
}

/// Reads the question source before any teardown happens.
fn load_migration_source(
    connection: &Connection,
    questions_path: Option<&Path>,
    db_path: &Path,
    kind: &str,
) -> Result<(Vec<AcceptedQuestion>, String)> {
    let Some(questionnaire_id) = primary_questionnaire_id(connection, kind)? else {
        bail!(
            "no questionnaire of kind '{kind}' in {}; run seed first",
            db_path.display()
        );
    };

    if let Some(path) = questions_path {
        let questions: Vec<AcceptedQuestion> = read_json(path)?;
        info!(path = %path.display(), count = questions.len(), "loaded question artifact");
        return Ok((questions, path.display().to_string()));
    }

    let questions = load_persisted_questions(connection, questionnaire_id)?;
    info!(questionnaire_id, count = questions.len(), "loaded persisted questions");
    Ok((
        questions,
        format!("{}#questionnaire={questionnaire_id}", db_path.display()),
    ))
}

fn render_migrate_command(args: &MigrateArgs) -> String {
    let mut parts = vec![
        "pqtool migrate".to_string(),
        format!("--cache-root {}", args.cache_root.display()),
        format!("--questionnaire-kind {}", args.questionnaire_kind),
    ];
    if let Some(db_path) = &args.db_path {
        parts.push(format!("--db-path {}", db_path.display()));
    }
    if let Some(questions) = &args.questions {
        parts.push(format!("--questions {}", questions.display()));
    }
    if let Some(rules) = &args.rules {
        parts.push(format!("--rules {}", rules.display()));
    }
    if let Some(fallback) = &args.fallback_category {
        parts.push(format!("--fallback-category {fallback}"));
    }
    if args.dry_run {
        parts.push("--dry-run".to_string());
    }
    parts.join(" ")
}

fn print_migration_summary(manifest: &MigrationRunManifest, outcome: &MigrationOutcome) {
    println!(
        "Migration summary (questionnaire {}, {})",
        outcome.questionnaire_id, manifest.status
    );
    println!("  questions migrated:  {}", outcome.migrated_count);
    println!("  placeholders:        {}", outcome.placeholder_count);
    println!("  duplicates removed:  {}", outcome.duplicates_removed);
    for record in &manifest.completed_steps {
        println!("  {:<38} {}", record.step, record.affected_rows);
    }

    println!("  before:");
    for count in &outcome.before {
        println!("    {:<10} {}", count.code, count.count);
    }
    println!("  after:");
    for count in &outcome.after {
        println!("    {:<10} {}", count.code, count.count);
    }

    if !manifest.unclassified.is_empty() {
        println!(
            "Unclassified, needs manual mapping ({}): {}",
            manifest.unclassified.len(),
            manifest.unclassified.join(", ")
        );
    }
    for warning in &manifest.warnings {
        println!("  - {warning}");
    }
}
