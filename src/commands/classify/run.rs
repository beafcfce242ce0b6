use super::*;

/// Loads questions from an artifact when given, else from the persisted
/// questionnaire of `kind`. Returns the questions and a source label.
pub fn load_question_source(
    questions_path: Option<&Path>,
    db_path: &Path,
    kind: &str,
) -> Result<(Vec<AcceptedQuestion>, String)> {
    if let Some(path) = questions_path {
        let questions: Vec<AcceptedQuestion> = read_json(path)?;
        info!(path = %path.display(), count = questions.len(), "loaded question artifact");
        return Ok((questions, path.display().to_string()));
    }

    let connection = open_store(db_path)?;
    let questionnaire_id = primary_questionnaire_id(&connection, kind)?
        .with_context(|| format!("no questionnaire of kind '{kind}' in {}", db_path.display()))?;
    let questions = load_persisted_questions(&connection, questionnaire_id)?;
    info!(
        db = %db_path.display(),
        questionnaire_id,
        count = questions.len(),
        "loaded persisted questions"
    );
    Ok((
        questions,
        format!("{}#questionnaire={questionnaire_id}", db_path.display()),
    ))
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let started_ts = Utc::now();
    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "classification_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let rules = load_rules(args.rules.as_deref())?;
    let classifier = TaxonomyClassifier::from_rules(&rules)?;

    let (questions, source) =
        load_question_source(args.questions.as_deref(), &db_path, &args.questionnaire_kind)?;
    let decisions = classifier.classify_all(&questions);
    let report = ClassificationReport::from_decisions(&source, decisions);

    write_json_pretty(&report_path, &report)?;
    info!(
        path = %report_path.display(),
        classified = report.classified_count(),
        unclassified = report.unclassified.len(),
        "wrote classification report"
    );

    print_classification_summary(&report);

    Ok(())
}
