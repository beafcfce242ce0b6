use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::cli::SeedArgs;
use crate::commands::parse::ACCEPTED_QUESTIONS_FILE;
use crate::model::{AcceptedQuestion, InputSource, SeedCounts, SeedRunManifest};
use crate::store::{default_db_path, open_store, primary_questionnaire_id};
use crate::taxonomy::{
    ANS_QUESTIONNAIRE_CODE, ANS_QUESTIONNAIRE_DESCRIPTION_EN, ANS_QUESTIONNAIRE_DESCRIPTION_FR,
    ANS_QUESTIONNAIRE_TITLE_EN, ANS_QUESTIONNAIRE_TITLE_FR, ANS_QUESTIONNAIRE_VERSION,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, run_id_for, sha256_file, utc_compact_string,
    write_json_pretty,
};

/// Category for questions that carried no critical element tag.
const UNASSIGNED_CATEGORY: &str = "UNASSIGNED";

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub questionnaire_id: i64,
    pub questionnaire_created: bool,
    pub counts: SeedCounts,
}

pub fn run(args: SeedArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = run_id_for("seed", started_ts);

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let questions_path = args
        .questions
        .clone()
        .unwrap_or_else(|| args.cache_root.join(ACCEPTED_QUESTIONS_FILE));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(questions = %questions_path.display(), db = %db_path.display(), run_id = %run_id, "starting seed");

    let questions: Vec<AcceptedQuestion> = read_json(&questions_path)?;
    let source_sha256 = sha256_file(&questions_path)?;

    let mut connection = open_store(&db_path)?;
    let outcome = seed_questions(&mut connection, &args.questionnaire_kind, &questions)?;

    let manifest = SeedRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        db_path: db_path.display().to_string(),
        questionnaire_kind: args.questionnaire_kind.clone(),
        questionnaire_id: outcome.questionnaire_id,
        questionnaire_created: outcome.questionnaire_created,
        source: InputSource {
            path: questions_path.display().to_string(),
            sha256: source_sha256,
        },
        counts: outcome.counts.clone(),
    };
    let manifest_path =
        manifest_dir.join(format!("seed_run_{}.json", utc_compact_string(started_ts)));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote seed run manifest");

    println!("Seed summary (questionnaire {})", outcome.questionnaire_id);
    println!("  input questions:    {}", outcome.counts.input_count);
    println!("  categories created: {}", outcome.counts.categories_created);
    println!("  questions created:  {}", outcome.counts.questions_created);
    println!("  already present:    {}", outcome.counts.questions_skipped);

    Ok(())
}

/// Persists an accepted question set as a flat, CE-grouped hierarchy.
///
/// Re-runnable: the questionnaire, its categories and each question are
/// looked up before being created.
pub fn seed_questions(
    connection: &mut Connection,
    kind: &str,
    questions: &[AcceptedQuestion],
) -> Result<SeedOutcome> {
    let tx = connection.transaction()?;
    let mut counts = SeedCounts {
        input_count: questions.len(),
        ..SeedCounts::default()
    };

    let (questionnaire_id, questionnaire_created) = match primary_questionnaire_id(&tx, kind)? {
        Some(id) => (id, false),
        None => {
            let now = now_utc_string();
            tx.execute(
                "INSERT INTO questionnaires(kind, code, version, title_en, title_fr, description_en, description_fr, created_at, updated_at)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    kind,
                    ANS_QUESTIONNAIRE_CODE,
                    ANS_QUESTIONNAIRE_VERSION,
                    ANS_QUESTIONNAIRE_TITLE_EN,
                    ANS_QUESTIONNAIRE_TITLE_FR,
                    ANS_QUESTIONNAIRE_DESCRIPTION_EN,
                    ANS_QUESTIONNAIRE_DESCRIPTION_FR,
                    now
                ],
            )
            .context("failed to insert questionnaire")?;
            (tx.last_insert_rowid(), true)
        }
    };

    let mut category_ids = HashMap::<String, i64>::new();
    {
        let mut find_category = tx.prepare(
            "SELECT id FROM categories WHERE questionnaire_id = ?1 AND code = ?2 ORDER BY id LIMIT 1",
        )?;
        let mut insert_category = tx.prepare(
            "INSERT INTO categories(questionnaire_id, code, name_en, name_fr, sort_order)
             VALUES(?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut find_question = tx.prepare(
            "SELECT id FROM questions
             WHERE questionnaire_id = ?1 AND COALESCE(source_pq_number, pq_number) = ?2
             LIMIT 1",
        )?;
        let mut insert_question = tx.prepare(
            "INSERT INTO questions(
               questionnaire_id, category_id, pq_number, source_pq_number, question_en,
               question_fr, guidance_en, guidance_fr, is_priority, requires_on_site,
               critical_element, is_placeholder, sort_order
             ) VALUES(?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11)",
        )?;
        let mut insert_reference = tx.prepare(
            "INSERT INTO question_references(question_id, reference_text) VALUES(?1, ?2)",
        )?;

        for (position, question) in questions.iter().enumerate() {
            // Renumbered rows keep their item key in source_pq_number.
            let existing = find_question
                .query_row(params![questionnaire_id, question.pq_number], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()?;
            if existing.is_some() {
                counts.questions_skipped += 1;
                continue;
            }

            let code = question
                .critical_element
                .clone()
                .unwrap_or_else(|| UNASSIGNED_CATEGORY.to_string());

            let category_id = match category_ids.get(&code) {
                Some(id) => *id,
                None => {
                    let existing = find_category
                        .query_row(params![questionnaire_id, code], |row| row.get::<_, i64>(0))
                        .optional()?;
                    let id = match existing {
                        Some(id) => id,
                        None => {
                            let (name_en, name_fr, sort_order) = seed_category_names(&code);
                            insert_category
                                .execute(params![questionnaire_id, code, name_en, name_fr, sort_order])
                                .with_context(|| format!("failed to insert category {code}"))?;
                            counts.categories_created += 1;
                            tx.last_insert_rowid()
                        }
                    };
                    category_ids.insert(code.clone(), id);
                    id
                }
            };

            insert_question
                .execute(params![
                    questionnaire_id,
                    category_id,
                    question.pq_number,
                    question.question_en,
                    question.question_fr,
                    question.guidance_en,
                    question.guidance_fr,
                    question.is_priority as i64,
                    question.requires_on_site as i64,
                    question.critical_element,
                    (position + 1) as i64
                ])
                .with_context(|| format!("failed to insert question {}", question.pq_number))?;
            counts.questions_created += 1;
            let question_id = tx.last_insert_rowid();

            if !question.references.trim().is_empty() {
                insert_reference.execute(params![question_id, question.references])?;
                counts.references_created += 1;
            }
        }
    }

    tx.commit()?;

    info!(
        questionnaire_id,
        questionnaire_created,
        categories_created = counts.categories_created,
        questions_created = counts.questions_created,
        questions_skipped = counts.questions_skipped,
        "seeded question set"
    );

    Ok(SeedOutcome {
        questionnaire_id,
        questionnaire_created,
        counts,
    })
}

fn seed_category_names(code: &str) -> (String, String, i64) {
    match code.strip_prefix("CE-").and_then(|n| n.parse::<i64>().ok()) {
        Some(number) => (
            format!("Critical Element {number}"),
            format!("Élément crucial {number}"),
            number,
        ),
        None => (code.to_string(), code.to_string(), 99),
    }
}
