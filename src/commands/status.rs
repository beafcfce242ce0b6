use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{
    category_breakdown, configure_connection, count_rows, default_db_path,
    primary_questionnaire_id, questionnaire_ids_of_kind,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub orphaned_responses: i64,
    pub orphaned_references: i64,
    pub unlinked_findings: i64,
    pub duplicate_questionnaires: i64,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_responses == 0
            && self.orphaned_references == 0
            && self.duplicate_questionnaires == 0
    }
}

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    for prefix in ["parse_run_", "seed_run_", "migration_run_"] {
        match latest_manifest(&manifest_dir, prefix)? {
            Some(path) => log_manifest(&path)?,
            None => warn!(dir = %manifest_dir.display(), prefix, "no manifest found"),
        }
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;

    let questionnaires = count_or_warn(&connection, "SELECT COUNT(*) FROM questionnaires");
    let categories = count_or_warn(&connection, "SELECT COUNT(*) FROM categories");
    let questions = count_or_warn(&connection, "SELECT COUNT(*) FROM questions");
    let placeholders = count_or_warn(
        &connection,
        "SELECT COUNT(*) FROM questions WHERE is_placeholder = 1",
    );
    let responses = count_or_warn(&connection, "SELECT COUNT(*) FROM assessment_responses");
    let findings = count_or_warn(&connection, "SELECT COUNT(*) FROM findings");

    info!(
        path = %db_path.display(),
        questionnaires,
        categories,
        questions,
        placeholders,
        responses,
        findings,
        "database status"
    );

    println!("Store {}", db_path.display());
    println!("  questionnaires: {questionnaires}");
    println!("  categories:     {categories}");
    println!("  questions:      {questions} ({placeholders} placeholders)");
    println!("  responses:      {responses}");
    println!("  findings:       {findings}");

    match primary_questionnaire_id(&connection, &args.questionnaire_kind)? {
        Some(questionnaire_id) => {
            println!("  {} questionnaire {questionnaire_id}:", args.questionnaire_kind);
            for count in category_breakdown(&connection, questionnaire_id)? {
                println!("    {:<10} {}", count.code, count.count);
            }
        }
        None => warn!(kind = %args.questionnaire_kind, "no questionnaire of this kind"),
    }

    let integrity = check_integrity(&connection, &args.questionnaire_kind)?;
    if integrity.is_clean() {
        info!(unlinked_findings = integrity.unlinked_findings, "integrity checks passed");
    } else {
        warn!(
            orphaned_responses = integrity.orphaned_responses,
            orphaned_references = integrity.orphaned_references,
            duplicate_questionnaires = integrity.duplicate_questionnaires,
            "integrity checks found problems"
        );
    }
    println!("  integrity:");
    println!("    responses to missing questions:  {}", integrity.orphaned_responses);
    println!("    references to missing questions: {}", integrity.orphaned_references);
    println!("    findings without a question:     {}", integrity.unlinked_findings);
    println!("    duplicate questionnaires:        {}", integrity.duplicate_questionnaires);

    Ok(())
}

/// Row count for the status table; a failing query is logged and shown as zero.
fn count_or_warn(connection: &Connection, sql: &str) -> i64 {
    match count_rows(connection, sql) {
        Ok(count) => count,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "status count query failed");
            0
        }
    }
}

pub fn check_integrity(connection: &Connection, kind: &str) -> Result<IntegrityReport> {
    let orphaned_responses = count_rows(
        connection,
        "SELECT COUNT(*) FROM assessment_responses r
         LEFT JOIN questions q ON q.id = r.question_id WHERE q.id IS NULL",
    )?;
    let orphaned_references = count_rows(
        connection,
        "SELECT COUNT(*) FROM question_references r
         LEFT JOIN questions q ON q.id = r.question_id WHERE q.id IS NULL",
    )?;
    let unlinked_findings = count_rows(
        connection,
        "SELECT COUNT(*) FROM findings WHERE question_id IS NULL",
    )?;
    let questionnaires = questionnaire_ids_of_kind(connection, kind)?.len() as i64;

    Ok(IntegrityReport {
        orphaned_responses,
        orphaned_references,
        unlinked_findings,
        duplicate_questionnaires: (questionnaires - 1).max(0),
    })
}

/// Newest manifest whose file name starts with `prefix`; names sort by timestamp.
fn latest_manifest(manifest_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(prefix) && name.ends_with(".json"))
            .unwrap_or(false);
        if matches {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.pop())
}

fn log_manifest(path: &Path) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let field = |key: &str| {
        manifest
            .get(key)
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string()
    };

    info!(
        path = %path.display(),
        run_id = %field("run_id"),
        status = %field("status"),
        updated_at = %field("updated_at"),
        failed_step = %field("failed_step"),
        "loaded run manifest"
    );
    Ok(())
}
