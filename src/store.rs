use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use tracing::warn;

use crate::model::{AcceptedQuestion, CategoryCount};

pub const DB_SCHEMA_VERSION: &str = "0.2.0";

pub fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("pq_store.sqlite")
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        crate::util::ensure_directory(parent)?;
    }
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS questionnaires (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          kind TEXT NOT NULL,
          code TEXT NOT NULL,
          version TEXT,
          title_en TEXT,
          title_fr TEXT,
          description_en TEXT,
          description_fr TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          questionnaire_id INTEGER NOT NULL,
          code TEXT NOT NULL,
          name_en TEXT NOT NULL,
          name_fr TEXT,
          sort_order INTEGER NOT NULL DEFAULT 0,
          FOREIGN KEY(questionnaire_id) REFERENCES questionnaires(id)
        );

        CREATE TABLE IF NOT EXISTS questions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          questionnaire_id INTEGER NOT NULL,
          category_id INTEGER NOT NULL,
          pq_number TEXT NOT NULL,
          source_pq_number TEXT,
          question_en TEXT NOT NULL,
          question_fr TEXT,
          guidance_en TEXT,
          guidance_fr TEXT,
          is_priority INTEGER NOT NULL DEFAULT 0,
          requires_on_site INTEGER NOT NULL DEFAULT 0,
          critical_element TEXT,
          is_placeholder INTEGER NOT NULL DEFAULT 0,
          sort_order INTEGER NOT NULL DEFAULT 0,
          FOREIGN KEY(questionnaire_id) REFERENCES questionnaires(id),
          FOREIGN KEY(category_id) REFERENCES categories(id)
        );

        CREATE TABLE IF NOT EXISTS question_references (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          question_id INTEGER NOT NULL,
          reference_text TEXT NOT NULL,
          FOREIGN KEY(question_id) REFERENCES questions(id)
        );

        CREATE TABLE IF NOT EXISTS assessments (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          questionnaire_id INTEGER NOT NULL,
          title TEXT NOT NULL,
          selected_areas TEXT,
          FOREIGN KEY(questionnaire_id) REFERENCES questionnaires(id)
        );

        CREATE TABLE IF NOT EXISTS assessment_responses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          assessment_id INTEGER NOT NULL,
          question_id INTEGER NOT NULL,
          answer TEXT,
          notes TEXT,
          FOREIGN KEY(assessment_id) REFERENCES assessments(id),
          FOREIGN KEY(question_id) REFERENCES questions(id)
        );

        CREATE TABLE IF NOT EXISTS findings (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          assessment_id INTEGER,
          question_id INTEGER,
          title TEXT NOT NULL,
          severity TEXT,
          FOREIGN KEY(assessment_id) REFERENCES assessments(id),
          FOREIGN KEY(question_id) REFERENCES questions(id)
        );

        CREATE INDEX IF NOT EXISTS idx_questions_category ON questions(category_id);
        CREATE INDEX IF NOT EXISTS idx_questions_questionnaire ON questions(questionnaire_id);
        CREATE INDEX IF NOT EXISTS idx_responses_question ON assessment_responses(question_id);
        CREATE INDEX IF NOT EXISTS idx_findings_question ON findings(question_id);
        ",
        )
        .context("failed to create store schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed count query: {sql}"))?;
    Ok(count)
}

/// Questionnaire ids of one logical kind, oldest first.
pub fn questionnaire_ids_of_kind(connection: &Connection, kind: &str) -> Result<Vec<i64>> {
    let mut statement = connection
        .prepare("SELECT id FROM questionnaires WHERE kind = ?1 ORDER BY id")
        .context("failed to prepare questionnaire lookup")?;
    let ids = statement
        .query_map([kind], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()
        .context("failed to read questionnaire ids")?;
    Ok(ids)
}

pub fn primary_questionnaire_id(connection: &Connection, kind: &str) -> Result<Option<i64>> {
    let id = connection
        .query_row(
            "SELECT id FROM questionnaires WHERE kind = ?1 ORDER BY id LIMIT 1",
            [kind],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .context("failed to look up questionnaire")?;
    Ok(id)
}

/// Question counts per category of a questionnaire, in category sort order.
pub fn category_breakdown(
    connection: &Connection,
    questionnaire_id: i64,
) -> Result<Vec<CategoryCount>> {
    let mut statement = connection.prepare(
        "
        SELECT c.code, COUNT(q.id)
        FROM categories c
        LEFT JOIN questions q ON q.category_id = c.id
        WHERE c.questionnaire_id = ?1
        GROUP BY c.id
        ORDER BY c.sort_order, c.id
        ",
    )?;
    let rows = statement
        .query_map([questionnaire_id], |row| {
            Ok(CategoryCount {
                code: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<CategoryCount>>>()
        .context("failed to read category breakdown")?;
    Ok(rows)
}

/// Reads the persisted question set of a questionnaire in hand-off form.
///
/// The original key is preferred over the renumbered one so a reorganized
/// set classifies the same way it did before. Keys stay unique: the oldest
/// row of a key wins and later copies are skipped with a warning.
pub fn load_persisted_questions(
    connection: &Connection,
    questionnaire_id: i64,
) -> Result<Vec<AcceptedQuestion>> {
    let mut statement = connection.prepare(
        "
        SELECT q.id, COALESCE(q.source_pq_number, q.pq_number), q.question_en,
               COALESCE(q.question_fr, ''), COALESCE(q.guidance_en, ''),
               COALESCE(q.guidance_fr, ''), q.is_priority, q.requires_on_site,
               q.critical_element, c.code
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        WHERE q.questionnaire_id = ?1 AND q.is_placeholder = 0
        ORDER BY q.id
        ",
    )?;
    let rows = statement
        .query_map([questionnaire_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                AcceptedQuestion {
                    pq_number: row.get(1)?,
                    question_en: row.get(2)?,
                    question_fr: row.get(3)?,
                    guidance_en: row.get(4)?,
                    guidance_fr: row.get(5)?,
                    references: String::new(),
                    is_priority: row.get::<_, i64>(6)? != 0,
                    requires_on_site: row.get::<_, i64>(7)? != 0,
                    critical_element: row.get(8)?,
                    source_category: Some(row.get(9)?),
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<(i64, AcceptedQuestion)>>>()
        .context("failed to read persisted questions")?;

    let mut reference_statement = connection.prepare(
        "SELECT reference_text FROM question_references WHERE question_id = ?1 ORDER BY id",
    )?;
    let mut questions = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    for (question_id, mut question) in rows {
        if !seen.insert(question.pq_number.clone()) {
            warn!(
                question_id,
                pq_number = %question.pq_number,
                "skipping persisted duplicate of an item key"
            );
            continue;
        }
        let references = reference_statement
            .query_map(params![question_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("failed to read question references")?;
        question.references = references.join("; ");
        questions.push(question);
    }

    Ok(questions)
}

#[cfg(test)]
pub fn open_test_store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory DB should open");
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .expect("foreign keys pragma");
    ensure_schema(&connection).expect("schema should apply");
    connection
}
