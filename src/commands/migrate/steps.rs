use super::*;

pub(super) const STEP_COLLECT_QUESTIONS: &str = "01_collect_question_ids";
pub(super) const STEP_DELETE_RESPONSES: &str = "02_delete_responses";
pub(super) const STEP_UNLINK_FINDINGS: &str = "03_unlink_findings";
pub(super) const STEP_DELETE_REFERENCES: &str = "04_delete_references";
pub(super) const STEP_DELETE_QUESTIONS: &str = "05_delete_questions";
pub(super) const STEP_DELETE_CATEGORIES: &str = "06_delete_categories";
pub(super) const STEP_REMOVE_DUPLICATES: &str = "07_remove_duplicate_questionnaires";
pub(super) const STEP_UPDATE_METADATA: &str = "08_update_questionnaire_metadata";
pub(super) const STEP_CREATE_CATEGORIES: &str = "09_create_categories";
pub(super) const STEP_CREATE_QUESTIONS: &str = "10_create_questions";
pub(super) const STEP_CREATE_PLACEHOLDERS: &str = "11_create_placeholders";
pub(super) const STEP_BACKFILL_AREAS: &str = "12_backfill_selected_areas";

pub(super) fn collect_question_ids(connection: &Connection, questionnaire_id: i64) -> Result<Vec<i64>> {
    let mut statement = connection
        .prepare("SELECT id FROM questions WHERE questionnaire_id = ?1 ORDER BY id")?;
    let ids = statement
        .query_map([questionnaire_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()
        .context("failed to collect question ids")?;
    Ok(ids)
}

fn execute_per_id(connection: &Connection, sql: &str, ids: &[i64]) -> Result<usize> {
    let mut statement = connection
        .prepare(sql)
        .with_context(|| format!("failed to prepare: {sql}"))?;
    let mut affected = 0;
    for id in ids {
        affected += statement
            .execute([id])
            .with_context(|| format!("failed statement for id {id}: {sql}"))?;
    }
    Ok(affected)
}

pub(super) fn delete_responses(connection: &Connection, question_ids: &[i64]) -> Result<usize> {
    execute_per_id(
        connection,
        "DELETE FROM assessment_responses WHERE question_id = ?1",
        question_ids,
    )
}

pub(super) fn unlink_findings(connection: &Connection, question_ids: &[i64]) -> Result<usize> {
    execute_per_id(
        connection,
        "UPDATE findings SET question_id = NULL WHERE question_id = ?1",
        question_ids,
    )
}

pub(super) fn delete_references(connection: &Connection, question_ids: &[i64]) -> Result<usize> {
    execute_per_id(
        connection,
        "DELETE FROM question_references WHERE question_id = ?1",
        question_ids,
    )
}

pub(super) fn delete_questions(connection: &Connection, question_ids: &[i64]) -> Result<usize> {
    execute_per_id(connection, "DELETE FROM questions WHERE id = ?1", question_ids)
}

pub(super) fn delete_categories(connection: &Connection, questionnaire_id: i64) -> Result<usize> {
    connection
        .execute(
            "DELETE FROM categories WHERE questionnaire_id = ?1",
            [questionnaire_id],
        )
        .context("failed to delete categories")
}

/// Steps 1 to 6 plus assessment removal for a questionnaire that is not retained.
pub(super) fn remove_questionnaire(connection: &Connection, questionnaire_id: i64) -> Result<usize> {
    let question_ids = collect_question_ids(connection, questionnaire_id)?;
    let mut affected = delete_responses(connection, &question_ids)?;
    affected += unlink_findings(connection, &question_ids)?;
    affected += delete_references(connection, &question_ids)?;
    affected += delete_questions(connection, &question_ids)?;
    affected += delete_categories(connection, questionnaire_id)?;

    affected += connection
        .execute(
            "DELETE FROM assessment_responses
             WHERE assessment_id IN (SELECT id FROM assessments WHERE questionnaire_id = ?1)",
            [questionnaire_id],
        )
        .context("failed to delete responses of duplicate assessments")?;
    affected += connection
        .execute(
            "UPDATE findings SET assessment_id = NULL
             WHERE assessment_id IN (SELECT id FROM assessments WHERE questionnaire_id = ?1)",
            [questionnaire_id],
        )
        .context("failed to unlink findings of duplicate assessments")?;
    affected += connection
        .execute(
            "DELETE FROM assessments WHERE questionnaire_id = ?1",
            [questionnaire_id],
        )
        .context("failed to delete duplicate assessments")?;
    affected += connection
        .execute("DELETE FROM questionnaires WHERE id = ?1", [questionnaire_id])
        .context("failed to delete duplicate questionnaire")?;

    warn!(
        questionnaire_id,
        questions = question_ids.len(),
        "removed duplicate questionnaire"
    );
    Ok(affected)
}

pub(super) fn update_questionnaire_metadata(
    connection: &Connection,
    questionnaire_id: i64,
) -> Result<usize> {
    connection
        .execute(
            "UPDATE questionnaires
             SET code = ?1, version = ?2, title_en = ?3, title_fr = ?4,
                 description_en = ?5, description_fr = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                ANS_QUESTIONNAIRE_CODE,
                ANS_QUESTIONNAIRE_VERSION,
                ANS_QUESTIONNAIRE_TITLE_EN,
                ANS_QUESTIONNAIRE_TITLE_FR,
                ANS_QUESTIONNAIRE_DESCRIPTION_EN,
                ANS_QUESTIONNAIRE_DESCRIPTION_FR,
                now_utc_string(),
                questionnaire_id
            ],
        )
        .context("failed to update questionnaire metadata")
}

/// Returns the new category ids in taxonomy order.
pub(super) fn create_categories(connection: &Connection, questionnaire_id: i64) -> Result<Vec<i64>> {
    let mut statement = connection.prepare(
        "INSERT INTO categories(questionnaire_id, code, name_en, name_fr, sort_order)
         VALUES(?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut ids = Vec::with_capacity(TAXONOMY.len());
    for category in TAXONOMY {
        statement
            .execute(params![
                questionnaire_id,
                category.code,
                category.name_en,
                category.name_fr,
                category.sort_order
            ])
            .with_context(|| format!("failed to insert category {}", category.code))?;
        ids.push(connection.last_insert_rowid());
    }
    Ok(ids)
}

/// One row to insert into `questions` under a new category.
pub(super) struct NewQuestion<'a> {
    pub pq_number: String,
    pub source_pq_number: Option<&'a str>,
    pub question_en: &'a str,
    pub question_fr: &'a str,
    pub guidance_en: &'a str,
    pub guidance_fr: &'a str,
    pub references: &'a str,
    pub is_priority: bool,
    pub requires_on_site: bool,
    pub critical_element: Option<&'a str>,
    pub is_placeholder: bool,
    pub sort_order: usize,
}

pub(super) fn numbered_key(category: &TargetCategory, position: usize) -> String {
    format!("{}.{position:03}", category.question_prefix)
}

pub(super) fn insert_questions(
    connection: &Connection,
    questionnaire_id: i64,
    category_id: i64,
    rows: &[NewQuestion<'_>],
) -> Result<usize> {
    let mut insert_question = connection.prepare(
        "INSERT INTO questions(
           questionnaire_id, category_id, pq_number, source_pq_number, question_en,
           question_fr, guidance_en, guidance_fr, is_priority, requires_on_site,
           critical_element, is_placeholder, sort_order
         ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;
    let mut insert_reference = connection.prepare(
        "INSERT INTO question_references(question_id, reference_text) VALUES(?1, ?2)",
    )?;

    for row in rows {
        insert_question
            .execute(params![
                questionnaire_id,
                category_id,
                row.pq_number,
                row.source_pq_number,
                row.question_en,
                row.question_fr,
                row.guidance_en,
                row.guidance_fr,
                row.is_priority as i64,
                row.requires_on_site as i64,
                row.critical_element,
                row.is_placeholder as i64,
                row.sort_order as i64
            ])
            .with_context(|| format!("failed to insert question {}", row.pq_number))?;
        let question_id = connection.last_insert_rowid();
        if !row.references.trim().is_empty() {
            insert_reference.execute(params![question_id, row.references])?;
        }
    }

    Ok(rows.len())
}

pub(super) fn migrated_rows<'a>(
    category: &TargetCategory,
    questions: &'a [AcceptedQuestion],
) -> Vec<NewQuestion<'a>> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| NewQuestion {
            pq_number: numbered_key(category, index + 1),
            source_pq_number: Some(question.pq_number.as_str()),
            question_en: &question.question_en,
            question_fr: &question.question_fr,
            guidance_en: &question.guidance_en,
            guidance_fr: &question.guidance_fr,
            references: &question.references,
            is_priority: question.is_priority,
            requires_on_site: question.requires_on_site,
            critical_element: question.critical_element.as_deref(),
            is_placeholder: false,
            sort_order: index + 1,
        })
        .collect()
}

pub(super) fn placeholder_rows(category: &TargetCategory) -> Vec<NewQuestion<'static>> {
    placeholders_for(category.code)
        .into_iter()
        .enumerate()
        .map(|(index, placeholder)| NewQuestion {
            pq_number: numbered_key(category, index + 1),
            source_pq_number: None,
            question_en: placeholder.question_en,
            question_fr: placeholder.question_fr,
            guidance_en: placeholder.guidance_en,
            guidance_fr: "",
            references: placeholder.references,
            is_priority: false,
            requires_on_site: false,
            critical_element: None,
            is_placeholder: true,
            sort_order: index + 1,
        })
        .collect()
}

/// Responses attached to persisted questions with the given item keys.
pub(super) fn count_responses_for_keys(
    connection: &Connection,
    questionnaire_id: i64,
    keys: &[String],
) -> Result<usize> {
    let mut statement = connection.prepare(
        "SELECT COUNT(*) FROM assessment_responses r
         JOIN questions q ON q.id = r.question_id
         WHERE q.questionnaire_id = ?1 AND COALESCE(q.source_pq_number, q.pq_number) = ?2",
    )?;
    let mut total = 0;
    for key in keys {
        let count = statement
            .query_row(params![questionnaire_id, key], |row| row.get::<_, i64>(0))
            .with_context(|| format!("failed to count responses for {key}"))?;
        total += count as usize;
    }
    Ok(total)
}

pub(super) fn backfill_selected_areas(connection: &Connection, questionnaire_id: i64) -> Result<usize> {
    let areas = serde_json::to_string(&all_codes()).context("failed to encode selected areas")?;
    connection
        .execute(
            "UPDATE assessments SET selected_areas = ?1
             WHERE questionnaire_id = ?2
               AND (selected_areas IS NULL OR TRIM(selected_areas) IN ('', '[]'))",
            params![areas, questionnaire_id],
        )
        .context("failed to backfill assessment selected areas")
}
