use super::*;

/// Target grouping to persist, one bucket per taxonomy category.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub questionnaire_kind: String,
    pub grouped: Vec<(&'static TargetCategory, Vec<AcceptedQuestion>)>,
}

impl MigrationPlan {
    pub fn question_count(&self) -> usize {
        self.grouped.iter().map(|(_, bucket)| bucket.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub questionnaire_id: i64,
    pub before: Vec<CategoryCount>,
    pub after: Vec<CategoryCount>,
    pub migrated_count: usize,
    pub placeholder_count: usize,
    pub duplicates_removed: usize,
    pub committed: bool,
}

/// Replaces the persisted hierarchy of `plan.questionnaire_kind` with the
/// planned grouping inside one transaction.
///
/// Any failing step drops the transaction, leaving the store as it was.
/// With `dry_run` every step executes and the transaction is rolled back.
pub fn migrate_store(
    connection: &mut Connection,
    plan: &MigrationPlan,
    dry_run: bool,
    ledger: &mut StepLedger,
) -> Result<MigrationOutcome> {
    if TAXONOMY.is_empty() {
        bail!("target taxonomy is empty");
    }
    if plan.grouped.len() != TAXONOMY.len() {
        bail!(
            "migration plan has {} category buckets, expected {}",
            plan.grouped.len(),
            TAXONOMY.len()
        );
    }

    let tx = connection.transaction()?;

    let Some(questionnaire_id) = primary_questionnaire_id(&tx, &plan.questionnaire_kind)? else {
        bail!(
            "no questionnaire of kind '{}' to migrate",
            plan.questionnaire_kind
        );
    };
    let duplicate_ids = questionnaire_ids_of_kind(&tx, &plan.questionnaire_kind)?
        .into_iter()
        .filter(|id| *id != questionnaire_id)
        .collect::<Vec<i64>>();
    let before = category_breakdown(&tx, questionnaire_id)?;

    info!(
        questionnaire_id,
        duplicates = duplicate_ids.len(),
        planned_questions = plan.question_count(),
        dry_run,
        "starting migration"
    );

    let question_ids = ledger.run_step(STEP_COLLECT_QUESTIONS, || {
        let ids = collect_question_ids(&tx, questionnaire_id)?;
        let count = ids.len();
        Ok((ids, count))
    })?;
    ledger.run_step(STEP_DELETE_RESPONSES, || {
        Ok(((), delete_responses(&tx, &question_ids)?))
    })?;
    ledger.run_step(STEP_UNLINK_FINDINGS, || {
        Ok(((), unlink_findings(&tx, &question_ids)?))
    })?;
    ledger.run_step(STEP_DELETE_REFERENCES, || {
        Ok(((), delete_references(&tx, &question_ids)?))
    })?;
    ledger.run_step(STEP_DELETE_QUESTIONS, || {
        Ok(((), delete_questions(&tx, &question_ids)?))
    })?;
    ledger.run_step(STEP_DELETE_CATEGORIES, || {
        Ok(((), delete_categories(&tx, questionnaire_id)?))
    })?;
    ledger.run_step(STEP_REMOVE_DUPLICATES, || {
        let mut affected = 0;
        for duplicate_id in &duplicate_ids {
            affected += remove_questionnaire(&tx, *duplicate_id)?;
        }
        Ok(((), affected))
    })?;
    ledger.run_step(STEP_UPDATE_METADATA, || {
        Ok(((), update_questionnaire_metadata(&tx, questionnaire_id)?))
    })?;
    let category_ids = ledger.run_step(STEP_CREATE_CATEGORIES, || {
        let ids = create_categories(&tx, questionnaire_id)?;
        let count = ids.len();
        Ok((ids, count))
    })?;

    let migrated_count = ledger.run_step(STEP_CREATE_QUESTIONS, || {
        let mut inserted = 0;
        for ((category, bucket), category_id) in plan.grouped.iter().zip(&category_ids) {
            let rows = migrated_rows(category, bucket);
            inserted += insert_questions(&tx, questionnaire_id, *category_id, &rows)?;
        }
        Ok((inserted, inserted))
    })?;

    let placeholder_count = ledger.run_step(STEP_CREATE_PLACEHOLDERS, || {
        let mut inserted = 0;
        for ((category, bucket), category_id) in plan.grouped.iter().zip(&category_ids) {
            if !bucket.is_empty() {
                continue;
            }
            let rows = placeholder_rows(category);
            if rows.is_empty() {
                warn!(category = category.code, "category has no questions and no placeholders");
                continue;
            }
            inserted += insert_questions(&tx, questionnaire_id, *category_id, &rows)?;
        }
        Ok((inserted, inserted))
    })?;

    ledger.run_step(STEP_BACKFILL_AREAS, || {
        Ok(((), backfill_selected_areas(&tx, questionnaire_id)?))
    })?;

    let after = category_breakdown(&tx, questionnaire_id)?;

    if dry_run {
        tx.rollback().context("failed to roll back dry-run migration")?;
        info!(questionnaire_id, "dry run complete, changes rolled back");
    } else {
        tx.commit().context("failed to commit migration")?;
        info!(questionnaire_id, "migration committed");
    }

    Ok(MigrationOutcome {
        questionnaire_id,
        before,
        after,
        migrated_count,
        placeholder_count,
        duplicates_removed: duplicate_ids.len(),
        committed: !dry_run,
    })
}
