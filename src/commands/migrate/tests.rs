use super::*;
use crate::commands::classify::ClassificationRules;
use crate::commands::seed::seed_questions;
use crate::store::{count_rows, open_test_store};
use crate::taxonomy::ANS_QUESTIONNAIRE_KIND;

fn accepted(key: &str, ce: Option<&str>, text: &str) -> AcceptedQuestion {
    AcceptedQuestion {
        pq_number: key.to_string(),
        question_en: text.to_string(),
        critical_element: ce.map(str::to_string),
        ..AcceptedQuestion::default()
    }
}

fn seeded_store() -> Connection {
    let mut connection = open_test_store();
    let questions = vec![
        accepted("7.501", Some("CE-3"), "Is the list of items kept up to date regularly?"),
        accepted("7.001", Some("CE-1"), "Has the State promulgated primary aviation legislation?"),
        accepted("7.231", Some("CE-4"), "Has the State implemented a flight inspection programme?"),
        accepted("7.381", Some("CE-4"), "Has the State established a rescue coordination centre?"),
        accepted("7.500", None, "Has the State published aeronautical charts in accordance with Annex 4?"),
    ];
    seed_questions(&mut connection, ANS_QUESTIONNAIRE_KIND, &questions).expect("seed");

    connection
        .execute_batch(
            "
            INSERT INTO assessments(questionnaire_id, title, selected_areas) VALUES(1, 'Audit 2024', NULL);
            INSERT INTO assessment_responses(assessment_id, question_id, answer)
              SELECT 1, id, 'satisfactory' FROM questions WHERE pq_number = '7.001';
            INSERT INTO findings(assessment_id, question_id, title, severity)
              SELECT 1, id, 'Inspection records incomplete', 'major' FROM questions WHERE pq_number = '7.231';
            ",
        )
        .expect("audit fixture");
    connection
}

fn plan_from_store(
    connection: &Connection,
    fallback: Option<&'static TargetCategory>,
) -> MigrationPlan {
    let questionnaire_id = primary_questionnaire_id(connection, ANS_QUESTIONNAIRE_KIND)
        .expect("lookup")
        .expect("questionnaire");
    let questions = load_persisted_questions(connection, questionnaire_id).expect("load");
    let classifier = TaxonomyClassifier::from_rules(&load_rules(None).expect("rules"))
        .expect("classifier");
    let decisions = classifier.classify_all(&questions);
    MigrationPlan {
        questionnaire_kind: ANS_QUESTIONNAIRE_KIND.to_string(),
        grouped: group_by_category(&questions, &decisions, fallback),
    }
}

fn count(connection: &Connection, sql: &str) -> i64 {
    count_rows(connection, sql).expect("count query")
}

#[test]
fn findings_survive_unlinked_and_responses_are_removed() {
    let mut connection = seeded_store();
    let plan = plan_from_store(&connection, None);
    let mut ledger = StepLedger::default();

    migrate_store(&mut connection, &plan, false, &mut ledger).expect("migrate");

    assert_eq!(count(&connection, "SELECT COUNT(*) FROM findings"), 1);
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM findings WHERE question_id IS NULL AND assessment_id = 1"),
        1
    );
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM assessment_responses"), 0);
    assert_eq!(
        count(
            &connection,
            "SELECT COUNT(*) FROM assessment_responses r LEFT JOIN questions q ON q.id = r.question_id WHERE q.id IS NULL"
        ),
        0
    );
    let step_two = ledger
        .completed
        .iter()
        .find(|record| record.step == STEP_DELETE_RESPONSES)
        .expect("response step recorded");
    assert_eq!(step_two.affected_rows, 1);
}

#[test]
fn new_hierarchy_holds_classified_questions_plus_placeholders() {
    let mut connection = seeded_store();
    let plan = plan_from_store(&connection, None);
    let mut ledger = StepLedger::default();

    let outcome = migrate_store(&mut connection, &plan, false, &mut ledger).expect("migrate");

    assert_eq!(outcome.migrated_count, 4);
    assert_eq!(outcome.placeholder_count, 5);
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM questions") as usize,
        outcome.migrated_count + outcome.placeholder_count
    );
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM questions WHERE is_placeholder = 1"),
        5
    );
    assert_eq!(ledger.completed.len(), 12);

    let codes = outcome
        .after
        .iter()
        .map(|count| count.code.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(codes, all_codes());
    let cns = connection
        .query_row(
            "SELECT q.pq_number, q.source_pq_number, q.question_en FROM questions q
             JOIN categories c ON c.id = q.category_id WHERE c.code = 'CNS'",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .expect("CNS question");
    assert_eq!(cns.0, "CNS.001");
    assert_eq!(cns.1, "7.231");
    assert_eq!(cns.2, "Has the State implemented a flight inspection programme?");

    let areas = connection
        .query_row("SELECT selected_areas FROM assessments WHERE id = 1", [], |row| {
            row.get::<_, String>(0)
        })
        .expect("selected areas");
    assert_eq!(areas, r#"["GEN","ATM","FPD","AIM","MAP","CNS","MET","SAR"]"#);
}

#[test]
fn running_twice_creates_no_duplicates() {
    let mut connection = seeded_store();

    let first_plan = plan_from_store(&connection, None);
    migrate_store(&mut connection, &first_plan, false, &mut StepLedger::default())
        .expect("first migration");
    let first_keys = count(&connection, "SELECT COUNT(*) FROM questions");

    let second_plan = plan_from_store(&connection, None);
    let mut ledger = StepLedger::default();
    let outcome = migrate_store(&mut connection, &second_plan, false, &mut ledger)
        .expect("second migration");

    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questionnaires"), 1);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM categories"), 8);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questions"), first_keys);
    assert_eq!(outcome.duplicates_removed, 0);
    let duplicate_step = ledger
        .completed
        .iter()
        .find(|record| record.step == STEP_REMOVE_DUPLICATES)
        .expect("duplicate step recorded");
    assert_eq!(duplicate_step.affected_rows, 0);
    assert_eq!(
        count(
            &connection,
            "SELECT COUNT(*) FROM questions WHERE pq_number = 'MAP.001' AND source_pq_number = '7.500'"
        ),
        1
    );
}

#[test]
fn duplicate_questionnaires_are_removed_and_their_findings_kept() {
    let mut connection = seeded_store();
    connection
        .execute_batch(
            "
            INSERT INTO questionnaires(kind, code, created_at, updated_at)
              VALUES('USOAP_ANS', 'ANS-OLD', '2020-01-01T00:00:00Z', '2020-01-01T00:00:00Z');
            INSERT INTO categories(questionnaire_id, code, name_en) VALUES(2, 'CE-1', 'Old');
            INSERT INTO questions(questionnaire_id, category_id, pq_number, question_en)
              SELECT 2, id, '7.001', 'Old copy of the legislation question' FROM categories WHERE questionnaire_id = 2;
            INSERT INTO assessments(questionnaire_id, title) VALUES(2, 'Old audit');
            INSERT INTO assessment_responses(assessment_id, question_id, answer)
              SELECT 2, id, 'no' FROM questions WHERE questionnaire_id = 2;
            INSERT INTO findings(assessment_id, question_id, title)
              SELECT 2, id, 'Legacy finding' FROM questions WHERE questionnaire_id = 2;
            ",
        )
        .expect("duplicate fixture");

    let plan = plan_from_store(&connection, None);
    let outcome = migrate_store(&mut connection, &plan, false, &mut StepLedger::default())
        .expect("migrate");

    assert_eq!(outcome.questionnaire_id, 1);
    assert_eq!(outcome.duplicates_removed, 1);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questionnaires"), 1);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM assessments"), 1);
    assert_eq!(
        count(
            &connection,
            "SELECT COUNT(*) FROM findings WHERE title = 'Legacy finding' AND question_id IS NULL AND assessment_id IS NULL"
        ),
        1
    );
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM questions WHERE questionnaire_id <> 1"),
        0
    );
}

#[test]
fn missing_questionnaire_fails_before_any_step() {
    let mut connection = open_test_store();
    let plan = MigrationPlan {
        questionnaire_kind: ANS_QUESTIONNAIRE_KIND.to_string(),
        grouped: group_by_category(&[], &[], None),
    };
    let mut ledger = StepLedger::default();

    let error = migrate_store(&mut connection, &plan, false, &mut ledger)
        .expect_err("no questionnaire should fail");

    assert!(error.to_string().contains("no questionnaire"));
    assert!(ledger.completed.is_empty());
    assert!(ledger.failed_step.is_none());
}

#[test]
fn failing_step_rolls_back_every_earlier_step() {
    let mut connection = seeded_store();
    let plan = plan_from_store(&connection, None);
    connection
        .execute_batch(
            "CREATE TRIGGER block_category_insert BEFORE INSERT ON categories
             BEGIN SELECT RAISE(ABORT, 'categories are locked'); END;",
        )
        .expect("trigger");
    let mut ledger = StepLedger::default();

    let error = migrate_store(&mut connection, &plan, false, &mut ledger)
        .expect_err("blocked insert should fail");

    assert!(format!("{error:#}").contains("categories are locked"));
    assert_eq!(ledger.failed_step.as_deref(), Some(STEP_CREATE_CATEGORIES));
    assert_eq!(ledger.last_completed(), Some(STEP_UPDATE_METADATA));
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questions"), 5);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM categories"), 4);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM assessment_responses"), 1);
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM findings WHERE question_id IS NOT NULL"),
        1
    );
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM questionnaires WHERE code = 'ANS-PQ'"),
        1
    );
}

#[test]
fn dry_run_reports_but_leaves_store_unchanged() {
    let mut connection = seeded_store();
    let plan = plan_from_store(&connection, None);
    let mut ledger = StepLedger::default();

    let outcome = migrate_store(&mut connection, &plan, true, &mut ledger).expect("dry run");

    assert!(!outcome.committed);
    assert_eq!(ledger.completed.len(), 12);
    assert_eq!(outcome.after.len(), 8);
    assert_eq!(outcome.before.len(), 4);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM categories"), 4);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questions"), 5);
    assert_eq!(count(&connection, "SELECT COUNT(*) FROM assessment_responses"), 1);
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM assessments WHERE selected_areas IS NULL"),
        1
    );
}

#[test]
fn fallback_category_receives_unclassified_questions_in_key_order() {
    let mut connection = seeded_store();
    let plan = plan_from_store(&connection, category_by_code("GEN"));

    let outcome = migrate_store(&mut connection, &plan, false, &mut StepLedger::default())
        .expect("migrate");

    assert_eq!(outcome.migrated_count, 5);
    let mut statement = connection
        .prepare(
            "SELECT q.pq_number, q.source_pq_number FROM questions q
             JOIN categories c ON c.id = q.category_id
             WHERE c.code = 'GEN' ORDER BY q.sort_order",
        )
        .expect("prepare");
    let rows = statement
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .expect("query")
        .collect::<rusqlite::Result<Vec<(String, String)>>>()
        .expect("rows");
    assert_eq!(
        rows,
        vec![
            ("GEN.001".to_string(), "7.001".to_string()),
            ("GEN.002".to_string(), "7.501".to_string()),
        ]
    );
}

#[test]
fn external_rules_drive_the_plan() {
    let mut connection = seeded_store();
    let questionnaire_id = primary_questionnaire_id(&connection, ANS_QUESTIONNAIRE_KIND)
        .expect("lookup")
        .expect("questionnaire");
    let questions = load_persisted_questions(&connection, questionnaire_id).expect("load");
    let mut rules = ClassificationRules::default();
    for question in &questions {
        rules.exact.insert(question.pq_number.clone(), "SAR".to_string());
    }
    let classifier = TaxonomyClassifier::from_rules(&rules).expect("classifier");
    let decisions = classifier.classify_all(&questions);
    let plan = MigrationPlan {
        questionnaire_kind: ANS_QUESTIONNAIRE_KIND.to_string(),
        grouped: group_by_category(&questions, &decisions, None),
    };

    let outcome = migrate_store(&mut connection, &plan, false, &mut StepLedger::default())
        .expect("migrate");

    let sar = outcome
        .after
        .iter()
        .find(|count| count.code == "SAR")
        .expect("SAR count");
    assert_eq!(sar.count, 5);
    assert_eq!(
        count(&connection, "SELECT COUNT(*) FROM questions WHERE is_placeholder = 1"),
        8
    );
}

#[test]
fn reseeding_a_migrated_store_adds_nothing() {
    let mut connection = seeded_store();
    let first_plan = plan_from_store(&connection, None);
    migrate_store(&mut connection, &first_plan, false, &mut StepLedger::default())
        .expect("first migration");
    let migrated_questions = count(&connection, "SELECT COUNT(*) FROM questions");

    let reseed = vec![
        accepted("7.001", Some("CE-1"), "Has the State promulgated primary aviation legislation?"),
        accepted("7.231", Some("CE-4"), "Has the State implemented a flight inspection programme?"),
    ];
    let outcome =
        seed_questions(&mut connection, ANS_QUESTIONNAIRE_KIND, &reseed).expect("reseed");
    assert_eq!(outcome.counts.questions_created, 0);
    assert_eq!(outcome.counts.questions_skipped, 2);
    assert_eq!(outcome.counts.categories_created, 0);

    let second_plan = plan_from_store(&connection, None);
    migrate_store(&mut connection, &second_plan, false, &mut StepLedger::default())
        .expect("second migration");

    assert_eq!(count(&connection, "SELECT COUNT(*) FROM questions"), migrated_questions);
    assert_eq!(
        count(
            &connection,
            "SELECT COUNT(*) FROM (
               SELECT source_pq_number FROM questions WHERE source_pq_number IS NOT NULL
               GROUP BY source_pq_number HAVING COUNT(*) > 1
             )"
        ),
        0
    );
}

#[test]
fn dropped_unclassified_questions_are_counted_with_their_responses() {
    let connection = seeded_store();
    connection
        .execute(
            "INSERT INTO assessment_responses(assessment_id, question_id, answer)
             SELECT 1, id, 'not implemented' FROM questions WHERE pq_number = '7.501'",
            [],
        )
        .expect("response to unclassified question");
    let plan_keys = vec!["7.501".to_string()];

    let responses = count_responses_for_keys(&connection, 1, &plan_keys).expect("count");
    assert_eq!(responses, 1);

    let message = super::run::dropped_questions_warning(plan_keys.len(), responses);
    assert!(message.contains("1 unclassified question(s) and 1 response(s)"));
    assert!(message.contains("--fallback-category"));
}
