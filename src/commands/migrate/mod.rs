use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{error, info, warn};

use crate::cli::MigrateArgs;
use crate::commands::classify::{
    ClassificationReport, TaxonomyClassifier, group_by_category, load_rules,
};
use crate::model::{AcceptedQuestion, CategoryCount, MigrationRunManifest, MigrationStepRecord};
use crate::store::{
    category_breakdown, default_db_path, load_persisted_questions, open_store,
    primary_questionnaire_id, questionnaire_ids_of_kind,
};
use crate::taxonomy::{
    ANS_QUESTIONNAIRE_CODE, ANS_QUESTIONNAIRE_DESCRIPTION_EN, ANS_QUESTIONNAIRE_DESCRIPTION_FR,
    ANS_QUESTIONNAIRE_TITLE_EN, ANS_QUESTIONNAIRE_TITLE_FR, ANS_QUESTIONNAIRE_VERSION, TAXONOMY,
    TargetCategory, all_codes, category_by_code, placeholders_for,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, run_id_for, utc_compact_string,
    write_json_pretty,
};

mod ledger;
mod orchestrator;
mod run;
mod steps;
#[cfg(test)]
mod tests;

pub use ledger::StepLedger;
pub use orchestrator::{MigrationOutcome, MigrationPlan, migrate_store};
pub use run::run;

use steps::*;
