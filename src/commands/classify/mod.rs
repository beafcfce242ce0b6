use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::ClassifyArgs;
use crate::commands::parse::item_sort_key;
use crate::model::{AcceptedQuestion, CategoryCount};
use crate::store::{default_db_path, load_persisted_questions, open_store, primary_questionnaire_id};
use crate::taxonomy::{TAXONOMY, TargetCategory, canonical_index, category_by_code};
use crate::util::{ensure_directory, now_utc_string, read_json, utc_compact_string, write_json_pretty};

mod report;
mod rules;
mod run;
mod strategies;

pub use report::{ClassificationReport, group_by_category, print_classification_summary};
pub use rules::{ClassificationRules, load_rules};
pub use run::{load_question_source, run};
pub use strategies::{ClassificationDecision, Provenance, TaxonomyClassifier};

use report::*;
use rules::*;
use strategies::*;
