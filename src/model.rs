use serde::{Deserialize, Serialize};

/// A validated Protocol Question in the hand-off format shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AcceptedQuestion {
    pub pq_number: String,
    pub question_en: String,
    #[serde(default)]
    pub question_fr: String,
    #[serde(default)]
    pub guidance_en: String,
    #[serde(default)]
    pub guidance_fr: String,
    #[serde(default)]
    pub references: String,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub requires_on_site: bool,
    #[serde(default)]
    pub critical_element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSource {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsePaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub input_path: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ParseCounts {
    pub raw_line_count: usize,
    pub normalized_line_count: usize,
    pub dehyphenation_merges: usize,
    pub skipped_line_count: usize,
    pub preamble_line_count: usize,
    pub boundary_marker_count: usize,
    pub index_artifact_count: usize,
    pub candidate_count: usize,
    pub rejected_short_header_count: usize,
    pub duplicate_count: usize,
    pub accepted_count: usize,
    pub priority_count: usize,
    pub on_site_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub previous_path: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
    pub unchanged_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub assembler_mode: String,
    pub item_prefix: String,
    pub min_header_chars: usize,
    pub lookahead_window: usize,
    pub paths: ParsePaths,
    pub source: InputSource,
    pub counts: ParseCounts,
    pub drift: Option<DriftReport>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub code: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStepRecord {
    pub step: String,
    pub affected_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub dry_run: bool,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub db_path: String,
    pub questionnaire_kind: String,
    pub question_source: String,
    pub completed_steps: Vec<MigrationStepRecord>,
    pub failed_step: Option<String>,
    pub failure_reason: Option<String>,
    pub before: Vec<CategoryCount>,
    pub after: Vec<CategoryCount>,
    pub classified_count: usize,
    pub placeholder_count: usize,
    pub unclassified: Vec<String>,
    pub low_confidence: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SeedCounts {
    pub input_count: usize,
    pub categories_created: usize,
    pub questions_created: usize,
    pub questions_skipped: usize,
    pub references_created: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub db_path: String,
    pub questionnaire_kind: String,
    pub questionnaire_id: i64,
    pub questionnaire_created: bool,
    pub source: InputSource,
    pub counts: SeedCounts,
}
