use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use tracing::{info, warn};

use crate::cli::{AssemblerMode, ParseArgs};
use crate::model::{
    AcceptedQuestion, DriftReport, InputSource, ParseCounts, ParsePaths, ParseRunManifest,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, run_id_for, sha256_file, utc_compact_string,
    write_json_pretty,
};

/// ANS audit area; boundary markers look like `7.001`.
pub const DEFAULT_ITEM_PREFIX: &str = "7";
/// Shortest question text accepted for a record.
pub const MIN_HEADER_CHARS: usize = 15;
/// Lines scanned after a boundary marker in look-ahead mode.
pub const LOOKAHEAD_WINDOW: usize = 6;
/// Default artifact name under the cache root.
pub const ACCEPTED_QUESTIONS_FILE: &str = "accepted_questions.json";

mod assembler;
mod drift;
mod line_classifier;
mod normalize;
mod run;
#[cfg(test)]
mod tests;
mod validate;

pub use run::{ParserConfig, parse_document, run};
pub use validate::item_sort_key;

use assembler::*;
use drift::*;
use line_classifier::*;
use normalize::*;
use validate::*;
