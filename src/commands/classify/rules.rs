use super::*;

/// Rule set driving the three classification strategies.
///
/// The same shape is accepted from an external JSON file via `--rules`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassificationRules {
    /// Item key → category code. Authoritative over every heuristic.
    #[serde(default)]
    pub exact: BTreeMap<String, String>,
    #[serde(default)]
    pub prefixes: Vec<PrefixRule>,
    /// Category code → weighted patterns.
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<KeywordRule>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrefixMatch {
    #[default]
    Contains,
    Prefix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRule {
    pub pattern: String,
    pub category: String,
    #[serde(default)]
    pub match_mode: PrefixMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub pattern: String,
    #[serde(default = "default_keyword_weight")]
    pub weight: u32,
}

fn default_keyword_weight() -> u32 {
    1
}

/// Largest weight accepted for a single keyword pattern.
pub const MAX_KEYWORD_WEIGHT: u32 = 1000;

pub fn load_rules(path: Option<&Path>) -> Result<ClassificationRules> {
    let rules = match path {
        Some(path) => {
            let rules: ClassificationRules = read_json(path)?;
            info!(
                path = %path.display(),
                exact = rules.exact.len(),
                prefixes = rules.prefixes.len(),
                keyword_categories = rules.keywords.len(),
                "loaded external classification rules"
            );
            rules
        }
        None => default_rules(),
    };

    check_rule_categories(&rules)?;
    Ok(rules)
}

fn check_rule_categories(rules: &ClassificationRules) -> Result<()> {
    for (key, code) in &rules.exact {
        if category_by_code(code).is_none() {
            bail!("exact rule for {key} names unknown category '{code}'");
        }
    }
    for rule in &rules.prefixes {
        if category_by_code(&rule.category).is_none() {
            bail!(
                "prefix rule '{}' names unknown category '{}'",
                rule.pattern,
                rule.category
            );
        }
        if rule.pattern.trim().is_empty() {
            bail!("prefix rule for '{}' has an empty pattern", rule.category);
        }
    }
    for (code, keyword_rules) in &rules.keywords {
        if category_by_code(code).is_none() {
            bail!("keyword rules name unknown category '{code}'");
        }
        for rule in keyword_rules {
            if rule.weight > MAX_KEYWORD_WEIGHT {
                bail!(
                    "keyword rule '{}' for {code} has weight {}, above the limit of {MAX_KEYWORD_WEIGHT}",
                    rule.pattern,
                    rule.weight
                );
            }
        }
    }
    Ok(())
}

pub(super) fn compile_keyword_rules(
    rules: &ClassificationRules,
) -> Result<Vec<(&'static TargetCategory, Vec<(Regex, u32)>)>> {
    let mut compiled = Vec::new();

    for category in TAXONOMY {
        let Some(category_rules) = rules
            .keywords
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(category.code))
            .map(|(_, list)| list)
        else {
            continue;
        };

        let mut patterns = Vec::with_capacity(category_rules.len());
        for rule in category_rules {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| {
                    format!(
                        "failed to compile keyword pattern for {}: {}",
                        category.code, rule.pattern
                    )
                })?;
            patterns.push((regex, rule.weight));
        }
        compiled.push((category, patterns));
    }

    Ok(compiled)
}

const DEFAULT_EXACT: &[(&str, &str)] = &[
    ("7.001", "GEN"),
    ("7.003", "GEN"),
    ("7.005", "GEN"),
    ("7.007", "GEN"),
    ("7.011", "GEN"),
    ("7.013", "GEN"),
    ("7.015", "GEN"),
    ("7.021", "ATM"),
    ("7.023", "ATM"),
    ("7.039", "ATM"),
    ("7.043", "ATM"),
    ("7.051", "ATM"),
    ("7.101", "FPD"),
    ("7.103", "FPD"),
    ("7.131", "AIM"),
    ("7.133", "AIM"),
    ("7.147", "AIM"),
    ("7.181", "MAP"),
    ("7.185", "MAP"),
    ("7.231", "CNS"),
    ("7.233", "CNS"),
    ("7.251", "CNS"),
    ("7.301", "MET"),
    ("7.305", "MET"),
    ("7.331", "MET"),
    ("7.381", "SAR"),
    ("7.385", "SAR"),
];

const DEFAULT_PREFIXES: &[(&str, &str, PrefixMatch)] = &[
    ("PANS-OPS", "FPD", PrefixMatch::Contains),
    ("FPD", "FPD", PrefixMatch::Contains),
    ("ATM", "ATM", PrefixMatch::Contains),
    ("ATS", "ATM", PrefixMatch::Contains),
    ("AIM", "AIM", PrefixMatch::Contains),
    ("AIS", "AIM", PrefixMatch::Contains),
    ("MAP", "MAP", PrefixMatch::Contains),
    ("CHART", "MAP", PrefixMatch::Contains),
    ("CNS", "CNS", PrefixMatch::Contains),
    ("MET", "MET", PrefixMatch::Prefix),
    ("SAR", "SAR", PrefixMatch::Contains),
    ("GEN", "GEN", PrefixMatch::Prefix),
];

const DEFAULT_KEYWORDS: &[(&str, &[(&str, u32)])] = &[
    (
        "GEN",
        &[
            (r"\bannex 19\b", 3),
            (r"\bdoc 9734\b", 3),
            (r"\bstate safety programme\b|\bSSP\b", 2),
            (r"\bprimary aviation legislation\b", 2),
            (r"\boversight\b", 1),
            (r"\binspectors?\b", 1),
            (r"\btechnical (?:staff|personnel)\b", 1),
        ],
    ),
    (
        "ATM",
        &[
            (r"\bannex 11\b", 3),
            (r"\bdoc 4444\b", 3),
            (r"\bPANS-ATM\b", 3),
            (r"\bair traffic\b", 2),
            (r"\bATS\b|\bATC\b|\bATM\b", 2),
            (r"\bairspace\b", 1),
            (r"\bcontrollers?\b", 1),
        ],
    ),
    (
        "FPD",
        &[
            (r"\bdoc 8168\b", 3),
            (r"\bdoc 9906\b", 3),
            (r"\bPANS-OPS\b", 3),
            (r"\binstrument flight procedures?\b", 3),
            (r"\bprocedure design", 2),
            (r"\bobstacle clearance\b", 1),
        ],
    ),
    (
        "AIM",
        &[
            (r"\bannex 15\b", 3),
            (r"\bdoc 10066\b", 3),
            (r"\bPANS-AIM\b", 3),
            (r"\bdoc 8126\b", 3),
            (r"\baeronautical information\b", 2),
            (r"\bAIS\b|\bAIM\b|\bAIP\b", 2),
            (r"\bNOTAMs?\b|\bAIRAC\b", 2),
        ],
    ),
    (
        "MAP",
        &[
            (r"\bannex 4\b", 3),
            (r"\bdoc 8697\b", 3),
            (r"\baeronautical charts?\b", 3),
            (r"\bcartograph", 2),
            (r"\bcharts?\b", 1),
            (r"\bterrain\b", 1),
        ],
    ),
    (
        "CNS",
        &[
            (r"\bannex 10\b", 3),
            (r"\bdoc 8071\b", 3),
            (r"\bnavigation aids?\b|\bNAVAIDS?\b", 2),
            (r"\bsurveillance\b|\bradar\b", 2),
            (r"\bflight inspection\b", 2),
            (r"\bCNS\b|\bGNSS\b", 2),
            (r"\bcommunications?\b|\bradio\b", 1),
            (r"\bfrequenc(?:y|ies)\b", 1),
        ],
    ),
    (
        "MET",
        &[
            (r"\bannex 3\b", 3),
            (r"\bdoc 8896\b", 3),
            (r"\bmeteorolog", 2),
            (r"\bMET\b|\bWMO\b", 2),
            (r"\bMETAR\b|\bTAF\b|\bSIGMET\b", 2),
            (r"\bvolcanic ash\b", 2),
            (r"\bweather\b", 1),
        ],
    ),
    (
        "SAR",
        &[
            (r"\bannex 12\b", 3),
            (r"\bdoc 9731\b|\bIAMSAR\b", 3),
            (r"\bsearch and rescue\b", 3),
            (r"\bSAR\b", 2),
            (r"\brescue coordination\b|\bRCCs?\b", 2),
            (r"\bdistress\b", 1),
        ],
    ),
];

/// Built-in rule set used when no external rule file is given.
pub fn default_rules() -> ClassificationRules {
    ClassificationRules {
        exact: DEFAULT_EXACT
            .iter()
            .map(|(key, code)| ((*key).to_string(), (*code).to_string()))
            .collect(),
        prefixes: DEFAULT_PREFIXES
            .iter()
            .map(|(pattern, category, match_mode)| PrefixRule {
                pattern: (*pattern).to_string(),
                category: (*category).to_string(),
                match_mode: *match_mode,
            })
            .collect(),
        keywords: DEFAULT_KEYWORDS
            .iter()
            .map(|(code, rules)| {
                (
                    (*code).to_string(),
                    rules
                        .iter()
                        .map(|(pattern, weight)| KeywordRule {
                            pattern: (*pattern).to_string(),
                            weight: *weight,
                        })
                        .collect(),
                )
            })
            .collect(),
    }
}
