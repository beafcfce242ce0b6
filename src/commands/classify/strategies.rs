use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    ExactLookup,
    PrefixRule,
    KeywordScore,
    Unclassified,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::ExactLookup => "exact_lookup",
            Provenance::PrefixRule => "prefix_rule",
            Provenance::KeywordScore => "keyword_score",
            Provenance::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyMatch {
    pub category: &'static str,
    pub matched_rule: Option<String>,
    pub score: Option<u32>,
    pub runner_up_score: Option<u32>,
    pub tied_categories: Vec<String>,
}

impl StrategyMatch {
    fn direct(category: &'static str, matched_rule: String) -> Self {
        Self {
            category,
            matched_rule: Some(matched_rule),
            score: None,
            runner_up_score: None,
            tied_categories: Vec::new(),
        }
    }
}

/// One tier of the classifier. Returning `None` hands the question to the next tier.
pub trait ClassificationStrategy {
    fn provenance(&self) -> Provenance;
    fn classify(&self, question: &AcceptedQuestion) -> Option<StrategyMatch>;
}

#[derive(Debug)]
pub struct ExactLookupStrategy {
    table: BTreeMap<String, &'static str>,
}

impl ExactLookupStrategy {
    pub fn new(rules: &ClassificationRules) -> Self {
        let table = rules
            .exact
            .iter()
            .filter_map(|(key, code)| {
                category_by_code(code).map(|category| (key.trim().to_string(), category.code))
            })
            .collect();
        Self { table }
    }
}

impl ClassificationStrategy for ExactLookupStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::ExactLookup
    }

    fn classify(&self, question: &AcceptedQuestion) -> Option<StrategyMatch> {
        let key = question.pq_number.trim();
        self.table
            .get(key)
            .map(|category| StrategyMatch::direct(*category, key.to_string()))
    }
}

#[derive(Debug)]
pub struct PrefixRuleStrategy {
    rules: Vec<(String, PrefixMatch, &'static str)>,
}

impl PrefixRuleStrategy {
    pub fn new(rules: &ClassificationRules) -> Self {
        let rules = rules
            .prefixes
            .iter()
            .filter_map(|rule| {
                category_by_code(&rule.category).map(|category| {
                    (
                        rule.pattern.trim().to_uppercase(),
                        rule.match_mode,
                        category.code,
                    )
                })
            })
            .collect();
        Self { rules }
    }
}

impl ClassificationStrategy for PrefixRuleStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::PrefixRule
    }

    fn classify(&self, question: &AcceptedQuestion) -> Option<StrategyMatch> {
        let targets = [Some(question.pq_number.as_str()), question.source_category.as_deref()]
            .into_iter()
            .flatten()
            .map(|target| target.trim().to_uppercase())
            .filter(|target| !target.is_empty())
            .collect::<Vec<String>>();

        for (pattern, match_mode, category) in &self.rules {
            let hit = targets.iter().find(|target| match match_mode {
                PrefixMatch::Prefix => target.starts_with(pattern.as_str()),
                PrefixMatch::Contains => target.contains(pattern.as_str()),
            });
            if let Some(target) = hit {
                return Some(StrategyMatch::direct(
                    *category,
                    format!("{pattern} in {target}"),
                ));
            }
        }

        None
    }
}

#[derive(Debug)]
pub struct KeywordScoreStrategy {
    categories: Vec<(&'static TargetCategory, Vec<(Regex, u32)>)>,
}

impl KeywordScoreStrategy {
    pub fn new(rules: &ClassificationRules) -> Result<Self> {
        Ok(Self {
            categories: compile_keyword_rules(rules)?,
        })
    }

    /// Scores in canonical taxonomy order.
    pub fn scores(&self, question: &AcceptedQuestion) -> Vec<(&'static str, u32)> {
        let text = scoring_text(question);
        self.categories
            .iter()
            .map(|(category, patterns)| {
                let score = patterns.iter().fold(0_u32, |total, (regex, weight)| {
                    let hits = u32::try_from(regex.find_iter(&text).count()).unwrap_or(u32::MAX);
                    total.saturating_add(hits.saturating_mul(*weight))
                });
                (category.code, score)
            })
            .collect()
    }
}

impl ClassificationStrategy for KeywordScoreStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::KeywordScore
    }

    fn classify(&self, question: &AcceptedQuestion) -> Option<StrategyMatch> {
        let scores = self.scores(question);
        let best = scores.iter().map(|(_, score)| *score).max().unwrap_or(0);
        if best == 0 {
            return None;
        }

        let tied = scores
            .iter()
            .filter(|(_, score)| *score == best)
            .map(|(code, _)| *code)
            .collect::<Vec<&'static str>>();
        let winner = *tied.first()?;

        let runner_up = if tied.len() > 1 {
            best
        } else {
            scores
                .iter()
                .filter(|(code, _)| *code != winner)
                .map(|(_, score)| *score)
                .max()
                .unwrap_or(0)
        };

        Some(StrategyMatch {
            category: winner,
            matched_rule: None,
            score: Some(best),
            runner_up_score: Some(runner_up),
            tied_categories: if tied.len() > 1 {
                tied.iter().map(|code| (*code).to_string()).collect()
            } else {
                Vec::new()
            },
        })
    }
}

fn scoring_text(question: &AcceptedQuestion) -> String {
    [
        question.question_en.as_str(),
        question.references.as_str(),
        question.guidance_en.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<&str>>()
    .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationDecision {
    pub pq_number: String,
    pub category: Option<String>,
    pub provenance: Provenance,
    pub matched_rule: Option<String>,
    pub score: Option<u32>,
    pub runner_up_score: Option<u32>,
    pub margin: Option<u32>,
    pub low_confidence: bool,
    pub tied_categories: Vec<String>,
}

impl ClassificationDecision {
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}

/// Ordered strategy list composed first-match-wins.
pub struct TaxonomyClassifier {
    strategies: Vec<Box<dyn ClassificationStrategy>>,
}

impl TaxonomyClassifier {
    pub fn from_rules(rules: &ClassificationRules) -> Result<Self> {
        Ok(Self::with_strategies(vec![
            Box::new(ExactLookupStrategy::new(rules)),
            Box::new(PrefixRuleStrategy::new(rules)),
            Box::new(KeywordScoreStrategy::new(rules)?),
        ]))
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ClassificationStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn classify(&self, question: &AcceptedQuestion) -> ClassificationDecision {
        for strategy in &self.strategies {
            let Some(matched) = strategy.classify(question) else {
                continue;
            };

            let low_confidence = !matched.tied_categories.is_empty();
            let margin = matched
                .score
                .zip(matched.runner_up_score)
                .map(|(score, runner_up)| score.saturating_sub(runner_up));
            let decision = ClassificationDecision {
                pq_number: question.pq_number.clone(),
                category: Some(matched.category.to_string()),
                provenance: strategy.provenance(),
                matched_rule: matched.matched_rule,
                score: matched.score,
                runner_up_score: matched.runner_up_score,
                margin,
                low_confidence,
                tied_categories: matched.tied_categories,
            };

            if low_confidence {
                warn!(
                    pq_number = %decision.pq_number,
                    category = matched.category,
                    tied = %decision.tied_categories.join(","),
                    score = decision.score.unwrap_or(0),
                    "keyword score tie resolved by taxonomy order"
                );
            } else {
                info!(
                    pq_number = %decision.pq_number,
                    category = matched.category,
                    provenance = decision.provenance.as_str(),
                    score = ?decision.score,
                    margin = ?decision.margin,
                    "classified question"
                );
            }

            return decision;
        }

        warn!(pq_number = %question.pq_number, "question could not be classified");
        ClassificationDecision {
            pq_number: question.pq_number.clone(),
            category: None,
            provenance: Provenance::Unclassified,
            matched_rule: None,
            score: Some(0),
            runner_up_score: None,
            margin: None,
            low_confidence: false,
            tied_categories: Vec::new(),
        }
    }

    pub fn classify_all(&self, questions: &[AcceptedQuestion]) -> Vec<ClassificationDecision> {
        questions
            .iter()
            .map(|question| self.classify(question))
            .collect()
    }
}
