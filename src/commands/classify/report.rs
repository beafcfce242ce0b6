use super::*;

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub question_source: String,
    pub question_count: usize,
    pub counts: Vec<CategoryCount>,
    pub by_provenance: BTreeMap<String, usize>,
    pub unclassified: Vec<String>,
    pub low_confidence: Vec<String>,
    pub decisions: Vec<ClassificationDecision>,
}

impl ClassificationReport {
    pub fn from_decisions(question_source: &str, decisions: Vec<ClassificationDecision>) -> Self {
        let mut per_category = BTreeMap::<&str, i64>::new();
        let mut by_provenance = BTreeMap::<String, usize>::new();
        let mut unclassified = Vec::new();
        let mut low_confidence = Vec::new();

        for decision in &decisions {
            *by_provenance
                .entry(decision.provenance.as_str().to_string())
                .or_insert(0) += 1;
            match decision.category.as_deref().and_then(category_by_code) {
                Some(category) => *per_category.entry(category.code).or_insert(0) += 1,
                None => unclassified.push(decision.pq_number.clone()),
            }
            if decision.low_confidence {
                low_confidence.push(decision.pq_number.clone());
            }
        }

        let counts = TAXONOMY
            .iter()
            .map(|category| CategoryCount {
                code: category.code.to_string(),
                count: per_category.get(category.code).copied().unwrap_or(0),
            })
            .collect();

        Self {
            manifest_version: 1,
            generated_at: now_utc_string(),
            question_source: question_source.to_string(),
            question_count: decisions.len(),
            counts,
            by_provenance,
            unclassified,
            low_confidence,
            decisions,
        }
    }

    pub fn classified_count(&self) -> usize {
        self.question_count - self.unclassified.len()
    }
}

/// Buckets questions by their decided category, in canonical taxonomy order.
///
/// Questions without a category go to `fallback` when one is given and are
/// otherwise left out. Within a bucket, questions keep numeric key order.
pub fn group_by_category(
    questions: &[AcceptedQuestion],
    decisions: &[ClassificationDecision],
    fallback: Option<&'static TargetCategory>,
) -> Vec<(&'static TargetCategory, Vec<AcceptedQuestion>)> {
    let mut buckets = TAXONOMY
        .iter()
        .map(|category| (category, Vec::<AcceptedQuestion>::new()))
        .collect::<Vec<_>>();

    for (question, decision) in questions.iter().zip(decisions) {
        let target = decision
            .category
            .as_deref()
            .and_then(category_by_code)
            .or(fallback);
        let Some(target) = target else {
            continue;
        };
        if let Some(index) = canonical_index(target.code) {
            buckets[index].1.push(question.clone());
        }
    }

    for (_, bucket) in &mut buckets {
        bucket.sort_by(|left, right| {
            let left_key = item_sort_key(&left.pq_number).unwrap_or((u32::MAX, u32::MAX));
            let right_key = item_sort_key(&right.pq_number).unwrap_or((u32::MAX, u32::MAX));
            left_key
                .cmp(&right_key)
                .then_with(|| left.pq_number.cmp(&right.pq_number))
        });
    }

    buckets
}

pub fn print_classification_summary(report: &ClassificationReport) {
    println!("Classification summary ({})", report.question_source);
    println!("  questions:  {}", report.question_count);
    println!("  classified: {}", report.classified_count());
    for count in &report.counts {
        println!("    {:<4} {}", count.code, count.count);
    }
    for (provenance, count) in &report.by_provenance {
        println!("  via {provenance}: {count}");
    }

    if !report.unclassified.is_empty() {
        println!(
            "Unclassified, needs manual mapping ({}): {}",
            report.unclassified.len(),
            report.unclassified.join(", ")
        );
    }
    if !report.low_confidence.is_empty() {
        println!(
            "Low confidence (score tie) ({}): {}",
            report.low_confidence.len(),
            report.low_confidence.join(", ")
        );
    }
}
