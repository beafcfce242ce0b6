use super::*;

/// Compares a fresh accepted set with a previously written one.
pub fn compute_drift(
    previous_path: &Path,
    previous: &[AcceptedQuestion],
    current: &[AcceptedQuestion],
) -> DriftReport {
    let previous_by_key = previous
        .iter()
        .map(|question| (question.pq_number.as_str(), question))
        .collect::<BTreeMap<&str, &AcceptedQuestion>>();
    let current_by_key = current
        .iter()
        .map(|question| (question.pq_number.as_str(), question))
        .collect::<BTreeMap<&str, &AcceptedQuestion>>();

    let mut report = DriftReport {
        previous_path: previous_path.display().to_string(),
        ..DriftReport::default()
    };

    for (key, question) in &current_by_key {
        match previous_by_key.get(key) {
            None => report.added.push((*key).to_string()),
            Some(before) if !same_content(before, question) => {
                report.changed.push((*key).to_string())
            }
            Some(_) => report.unchanged_count += 1,
        }
    }

    report.removed = previous_by_key
        .keys()
        .filter(|key| !current_by_key.contains_key(*key))
        .map(|key| (*key).to_string())
        .collect();

    report
}

fn same_content(left: &AcceptedQuestion, right: &AcceptedQuestion) -> bool {
    left.question_en == right.question_en
        && left.guidance_en == right.guidance_en
        && left.references == right.references
        && left.is_priority == right.is_priority
        && left.requires_on_site == right.requires_on_site
        && left.critical_element == right.critical_element
}
