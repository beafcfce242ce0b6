use super::*;

#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<AcceptedQuestion>,
    pub rejected_short_header: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Numeric `(area, sequence)` pair of an item key such as `7.012`.
pub fn item_sort_key(item_key: &str) -> Option<(u32, u32)> {
    let (area, sequence) = item_key.trim().split_once('.')?;
    Some((area.parse().ok()?, sequence.parse().ok()?))
}

pub fn validate_candidates(
    candidates: Vec<CandidateRecord>,
    min_header_chars: usize,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    let mut seen = HashSet::<String>::new();

    for candidate in candidates {
        let header = candidate.header_text.trim();
        if header.is_empty() || header.chars().count() < min_header_chars {
            outcome.rejected_short_header.push(candidate.item_key);
            continue;
        }

        if !seen.insert(candidate.item_key.clone()) {
            outcome.duplicates.push(candidate.item_key);
            continue;
        }

        outcome.accepted.push(AcceptedQuestion {
            pq_number: candidate.item_key,
            question_en: header.to_string(),
            question_fr: String::new(),
            guidance_en: candidate.body_text.trim().to_string(),
            guidance_fr: String::new(),
            references: candidate.citation_text.trim().to_string(),
            is_priority: candidate.is_priority,
            requires_on_site: candidate.requires_on_site,
            critical_element: candidate.critical_element,
            source_category: None,
        });
    }

    outcome.accepted.sort_by(|left, right| {
        let left_key = item_sort_key(&left.pq_number).unwrap_or((u32::MAX, u32::MAX));
        let right_key = item_sort_key(&right.pq_number).unwrap_or((u32::MAX, u32::MAX));
        left_key
            .cmp(&right_key)
            .then_with(|| left.pq_number.cmp(&right.pq_number))
    });

    outcome
}
