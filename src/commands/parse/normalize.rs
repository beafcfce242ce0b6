use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct NormalizedDocument {
    pub lines: Vec<SourceLine>,
    pub raw_line_count: usize,
    pub dehyphenation_merges: usize,
}

/// Splits raw extracted text into trimmed, printable, non-empty lines.
///
/// Form feeds emitted between pages count as line breaks. Each surviving
/// line keeps the ordinal of the raw line it came from.
pub fn normalize_document(raw: &str) -> NormalizedDocument {
    if raw.is_empty() {
        return NormalizedDocument::default();
    }

    let mut raw_line_count = 0usize;
    let mut lines = Vec::<SourceLine>::new();

    for (index, raw_line) in raw.split(['\n', '\u{c}']).enumerate() {
        raw_line_count += 1;
        let text = normalize_line(raw_line);
        if text.is_empty() {
            continue;
        }
        lines.push(SourceLine { index, text });
    }

    let (lines, dehyphenation_merges) = merge_hyphenated_lines(lines);

    NormalizedDocument {
        lines,
        raw_line_count,
        dehyphenation_merges,
    }
}

pub fn normalize_line(raw_line: &str) -> String {
    let printable = raw_line
        .chars()
        .filter_map(|character| match character {
            '\t' | '\u{a0}' | '\u{2007}' | '\u{202f}' => Some(' '),
            _ if character.is_control() || is_format_character(character) => None,
            _ => Some(character),
        })
        .collect::<String>();

    printable.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn is_format_character(character: char) -> bool {
    matches!(
        character,
        '\u{ad}' | '\u{200b}'..='\u{200f}' | '\u{2028}'..='\u{202e}' | '\u{2060}'..='\u{2064}' | '\u{feff}' | '\u{fffd}'
    )
}

fn merge_hyphenated_lines(lines: Vec<SourceLine>) -> (Vec<SourceLine>, usize) {
    let mut merged = Vec::<SourceLine>::with_capacity(lines.len());
    let mut merges = 0usize;
    let mut index = 0usize;

    while index < lines.len() {
        let current = &lines[index];
        if let Some(next) = lines.get(index + 1) {
            if should_merge_hyphenated_pair(&current.text, &next.text) {
                merged.push(SourceLine {
                    index: current.index,
                    text: format!("{}{}", current.text.trim_end_matches('-'), next.text),
                });
                merges += 1;
                index += 2;
                continue;
            }
        }

        merged.push(current.clone());
        index += 1;
    }

    (merged, merges)
}

fn should_merge_hyphenated_pair(current: &str, next: &str) -> bool {
    if !current.ends_with('-') || current.ends_with("--") {
        return false;
    }

    let starts_with_lowercase = next
        .chars()
        .next()
        .map(|character| character.is_lowercase())
        .unwrap_or(false);
    if !starts_with_lowercase {
        return false;
    }

    current
        .trim_end_matches('-')
        .chars()
        .last()
        .map(|character| character.is_alphabetic())
        .unwrap_or(false)
}
