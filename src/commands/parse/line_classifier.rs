use super::*;

/// Role of a single normalized line. Variant order is tag priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineTag {
    Skip,
    ItemBoundary,
    CriticalElementTag,
    PriorityMarker,
    OnSiteMarker,
    ReferenceCitation,
    GuidanceStart,
    QuestionStart,
    Content,
}

impl LineTag {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTag::Skip => "skip",
            LineTag::ItemBoundary => "item_boundary",
            LineTag::CriticalElementTag => "critical_element_tag",
            LineTag::PriorityMarker => "priority_marker",
            LineTag::OnSiteMarker => "on_site_marker",
            LineTag::ReferenceCitation => "reference_citation",
            LineTag::GuidanceStart => "guidance_start",
            LineTag::QuestionStart => "question_start",
            LineTag::Content => "content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub index: usize,
    pub text: String,
    pub tag: LineTag,
    /// Normalized `CE-n` label for critical element tags.
    pub label: Option<String>,
}

const SKIP_PATTERNS: &[&str] = &[
    r"(?i)^page\s+\d+(?:\s+of\s+\d+)?$",
    r"^-?\s*\d{1,4}\s*-?$",
    r"\.{3,}\s*\d+\s*$",
    r"(?i)^USOAP\b",
    r"(?i)^(?:PQ\s*)?No\.?$",
    r"(?i)^Protocol\s+Questions?$",
    r"(?i)^Guidance\s+for\s+review\s+of\s+evidence$",
    r"(?i)^ICAO\s+references?$",
    r"(?i)^(?:PPQ|CE|Status\s+of\s+implementation)$",
    r"(?i)^Air\s+Navigation\s+Services(?:\s*\(ANS\))?$",
    r"(?i)^(?:for\s+official\s+use\s+only|restricted)$",
    r"(?i)^(?:©|\(c\)|copyright)\s*(?:\d{4}\s*)?ICAO\b",
    r"(?i)^(?:\d{1,2}\s+)?(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}$",
];

const CITATION_PATTERNS: &[&str] = &[
    r"(?i)^(?:ICAO\s+)?Doc\s+\d{4}\b",
    r"(?i)^Annex\s+\d{1,2}\b",
    r"(?i)^PANS[-\s]?(?:ATM|OPS|AIM|ABC)\b",
    r"(?i)^(?:STD|GM|CC|RP|SARPs?)\b",
    r"(?i)^(?:Chapter|Section|Appendix|Attachment|Part|Vol(?:ume)?\.?)\s+[0-9IVXLC]+\b",
    r"^§\s*\d",
    r"^\d+(?:\.\d+){1,4}(?:\s*[,;]\s*\d+(?:\.\d+)*)*$",
];

const GUIDANCE_PREFIXES: &[&str] = &[
    "verify",
    "review",
    "confirm",
    "check",
    "examine",
    "evaluate",
    "assess",
    "ensure",
    "obtain",
    "sample",
    "interview",
    "observe",
    "determine",
];

const QUESTION_PREFIXES: &[&str] = &[
    "has the state",
    "have the",
    "has the",
    "has an",
    "does the state",
    "does the",
    "do the",
    "did the",
    "is the state",
    "is the",
    "is there",
    "are the",
    "are there",
];

#[derive(Debug)]
pub struct LineClassifier {
    skip_patterns: Vec<Regex>,
    item_boundary: Regex,
    critical_element: Regex,
    priority_marker: Regex,
    on_site_marker: Regex,
    citation_patterns: Vec<Regex>,
}

impl LineClassifier {
    pub fn new(item_prefix: &str) -> Result<Self> {
        let item_prefix = item_prefix.trim();
        let item_boundary = Regex::new(&format!(r"^{}\.\d{{3}}$", regex::escape(item_prefix)))
            .with_context(|| format!("failed to compile item boundary regex for '{item_prefix}'"))?;

        Ok(Self {
            skip_patterns: compile_patterns(SKIP_PATTERNS, "skip")?,
            item_boundary,
            critical_element: Regex::new(r"(?i)^CE\s*[-–]?\s*([1-8])$")
                .context("failed to compile critical element regex")?,
            priority_marker: Regex::new(r"(?i)^(?:√|✓|✔|PPQ\s*[:=]?\s*(?:yes|y|√|✓|✔))$")
                .context("failed to compile priority marker regex")?,
            on_site_marker: Regex::new(
                r"(?i)^(?:\(?OSV\)?|on[-\s]?site(?:\s+verification)?(?:\s+required)?)$",
            )
            .context("failed to compile on-site marker regex")?,
            citation_patterns: compile_patterns(CITATION_PATTERNS, "citation")?,
        })
    }

    pub fn classify_line(&self, line: &str) -> LineTag {
        let line = line.trim();

        if line.is_empty() || self.skip_patterns.iter().any(|regex| regex.is_match(line)) {
            return LineTag::Skip;
        }
        if self.item_boundary.is_match(line) {
            return LineTag::ItemBoundary;
        }
        if self.critical_element.is_match(line) {
            return LineTag::CriticalElementTag;
        }
        if self.priority_marker.is_match(line) {
            return LineTag::PriorityMarker;
        }
        if self.on_site_marker.is_match(line) {
            return LineTag::OnSiteMarker;
        }
        if self.citation_patterns.iter().any(|regex| regex.is_match(line)) {
            return LineTag::ReferenceCitation;
        }
        if starts_with_phrase(line, GUIDANCE_PREFIXES) {
            return LineTag::GuidanceStart;
        }
        if starts_with_phrase(line, QUESTION_PREFIXES) {
            return LineTag::QuestionStart;
        }

        LineTag::Content
    }

    pub fn critical_element_label(&self, line: &str) -> Option<String> {
        let captures = self.critical_element.captures(line.trim())?;
        captures.get(1).map(|m| format!("CE-{}", m.as_str()))
    }

    pub fn classify_lines(&self, lines: &[SourceLine]) -> Vec<ClassifiedLine> {
        lines
            .iter()
            .map(|line| {
                let tag = self.classify_line(&line.text);
                let label = if tag == LineTag::CriticalElementTag {
                    self.critical_element_label(&line.text)
                } else {
                    None
                };
                ClassifiedLine {
                    index: line.index,
                    text: line.text.clone(),
                    tag,
                    label,
                }
            })
            .collect()
    }
}

fn compile_patterns(patterns: &[&str], kind: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("failed to compile {kind} pattern: {pattern}"))
        })
        .collect()
}

/// Case-insensitive phrase prefix match that stops at a word boundary.
fn starts_with_phrase(line: &str, phrases: &[&str]) -> bool {
    let lower = line.to_lowercase();
    phrases.iter().any(|phrase| {
        lower.starts_with(phrase)
            && lower[phrase.len()..]
                .chars()
                .next()
                .map(|character| !character.is_alphanumeric())
                .unwrap_or(true)
    })
}
