use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Body,
    Citation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateRecord {
    pub item_key: String,
    pub header_text: String,
    pub body_text: String,
    pub citation_text: String,
    pub is_priority: bool,
    pub requires_on_site: bool,
    pub critical_element: Option<String>,
    pub first_line: usize,
    pub last_line: usize,
}

impl CandidateRecord {
    fn start(item_key: &str, line_index: usize, critical_element: Option<String>) -> Self {
        Self {
            item_key: item_key.to_string(),
            critical_element,
            first_line: line_index,
            last_line: line_index,
            ..Self::default()
        }
    }

    fn append(&mut self, section: Section, text: &str) {
        let buffer = match section {
            Section::Header => &mut self.header_text,
            Section::Body => &mut self.body_text,
            Section::Citation => &mut self.citation_text,
        };
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(text);
    }
}

#[derive(Debug)]
struct OpenRecord {
    record: CandidateRecord,
    section: Section,
}

/// Fold state of the assembler. `None` in `open` is the awaiting-boundary state.
#[derive(Debug, Default)]
struct AssemblerState {
    open: Option<OpenRecord>,
    current_default_category: Option<String>,
    emitted: Vec<CandidateRecord>,
    preamble_line_count: usize,
    skipped_line_count: usize,
    boundary_marker_count: usize,
    index_artifact_count: usize,
}

impl AssemblerState {
    fn finalize_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.emitted.push(open.record);
        }
    }
}

#[derive(Debug, Default)]
pub struct AssemblyOutcome {
    pub candidates: Vec<CandidateRecord>,
    pub preamble_line_count: usize,
    pub skipped_line_count: usize,
    pub boundary_marker_count: usize,
    pub index_artifact_count: usize,
}

/// Groups classified lines into candidate records.
///
/// Output may contain duplicates and records with empty text; those are the
/// validator's concern.
pub fn assemble_records(
    lines: &[ClassifiedLine],
    mode: AssemblerMode,
    lookahead_window: usize,
) -> AssemblyOutcome {
    let mut state = lines
        .iter()
        .enumerate()
        .fold(AssemblerState::default(), |state, (position, line)| {
            let index_artifact = mode == AssemblerMode::LookAhead
                && line.tag == LineTag::ItemBoundary
                && is_index_artifact(lines, position, lookahead_window);
            step(state, line, index_artifact)
        });

    state.finalize_open();

    AssemblyOutcome {
        candidates: state.emitted,
        preamble_line_count: state.preamble_line_count,
        skipped_line_count: state.skipped_line_count,
        boundary_marker_count: state.boundary_marker_count,
        index_artifact_count: state.index_artifact_count,
    }
}

fn step(mut state: AssemblerState, line: &ClassifiedLine, index_artifact: bool) -> AssemblerState {
    match line.tag {
        LineTag::Skip => {
            state.skipped_line_count += 1;
            return state;
        }
        LineTag::ItemBoundary => {
            state.boundary_marker_count += 1;
            if index_artifact {
                state.index_artifact_count += 1;
                return state;
            }
            state.finalize_open();
            state.open = Some(OpenRecord {
                record: CandidateRecord::start(
                    &line.text,
                    line.index,
                    state.current_default_category.clone(),
                ),
                section: Section::Header,
            });
            return state;
        }
        LineTag::CriticalElementTag => {
            if let Some(label) = line.label.clone() {
                state.current_default_category = Some(label.clone());
                if let Some(open) = state.open.as_mut() {
                    open.record.critical_element = Some(label);
                }
            }
            if let Some(open) = state.open.as_mut() {
                open.record.last_line = line.index;
            }
            return state;
        }
        _ => {}
    }

    let Some(open) = state.open.as_mut() else {
        state.preamble_line_count += 1;
        return state;
    };
    open.record.last_line = line.index;

    match line.tag {
        LineTag::PriorityMarker => {
            if open.section == Section::Header {
                open.record.is_priority = true;
            }
        }
        LineTag::OnSiteMarker => {
            if open.section == Section::Header {
                open.record.requires_on_site = true;
            }
        }
        LineTag::ReferenceCitation => {
            open.section = Section::Citation;
            open.record.append(Section::Citation, &line.text);
        }
        LineTag::GuidanceStart => {
            open.section = Section::Body;
            open.record.append(Section::Body, &line.text);
        }
        LineTag::QuestionStart => {
            if open.record.header_text.is_empty() {
                open.section = Section::Header;
            }
            open.record.append(open.section, &line.text);
        }
        LineTag::Content => {
            open.record.append(open.section, &line.text);
        }
        LineTag::Skip | LineTag::ItemBoundary | LineTag::CriticalElementTag => {}
    }

    state
}

/// A boundary marker followed by another marker before any text is a row of
/// an index or summary table rather than the start of a question.
fn is_index_artifact(lines: &[ClassifiedLine], position: usize, window: usize) -> bool {
    for line in lines.iter().skip(position + 1).take(window) {
        match line.tag {
            LineTag::ItemBoundary => return true,
            LineTag::Content | LineTag::QuestionStart | LineTag::GuidanceStart => return false,
            _ => {}
        }
    }

    false
}
