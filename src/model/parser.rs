// File: src/model/parser.rs
//! Turns board text into dated task records.
//!
//! The scan is a single forward pass over the lines. A task line that carries
//! no date of its own may borrow one from its parent (when indented) or from
//! the next few lines, up to the next top-level task. Items that end up
//! without a date are left out: they cannot be placed on a calendar.
use crate::model::grammar::{self, TimeToken};
use crate::model::{TaskRecord, TaskTime};
use chrono::NaiveDate;

/// Lines after a task line that may carry its metadata.
pub const LOOKAHEAD_LINES: usize = 3;

/// What subtasks inherit from the closest top-level task above them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentContext {
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

/// State threaded through the line scan.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pub parent: Option<ParentContext>,
    pub section: Option<String>,
}

/// Annotations read from one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMeta {
    pub date: Option<NaiveDate>,
    pub time: Option<TimeToken>,
    pub tags: Vec<String>,
}

impl LineMeta {
    pub fn scan(line: &str) -> Self {
        let mut tags = Vec::new();
        merge_tags(
            &mut tags,
            grammar::find_tags(line).into_iter().map(|t| t.value),
        );
        Self {
            date: grammar::find_date(line).map(|d| d.value),
            time: grammar::find_time(line).map(|t| t.value),
            tags,
        }
    }
}

fn merge_tags<I>(into: &mut Vec<String>, tags: I)
where
    I: IntoIterator<Item = String>,
{
    for tag in tags {
        if !into.contains(&tag) {
            into.push(tag);
        }
    }
}

/// First line within the lookahead window that carries a date.
///
/// The window stops early at a top-level task line: metadata only belongs to
/// the task directly above it.
pub fn lookahead(lines: &[&str], at: usize) -> Option<(usize, LineMeta)> {
    for j in (at + 1..lines.len()).take(LOOKAHEAD_LINES) {
        let line = lines[j];
        if grammar::is_task_line(line) && !grammar::is_indented(line) {
            break;
        }
        let meta = LineMeta::scan(line);
        if meta.date.is_some() {
            return Some((j, meta));
        }
    }
    None
}

fn clean_description(line: &str, own: &LineMeta, tags: &[String]) -> String {
    let mut text = match grammar::find_marker(line) {
        Some(m) => format!("{}{}", &line[..m.start], &line[m.end..]),
        None => line.to_string(),
    };
    if let Some(span) = grammar::find_date(&text) {
        text.replace_range(span.range(), "");
    }
    if own.time.is_some()
        && let Some(span) = grammar::find_time(&text)
    {
        text.replace_range(span.range(), "");
    }
    // Plain text removal: a tag that is a prefix of a longer word is also cut.
    for tag in tags {
        text = text.replace(tag.as_str(), "");
    }
    grammar::strip_emphasis(text.trim()).trim().to_string()
}

/// Reads the task line at `at`, updating the scan state for the lines below.
pub fn scan_task_line(
    lines: &[&str],
    at: usize,
    state: &mut ScanState,
    source: &str,
) -> Option<TaskRecord> {
    let line = lines[at];
    let completed = grammar::find_marker(line)?.value;
    let subtask = grammar::is_indented(line);

    let own = LineMeta::scan(line);
    let mut date = own.date;
    let mut tags = own.tags.clone();
    let mut time: Option<TaskTime> = own.time.as_ref().map(|t| t.time.clone());

    if subtask && let Some(parent) = &state.parent {
        merge_tags(&mut tags, parent.tags.iter().cloned());
        if date.is_none() {
            date = parent.date;
        }
    }

    if date.is_none()
        && let Some((_, found)) = lookahead(lines, at)
    {
        date = found.date;
        merge_tags(&mut tags, found.tags);
        if time.is_none() {
            time = found.time.map(|t| t.time);
        }
    }

    if !subtask {
        state.parent = Some(ParentContext {
            date,
            tags: tags.clone(),
        });
    }

    let date = date?;
    let description = clean_description(line, &own, &tags);
    Some(TaskRecord {
        id: TaskRecord::make_id(source, &description, date),
        description,
        date,
        time,
        tags,
        completed,
        source: source.to_string(),
        linked_note: grammar::find_link(line),
        list_name: state.section.clone(),
    })
}

/// Extracts every dated task from `text`, in document order.
///
/// Never fails: malformed or undated items are skipped. Lines read as
/// lookahead metadata are not consumed; they have no checklist marker and
/// fall through the outer loop on their own.
pub fn extract(text: &str, source: &str) -> Vec<TaskRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let mut state = ScanState::default();
    let mut tasks = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(title) = grammar::section_title(line) {
            state.section = Some(title.to_string());
            continue;
        }
        if grammar::is_task_line(line)
            && let Some(task) = scan_task_line(&lines, i, &mut state, source)
        {
            tasks.push(task);
        }
    }
    tasks
}
