// File: src/model/editor.rs
//! In-place edits of board text.
//!
//! Edits never re-serialize the document. They find the line that holds a
//! previously extracted task in the *current* text and patch only the tokens
//! that change; every other byte is written back as it was.
//!
//! A task has no stable address in the text, so it is found by its
//! description plus the bracketed date near it. Two tasks with the same
//! description and date cannot be told apart and the first one wins. The
//! text passed in must be the latest version of the document: nothing here
//! detects a concurrent writer.
use crate::model::grammar::{self, TimeStyle};
use crate::model::{NewTask, TaskChanges, TaskRecord, TimeChange};
use chrono::NaiveDate;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// The task could not be found in the current text.
    NotFound,
    /// The edit would not change a single byte.
    Unchanged,
    /// No section other than a done column to append into.
    NoTargetSection,
    /// The task was found but a token to rewrite was not.
    TokenMissing,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::NotFound => write!(f, "Task not found in current document"),
            EditError::Unchanged => write!(f, "Nothing to change"),
            EditError::NoTargetSection => write!(f, "No open section to add the task to"),
            EditError::TokenMissing => write!(f, "Token to rewrite missing near the task"),
        }
    }
}

impl std::error::Error for EditError {}

/// Where a task sits in the current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Index of the task line.
    pub line: usize,
    /// The task line plus its metadata lines.
    pub window: Range<usize>,
}

/// The task line and up to three lines after it, cut at the next task line.
pub fn metadata_window(lines: &[&str], at: usize) -> Range<usize> {
    let mut end = at + 1;
    while end < lines.len()
        && end - at <= super::parser::LOOKAHEAD_LINES
        && !grammar::is_task_line(lines[end])
    {
        end += 1;
    }
    at..end
}

/// Byte range of the description text on a task line.
///
/// Only text after the checklist marker counts, and a match that overlaps a
/// tag, date or time token is not the description.
pub fn description_span(line: &str, description: &str) -> Option<Range<usize>> {
    if description.is_empty() {
        return None;
    }
    let from = grammar::find_marker(line)?.end;
    let mut tokens: Vec<Range<usize>> = grammar::find_tags(line)
        .iter()
        .map(|t| t.range())
        .collect();
    tokens.extend(grammar::find_date(line).map(|d| d.range()));
    tokens.extend(grammar::find_times(line).iter().map(|t| t.range()));

    line[from..]
        .match_indices(description)
        .map(|(at, _)| from + at..from + at + description.len())
        .find(|hit| {
            !tokens
                .iter()
                .any(|tok| hit.start < tok.end && tok.start < hit.end)
        })
}

/// First task line holding the record's description whose window also
/// holds the record's original date token. A record with an empty
/// description is never located.
pub fn locate(lines: &[&str], record: &TaskRecord) -> Option<Located> {
    let token = grammar::date_token(record.date);
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            grammar::is_task_line(line) && description_span(line, &record.description).is_some()
        })
        .map(|(i, _)| Located {
            line: i,
            window: metadata_window(lines, i),
        })
        .find(|found| lines[found.window.clone()].iter().any(|l| l.contains(&token)))
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

fn locate_in(lines: &[&str], record: &TaskRecord) -> Result<Located, EditError> {
    match locate(lines, record) {
        Some(found) => {
            log::debug!(
                "Located '{}' at line {} (window {:?})",
                record.description,
                found.line,
                found.window
            );
            Ok(found)
        }
        None => {
            log::debug!(
                "No line in {} matches '{}' with {}",
                record.source,
                record.description,
                grammar::date_token(record.date)
            );
            Err(EditError::NotFound)
        }
    }
}

/// Replaces the first `old` with `new` in the window; returns the line index.
fn replace_in_window(
    lines: &mut [String],
    window: Range<usize>,
    old: &str,
    new: &str,
) -> Option<usize> {
    let idx = window.into_iter().find(|&i| lines[i].contains(old))?;
    lines[idx] = lines[idx].replacen(old, new, 1);
    Some(idx)
}

/// Appends a token at the end of the line, before a trailing `\r`.
fn push_token(line: &mut String, token: &str) {
    let cr = line.ends_with('\r');
    if cr {
        line.pop();
    }
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    line.push(' ');
    line.push_str(token);
    if cr {
        line.push('\r');
    }
}

/// Moves a task to `new_date` by rewriting its date token.
pub fn reschedule(
    text: &str,
    record: &TaskRecord,
    new_date: NaiveDate,
) -> Result<String, EditError> {
    if new_date == record.date {
        return Err(EditError::Unchanged);
    }
    let lines = split_lines(text);
    let found = locate_in(&lines, record)?;

    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    replace_in_window(
        &mut out,
        found.window,
        &grammar::date_token(record.date),
        &grammar::date_token(new_date),
    )
    .ok_or(EditError::TokenMissing)?;
    Ok(out.join("\n"))
}

fn apply_time_change(
    out: &mut [String],
    found: &Located,
    record: &TaskRecord,
    change: &TimeChange,
    date_line: Option<usize>,
    style: TimeStyle,
) -> Result<(), EditError> {
    let Some(old) = &record.time else {
        if let TimeChange::Set(new) = change {
            let at = date_line.unwrap_or(found.line);
            push_token(&mut out[at], &grammar::time_token(new, style));
        }
        return Ok(());
    };

    let hit = found.window.clone().find_map(|i| {
        grammar::find_times(&out[i])
            .into_iter()
            .find(|t| t.value.time == *old)
            .map(|t| (i, t))
    });
    let Some((i, span)) = hit else {
        log::warn!("Time {} of '{}' not found near the task", old.display, record.description);
        return Err(EditError::TokenMissing);
    };

    match change {
        TimeChange::Set(new) => {
            if new != old {
                // Existing tokens keep the bracket form they were written in.
                out[i].replace_range(span.range(), &grammar::time_token(new, span.value.style));
            }
        }
        TimeChange::Clear => {
            let start = if out[i][..span.start].ends_with(' ') {
                span.start - 1
            } else {
                span.start
            };
            out[i].replace_range(start..span.end, "");
        }
    }
    Ok(())
}

/// Applies field edits to a task. Fails with `Unchanged` when no field
/// actually changes the text.
pub fn update_task(
    text: &str,
    record: &TaskRecord,
    changes: &TaskChanges,
    style: TimeStyle,
) -> Result<String, EditError> {
    let lines = split_lines(text);
    let found = locate_in(&lines, record)?;
    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

    if let Some(done) = changes.completed
        && done != record.completed
    {
        let line = &mut out[found.line];
        if let Some(span) = grammar::find_marker(line) {
            line.replace_range(span.range(), grammar::marker(done));
        }
    }

    if let Some(description) = &changes.description
        && *description != record.description
    {
        let line = &mut out[found.line];
        let span = description_span(line, &record.description).ok_or(EditError::NotFound)?;
        line.replace_range(span, description);
    }

    let old_token = grammar::date_token(record.date);
    let mut date_line = found.window.clone().find(|&i| out[i].contains(&old_token));
    if let Some(date) = changes.date
        && date != record.date
    {
        date_line = replace_in_window(
            &mut out,
            found.window.clone(),
            &old_token,
            &grammar::date_token(date),
        );
    }

    if let Some(change) = &changes.time {
        apply_time_change(&mut out, &found, record, change, date_line, style)?;
    }

    if out.iter().zip(&lines).all(|(new, old)| new == old) {
        return Err(EditError::Unchanged);
    }
    Ok(out.join("\n"))
}

/// The two lines written for a new task: checklist item and metadata.
pub fn render_new_task(task: &NewTask, style: TimeStyle) -> [String; 2] {
    let mut meta = task.normalized_tags();
    meta.push(grammar::date_token(task.date));
    if let Some(time) = &task.time {
        meta.push(grammar::time_token(time, style));
    }
    [
        format!("{} **{}**", grammar::OPEN_MARKER, task.description),
        format!("    {}", meta.join(" ")),
    ]
}

/// Inserts a new task at the end of the first section that is not a done
/// column.
pub fn append_task(text: &str, task: &NewTask, style: TimeStyle) -> Result<String, EditError> {
    let lines = split_lines(text);
    let target = lines
        .iter()
        .position(|l| grammar::section_title(l).is_some_and(|t| !grammar::is_done_section(t)))
        .ok_or(EditError::NoTargetSection)?;

    let boundary = lines[target + 1..]
        .iter()
        .position(|l| grammar::section_title(l).is_some() || grammar::is_board_footer(l))
        .map_or(lines.len(), |p| target + 1 + p);

    // Keep the blank separator in front of the next header.
    let mut insert_at = boundary;
    while insert_at > target + 1 && lines[insert_at - 1].trim().is_empty() {
        insert_at -= 1;
    }

    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    // Match the document's line endings.
    let cr = if lines[target].ends_with('\r') { "\r" } else { "" };
    for (k, line) in render_new_task(task, style).into_iter().enumerate() {
        out.insert(insert_at + k, format!("{}{}", line, cr));
    }

    log::debug!(
        "Appending '{}' to section '{}' at line {}",
        task.description,
        grammar::section_title(lines[target]).unwrap_or_default(),
        insert_at
    );
    Ok(out.join("\n"))
}
