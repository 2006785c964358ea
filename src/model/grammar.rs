// File: src/model/grammar.rs
//! Line-level tokenizer for the board annotation grammar.
//!
//! Every function here looks at a single, immutable line and reports what it
//! found together with the byte span, so callers can either read the value or
//! splice the exact token out of the line. All sigils are ASCII, which keeps
//! the reported spans on char boundaries.
use crate::model::TaskTime;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const OPEN_MARKER: &str = "- [ ]";
pub const DONE_MARKER: &str = "- [x]";
/// Accepted as done when reading; never written.
const DONE_MARKER_UPPER: &str = "- [X]";
pub const SECTION_PREFIX: &str = "## ";
pub const BOARD_FOOTER: &str = "%% kanban:settings";

/// Bracket form used when a new time token is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeStyle {
    /// `@@{09:00}` / `@@{09:00-11:30}`
    #[default]
    Braced,
    /// `@@09:00` / `@@09:00-11:30`
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

impl<T> Spanned<T> {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeToken {
    pub time: TaskTime,
    pub style: TimeStyle,
}

// --- LINE SHAPE ---

/// Returns the first checklist marker on the line and whether it is checked.
pub fn find_marker(line: &str) -> Option<Spanned<bool>> {
    [
        (OPEN_MARKER, false),
        (DONE_MARKER, true),
        (DONE_MARKER_UPPER, true),
    ]
    .into_iter()
    .filter_map(|(m, completed)| line.find(m).map(|start| (start, completed)))
    .min_by_key(|(start, _)| *start)
    .map(|(start, completed)| Spanned {
        value: completed,
        start,
        end: start + OPEN_MARKER.len(),
    })
}

pub fn is_task_line(line: &str) -> bool {
    find_marker(line).is_some()
}

pub fn is_indented(line: &str) -> bool {
    line.starts_with('\t') || line.starts_with("    ")
}

pub fn marker(completed: bool) -> &'static str {
    if completed { DONE_MARKER } else { OPEN_MARKER }
}

/// Title of a `## ` section header, trimmed.
pub fn section_title(line: &str) -> Option<&str> {
    line.strip_prefix(SECTION_PREFIX).map(str::trim)
}

pub fn is_done_section(title: &str) -> bool {
    title.contains("done") || title.contains("Done")
}

/// The settings block Obsidian Kanban appends after the last list.
pub fn is_board_footer(line: &str) -> bool {
    line.trim_start().starts_with(BOARD_FOOTER)
}

// --- DATES ---

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// First well-formed `@{YYYY-MM-DD}` token on the line.
pub fn find_date(line: &str) -> Option<Spanned<NaiveDate>> {
    let mut from = 0;
    while let Some(rel) = line[from..].find("@{") {
        let at = from + rel;
        if line.as_bytes().get(at + 12) == Some(&b'}')
            && let Some(date) = line.get(at + 2..at + 12).and_then(parse_iso_date)
        {
            return Some(Spanned {
                value: date,
                start: at,
                end: at + 13,
            });
        }
        from = at + 2;
    }
    None
}

pub fn date_token(date: NaiveDate) -> String {
    format!("@{{{}}}", date.format("%Y-%m-%d"))
}

// --- TIMES ---

/// A leading 24h `HH:MM` clock value.
fn clock_prefix(s: &str) -> Option<&str> {
    let candidate = s.get(..5)?;
    let b = candidate.as_bytes();
    if !(b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b':'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit())
    {
        return None;
    }
    NaiveTime::parse_from_str(candidate, "%H:%M").ok()?;
    Some(candidate)
}

pub fn is_clock(s: &str) -> bool {
    s.len() == 5 && clock_prefix(s).is_some()
}

fn time_at(line: &str, at: usize) -> Option<Spanned<TimeToken>> {
    let rest = &line[at + 2..];
    let (style, body) = match rest.strip_prefix('{') {
        Some(inner) => (TimeStyle::Braced, inner),
        None => (TimeStyle::Bare, rest),
    };
    let start = clock_prefix(body)?;
    let mut len = start.len();
    let mut end = None;
    if let Some(after) = body[len..].strip_prefix('-')
        && let Some(e) = clock_prefix(after)
    {
        end = Some(e);
        len += 1 + e.len();
    }
    if style == TimeStyle::Braced {
        if body.as_bytes().get(len) != Some(&b'}') {
            return None;
        }
        len += 2;
    }
    let time = match end {
        Some(e) => TaskTime::range(start, e),
        None => TaskTime::single(start),
    };
    Some(Spanned {
        value: TimeToken { time, style },
        start: at,
        end: at + 2 + len,
    })
}

/// All time tokens on the line, in either bracket form.
pub fn find_times(line: &str) -> Vec<Spanned<TimeToken>> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(rel) = line[from..].find("@@") {
        let at = from + rel;
        match time_at(line, at) {
            Some(token) => {
                from = token.end;
                found.push(token);
            }
            None => from = at + 1,
        }
    }
    found
}

pub fn find_time(line: &str) -> Option<Spanned<TimeToken>> {
    find_times(line).into_iter().next()
}

pub fn time_token(time: &TaskTime, style: TimeStyle) -> String {
    match style {
        TimeStyle::Braced => format!("@@{{{}}}", time.display),
        TimeStyle::Bare => format!("@@{}", time.display),
    }
}

// --- TAGS & LINKS ---

/// Every `#tag` on the line, in order of appearance (duplicates included).
pub fn find_tags(line: &str) -> Vec<Spanned<String>> {
    let bytes = line.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' {
            let len = bytes[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric())
                .count();
            if len > 0 {
                tags.push(Spanned {
                    value: line[i..i + 1 + len].to_string(),
                    start: i,
                    end: i + 1 + len,
                });
                i += 1 + len;
                continue;
            }
        }
        i += 1;
    }
    tags
}

/// Target of the first `[[wiki link]]`, without alias or heading suffix.
pub fn find_link(line: &str) -> Option<String> {
    let open = line.find("[[")?;
    let inner = &line[open + 2..];
    let close = inner.find("]]")?;
    let target = inner[..close]
        .split(['|', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

// --- MARKUP ---

fn unwrap_pairs(s: &str, delim: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find(delim) {
        let after = &rest[open + delim.len()..];
        let Some(close) = after.find(delim) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&after[..close]);
        rest = &after[close + delim.len()..];
    }
    out.push_str(rest);
    out
}

/// Removes bold, italic and underline wrappers, keeping the inner text.
pub fn strip_emphasis(s: &str) -> String {
    let s = unwrap_pairs(s, "**");
    let s = unwrap_pairs(&s, "*");
    unwrap_pairs(&s, "__")
}
