// File: ./src/model/item.rs
use crate::model::grammar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const ID_DESCRIPTION_CHARS: usize = 40;

// --- TIME ---

/// Time of day attached to a task, either a single clock value or a range.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskTime {
    /// Combined form as written, e.g. `09:00-11:30`.
    pub display: String,
    pub start: String,
    pub end: Option<String>,
}

impl TaskTime {
    pub fn single(start: &str) -> Self {
        Self {
            display: start.to_string(),
            start: start.to_string(),
            end: None,
        }
    }

    pub fn range(start: &str, end: &str) -> Self {
        Self {
            display: format!("{}-{}", start, end),
            start: start.to_string(),
            end: Some(end.to_string()),
        }
    }

    /// Parses `HH:MM` or `HH:MM-HH:MM` (24h clock).
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some((start, end)) = input.split_once('-') {
            let (start, end) = (start.trim(), end.trim());
            if grammar::is_clock(start) && grammar::is_clock(end) {
                return Some(Self::range(start, end));
            }
            return None;
        }
        grammar::is_clock(input).then(|| Self::single(input))
    }
}

// --- RECORDS ---

/// One dated checklist item found in a board document.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<TaskTime>,
    pub tags: Vec<String>,
    pub completed: bool,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_note: Option<String>,
    /// Title of the `## ` section the item sits under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
}

impl TaskRecord {
    /// Stable key for a task: the same source, description and date always
    /// produce the same id, and the result only contains `[A-Za-z0-9-]`.
    pub fn make_id(source: &str, description: &str, date: NaiveDate) -> String {
        let slice: String = description
            .trim()
            .chars()
            .take(ID_DESCRIPTION_CHARS)
            .collect();
        let raw = format!("task-{}-{}-{}", source, slice, date.format("%Y-%m-%d"));
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }

    pub fn start_time(&self) -> Option<&str> {
        self.time.as_ref().map(|t| t.start.as_str())
    }

    pub fn end_time(&self) -> Option<&str> {
        self.time.as_ref().and_then(|t| t.end.as_deref())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim_start_matches('#');
        self.tags
            .iter()
            .any(|t| t.trim_start_matches('#').eq_ignore_ascii_case(wanted))
    }

    /// Agenda order: date, then timed before untimed, then description.
    pub fn agenda_cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| match (self.start_time(), other.start_time()) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.description.cmp(&other.description))
    }
}

// --- EDIT REQUESTS ---

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TimeChange {
    Set(TaskTime),
    Clear,
}

/// Field edits for an existing task; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TaskChanges {
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeChange>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.completed.is_none()
    }
}

/// A task to be written into a board for the first time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<TaskTime>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(description: &str, date: NaiveDate) -> Self {
        Self {
            description: description.trim().to_string(),
            date,
            time: None,
            tags: Vec::new(),
        }
    }

    /// Tags with a single leading `#`, blanks dropped.
    pub fn normalized_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{}", t))
            .collect()
    }
}
