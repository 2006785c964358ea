// File: src/store.rs
use crate::config::Config;
use crate::model::{self, NewTask, TaskChanges, TaskRecord, TimeStyle};
use crate::storage::DocumentStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Scans documents into task records and writes edits back.
///
/// Records are never cached here: every edit re-reads the owning document,
/// and any record held across an edit is stale afterwards.
#[derive(Debug)]
pub struct TaskBoard<S: DocumentStore> {
    store: S,
    time_style: TimeStyle,
}

impl<S: DocumentStore> TaskBoard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            time_style: TimeStyle::default(),
        }
    }

    pub fn with_time_style(mut self, style: TimeStyle) -> Self {
        self.time_style = style;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_document(&self, source: &str) -> Result<Vec<TaskRecord>> {
        let text = self.store.read_text(source)?;
        Ok(model::extract(&text, source))
    }

    /// Tasks of one board, or of every document when `board` is `None`.
    ///
    /// When scanning everything, a document that cannot be read is skipped.
    pub fn load_tasks(&self, board: Option<&str>) -> Result<Vec<TaskRecord>> {
        if let Some(source) = board {
            return self.load_document(source);
        }
        let mut tasks = Vec::new();
        for source in self.store.list_sources()? {
            match self.load_document(&source) {
                Ok(found) => tasks.extend(found),
                Err(e) => log::warn!("Skipping {}: {:#}", source, e),
            }
        }
        log::debug!("Loaded {} dated tasks", tasks.len());
        Ok(tasks)
    }

    fn edit<F>(&self, source: &str, f: F) -> Result<String>
    where
        F: FnOnce(&str) -> Result<String, model::EditError>,
    {
        let text = self.store.read_text(source)?;
        let updated = f(&text).map_err(|e| {
            log::warn!("Edit of {} failed: {}", source, e);
            anyhow::Error::new(e)
        })?;
        self.store
            .write_text(source, &updated)
            .with_context(|| format!("Failed to save {}", source))?;
        Ok(updated)
    }

    /// Moves a task to another day. Returns the new document text.
    pub fn reschedule(&self, task: &TaskRecord, new_date: NaiveDate) -> Result<String> {
        self.edit(&task.source, |text| model::reschedule(text, task, new_date))
    }

    pub fn update_task(&self, task: &TaskRecord, changes: &TaskChanges) -> Result<String> {
        let style = self.time_style;
        self.edit(&task.source, |text| {
            model::update_task(text, task, changes, style)
        })
    }

    pub fn add_task(&self, source: &str, task: &NewTask) -> Result<String> {
        let style = self.time_style;
        self.edit(source, |text| model::append_task(text, task, style))
    }
}

/// Tasks that pass the configured completion and list filters.
pub fn visible(tasks: Vec<TaskRecord>, config: &Config) -> Vec<TaskRecord> {
    tasks.into_iter().filter(|t| config.is_visible(t)).collect()
}

pub fn find<'a>(tasks: &'a [TaskRecord], id: &str) -> Option<&'a TaskRecord> {
    tasks.iter().find(|t| t.id == id)
}

/// Tasks dated within `[from, to]`, in agenda order.
pub fn tasks_between(
    tasks: &[TaskRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<TaskRecord> {
    let mut out: Vec<TaskRecord> = tasks
        .iter()
        .filter(|t| from.is_none_or(|d| t.date >= d) && to.is_none_or(|d| t.date <= d))
        .cloned()
        .collect();
    out.sort_by(|a, b| a.agenda_cmp(b));
    out
}
