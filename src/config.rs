// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::{TaskRecord, TimeStyle};
use crate::storage::VaultStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Directory holding the board documents. Empty means the working directory.
    #[serde(default)]
    pub vault_root: String,
    /// Board to scan, relative to the vault. Empty means every document.
    #[serde(default)]
    pub default_board: String,
    #[serde(default = "default_true")]
    pub show_completed_tasks: bool,
    /// Sections to show; empty shows all of them.
    #[serde(default)]
    pub included_lists: Vec<String>,
    #[serde(default)]
    pub excluded_lists: Vec<String>,
    /// Bracket form for newly written time tokens.
    #[serde(default)]
    pub time_style: TimeStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_root: String::new(),
            default_board: String::new(),
            // Match the serde defaults
            show_completed_tasks: true,
            included_lists: Vec::new(),
            excluded_lists: Vec::new(),
            time_style: TimeStyle::default(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(config) => Ok(config),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Whether an error from `load` means the config file does not exist.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }
        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
        })
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        VaultStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            VaultStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Whether a task should be shown under the completion and list filters.
    pub fn is_visible(&self, task: &TaskRecord) -> bool {
        if task.completed && !self.show_completed_tasks {
            return false;
        }
        let list = task.list_name.as_deref().unwrap_or_default();
        if !self.included_lists.is_empty()
            && !self.included_lists.iter().any(|l| l.eq_ignore_ascii_case(list))
        {
            return false;
        }
        !self.excluded_lists.iter().any(|l| l.eq_ignore_ascii_case(list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use chrono::NaiveDate;

    fn task(list: Option<&str>, completed: bool) -> TaskRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TaskRecord {
            id: TaskRecord::make_id("b.md", "t", date),
            description: "t".to_string(),
            date,
            time: None,
            tags: vec![],
            completed,
            source: "b.md".to_string(),
            linked_note: None,
            list_name: list.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_config_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let ctx = TestContext::new();
        let config = Config {
            vault_root: "/notes".to_string(),
            excluded_lists: vec!["Archive".to_string()],
            time_style: TimeStyle::Bare,
            ..Config::default()
        };
        config.save(&ctx).unwrap();
        assert_eq!(Config::load(&ctx).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "default_board = \"Board.md\"\n").unwrap();
        let config = Config::load(&ctx).unwrap();
        assert_eq!(config.default_board, "Board.md");
        assert!(config.show_completed_tasks);
        assert_eq!(config.time_style, TimeStyle::Braced);
    }

    #[test]
    fn test_broken_file_is_not_missing() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "show_completed_tasks = \"maybe\"").unwrap();
        let err = Config::load(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
    }

    #[test]
    fn test_visibility_filters() {
        let mut config = Config::default();
        assert!(config.is_visible(&task(Some("Doing"), true)));

        config.show_completed_tasks = false;
        assert!(!config.is_visible(&task(Some("Doing"), true)));

        config.included_lists = vec!["doing".to_string()];
        assert!(config.is_visible(&task(Some("Doing"), false)));
        assert!(!config.is_visible(&task(Some("Later"), false)));
        assert!(!config.is_visible(&task(None, false)));

        config.included_lists.clear();
        config.excluded_lists = vec!["Later".to_string()];
        assert!(!config.is_visible(&task(Some("Later"), false)));
        assert!(config.is_visible(&task(None, false)));
    }
}
