use crate::data::pagination::DEFAULT_PAGE_SIZE;
use crate::data::selection::SelectionMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows per page
    pub page_size: usize,

    /// Choices offered by a page-size picker
    pub page_size_options: Vec<usize>,

    /// Show row numbers in rendered tables
    pub show_row_numbers: bool,

    /// Text shown for missing or null cells
    pub null_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// none, single or multiple
    pub selection_mode: SelectionMode,

    /// Allow inline cell editing
    pub editable: bool,

    /// Field used to recognise the same row across reloads.
    /// Rows are matched by reference when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where export files are written. Defaults to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Leading part of generated export file names
    pub filename_prefix: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![5, 10, 25, 50, 100],
            show_row_numbers: false,
            null_text: String::new(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::Multiple,
            editable: false,
            row_key: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filename_prefix: "grid_export".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl GridConfig {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: GridConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("grid-engine").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Grid Engine Configuration File
# Location: ~/.config/grid-engine/config.toml (Linux)
#           ~/Library/Application Support/grid-engine/config.toml (macOS)
#           %APPDATA%\grid-engine\config.toml (Windows)

[display]
# Rows shown per page
page_size = 10

# Page sizes offered to the user
page_size_options = [5, 10, 25, 50, 100]

# Prefix each rendered row with its position
show_row_numbers = false

# Text shown for missing or null cells
null_text = ""

[behavior]
# Row selection: "none", "single" or "multiple"
selection_mode = "multiple"

# Allow inline cell editing
editable = false

# Field identifying a row across reloads (rows match by reference when unset)
# row_key = "id"

[export]
# Directory for export files (defaults to the current directory)
# directory = "/tmp/exports"

# Export files are named <prefix>_<YYYYmmdd_HHMMSS>.<csv|json>
filename_prefix = "grid_export"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.display.page_size, 10);
        assert_eq!(config.behavior.selection_mode, SelectionMode::Multiple);
        assert!(!config.behavior.editable);
        assert_eq!(config.export.resolved_directory(), PathBuf::from("."));
    }

    #[test]
    fn test_commented_default_parses_to_default() {
        let parsed: GridConfig =
            toml::from_str(&GridConfig::create_default_with_comments()).unwrap();
        assert_eq!(parsed, GridConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed: GridConfig = toml::from_str(
            r#"
            [behavior]
            selection_mode = "single"
            row_key = "id"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.behavior.selection_mode, SelectionMode::Single);
        assert_eq!(parsed.behavior.row_key.as_deref(), Some("id"));
        assert_eq!(parsed.display, DisplayConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = GridConfig::default();
        config.display.page_size = 25;
        config.export.directory = Some(PathBuf::from("/tmp/out"));
        config.save_to(&path).unwrap();

        let loaded = GridConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
