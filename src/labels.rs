//! Label Records and Import/Export
//!
//! The label domain entity, the built-in preset set, sample file generation,
//! and validation of user-supplied import files. Validation is a pure
//! function over parsed values: every record is classified independently, so
//! one bad record never aborts the batch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// File name of the generated JSON sample
pub const SAMPLE_JSON_FILE: &str = "hyouji.json";

/// File name of the generated YAML sample
pub const SAMPLE_YAML_FILE: &str = "hyouji.yaml";

/// A GitHub issue label
///
/// `color` is a 6-digit hex code without the `#` prefix; the API picks a
/// default when it is omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelRecord {
    /// Label name (unique within a repository)
    pub name: String,

    /// Label color (6-digit hex without #)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Label description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validation outcome for a single import record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidation {
    Valid {
        record: LabelRecord,
        /// Unknown keys on the record, reported but not fatal
        warnings: Vec<String>,
    },
    Invalid {
        reason: String,
    },
}

/// Record skipped during batch validation
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Zero-based position in the input array
    pub index: usize,
    pub reason: String,
}

/// Validated import file content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    pub valid: Vec<LabelRecord>,
    pub skipped: Vec<SkippedRecord>,
    pub warnings: Vec<String>,
}

/// Validate a single parsed record
///
/// Rules: `name` is required and must be a non-empty string after trimming;
/// `color`, if present, must be a non-empty string after trimming;
/// `description`, if present, must be a string (empty allowed). Any other
/// key is reported as a warning and otherwise ignored.
pub fn validate_record(value: &Value) -> RecordValidation {
    let Some(map) = value.as_object() else {
        return RecordValidation::Invalid {
            reason: "record is not an object".to_string(),
        };
    };

    let name = match map.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        Some(_) => {
            return RecordValidation::Invalid {
                reason: "name must not be empty".to_string(),
            }
        }
        None => {
            return RecordValidation::Invalid {
                reason: "name is required and must be a string".to_string(),
            }
        }
    };

    let color = match map.get("color") {
        None => None,
        Some(value) => match value.as_str() {
            Some(color) if !color.trim().is_empty() => Some(color.to_string()),
            _ => {
                return RecordValidation::Invalid {
                    reason: "color must be a non-empty string when present".to_string(),
                }
            }
        },
    };

    let description = match map.get("description") {
        None => None,
        Some(value) => match value.as_str() {
            Some(description) => Some(description.to_string()),
            None => {
                return RecordValidation::Invalid {
                    reason: "description must be a string when present".to_string(),
                }
            }
        },
    };

    let warnings = map
        .keys()
        .filter(|key| !matches!(key.as_str(), "name" | "color" | "description"))
        .map(|key| format!("ignoring unknown key `{key}`"))
        .collect();

    RecordValidation::Valid {
        record: LabelRecord {
            name,
            color,
            description,
        },
        warnings,
    }
}

/// Validate every element of a parsed array independently
pub fn validate_batch(values: &[Value]) -> ImportBatch {
    let mut batch = ImportBatch::default();

    for (index, value) in values.iter().enumerate() {
        match validate_record(value) {
            RecordValidation::Valid { record, warnings } => {
                for warning in warnings {
                    batch.warnings.push(format!("record {}: {}", index + 1, warning));
                }
                batch.valid.push(record);
            }
            RecordValidation::Invalid { reason } => {
                batch.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    batch
}

/// Load and validate an import file
///
/// The format is decided purely by the file extension, before any I/O:
/// `.json` is JSON, `.yaml`/`.yml` is YAML, anything else is rejected. The
/// file must parse to a top-level array or the whole import aborts.
///
/// # Errors
/// Unsupported extension, unreadable file, malformed content, or a
/// non-array top level.
pub fn load_import_file(path: &Path) -> Result<ImportBatch> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => ImportFormat::Json,
        Some("yaml") | Some("yml") => ImportFormat::Yaml,
        _ => {
            return Err(Error::invalid_format(
                "Import file must be .json, .yaml, or .yml",
            ))
        }
    };

    let content = std::fs::read_to_string(path)?;
    let parsed: Value = match format {
        ImportFormat::Json => serde_json::from_str(&content)?,
        ImportFormat::Yaml => serde_yaml::from_str(&content)?,
    };

    let Some(values) = parsed.as_array() else {
        return Err(Error::invalid_format(
            "Import file must contain a top-level array of labels",
        ));
    };

    Ok(validate_batch(values))
}

enum ImportFormat {
    Json,
    Yaml,
}

/// The built-in label set offered by the "create preset set" action
pub fn preset_labels() -> Vec<LabelRecord> {
    vec![
        LabelRecord {
            name: "bug".to_string(),
            color: Some("d73a4a".to_string()),
            description: Some("Something isn't working".to_string()),
        },
        LabelRecord {
            name: "enhancement".to_string(),
            color: Some("a2eeef".to_string()),
            description: Some("New feature or request".to_string()),
        },
        LabelRecord {
            name: "documentation".to_string(),
            color: Some("0075ca".to_string()),
            description: Some("Improvements or additions to documentation".to_string()),
        },
        LabelRecord {
            name: "duplicate".to_string(),
            color: Some("cfd3d7".to_string()),
            description: Some("This issue or pull request already exists".to_string()),
        },
        LabelRecord {
            name: "good first issue".to_string(),
            color: Some("7057ff".to_string()),
            description: Some("Good for newcomers".to_string()),
        },
        LabelRecord {
            name: "help wanted".to_string(),
            color: Some("008672".to_string()),
            description: Some("Extra attention is needed".to_string()),
        },
    ]
}

/// The fixed three-entry sample written by the generate actions
pub fn sample_labels() -> Vec<LabelRecord> {
    vec![
        LabelRecord {
            name: "bug".to_string(),
            color: Some("d73a4a".to_string()),
            description: Some("Something isn't working".to_string()),
        },
        LabelRecord {
            name: "enhancement".to_string(),
            color: Some("a2eeef".to_string()),
            description: Some("New feature or request".to_string()),
        },
        LabelRecord {
            name: "question".to_string(),
            color: Some("d876e3".to_string()),
            description: Some("Further information is requested".to_string()),
        },
    ]
}

/// Write the JSON sample file into the current working directory
///
/// Overwrites any existing `hyouji.json` unconditionally.
pub fn write_sample_json() -> Result<PathBuf> {
    let path = PathBuf::from(SAMPLE_JSON_FILE);
    let content = serde_json::to_string_pretty(&sample_labels())?;
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Write the YAML sample file into the current working directory
///
/// Overwrites any existing `hyouji.yaml` unconditionally.
pub fn write_sample_yaml() -> Result<PathBuf> {
    let path = PathBuf::from(SAMPLE_YAML_FILE);
    let content = serde_yaml::to_string(&sample_labels())?;
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Validate hex color code (6-digit hex without #)
///
/// Used by the interactive color prompt; import files only require color to
/// be a non-empty string, matching the remote API's own validation.
pub fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}
