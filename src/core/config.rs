use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::core::error::PreflightError;

/// Name of the config file looked up at the repository root.
pub const CONFIG_FILE_NAME: &str = ".git-preflight";

/// How the matched filenames are handed to a trigger's command.
///
/// Only `args` is understood. Any other string is kept as `Other` so that the
/// validator, not the decoder, reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    /// Matched filenames are appended as trailing command arguments.
    Args,
    Other(String),
}

impl Default for InputType {
    fn default() -> Self {
        InputType::Other(String::new())
    }
}

impl From<String> for InputType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "args" => InputType::Args,
            _ => InputType::Other(value),
        }
    }
}

impl From<InputType> for String {
    fn from(value: InputType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Args => write!(f, "args"),
            InputType::Other(other) => write!(f, "{other}"),
        }
    }
}

/// A command that is executed when a relevant file changed.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct TriggerConfig {
    pub name: String,
    /// Executable followed by its fixed leading arguments.
    pub cmd: Vec<String>,
    pub input_type: InputType,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

/// Triggers are executed in the order they are declared.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct PreflightConfig {
    pub triggers: Vec<TriggerConfig>,
}

const CONFIG_KEYS: &[&str] = &["Triggers"];
const TRIGGER_KEYS: &[&str] = &["Name", "Cmd", "InputType", "Includes", "Excludes"];

/// Decodes a config document without validating it.
///
/// The document is JSON that may contain comments. Keys are matched against
/// the field names without regard to case; keys matching no field are
/// rejected.
pub fn parse_config(content: &str, path: &Path) -> Result<PreflightConfig, PreflightError> {
    let decode_error = |message: String| PreflightError::ConfigDecode {
        path: path.to_path_buf(),
        message,
    };
    let mut document: Value = json5::from_str(content).map_err(|e| decode_error(e.to_string()))?;

    canonicalize_keys(&mut document, CONFIG_KEYS);
    if let Some(Value::Array(triggers)) = document.get_mut("Triggers") {
        for trigger in triggers {
            canonicalize_keys(trigger, TRIGGER_KEYS);
        }
    }

    serde_json::from_value(document).map_err(|e| decode_error(e.to_string()))
}

/// Renames the keys of a JSON object that equal one of `fields` ignoring
/// case. Other keys are left alone for serde to reject.
fn canonicalize_keys(value: &mut Value, fields: &[&str]) {
    let Value::Object(map) = value else {
        return;
    };
    *map = std::mem::take(map)
        .into_iter()
        .map(|(key, value)| {
            let key = fields
                .iter()
                .find(|field| field.eq_ignore_ascii_case(&key))
                .map_or(key, |field| field.to_string());
            (key, value)
        })
        .collect();
}

/// Reads, decodes and validates the config file at `path`.
pub fn load_config_file(path: &Path) -> Result<PreflightConfig, PreflightError> {
    let content = fs::read_to_string(path).map_err(|source| PreflightError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, path)?;
    StandardValidator::new().validate_config(&config)?;
    Ok(config)
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new_at(repo_root: PathBuf) -> Self {
        Self {
            config_path: repo_root.join(CONFIG_FILE_NAME),
        }
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<PreflightConfig>;
    fn get_config_path(&self) -> PathBuf;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<PreflightConfig> {
        Ok(load_config_file(&self.config_path)?)
    }

    fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }
}
