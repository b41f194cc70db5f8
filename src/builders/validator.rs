use std::collections::HashSet;

use crate::builders::patterns;
use crate::core::config::{InputType, PreflightConfig, TriggerConfig};
use crate::core::error::{PreflightError, Result};

/// The `ConfigValidator` trait defines the public interface for validating a
/// loaded preflight configuration.
///
/// Validation fails fast: the first problem found is returned and nothing
/// else is checked.
pub trait ConfigValidator {
    /// Validates every trigger of `config`, in declaration order.
    fn validate_config(&self, config: &PreflightConfig) -> Result<()>;

    /// Validates a single trigger in isolation.
    fn validate_trigger(&self, trigger: &TriggerConfig) -> Result<()>;
}

/// The `StandardValidator` applies the rules every `.git-preflight` file has
/// to satisfy before any trigger is run.
///
/// Per trigger the checks run in this order: duplicate name, empty or
/// whitespace-containing name, input type, include patterns, exclude
/// patterns, empty command.
pub struct StandardValidator;

impl StandardValidator {
    /// Creates a new instance of `StandardValidator`.
    pub fn new() -> Self {
        Self
    }

    /// Surfaces glob syntax errors early by compiling the pattern.
    fn check_pattern(&self, kind: &str, pattern: &str, trigger: &str) -> Result<()> {
        patterns::compile_pattern(pattern).map_err(|e| {
            let cause = match e {
                PreflightError::GlobSyntax { message, .. } => message,
                other => other.to_string(),
            };
            invalid(format!(
                "invalid {kind} pattern {pattern:?} for trigger {trigger}: {cause}"
            ))
        })?;
        Ok(())
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &PreflightConfig) -> Result<()> {
        let mut names = HashSet::new();
        for trigger in &config.triggers {
            // Uniqueness is checked explicitly; name lookups elsewhere assume it.
            if !names.insert(trigger.name.as_str()) {
                return Err(invalid(format!("duplicate trigger name: {}", trigger.name)));
            }
            self.validate_trigger(trigger)?;
        }
        Ok(())
    }

    fn validate_trigger(&self, trigger: &TriggerConfig) -> Result<()> {
        if trigger.name.is_empty() {
            return Err(invalid("empty trigger name".to_string()));
        }
        if trigger.name.chars().any(char::is_whitespace) {
            return Err(invalid(format!(
                "invalid trigger name containing whitespace: {:?}",
                trigger.name
            )));
        }

        if let InputType::Other(input_type) = &trigger.input_type {
            return Err(invalid(format!(
                "invalid trigger input type {input_type:?} for trigger {}",
                trigger.name
            )));
        }

        for pattern in &trigger.includes {
            self.check_pattern("include", pattern, &trigger.name)?;
        }
        for pattern in &trigger.excludes {
            self.check_pattern("exclude", pattern, &trigger.name)?;
        }

        if trigger.cmd.is_empty() {
            return Err(invalid(format!("empty command for trigger {}", trigger.name)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PreflightError {
    PreflightError::ConfigValidation(message)
}
