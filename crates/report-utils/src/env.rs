//! Environment variable helpers

use thiserror::Error;

/// Error raised when a required environment variable is missing
#[derive(Debug, Error)]
#[error("{name} environment variable not set")]
pub struct MissingEnvVar {
    /// Variable name
    pub name: &'static str,
}

/// Read a required environment variable
pub fn require_var(name: &'static str) -> Result<String, MissingEnvVar> {
    std::env::var(name).map_err(|_| MissingEnvVar { name })
}

/// Read an optional environment variable, treating empty values as absent
pub fn optional_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_var_missing() {
        let err = require_var("REPORT_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(err.to_string().contains("REPORT_TEST_DOES_NOT_EXIST"));
    }

    #[test]
    fn test_optional_var_empty_is_none() {
        // SAFETY: test-only env mutation, no concurrent readers of this key
        unsafe { std::env::set_var("REPORT_TEST_EMPTY", "") };
        assert!(optional_var("REPORT_TEST_EMPTY").is_none());
        unsafe { std::env::set_var("REPORT_TEST_EMPTY", "value") };
        assert_eq!(optional_var("REPORT_TEST_EMPTY").as_deref(), Some("value"));
        unsafe { std::env::remove_var("REPORT_TEST_EMPTY") };
    }
}
