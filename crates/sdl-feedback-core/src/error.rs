// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(u8::from(code))
    }
}

/// Error payload printed by the CLI in `--json` mode.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for (key, value) in &self.details {
            write!(f, "\n  {key}: {value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MachineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_error_serializes_details_sorted() {
        let err = MachineError::new("validation_error", "message must not be empty")
            .with_detail("page", "day2")
            .with_detail("field", "message");
        let json = serde_json::to_string(&err).expect("encode");
        assert_eq!(
            json,
            r#"{"code":"validation_error","message":"message must not be empty","details":{"field":"message","page":"day2"}}"#
        );
    }

    #[test]
    fn exit_codes_keep_their_process_status() {
        assert_eq!(u8::from(ExitCode::Success), 0);
        assert_eq!(u8::from(ExitCode::Usage), 2);
        assert_eq!(u8::from(ExitCode::Validation), 3);
        assert_eq!(u8::from(ExitCode::DependencyFailure), 4);
        assert_eq!(u8::from(ExitCode::Internal), 10);
    }

    #[test]
    fn display_lists_details_under_the_message() {
        let err = MachineError::new("usage_error", "invalid command line arguments")
            .with_detail("error", "unexpected argument '--pag'");
        assert_eq!(
            err.to_string(),
            "usage_error: invalid command line arguments\n  error: unexpected argument '--pag'"
        );
    }

    #[test]
    fn machine_error_rejects_unknown_fields() {
        let raw = r#"{"code":"x","message":"y","extra":1}"#;
        assert!(serde_json::from_str::<MachineError>(raw).is_err());
    }
}
