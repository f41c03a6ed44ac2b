//! Log output verification helpers.
//!
//! `vt` logs to stderr. With stderr piped, human mode uses the compact
//! formatter (`<time> <LEVEL> <message> <fields>`), robot mode emits one JSON
//! object per line.

use serde_json::Value;

/// Verifier for log output captured from stderr.
///
/// # Example
///
/// ```ignore
/// let result = workspace.cli().run(&["-vv", "save", "notes.txt"]);
/// LogVerifier::from_stderr(&result.stderr)
///     .assert_debug("snapshot directory created")
///     .assert_info("version saved")
///     .assert_no_errors();
/// ```
pub struct LogVerifier {
    log_lines: Vec<String>,
}

impl LogVerifier {
    #[must_use]
    pub fn from_stderr(stderr: &str) -> Self {
        Self {
            log_lines: stderr.lines().map(String::from).collect(),
        }
    }

    /// Level and message of a line, from either formatter.
    fn parse(line: &str) -> Option<(String, String)> {
        if let Ok(json) = serde_json::from_str::<Value>(line) {
            let level = json.get("level")?.as_str()?.to_string();
            let message = json.pointer("/fields/message")?.as_str()?.to_string();
            return Some((level, message));
        }
        ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"]
            .into_iter()
            .find(|level| line.split_whitespace().any(|word| word == *level))
            .map(|level| (level.to_string(), line.to_string()))
    }

    /// Messages logged at `level`.
    #[must_use]
    pub fn messages_at(&self, level: &str) -> Vec<String> {
        self.log_lines
            .iter()
            .filter_map(|line| Self::parse(line))
            .filter(|(l, _)| l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// # Panics
    ///
    /// Panics if no entry at `level` contains `message` (case-insensitive).
    pub fn assert_contains_level(&self, level: &str, message: &str) -> &Self {
        let needle = message.to_lowercase();
        assert!(
            self.messages_at(level)
                .iter()
                .any(|m| m.to_lowercase().contains(&needle)),
            "No {level} log containing \"{message}\" found in:\n{}",
            self.log_lines.join("\n")
        );
        self
    }

    pub fn assert_debug(&self, message: &str) -> &Self {
        self.assert_contains_level("DEBUG", message)
    }

    pub fn assert_info(&self, message: &str) -> &Self {
        self.assert_contains_level("INFO", message)
    }

    pub fn assert_warn(&self, message: &str) -> &Self {
        self.assert_contains_level("WARN", message)
    }

    /// # Panics
    ///
    /// Panics if any ERROR entries are found.
    pub fn assert_no_errors(&self) -> &Self {
        let errors = self.messages_at("ERROR");
        assert!(errors.is_empty(), "Found unexpected errors:\n{}", errors.join("\n"));
        self
    }

    /// # Panics
    ///
    /// Panics if any WARN entries are found.
    pub fn assert_no_warnings(&self) -> &Self {
        let warnings = self.messages_at("WARN");
        assert!(
            warnings.is_empty(),
            "Found unexpected warnings:\n{}",
            warnings.join("\n")
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_lines() {
        let logs = "2026-10-16T10:00:00Z  INFO Configuration loaded path=/tmp/c.toml\n\
                    2026-10-16T10:00:00Z DEBUG Snapshot directory created stamp=20261016_100000";

        LogVerifier::from_stderr(logs)
            .assert_info("configuration loaded")
            .assert_debug("snapshot directory")
            .assert_no_errors()
            .assert_no_warnings();
    }

    #[test]
    fn test_json_lines() {
        let logs = r#"{"timestamp":"2026-10-16T10:00:00Z","level":"WARN","fields":{"message":"Storage root missing, skipping","root":"/mnt/usb"},"target":"vt::snapshot::scanner"}"#;

        let verifier = LogVerifier::from_stderr(logs);
        verifier.assert_warn("storage root missing");
        assert_eq!(verifier.messages_at("WARN").len(), 1);
        assert!(verifier.messages_at("INFO").is_empty());
    }

    #[test]
    fn test_non_log_lines_ignored() {
        let verifier = LogVerifier::from_stderr("Error: Source file not found\nHint: check the path");
        verifier.assert_no_errors();
    }
}
