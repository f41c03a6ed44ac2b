//! CLI test runner with fluent assertions.
//!
//! Executes the `vt` binary and verifies output, exit codes and JSON
//! responses in robot mode.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Variables from the developer's environment that would leak into a run.
const SCRUBBED_ENV: [&str; 5] = ["VT_ROOT", "VT_CONFIG", "VT_FORMAT", "NO_COLOR", "RUST_LOG"];

/// Process settings applied to every run.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub env_vars: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    /// Written to the child's stdin, which is then closed.
    pub stdin: Option<String>,
}

/// Test runner for the `vt` CLI binary.
///
/// # Example
///
/// ```ignore
/// let workspace = Workspace::new();
/// workspace.cli()
///     .run(&["view", "notes.txt"])
///     .assert_success()
///     .assert_stdout_contains("No saved versions");
/// ```
pub struct CliRunner {
    binary_path: PathBuf,
    config: CliConfig,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    /// Runner for the `vt` binary built by cargo for this test target.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_vt")),
            config: CliConfig::default(),
        }
    }

    /// Sets `key` in the child's environment.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.config
            .env_vars
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Runs the child in `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.config.working_dir = Some(dir);
        self
    }

    /// Feeds `stdin` to the child.
    #[must_use]
    pub fn with_stdin(mut self, stdin: &str) -> Self {
        self.config.stdin = Some(stdin.to_string());
        self
    }

    /// Runs `vt` with `args` and captures everything it wrote.
    ///
    /// Stdin is empty unless set with [`Self::with_stdin`].
    ///
    /// # Panics
    ///
    /// Panics if the binary cannot be spawned.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let start = Instant::now();

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in &self.config.env_vars {
            cmd.env(key, value);
        }
        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().expect("Failed to execute command");
        // Dropping the handle closes stdin. A child that exits without
        // reading it breaks the pipe, which is not a test failure.
        if let (Some(mut stdin), Some(input)) = (child.stdin.take(), &self.config.stdin) {
            let _ = stdin.write_all(input.as_bytes());
        }
        let output = child.wait_with_output().expect("Failed to wait for command");
        let duration = start.elapsed();

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Same as [`Self::run`] with `--robot` in front.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let robot_args: Vec<&str> = std::iter::once("--robot").chain(args.iter().copied()).collect();
        self.run(&robot_args)
    }
}

/// What one `vt` run printed, plus how it exited.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub args: Vec<String>,
}

impl CliResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    // === Exit status and text ===

    /// # Panics
    ///
    /// Panics if the command did not exit with code 0.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "{:?} exited with {}; stderr:\n{}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the command exited with code 0.
    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success(),
            "Command {:?} unexpectedly succeeded:\n{}",
            self.args,
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the exit code differs.
    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "Command {:?} exit code mismatch. stderr:\n{}",
            self.args, self.stderr
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stdout does not contain `text`.
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout of {:?} does not contain {text:?}:\n{}",
            self.args,
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stdout contains `text`.
    pub fn assert_stdout_not_contains(&self, text: &str) -> &Self {
        assert!(
            !self.stdout.contains(text),
            "stdout of {:?} unexpectedly contains {text:?}:\n{}",
            self.args,
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stderr does not contain `text`.
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr of {:?} does not contain {text:?}:\n{}",
            self.args,
            self.stderr
        );
        self
    }

    // === JSON ===

    /// Stdout parsed as one JSON document.
    ///
    /// # Panics
    ///
    /// Panics on invalid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        parse_json("stdout", &self.stdout)
    }

    /// Stderr parsed as one JSON document; robot-mode errors land there.
    ///
    /// # Panics
    ///
    /// Panics on invalid JSON.
    #[must_use]
    pub fn stderr_json(&self) -> Value {
        parse_json("stderr", &self.stderr)
    }

    /// Value at `pointer` (RFC 6901) in the stdout document.
    ///
    /// # Panics
    ///
    /// Panics if nothing is at `pointer`.
    #[must_use]
    pub fn json_at(&self, pointer: &str) -> Value {
        let json = self.json();
        json.pointer(pointer).cloned().unwrap_or_else(|| {
            panic!(
                "{pointer} missing from {:?} output:\n{}",
                self.args,
                serde_json::to_string_pretty(&json).unwrap_or_default()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if the value at `pointer` differs from `expected`.
    pub fn assert_json_field(&self, pointer: &str, expected: &Value) -> &Self {
        assert_eq!(&self.json_at(pointer), expected, "{pointer} of {:?}", self.args);
        self
    }

    /// # Panics
    ///
    /// Panics unless `pointer` names an array of `len` items.
    pub fn assert_json_array_len(&self, pointer: &str, len: usize) -> &Self {
        let value = self.json_at(pointer);
        let items = value
            .as_array()
            .unwrap_or_else(|| panic!("{pointer} is not an array: {value}"));
        assert_eq!(items.len(), len, "length of {pointer} in {value}");
        self
    }

    /// # Panics
    ///
    /// Panics if the run took `max` or longer.
    pub fn assert_duration_under(&self, max: Duration) -> &Self {
        assert!(self.duration < max, "{:?} ran for {:?}", self.args, self.duration);
        self
    }
}

fn parse_json(stream: &str, text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| panic!("{stream} is not JSON ({e}):\n{text}"))
}
