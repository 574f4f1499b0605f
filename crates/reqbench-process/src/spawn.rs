//! Spawn configuration.
//!
//! A [`SpawnSpec`] is the immutable description of a process: what to run,
//! where, with which environment, and how to tell that it has come up.

use crate::handle::POLL_INTERVAL;
use crate::readiness::ReadinessCheck;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default cap on how long a readiness check may keep failing.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between two readiness checks.
pub const DEFAULT_READINESS_INTERVAL: Duration = Duration::from_millis(100);

/// What to do with the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Share the benchmark's stdin/stdout/stderr.
    #[default]
    Inherit,
    /// Discard output and give the child an empty stdin.
    Null,
}

/// Immutable spawn configuration for one process.
#[derive(Clone)]
pub struct SpawnSpec {
    /// Name used in logs and errors.
    pub label: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub environment: BTreeMap<String, String>,
    pub working_directory: Option<PathBuf>,
    pub stdio: StdioMode,
    /// Polled after spawn; `spawn` returns only once it reports ready.
    pub readiness: Option<Arc<dyn ReadinessCheck>>,
    pub readiness_interval: Duration,
    pub startup_timeout: Duration,
    /// Granularity of `wait()`.
    pub poll_interval: Duration,
}

impl SpawnSpec {
    pub fn new<I, S>(label: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            command: command.into_iter().map(Into::into).collect(),
            environment: BTreeMap::new(),
            working_directory: None,
            stdio: StdioMode::default(),
            readiness: None,
            readiness_interval: DEFAULT_READINESS_INTERVAL,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn with_readiness(mut self, check: Arc<dyn ReadinessCheck>) -> Self {
        self.readiness = Some(check);
        self
    }

    pub fn with_readiness_interval(mut self, interval: Duration) -> Self {
        self.readiness_interval = interval;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Command rendered as a single string for logs and errors.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub(crate) fn build_command(&self) -> tokio::process::Command {
        let mut cmd = std::process::Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        cmd.envs(&self.environment);

        if let Some(ref dir) = self.working_directory {
            cmd.current_dir(dir);
        }

        if self.stdio == StdioMode::Null {
            cmd.stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null());
        }

        // Own process group: signals reach grandchildren, and a Ctrl-C on the
        // terminal only reaches the benchmark, which then tears down in order.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        tokio::process::Command::from(cmd)
    }
}

impl fmt::Debug for SpawnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnSpec")
            .field("label", &self.label)
            .field("command", &self.command)
            .field("environment", &self.environment)
            .field("working_directory", &self.working_directory)
            .field("stdio", &self.stdio)
            .field("readiness", &self.readiness.as_ref().map(|r| r.describe()))
            .field("readiness_interval", &self.readiness_interval)
            .field("startup_timeout", &self.startup_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = SpawnSpec::new("express", ["npm", "start"]);
        assert_eq!(spec.command, vec!["npm", "start"]);
        assert_eq!(spec.command_line(), "npm start");
        assert_eq!(spec.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
        assert_eq!(spec.poll_interval, POLL_INTERVAL);
        assert_eq!(spec.stdio, StdioMode::Inherit);
        assert!(spec.readiness.is_none());
    }

    #[test]
    fn test_env_overrides_merge() {
        let spec = SpawnSpec::new("jest", ["npm", "run", "test"])
            .with_envs([("NUM_TESTS", "100"), ("NUM_REQUESTS", "50")])
            .with_env("NUM_TESTS", "10");

        assert_eq!(spec.environment.get("NUM_TESTS").map(String::as_str), Some("10"));
        assert_eq!(spec.environment.len(), 2);
    }
}
