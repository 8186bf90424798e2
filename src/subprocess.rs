use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

use anyhow::Context;

use crate::error::ExitError;

/// Result of running a subprocess.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunOutput {
    /// Returns true if the process exited successfully.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for running external tools (git, gh).
pub struct Tool {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
    redact: Vec<String>,
}

impl Tool {
    /// Create a new tool invocation.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout: None,
            cwd: None,
            envs: Vec::new(),
            stdin: None,
            redact: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set a timeout for the subprocess.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    /// Feed `input` to the child's stdin, then close it.
    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    /// Mask `secret` wherever it would appear in error messages.
    pub fn redact(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.redact.push(secret.to_string());
        }
        self
    }

    /// Run the tool, capturing stdout and stderr.
    pub fn run(&self) -> anyhow::Result<RunOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        tracing::debug!(
            program = %self.program,
            args = %self.scrub(&self.args.join(" ")),
            "running"
        );

        let mut child = cmd.spawn().map_err(|e| self.not_found_or_other(e))?;
        if let Some(input) = &self.stdin
            && let Some(mut pipe) = child.stdin.take()
            && let Err(e) = pipe.write_all(input.as_bytes())
        {
            drop(pipe);
            let _ = child.kill();
            let _ = child.wait();
            return Err(
                anyhow::Error::new(e).context(format!("writing stdin of {}", self.program))
            );
        }

        let output: Output = if let Some(timeout) = self.timeout {
            wait_with_timeout(child, timeout, &self.program)?
        } else {
            child
                .wait_with_output()
                .with_context(|| format!("waiting for {}", self.program))?
        };

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Run the tool and return an error if it fails.
    pub fn run_ok(&self) -> anyhow::Result<RunOutput> {
        let output = self.run()?;
        if output.success() {
            Ok(output)
        } else {
            Err(ExitError::ToolFailed {
                tool: self.program.clone(),
                code: output.exit_code,
                message: self.scrub(output.stderr.trim()),
            }
            .into())
        }
    }

    fn scrub(&self, text: &str) -> String {
        self.redact
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret, "***"))
    }

    fn not_found_or_other(&self, e: std::io::Error) -> anyhow::Error {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExitError::ToolNotFound {
                tool: self.program.clone(),
            }
            .into()
        } else {
            anyhow::Error::new(e).context(format!("running {}", self.program))
        }
    }
}

fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    tool_name: &str,
) -> anyhow::Result<Output> {
    let start = std::time::Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                return child
                    .wait_with_output()
                    .with_context(|| format!("collecting output of {tool_name}"));
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExitError::Timeout {
                        tool: tool_name.to_string(),
                        timeout_secs: timeout.as_secs(),
                    }
                    .into());
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("waiting for {tool_name}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_echo() {
        let output = Tool::new("echo").arg("hello").run().unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn run_false_fails() {
        let output = Tool::new("false").run().unwrap();
        assert!(!output.success());
    }

    #[test]
    fn run_ok_returns_error_on_failure() {
        let err = Tool::new("false").run_ok().unwrap_err();
        assert!(err.downcast_ref::<ExitError>().is_some());
    }

    #[test]
    fn run_not_found() {
        let err = Tool::new("nonexistent-tool-xyz").run().unwrap_err();
        let exit_err = err.downcast_ref::<ExitError>().unwrap();
        assert!(matches!(exit_err, ExitError::ToolNotFound { .. }));
    }

    #[test]
    fn stdin_is_forwarded() {
        let output = Tool::new("cat").stdin("secret-value").run().unwrap();
        assert_eq!(output.stdout, "secret-value");
    }

    #[test]
    fn stdin_write_failure_reaps_child() {
        // `true` exits without reading, so a large input hits a closed pipe.
        let err = Tool::new("true")
            .stdin(&"x".repeat(1 << 20))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("writing stdin of true"), "{err:#}");
    }

    #[test]
    fn env_and_cwd_apply() {
        let dir = tempfile::tempdir().unwrap();
        let output = Tool::new("sh")
            .args(&["-c", "echo $REPLYBOT_TEST_VAR; pwd"])
            .env("REPLYBOT_TEST_VAR", "set")
            .current_dir(dir.path())
            .run()
            .unwrap();
        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("set"));
        let pwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(pwd, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn failures_redact_secrets() {
        let err = Tool::new("sh")
            .args(&["-c", "echo 'bad token hunter2' >&2; exit 3"])
            .redact("hunter2")
            .run_ok()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad token ***"), "{message}");
        assert!(!message.contains("hunter2"));
    }

    #[test]
    fn timeout_kills_slow_process() {
        let err = Tool::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(200))
            .run()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExitError>(),
            Some(ExitError::Timeout { .. })
        ));
    }

    #[test]
    fn run_with_timeout_succeeds() {
        let output = Tool::new("echo")
            .arg("fast")
            .timeout(Duration::from_secs(5))
            .run()
            .unwrap();
        assert_eq!(output.stdout.trim(), "fast");
    }
}
