//! Script execution.
//!
//! [`ProcessExecutor`] launches `<interpreter> <script>` from the script's own
//! folder, waits for it up to a timeout and kills it when the timeout fires.
//! On unix the script leads its own process group, so anything it spawned goes
//! down with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const TRACEBACK_MARKER: &str = "Traceback (most recent call last):";
const TAIL_LINES: usize = 20;
/// How long output pipes may stay open after the script itself has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pass,
    Fail,
    Timeout,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Timeout => "timeout",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when one script ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub duration_secs: f64,
    /// Traceback, stderr tail or timeout message for non-passing runs.
    pub error: Option<String>,
    /// Last lines of stdout.
    #[serde(default)]
    pub output_tail: String,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.status == RunStatus::Pass
    }

    pub fn timed_out(timeout: Duration, elapsed: Duration) -> Self {
        Self {
            status: RunStatus::Timeout,
            exit_code: None,
            duration_secs: elapsed.as_secs_f64(),
            error: Some(format!("Timeout after {} seconds", timeout.as_secs())),
            output_tail: String::new(),
        }
    }

    pub fn launch_failed(reason: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Fail,
            exit_code: None,
            duration_secs: 0.0,
            error: Some(reason.into()),
            output_tail: String::new(),
        }
    }
}

/// Runs one script to completion or timeout.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, script: &Path, timeout: Duration) -> RunOutcome;
}

/// Executes scripts as child processes.
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ProcessExecutor {
    /// `interpreter` may carry arguments (`"python3 -u"`).
    pub fn new(interpreter: &str, env: Vec<(String, String)>) -> Self {
        let mut parts = interpreter.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "python3".to_string());
        Self {
            program,
            args: parts.collect(),
            env,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, script: &Path, timeout: Duration) -> RunOutcome {
        let script = std::fs::canonicalize(script).unwrap_or_else(|_| script.to_path_buf());
        let workdir = script.parent().unwrap_or_else(|| Path::new("."));

        debug!(program = %self.program, args = ?self.args, script = %script.display(), "Launching script");

        let mut std_cmd = std::process::Command::new(&self.program);
        std_cmd
            .args(&self.args)
            .arg(&script)
            .current_dir(workdir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program, error = %e, "Failed to launch script");
                return RunOutcome::launch_failed(format!("Failed to launch {}: {e}", self.program));
            }
        };
        let pgid = child.id();

        let stdout = child.stdout.take().map(read_all);
        let stderr = child.stderr.take().map(read_all);

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let duration_secs = start.elapsed().as_secs_f64();
                let stdout = collect_output(stdout, pgid).await;
                let stderr = collect_output(stderr, pgid).await;
                let exit_code = status.code();

                if status.success() {
                    RunOutcome {
                        status: RunStatus::Pass,
                        exit_code,
                        duration_secs,
                        error: None,
                        output_tail: tail(&stdout, TAIL_LINES),
                    }
                } else {
                    RunOutcome {
                        status: RunStatus::Fail,
                        exit_code,
                        duration_secs,
                        error: Some(failure_text(&stderr, &stdout, exit_code)),
                        output_tail: tail(&stdout, TAIL_LINES),
                    }
                }
            }
            Ok(Err(e)) => {
                kill_group(pgid);
                for reader in [stdout, stderr].into_iter().flatten() {
                    reader.abort();
                }
                RunOutcome {
                    duration_secs: start.elapsed().as_secs_f64(),
                    ..RunOutcome::launch_failed(format!("Failed waiting for script: {e}"))
                }
            }
            Err(_) => {
                kill_group(pgid);
                if let Err(e) = child.kill().await {
                    warn!(script = %script.display(), error = %e, "Failed to kill timed-out script");
                }
                for reader in [stdout, stderr].into_iter().flatten() {
                    reader.abort();
                }
                RunOutcome::timed_out(timeout, start.elapsed())
            }
        }
    }
}

fn read_all<R>(mut stream: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf).await {
            warn!(error = %e, read = buf.len(), "Failed reading script output");
        }
        buf
    })
}

/// Waits for a reader after the script exited. A pipe still held open by a
/// leftover background process gets the group killed once the grace runs out.
async fn collect_output(reader: Option<JoinHandle<Vec<u8>>>, pgid: Option<u32>) -> String {
    let Some(mut handle) = reader else {
        return String::new();
    };
    let bytes = match tokio::time::timeout(DRAIN_GRACE, &mut handle).await {
        Ok(joined) => joined.unwrap_or_default(),
        Err(_) => {
            debug!(?pgid, "Output still open after exit, killing process group");
            kill_group(pgid);
            match tokio::time::timeout(DRAIN_GRACE, &mut handle).await {
                Ok(joined) => joined.unwrap_or_default(),
                Err(_) => {
                    handle.abort();
                    Vec::new()
                }
            }
        }
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn kill_group(pgid: Option<u32>) {
    let Some(pgid) = pgid.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "Process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: Option<u32>) {}

/// The Python traceback if there is one, else the tail of stderr, else the
/// tail of stdout.
pub fn failure_text(stderr: &str, stdout: &str, exit_code: Option<i32>) -> String {
    for stream in [stderr, stdout] {
        if let Some(idx) = stream.find(TRACEBACK_MARKER) {
            return stream[idx..].trim_end().to_string();
        }
    }
    for stream in [stderr, stdout] {
        let t = tail(stream, TAIL_LINES);
        if !t.is_empty() {
            return t;
        }
    }
    match exit_code {
        Some(code) => format!("Exited with code {code}"),
        None => "Terminated by signal".to_string(),
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traceback_is_cut_from_marker() {
        let stderr = "INFO starting\nTraceback (most recent call last):\n  File \"x.py\", line 3\nValueError: bad\n";
        assert_eq!(
            failure_text(stderr, "", Some(1)),
            "Traceback (most recent call last):\n  File \"x.py\", line 3\nValueError: bad"
        );
    }

    #[test]
    fn falls_back_to_stderr_then_stdout_tail() {
        assert_eq!(failure_text("connection refused\n", "hello", Some(1)), "connection refused");
        assert_eq!(failure_text("", "last words\n", Some(2)), "last words");
        assert_eq!(failure_text("", "", Some(3)), "Exited with code 3");
    }

    #[test]
    fn tail_keeps_last_lines() {
        let text: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let t = tail(&text, 3);
        assert_eq!(t, "line 28\nline 29\nline 30");
    }

    #[test]
    fn interpreter_with_arguments() {
        let exec = ProcessExecutor::new("python3 -u -X dev", vec![]);
        assert_eq!(exec.program(), "python3");
        assert_eq!(exec.args, vec!["-u", "-X", "dev"]);
    }

    #[cfg(unix)]
    mod process {
        use crate::exec::{Executor, ProcessExecutor, RunStatus};
        use std::fs;
        use std::path::Path;
        use std::time::Duration;

        fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            path
        }

        #[tokio::test]
        async fn zero_exit_passes() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(dir.path(), "01_ok.sh", "echo all good\n");
            let outcome = ProcessExecutor::new("sh", vec![])
                .execute(&path, Duration::from_secs(10))
                .await;
            assert_eq!(outcome.status, RunStatus::Pass);
            assert_eq!(outcome.exit_code, Some(0));
            assert_eq!(outcome.output_tail, "all good");
        }

        #[tokio::test]
        async fn nonzero_exit_captures_traceback() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(
                dir.path(),
                "02_boom.sh",
                "echo 'Traceback (most recent call last):' >&2\necho 'RuntimeError: boom' >&2\nexit 1\n",
            );
            let outcome = ProcessExecutor::new("sh", vec![])
                .execute(&path, Duration::from_secs(10))
                .await;
            assert_eq!(outcome.status, RunStatus::Fail);
            assert_eq!(outcome.exit_code, Some(1));
            assert!(outcome.error.unwrap().ends_with("RuntimeError: boom"));
        }

        #[tokio::test]
        async fn runs_in_script_dir_with_env() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("data.txt"), "fixture").unwrap();
            let path = script(dir.path(), "03_env.sh", "cat data.txt\necho \" $PATTERN_FLAG\"\n");
            let env = vec![("PATTERN_FLAG".to_string(), "on".to_string())];
            let outcome = ProcessExecutor::new("sh", env)
                .execute(&path, Duration::from_secs(10))
                .await;
            assert!(outcome.passed());
            assert_eq!(outcome.output_tail, "fixture on");
        }

        #[tokio::test]
        async fn timeout_kills_the_child() {
            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("pid");
            let path = script(dir.path(), "04_hang.sh", "echo $$ > pid\nexec sleep 30\n");
            let started = std::time::Instant::now();
            let outcome = ProcessExecutor::new("sh", vec![])
                .execute(&path, Duration::from_secs(1))
                .await;

            assert_eq!(outcome.status, RunStatus::Timeout);
            assert_eq!(outcome.error.as_deref(), Some("Timeout after 1 seconds"));
            assert!(started.elapsed() < Duration::from_secs(10));

            let pid = fs::read_to_string(pid_file).unwrap();
            let proc_dir = std::path::PathBuf::from(format!("/proc/{}", pid.trim()));
            if Path::new("/proc/self").exists() {
                assert!(!proc_dir.exists(), "child still present after timeout");
            }
        }

        /// True once `pid` has exited; zombies left for init count as exited.
        async fn wait_gone(pid: &str) -> bool {
            let stat = format!("/proc/{}/stat", pid.trim());
            for _ in 0..40 {
                match fs::read_to_string(&stat) {
                    Err(_) => return true,
                    Ok(s) => {
                        let state = s.rsplit(')').next().and_then(|rest| rest.trim().chars().next());
                        if matches!(state, Some('Z') | Some('X')) {
                            return true;
                        }
                    }
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            false
        }

        #[tokio::test]
        async fn background_child_holding_stdout_does_not_hang() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(
                dir.path(),
                "06_daemon.sh",
                "sleep 20 &\necho $! > bg\necho started\nexit 0\n",
            );
            let outcome = tokio::time::timeout(
                Duration::from_secs(10),
                ProcessExecutor::new("sh", vec![]).execute(&path, Duration::from_secs(2)),
            )
            .await
            .expect("execute returned within its bound");

            assert_eq!(outcome.status, RunStatus::Pass);
            assert_eq!(outcome.output_tail, "started");
            if Path::new("/proc/self").exists() {
                let bg = fs::read_to_string(dir.path().join("bg")).unwrap();
                assert!(wait_gone(&bg).await, "background sleep survived");
            }
        }

        #[tokio::test]
        async fn timeout_kills_grandchildren() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(dir.path(), "07_tree.sh", "sleep 30 &\necho $! > bg\nsleep 30\n");
            let outcome = tokio::time::timeout(
                Duration::from_secs(10),
                ProcessExecutor::new("sh", vec![]).execute(&path, Duration::from_secs(1)),
            )
            .await
            .expect("execute returned within its bound");

            assert_eq!(outcome.status, RunStatus::Timeout);
            if Path::new("/proc/self").exists() {
                let bg = fs::read_to_string(dir.path().join("bg")).unwrap();
                assert!(wait_gone(&bg).await, "grandchild survived the timeout");
            }
        }

        #[tokio::test]
        async fn missing_interpreter_fails_without_panicking() {
            let dir = tempfile::tempdir().unwrap();
            let path = script(dir.path(), "05_any.py", "print('x')\n");
            let outcome = ProcessExecutor::new("definitely-not-an-interpreter", vec![])
                .execute(&path, Duration::from_secs(5))
                .await;
            assert_eq!(outcome.status, RunStatus::Fail);
            assert!(outcome.error.unwrap().starts_with("Failed to launch"));
        }
    }
}
