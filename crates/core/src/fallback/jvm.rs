use super::ClassRunner;
use crate::config::ScanConfig;
use crate::error::{DiscoveryError, Result};
use crate::tracker::{ResourceGuard, ResourceKind, ResourceTracker};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const PROBE_FILE: &str = "NameProbe.java";
const PROBE_SOURCE: &str = include_str!("NameProbe.java");
const NAME_MARKER: &str = "\u{1}plugscan:name=";
const ERROR_MARKER: &str = "\u{1}plugscan:error=";
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STDERR_TAIL_LINES: usize = 5;

/// Finds the `java` launcher: explicit path, then `$JAVA_HOME/bin/java`, then `PATH`.
pub fn locate_java(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(home) = std::env::var("JAVA_HOME") {
        let launcher = Path::new(&home)
            .join("bin")
            .join(if cfg!(windows) { "java.exe" } else { "java" });
        if launcher.exists() {
            return launcher;
        }
    }

    PathBuf::from("java")
}

/// Runs the accessor in a child JVM launched in single-file source mode.
///
/// Needs a JDK 11+ since the probe is compiled in memory by the launcher.
pub struct JvmRunner {
    java: PathBuf,
    timeout: Option<Duration>,
    tracker: ResourceTracker,
}

impl JvmRunner {
    pub fn new(java: PathBuf, timeout: Option<Duration>, tracker: ResourceTracker) -> Self {
        Self {
            java,
            timeout,
            tracker,
        }
    }

    pub fn from_config(config: &ScanConfig, tracker: ResourceTracker) -> Self {
        Self::new(
            locate_java(config.java_executable.as_deref()),
            config.fallback_timeout(),
            tracker,
        )
    }

    pub fn java(&self) -> &Path {
        &self.java
    }
}

impl ClassRunner for JvmRunner {
    fn invoke_name(&self, artifact: &Path, class_name: &str) -> Result<String> {
        let fail = |reason: String| DiscoveryError::dynamic(class_name, artifact, reason);

        let context = ExecutionContext::new(&self.tracker)
            .map_err(|e| fail(format!("cannot prepare execution context: {e}")))?;
        let output = context.run(&self.java, artifact, class_name, self.timeout)?;

        match output.status {
            None => Err(fail(format!(
                "timed out after {}s",
                self.timeout.map(|t| t.as_secs()).unwrap_or_default()
            ))),
            Some(status) => interpret(&output.stdout, &output.stderr, status).map_err(fail),
        }
    }
}

struct ProbeOutput {
    /// `None` when the timeout expired.
    status: Option<ExitStatus>,
    stdout: String,
    stderr: String,
}

/// Temporary directory holding the probe source and captured output.
/// Deleted on drop.
struct ExecutionContext {
    dir: TempDir,
    _guard: ResourceGuard,
}

impl ExecutionContext {
    fn new(tracker: &ResourceTracker) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("plugscan-").tempdir()?;
        std::fs::write(dir.path().join(PROBE_FILE), PROBE_SOURCE)?;
        Ok(Self {
            dir,
            _guard: tracker.acquire(ResourceKind::ExecutionContext),
        })
    }

    fn run(
        &self,
        java: &Path,
        artifact: &Path,
        class_name: &str,
        timeout: Option<Duration>,
    ) -> Result<ProbeOutput> {
        let io_err = |e| DiscoveryError::io(self.dir.path(), e);
        let stdout_path = self.dir.path().join("stdout.log");
        let stderr_path = self.dir.path().join("stderr.log");
        let stdout = File::create(&stdout_path).map_err(io_err)?;
        let stderr = File::create(&stderr_path).map_err(io_err)?;

        // Absolute so the child can run from inside the context directory.
        let class_path = std::path::absolute(artifact).map_err(io_err)?;

        let child = Command::new(java)
            .arg("-Djava.awt.headless=true")
            .arg("--class-path")
            .arg(&class_path)
            .arg(PROBE_FILE)
            .arg(class_name)
            .current_dir(self.dir.path())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| {
                DiscoveryError::dynamic(
                    class_name,
                    artifact,
                    format!("cannot launch {}: {e}", java.display()),
                )
            })?;

        let mut child = ChildGuard(child);
        let status = child.wait_for(timeout).map_err(io_err)?;
        drop(child);

        Ok(ProbeOutput {
            status,
            stdout: std::fs::read_to_string(&stdout_path).map_err(io_err)?,
            stderr: std::fs::read_to_string(&stderr_path).map_err(io_err)?,
        })
    }
}

/// Kills the child if it is still running when dropped.
struct ChildGuard(Child);

impl ChildGuard {
    fn wait_for(&mut self, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
        let Some(timeout) = timeout else {
            return self.0.wait().map(Some);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.0.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

/// Extracts the name from probe output, or the reason it is missing.
fn interpret(stdout: &str, stderr: &str, status: ExitStatus) -> std::result::Result<String, String> {
    let mut name = None;
    let mut error = None;
    for line in stdout.lines() {
        if let Some((_, rest)) = line.rsplit_once(NAME_MARKER) {
            name = Some(rest.to_string());
        } else if let Some((_, rest)) = line.rsplit_once(ERROR_MARKER) {
            error = Some(rest.to_string());
        }
    }

    if let Some(error) = error {
        return Err(error);
    }
    match name {
        Some(name) if status.success() => Ok(name),
        _ => {
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            Err(format!("probe exited with {status}: {tail}"))
        }
    }
}
