use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Run the `statkeep` binary to completion.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_statkeep<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = statkeep_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("STATKEEP_LOG")
        .env_remove("STATKEEP_CONFIG")
        .output()
        .map_err(|err| format!("run statkeep failed: {}", err))
}

/// Spawn the `statkeep` binary in the background.
///
/// # Errors
///
/// Returns an error if the process cannot be started.
pub fn spawn_statkeep<I, S>(args: I) -> Result<Child, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = statkeep_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("STATKEEP_LOG")
        .env_remove("STATKEEP_CONFIG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| format!("spawn statkeep failed: {}", err))
}

/// Kills a background child when dropped.
pub struct ChildGuard(pub Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        drop(self.0.kill());
        drop(self.0.wait());
    }
}

/// Wait until `path` exists.
///
/// # Errors
///
/// Returns an error if the timeout is exceeded or the child exits first.
pub fn wait_for_socket(child: &mut Child, path: &Path, timeout: Duration) -> Result<(), String> {
    let start = Instant::now();
    while !path.exists() {
        if let Some(status) = child
            .try_wait()
            .map_err(|err| format!("wait failed: {}", err))?
        {
            return Err(format!("plugin server exited early: {}", status));
        }
        if start.elapsed() > timeout {
            return Err(format!("socket {} never appeared", path.display()));
        }
        thread::sleep(Duration::from_millis(25));
    }
    Ok(())
}

/// Wait for a child process to exit.
///
/// # Errors
///
/// Returns an error if waiting fails or the timeout is exceeded.
pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> Result<ExitStatus, String> {
    let start = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|err| format!("wait failed: {}", err))?
        {
            return Ok(status);
        }
        if start.elapsed() > timeout {
            drop(child.kill());
            return Err("process timed out".to_owned());
        }
        thread::sleep(Duration::from_millis(50));
    }
}

/// One JSON-lines observation for `container` at `second` past the epoch.
///
/// # Errors
///
/// Returns an error if `second` is not a representable timestamp.
pub fn observation_line(
    container: &str,
    second: i64,
    cpu_total_ns: u64,
    memory: u64,
) -> Result<String, String> {
    let timestamp = chrono::DateTime::<chrono::Utc>::from_timestamp(second, 0)
        .ok_or_else(|| format!("invalid timestamp {}", second))?;
    Ok(format!(
        r#"{{"reference":{{"id":"{}"}},"stats":[{{"timestamp":"{}","cpu":{{"total_ns":{}}},"memory":{{"usage_bytes":{}}}}}]}}"#,
        container,
        timestamp.to_rfc3339(),
        cpu_total_ns,
        memory
    ))
}

fn statkeep_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_statkeep").map_or_else(
        || Err("CARGO_BIN_EXE_statkeep missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
