//! Bounded execution of platform helper commands (osascript, PowerShell, xdotool).

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::Context;
use wait_timeout::ChildExt;

/// Captured result of a finished helper command.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    /// Trimmed stdout, the form every platform parser works on.
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }
}

/// Run `cmd` to completion, killing it after `timeout`.
///
/// A non-zero exit is not an error here; callers inspect `success` because
/// several scripts report failure through their output instead.
pub fn run(mut cmd: Command, timeout: Duration) -> anyhow::Result<ScriptOutput> {
    let program = format!("{:?}", cmd.get_program());
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    // Drain pipes on helper threads so a chatty child cannot block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child.wait_timeout(timeout).context("wait for child")? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs());
        }
    };

    let join = |h: Option<std::thread::JoinHandle<String>>| {
        h.and_then(|h| h.join().ok()).unwrap_or_default()
    };
    let output = ScriptOutput {
        success: status.success(),
        stdout: join(stdout),
        stderr: join(stderr),
    };
    log::debug!(
        "{program} exited {:?}: stdout={:?} stderr={:?}",
        status.code(),
        output.text(),
        output.stderr.trim()
    );
    Ok(output)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Escape a value for interpolation inside a double-quoted AppleScript string.
pub fn applescript_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a value for interpolation inside a single-quoted PowerShell string.
pub fn powershell_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_status() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let out = run(cmd, Duration::from_secs(5)).unwrap();
        assert!(!out.success);
        assert_eq!(out.text(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn kills_on_timeout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 5"]);
        let err = run(cmd, Duration::from_millis(200)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let cmd = Command::new("definitely-not-a-real-binary-asg");
        assert!(run(cmd, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn applescript_literal_escapes_quotes_and_backslashes() {
        assert_eq!(applescript_literal(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn powershell_literal_doubles_single_quotes() {
        assert_eq!(powershell_literal("it's"), "it''s");
    }
}
