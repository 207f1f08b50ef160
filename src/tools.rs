use crate::error::ShortError;

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

/// Lines of stderr kept when a tool fails.
const STDERR_TAIL: usize = 8;

/// Names or paths of the external programs.
#[derive(Debug, Clone)]
pub struct Tools {
    pub yt_dlp: String,
    pub ffmpeg: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

pub trait ToolRunner {
    /// Runs `program` with `args` inside `cwd` and waits for it. A non-zero
    /// exit is an error.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<()> {
        debug!(program, args = %args.join(" "), cwd = %cwd.display(), "running");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to spawn {}", program))?;

        if !output.status.success() {
            return Err(ShortError::Tool {
                tool: program.to_string(),
                code: output.status.code(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            }
            .into());
        }
        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(STDERR_TAIL);
    lines[skip..].join("\n")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_end_of_stderr() {
        let stderr: String = (1..=20).map(|i| format!("line {}\n\n", i)).collect();
        let tail = stderr_tail(&stderr);

        assert_eq!(tail.lines().count(), STDERR_TAIL);
        assert!(tail.starts_with("line 13"));
        assert!(tail.ends_with("line 20"));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemRunner
            .run("shortcut-no-such-program", &[], dir.path())
            .unwrap_err();

        assert!(err.to_string().contains("Failed to spawn"));
    }
}
