//! Working tree changes from `git status --porcelain`

use async_trait::async_trait;
use crosspost_domain::usecases::parse_porcelain;
use crosspost_domain::{ChangeSource, ChangeSourceError};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Change source that shells out to git in the working directory
pub struct GitStatusSource {
    working_dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl GitStatusSource {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::with_command(
            working_dir,
            "git",
            vec!["status".to_string(), "--porcelain".to_string()],
        )
    }

    /// Run a different command whose stdout is in porcelain format
    pub fn with_command(
        working_dir: impl Into<PathBuf>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            program: program.into(),
            args,
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ChangeSource for GitStatusSource {
    async fn changed_paths(&self) -> Result<Vec<String>, ChangeSourceError> {
        let error = |message: String| ChangeSourceError::Command {
            command: self.command_line(),
            message,
        };

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| error(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(error(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let paths = parse_porcelain(&stdout);
        tracing::debug!(
            command = %self.command_line(),
            count = paths.len(),
            "Collected changed paths"
        );
        Ok(paths)
    }
}
