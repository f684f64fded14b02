use crate::configuration::DispatchSettings;
use crate::domain::{ActionId, Secret};
use crate::error::DispatchError;
use rand::Rng;
use secrecy::ExposeSecret;
use std::fs::{self, DirBuilder};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

const SCRIPT_FILE: &str = "action.sh";

/// A private working directory for one script run, removed when dropped.
struct ScriptDir {
    path: PathBuf,
}

impl ScriptDir {
    /// Creates the directory with mode 0700. Fails instead of reusing an existing path.
    fn create(path: PathBuf) -> std::io::Result<Self> {
        DirBuilder::new().mode(0o700).create(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScriptDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove script directory");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    shell: String,
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptRunner {
    pub fn new(settings: &DispatchSettings) -> Self {
        Self {
            shell: settings.shell.clone(),
            workdir: settings.workdir(),
            timeout: settings.script_timeout(),
        }
    }

    /// Runs `content` through the configured shell with each secret exported
    /// into the child's environment.
    #[instrument(skip(self, content, secrets), fields(secret_count = secrets.len()))]
    pub async fn run(
        &self,
        action_id: ActionId,
        content: &str,
        secrets: &[Secret],
    ) -> Result<ScriptOutput, DispatchError> {
        let dir = ScriptDir::create(self.run_dir(action_id))?;
        let script = dir.path().join(SCRIPT_FILE);
        tokio::fs::write(&script, format!("#!/bin/sh\n{content}\n")).await?;
        tokio::fs::set_permissions(&script, fs::Permissions::from_mode(0o700)).await?;

        let mut command = Command::new(&self.shell);
        command
            .arg(&script)
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for secret in secrets {
            command.env(&secret.name, secret.value.expose_secret());
        }

        let child = command.spawn()?;
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| DispatchError::ScriptTimeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(DispatchError::ScriptExit {
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        info!("script finished");
        debug!(%stdout, %stderr, "script output");
        Ok(ScriptOutput { stdout, stderr })
    }

    fn run_dir(&self, action_id: ActionId) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let token: u64 = rand::rng().random();
        self.workdir
            .join(format!("repo-radar-action-{action_id}-{nanos}-{token:016x}"))
    }
}
