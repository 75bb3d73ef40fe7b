//! Container runtime invocations (pull/build/run) over `tokio::process`.

use std::{
    ffi::OsString,
    path::Path,
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{config::Config, error::PlayError};

/// Exit status and captured stdout of one runtime invocation.
/// `code` is `None` when the child was terminated by a signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pull or update an image by name.
    async fn pull(&self, image: &str) -> Result<RunOutcome, PlayError>;

    /// Build `context` once, tagging the result with every tag in `tags`.
    async fn build(&self, context: &Path, tags: &[String]) -> Result<RunOutcome, PlayError>;

    /// Run `image` attached, with the host control socket bind-mounted, capturing stdout.
    async fn run(&self, image: &str, socket: &Path) -> Result<RunOutcome, PlayError>;
}

/// Shells out to the docker CLI (or a compatible binary).
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.get_or_default("MM_CONTAINER_RUNTIME"))
    }

    fn command(&self, args: &[OsString]) -> Command {
        debug!(program = %self.program, ?args, "spawning container runtime");
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> PlayError {
        PlayError::Spawn { program: self.program.clone(), source }
    }

    /// Progress output goes straight to the terminal.
    async fn status(&self, args: Vec<OsString>) -> Result<RunOutcome, PlayError> {
        let status = self
            .command(&args)
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        debug!(code = ?status.code(), "container runtime exited");
        Ok(RunOutcome { code: status.code(), stdout: Vec::new() })
    }

    /// Stdout is captured, stderr stays on the terminal.
    async fn capture(&self, args: Vec<OsString>) -> Result<RunOutcome, PlayError> {
        let child = self
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let out = child
            .wait_with_output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        debug!(code = ?out.status.code(), bytes = out.stdout.len(), "container runtime exited");
        Ok(RunOutcome { code: out.status.code(), stdout: out.stdout })
    }
}

fn pull_args(image: &str) -> Vec<OsString> {
    vec!["pull".into(), image.into()]
}

fn build_args(context: &Path, tags: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["build".into(), context.as_os_str().to_owned()];
    for tag in tags {
        args.push("-t".into());
        args.push(tag.into());
    }
    args
}

fn run_args(image: &str, socket: &Path) -> Vec<OsString> {
    let mut mount = socket.as_os_str().to_owned();
    mount.push(":");
    mount.push(socket.as_os_str());
    vec![
        "run".into(),
        "-v".into(),
        mount,
        "--rm".into(),
        "-i".into(),
        image.into(),
    ]
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull(&self, image: &str) -> Result<RunOutcome, PlayError> {
        self.status(pull_args(image)).await
    }

    async fn build(&self, context: &Path, tags: &[String]) -> Result<RunOutcome, PlayError> {
        self.status(build_args(context, tags)).await
    }

    async fn run(&self, image: &str, socket: &Path) -> Result<RunOutcome, PlayError> {
        self.capture(run_args(image, socket)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn build_tags_every_image() {
        let tags = vec!["mechmania.io/bot/1".to_string(), "mechmania.io/bot/2".to_string()];
        assert_eq!(
            strings(build_args(Path::new("/home/me/mybot"), &tags)),
            vec!["build", "/home/me/mybot", "-t", "mechmania.io/bot/1", "-t", "mechmania.io/bot/2"]
        );
    }

    #[test]
    fn run_mounts_the_control_socket() {
        assert_eq!(
            strings(run_args("pranaygp/mm", Path::new("/var/run/docker.sock"))),
            vec!["run", "-v", "/var/run/docker.sock:/var/run/docker.sock", "--rm", "-i", "pranaygp/mm"]
        );
        assert_eq!(strings(pull_args("pranaygp/mm")), vec!["pull", "pranaygp/mm"]);
    }

    #[tokio::test]
    async fn missing_runtime_binary_is_a_spawn_error() {
        let cli = DockerCli::new("mm-test-no-such-runtime");
        let err = cli.pull("pranaygp/mm").await.unwrap_err();
        assert!(matches!(err, PlayError::Spawn { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn capture_keeps_stdout_and_exit_code() {
        let cli = DockerCli::new("sh");
        let out = cli
            .capture(vec!["-c".into(), "printf 'turn 1\\n'; exit 3".into()])
            .await
            .unwrap();
        assert_eq!(out.stdout, b"turn 1\n");
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
    }
}
