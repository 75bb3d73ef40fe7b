//! The `play` workflow: validate, execute (locally or remotely), log, visualize.
//!
//! Every step gates the next; the first failure aborts the run with a
//! [`PlayError`] and nothing is retried or rolled back.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    api::{ApiClient, ApiError},
    config::Config,
    error::{ContainerStep, PlayError},
    printer,
    process::{ContainerRuntime, RunOutcome},
    visualizer::{self, VisualizerLauncher},
};

pub mod archive;
pub mod log;
pub mod precondition;

use precondition::BotPair;

/// Fixed names and paths the workflow operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySettings {
    pub engine_image: String,
    pub bot_images: Vec<String>,
    pub docker_socket: PathBuf,
    pub log_path: PathBuf,
    pub visualizer_path: PathBuf,
}

impl PlaySettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            engine_image: cfg.get_or_default("MM_ENGINE_IMAGE"),
            bot_images: cfg.get_list_or_default("MM_BOT_IMAGES"),
            docker_socket: PathBuf::from(cfg.get_or_default("MM_DOCKER_SOCKET")),
            log_path: cfg.log_path(),
            visualizer_path: visualizer::binary_path(&cfg.visualizer_dir()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayRequest {
    pub script: PathBuf,
    pub remote: bool,
    pub visualize: bool,
    /// Extra copy of the log, on top of the fixed temp log.
    pub logfile: Option<PathBuf>,
    /// Distinct second bot. Not reachable from the command line yet.
    pub opponent: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Visualized { exit_code: i32 },
    Done { log_path: PathBuf },
}

impl PlayOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            PlayOutcome::Visualized { exit_code } => *exit_code,
            PlayOutcome::Done { .. } => 0,
        }
    }
}

/// Remote execution of an archived bot.
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    async fn submit(&self, archive: Vec<u8>) -> Result<Vec<u8>, ApiError>;
}

#[async_trait]
impl RemoteRunner for ApiClient {
    async fn submit(&self, archive: Vec<u8>) -> Result<Vec<u8>, ApiError> {
        self.play(archive).await
    }
}

pub struct PlayWorkflow<'a> {
    settings: &'a PlaySettings,
    runtime: &'a dyn ContainerRuntime,
    remote: &'a dyn RemoteRunner,
    visualizer: &'a dyn VisualizerLauncher,
}

impl<'a> PlayWorkflow<'a> {
    pub fn new(
        settings: &'a PlaySettings,
        runtime: &'a dyn ContainerRuntime,
        remote: &'a dyn RemoteRunner,
        visualizer: &'a dyn VisualizerLauncher,
    ) -> Self {
        Self { settings, runtime, remote, visualizer }
    }

    pub async fn run(&self, req: &PlayRequest) -> Result<PlayOutcome, PlayError> {
        let bots = precondition::check(self.settings, req)?;
        debug!(bot = %bots.primary.path().display(), remote = req.remote, "preconditions passed");

        let result = if req.remote {
            self.execute_remote(&bots).await?
        } else {
            self.execute_local(&bots).await?
        };

        log::write_log(&self.settings.log_path, &result)?;
        if let Some(extra) = &req.logfile {
            log::write_log(extra, &result)?;
        }

        if !req.visualize {
            return Ok(PlayOutcome::Done { log_path: self.settings.log_path.clone() });
        }

        println!("Setting up visualizer");
        let exit_code = self
            .visualizer
            .launch(&self.settings.visualizer_path, &self.settings.log_path)
            .await?;
        Ok(PlayOutcome::Visualized { exit_code })
    }

    async fn execute_remote(&self, bots: &BotPair) -> Result<Vec<u8>, PlayError> {
        printer::note("NOTE: Cloud builds with --remote are an experimental feature");
        println!("This could take a while...");

        let dir = bots.primary.path();
        let archive = archive::pack_directory(dir).map_err(|source| PlayError::Archive {
            path: dir.to_path_buf(),
            source,
        })?;
        info!(bytes = archive.len(), "submitting bot archive");
        Ok(self.remote.submit(archive).await?)
    }

    async fn execute_local(&self, bots: &BotPair) -> Result<Vec<u8>, PlayError> {
        let image = &self.settings.engine_image;

        println!("Updating game binary");
        ensure_success(ContainerStep::Pull, self.runtime.pull(image).await?)?;

        for job in bots.build_plan(&self.settings.bot_images) {
            println!("Building your bot at {}", job.context.display());
            ensure_success(
                ContainerStep::Build,
                self.runtime.build(job.context, &job.tags).await?,
            )?;
        }

        println!("Running game against your own bot");
        let outcome = ensure_success(
            ContainerStep::Run,
            self.runtime.run(image, &self.settings.docker_socket).await?,
        )?;
        Ok(outcome.stdout)
    }
}

fn ensure_success(step: ContainerStep, outcome: RunOutcome) -> Result<RunOutcome, PlayError> {
    if outcome.success() {
        Ok(outcome)
    } else {
        Err(PlayError::ExternalProcess { step, code: outcome.code.unwrap_or(1) })
    }
}
