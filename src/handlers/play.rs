//! `mm play`: wires the real runtime, backend and visualizer into the workflow.

use tracing::warn;

use crate::{
    api::ApiClient,
    auth::TeamStore,
    cli::PlayArgs,
    config::Config,
    error::PlayError,
    play::{PlayOutcome, PlayRequest, PlaySettings, PlayWorkflow},
    process::DockerCli,
    visualizer::SystemVisualizer,
};

pub async fn run(cfg: &Config, args: &PlayArgs) -> Result<PlayOutcome, PlayError> {
    let settings = PlaySettings::from_config(cfg);
    let team = TeamStore::from_config(cfg).load().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable team file");
        None
    });
    let api = ApiClient::from_config(cfg)?.authenticated(team.as_ref());
    let docker = DockerCli::from_config(cfg);

    let req = PlayRequest {
        script: args.script.clone(),
        remote: args.remote,
        visualize: args.visualize(),
        logfile: args.logfile.clone(),
        opponent: None,
    };

    let outcome = PlayWorkflow::new(&settings, &docker, &api, &SystemVisualizer)
        .run(&req)
        .await?;
    if let PlayOutcome::Done { log_path } = &outcome {
        println!("Game log written to {}", log_path.display());
    }
    Ok(outcome)
}
