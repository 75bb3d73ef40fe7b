//! Local checks that gate every play run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::PlayError, visualizer};

use super::{PlayRequest, PlaySettings};

/// A bot directory that existed when the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSource(PathBuf);

impl BotSource {
    pub fn resolve(path: &Path) -> Result<Self, PlayError> {
        let absolute = std::path::absolute(path).map_err(|source| PlayError::InaccessiblePath {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = fs::metadata(&absolute).map_err(|source| PlayError::InaccessiblePath {
            path: absolute.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(PlayError::NotADirectory { path: absolute });
        }
        Ok(Self(absolute))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// One docker build: a context directory and the tags it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob<'a> {
    pub context: &'a Path,
    pub tags: Vec<String>,
}

/// The bots taking part in a local game. Without an opponent the primary bot plays itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotPair {
    pub primary: BotSource,
    pub opponent: Option<BotSource>,
}

impl BotPair {
    pub fn build_plan(&self, tags: &[String]) -> Vec<BuildJob<'_>> {
        match &self.opponent {
            None => vec![BuildJob { context: self.primary.path(), tags: tags.to_vec() }],
            Some(opponent) => {
                let (first, rest) = tags.split_at(tags.len().min(1));
                let mut jobs = vec![BuildJob { context: self.primary.path(), tags: first.to_vec() }];
                if !rest.is_empty() {
                    jobs.push(BuildJob { context: opponent.path(), tags: rest.to_vec() });
                }
                jobs
            }
        }
    }
}

/// Visualizer first, then the bot directories. Touches nothing.
pub fn check(settings: &PlaySettings, req: &PlayRequest) -> Result<BotPair, PlayError> {
    if req.visualize {
        visualizer::ensure_installed(&settings.visualizer_path)?;
    }
    let primary = BotSource::resolve(&req.script)?;
    let opponent = req.opponent.as_deref().map(BotSource::resolve).transpose()?;
    Ok(BotPair { primary, opponent })
}
