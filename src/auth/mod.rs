//! Persistence of the logged-in team.

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};

use crate::{api::Team, config::Config};

#[derive(Debug, Clone)]
pub struct TeamStore {
    path: PathBuf,
}

impl TeamStore {
    pub fn from_config(cfg: &Config) -> Self {
        Self { path: cfg.team_path() }
    }

    /// The stored team, or `None` when nobody is logged in.
    pub fn load(&self) -> Result<Option<Team>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let team = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(team))
    }

    pub fn save(&self, team: &Team) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(team)?)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    /// Returns whether a team was logged in.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TeamStore {
        let home = dir.path().join("home");
        let cfg = Config::with_overrides([("MM_HOME", home.to_string_lossy().into_owned())]);
        TeamStore::from_config(&cfg)
    }

    #[test]
    fn save_load_clear_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().unwrap(), None);

        let team = Team { name: "bots".into(), email: "b@x".into(), token: "t0k".into() };
        store.save(&team).unwrap();
        assert_eq!(store.load().unwrap(), Some(team));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(dir.path().join("home")).unwrap();
        fs::write(dir.path().join("home").join("team.json"), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
