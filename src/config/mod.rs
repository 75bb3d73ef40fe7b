use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut map = default_map();

        // Read .mmrc if exists
        if let Ok(file) = fs::File::open(&config_path) {
            map.extend(parse_rc(BufReader::new(file)));
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Defaults plus the given overrides, ignoring the rc file and the environment.
    #[cfg(test)]
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        map.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { inner: map, config_path: PathBuf::new() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(|v| split_list(&v)).unwrap_or_default()
    }

    /// Trimmed value, or the built-in default when the key is unset or blank.
    pub fn get_or_default(&self, key: &str) -> String {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| default_map().remove(key))
            .unwrap_or_default()
    }

    /// Like [`Config::get_list`], falling back to the built-in list when nothing is left.
    pub fn get_list_or_default(&self, key: &str) -> Vec<String> {
        match self.get_list(key) {
            list if list.is_empty() => default_map()
                .get(key)
                .map(|v| split_list(v))
                .unwrap_or_default(),
            list => list,
        }
    }

    fn get_path(&self, key: &str) -> PathBuf {
        PathBuf::from(self.get(key).unwrap_or_default())
    }

    /// Per-user state directory (`~/.mm`).
    pub fn home_path(&self) -> PathBuf {
        self.get_path("MM_HOME")
    }

    pub fn visualizer_dir(&self) -> PathBuf {
        match self.get("MM_VISUALIZER_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.home_path().join("visualizer"),
        }
    }

    pub fn team_path(&self) -> PathBuf {
        self.home_path().join("team.json")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.get_path("MM_TMP_DIR")
    }

    pub fn log_path(&self) -> PathBuf {
        self.tmp_dir().join("last.log.txt")
    }

    /// `None` when `REQUEST_TIMEOUT` is zero or unset: requests wait indefinitely.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.get_u64("REQUEST_TIMEOUT")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn parse_rc<R: BufRead>(reader: R) -> Vec<(String, String)> {
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn is_config_key(k: &str) -> bool {
    k == "REQUEST_TIMEOUT" || k.starts_with("MM_")
}

fn base_config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"))
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"))
}

fn default_config_path() -> PathBuf {
    base_config_dir().join("mm").join(".mmrc")
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    // Paths
    m.insert("MM_HOME".into(), lossy(&home_dir().join(".mm")));
    m.insert("MM_TMP_DIR".into(), lossy(&env::temp_dir().join("mm")));

    // Endpoints
    m.insert("MM_API_URL".into(), "https://api.mechmania.io".into());
    m.insert("MM_LOGIN_URL".into(), "https://login.mechmania.io".into());
    m.insert("MM_REGISTER_URL".into(), "https://register.mechmania.io".into());

    // Container runtime
    m.insert("MM_CONTAINER_RUNTIME".into(), "docker".into());
    m.insert("MM_ENGINE_IMAGE".into(), "pranaygp/mm".into());
    m.insert(
        "MM_BOT_IMAGES".into(),
        "mechmania.io/bot/1,mechmania.io/bot/2".into(),
    );
    m.insert("MM_DOCKER_SOCKET".into(), "/var/run/docker.sock".into());

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "0".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rc_file_skips_comments_and_blank_lines() {
        let rc = "# comment\n\nMM_ENGINE_IMAGE = custom/engine\nnot a pair\nMM_API_URL=http://localhost:3000\n";
        let pairs = parse_rc(Cursor::new(rc));
        assert_eq!(
            pairs,
            vec![
                ("MM_ENGINE_IMAGE".to_string(), "custom/engine".to_string()),
                ("MM_API_URL".to_string(), "http://localhost:3000".to_string()),
            ]
        );
    }

    #[test]
    fn defaults_describe_self_play() {
        let cfg = Config::with_overrides(Vec::<(String, String)>::new());
        assert_eq!(cfg.get("MM_ENGINE_IMAGE").as_deref(), Some("pranaygp/mm"));
        assert_eq!(
            cfg.get_list("MM_BOT_IMAGES"),
            vec!["mechmania.io/bot/1", "mechmania.io/bot/2"]
        );
        assert_eq!(cfg.request_timeout(), None);
        assert!(cfg.log_path().ends_with("last.log.txt"));
    }

    #[test]
    fn visualizer_dir_follows_home_unless_overridden() {
        let cfg = Config::with_overrides([("MM_HOME", "/srv/mm")]);
        assert_eq!(cfg.visualizer_dir(), PathBuf::from("/srv/mm/visualizer"));
        assert_eq!(cfg.team_path(), PathBuf::from("/srv/mm/team.json"));

        let cfg = Config::with_overrides([("MM_HOME", "/srv/mm"), ("MM_VISUALIZER_DIR", "/opt/vis")]);
        assert_eq!(cfg.visualizer_dir(), PathBuf::from("/opt/vis"));
    }

    #[test]
    fn positive_timeout_is_applied() {
        let cfg = Config::with_overrides([("REQUEST_TIMEOUT", "30")]);
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(30)));
    }
}
