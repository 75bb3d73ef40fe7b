//! Reqwest-based client for the MechMania backend.

use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("not authorized")]
    Unauthorized,

    #[error("An unknown error occurred on the server {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub key: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_at: String,
}

/// A team as listed by the admin endpoints, with its most recent submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamEntry {
    pub team: Team,
    #[serde(default, alias = "latestScript")]
    pub script: Option<Script>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpponentInfo {
    pub key: String,
}

/// Per-opponent win counts; `wins[i]` belongs to `opponent_info[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchHistory {
    #[serde(rename = "oponentInfo", alias = "opponentInfo", default)]
    pub opponent_info: Vec<OpponentInfo>,
    #[serde(default)]
    pub wins: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_url: String,
    login_url: String,
    register_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;

        let api_url = cfg.get("MM_API_URL").unwrap_or_default();
        let login_url = cfg.get("MM_LOGIN_URL").unwrap_or_default();
        let register_url = cfg.get("MM_REGISTER_URL").unwrap_or_default();

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            login_url,
            register_url,
            token: None,
        })
    }

    /// Attach the logged-in team's token to remote play submissions.
    pub fn authenticated(mut self, team: Option<&Team>) -> Self {
        self.token = team.map(|t| t.token.clone());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// `Ok(None)` when the backend rejects the token.
    pub async fn login(&self, token: &str) -> Result<Option<Team>, ApiError> {
        let req = self.http.get(&self.login_url).bearer_auth(token);
        match send(req, &self.login_url).await {
            Ok(resp) => decode(resp, &self.login_url).await.map(Some),
            Err(ApiError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `Ok(None)` when the backend refuses the registration.
    pub async fn register(&self, name: &str, email: &str) -> Result<Option<Team>, ApiError> {
        let req = self
            .http
            .post(&self.register_url)
            .json(&serde_json::json!({ "name": name, "email": email }));
        match send(req, &self.register_url).await {
            Ok(resp) => decode(resp, &self.register_url).await.map(Some),
            Err(ApiError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn teams(&self, team: &Team) -> Result<Vec<TeamEntry>, ApiError> {
        self.get_json("teams", team).await
    }

    pub async fn stats(&self, team: &Team, script_key: &str) -> Result<Stats, ApiError> {
        self.get_json(&format!("stats/{}", script_key), team).await
    }

    pub async fn versions(&self, team: &Team) -> Result<Vec<Version>, ApiError> {
        self.get_json("versions", team).await
    }

    pub async fn matches(&self, team: &Team) -> Result<MatchHistory, ApiError> {
        self.get_json("matches", team).await
    }

    /// Submit a gzipped bot archive and return the engine log produced remotely.
    pub async fn play(&self, archive: Vec<u8>) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint("play");
        let mut req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/gzip"))
            .body(archive);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = send(req, &url).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|source| ApiError::Decode { url, source })?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, team: &Team) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let resp = send(self.http.get(&url).bearer_auth(&team.token), &url).await?;
        decode(resp, &url).await
    }
}

async fn send(req: RequestBuilder, url: &str) -> Result<Response, ApiError> {
    let resp = req.send().await.map_err(|source| ApiError::Http {
        url: url.to_string(),
        source,
    })?;
    let status = resp.status();
    debug!(%url, %status, "backend response");
    match status {
        s if s.is_success() => Ok(resp),
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        status => {
            let body = resp.text().await.unwrap_or_default();
            Err(ApiError::Status { status, body })
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: Response, url: &str) -> Result<T, ApiError> {
    resp.json::<T>().await.map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}
