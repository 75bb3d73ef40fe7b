//! Hidden `mm admin` commands: leaderboard and per-team inspection.

use std::fmt;

use anyhow::Result;
use futures_util::future::try_join_all;

use crate::{
    api::{ApiClient, ApiError, MatchHistory, Stats, Team, TeamEntry, Version},
    auth::TeamStore,
    config::Config,
    printer, prompt,
};

const NOT_LOGGED_IN: &str =
    "Nobody is currently logged in. Use `mm login` to login or `mm register` to create a new team.";

/// Three points per win, one per tie.
pub fn score(stats: &Stats) -> u32 {
    3 * stats.wins + stats.ties
}

fn pad_name(name: &str) -> String {
    format!("{:<20.20}", name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub team: String,
    pub stats: Stats,
    pub score: u32,
}

impl Standing {
    pub fn new(team: impl Into<String>, stats: Stats) -> Self {
        Self { team: team.into(), score: score(&stats), stats }
    }
}

/// Highest score first; equal scores keep their listing order.
pub fn rank(mut standings: Vec<Standing>) -> Vec<Standing> {
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

pub fn format_standing(position: usize, s: &Standing) -> String {
    format!(
        "{:>3}. Team: {} Score: {} Wins: {} Losses: {} Ties: {}",
        position,
        pad_name(&s.team),
        s.score,
        s.stats.wins,
        s.stats.losses,
        s.stats.ties
    )
}

fn logged_in_team(cfg: &Config) -> Result<Option<Team>> {
    let team = TeamStore::from_config(cfg).load()?;
    if team.is_none() {
        println!("{}", NOT_LOGGED_IN);
    }
    Ok(team)
}

pub async fn leaderboard(cfg: &Config) -> Result<()> {
    let Some(team) = logged_in_team(cfg)? else {
        return Ok(());
    };
    let api = ApiClient::from_config(cfg)?;
    let entries = api.teams(&team).await?;
    let standings = collect_standings(&api, &entries).await?;

    for (i, standing) in rank(standings).iter().enumerate() {
        println!("{}", format_standing(i + 1, standing));
    }
    Ok(())
}

/// Fetch stats for every team that has submitted a script, concurrently.
async fn collect_standings(api: &ApiClient, entries: &[TeamEntry]) -> Result<Vec<Standing>, ApiError> {
    let fetches = entries.iter().filter_map(|entry| {
        let script = entry.script.as_ref()?;
        Some(async move {
            let stats = api.stats(&entry.team, &script.key).await?;
            Ok::<_, ApiError>(Standing::new(entry.team.name.clone(), stats))
        })
    });
    try_join_all(fetches).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMode {
    Stats,
    Info,
    Versions,
    Matches,
}

impl UserMode {
    pub const ALL: [UserMode; 4] = [UserMode::Stats, UserMode::Info, UserMode::Versions, UserMode::Matches];
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserMode::Stats => "stats",
            UserMode::Info => "info",
            UserMode::Versions => "versions",
            UserMode::Matches => "matches",
        };
        f.write_str(name)
    }
}

struct TeamChoice<'a>(&'a TeamEntry);

impl fmt::Display for TeamChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.team.name)
    }
}

pub fn stats_lines(name: &str, stats: &Stats) -> Vec<String> {
    vec![
        format!("Name:       {}", name),
        format!("Wins:       {}", stats.wins),
        format!("Losses:     {}", stats.losses),
        format!("Ties:       {}", stats.ties),
        format!("Score:      {}", score(stats)),
    ]
}

pub fn info_lines(entry: &TeamEntry) -> Vec<String> {
    let mut lines = vec![
        format!("Name: {}", entry.team.name),
        format!("Email: {}", entry.team.email),
        format!("Token: {}", entry.team.token),
    ];
    match &entry.script {
        Some(script) => {
            lines.push(format!("Latest script url: {}", script.url));
            lines.push(format!("Latest script created at: {}", script.created_at));
        }
        None => lines.push("No script submitted yet".to_string()),
    }
    lines
}

pub fn version_lines(versions: &[Version]) -> Vec<String> {
    versions.iter().map(|v| v.created_at.clone()).collect()
}

/// One line per opponent whose script key belongs to a known team.
pub fn match_lines(history: &MatchHistory, entries: &[TeamEntry]) -> Vec<String> {
    history
        .opponent_info
        .iter()
        .enumerate()
        .filter_map(|(i, opponent)| {
            let name = entries
                .iter()
                .find(|e| e.script.as_ref().is_some_and(|s| s.key == opponent.key))
                .map(|e| e.team.name.as_str())?;
            let wins = history.wins.get(i).copied().unwrap_or(0);
            Some(format!(" {}  : {}", pad_name(name), wins))
        })
        .collect()
}

pub async fn user(cfg: &Config) -> Result<()> {
    let Some(team) = logged_in_team(cfg)? else {
        return Ok(());
    };
    let api = ApiClient::from_config(cfg)?;
    let entries = api.teams(&team).await?;

    let choices: Vec<TeamChoice> = entries.iter().map(TeamChoice).collect();
    let chosen = prompt::select("Which team?", &choices)?.0;
    let mode = *prompt::select("What do you want to see?", &UserMode::ALL)?;

    printer::heading(&format!("{} ({})", chosen.team.name, mode));
    let lines = match mode {
        UserMode::Stats => match &chosen.script {
            Some(script) => {
                let stats = api.stats(&chosen.team, &script.key).await?;
                stats_lines(&chosen.team.name, &stats)
            }
            None => vec![format!("{} has not submitted a script yet", chosen.team.name)],
        },
        UserMode::Info => info_lines(chosen),
        UserMode::Versions => version_lines(&api.versions(&chosen.team).await?),
        UserMode::Matches => match_lines(&api.matches(&chosen.team).await?, &entries),
    };
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{OpponentInfo, Script};
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(name: &str, key: Option<&str>) -> TeamEntry {
        TeamEntry {
            team: Team { name: name.into(), email: format!("{name}@x"), token: format!("t-{name}") },
            script: key.map(|k| Script {
                key: k.into(),
                url: format!("https://scripts/{k}"),
                created_at: "2019-02-23".into(),
            }),
        }
    }

    #[test]
    fn score_weights_wins_and_ties() {
        assert_eq!(score(&Stats { wins: 4, losses: 9, ties: 2 }), 14);
    }

    #[test]
    fn rank_orders_by_score_descending() {
        let ranked = rank(vec![
            Standing::new("low", Stats { wins: 0, losses: 3, ties: 1 }),
            Standing::new("high", Stats { wins: 5, losses: 0, ties: 0 }),
            Standing::new("mid", Stats { wins: 2, losses: 1, ties: 1 }),
        ]);
        let names: Vec<_> = ranked.iter().map(|s| s.team.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn equal_scores_keep_listing_order() {
        // 3 wins and 9 ties both score 9.
        let ranked = rank(vec![
            Standing::new("zulu", Stats { wins: 3, losses: 0, ties: 0 }),
            Standing::new("alpha", Stats { wins: 0, losses: 2, ties: 9 }),
            Standing::new("top", Stats { wins: 4, losses: 0, ties: 0 }),
            Standing::new("mike", Stats { wins: 2, losses: 5, ties: 3 }),
        ]);
        let names: Vec<_> = ranked.iter().map(|s| s.team.as_str()).collect();
        assert_eq!(names, vec!["top", "zulu", "alpha", "mike"]);
        let lines: Vec<_> = ranked.iter().enumerate().map(|(i, s)| format_standing(i + 1, s)).collect();
        assert!(lines[1].starts_with("  2. Team: zulu"));
        assert!(lines[2].starts_with("  3. Team: alpha"));
    }

    #[test]
    fn long_names_are_truncated() {
        let line = format_standing(1, &Standing::new("a-very-long-team-name-indeed", Stats { wins: 1, losses: 0, ties: 0 }));
        assert_eq!(line, "  1. Team: a-very-long-team-nam Score: 3 Wins: 1 Losses: 0 Ties: 0");
    }

    #[test]
    fn matches_skip_unknown_opponents() {
        let entries = vec![entry("alpha", Some("k1")), entry("beta", Some("k2")), entry("gamma", None)];
        let history = MatchHistory {
            opponent_info: vec![
                OpponentInfo { key: "k2".into() },
                OpponentInfo { key: "ghost".into() },
                OpponentInfo { key: "k1".into() },
            ],
            wins: vec![4, 1, 2],
        };
        assert_eq!(
            match_lines(&history, &entries),
            vec![
                format!(" {}  : 4", pad_name("beta")),
                format!(" {}  : 2", pad_name("alpha")),
            ]
        );
    }

    #[test]
    fn info_and_stats_lines() {
        let info = info_lines(&entry("alpha", Some("k1")));
        assert_eq!(info[0], "Name: alpha");
        assert_eq!(info[3], "Latest script url: https://scripts/k1");
        assert_eq!(info_lines(&entry("beta", None))[3], "No script submitted yet");

        let stats = stats_lines("alpha", &Stats { wins: 2, losses: 1, ties: 3 });
        assert_eq!(stats.last().map(String::as_str), Some("Score:      9"));
    }

    #[test]
    fn modes_render_lowercase() {
        let names: Vec<String> = UserMode::ALL.iter().map(|m| m.to_string()).collect();
        assert_eq!(names, vec!["stats", "info", "versions", "matches"]);
    }

    #[tokio::test]
    async fn standings_only_for_teams_with_scripts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/stats/k1").header("authorization", "Bearer t-alpha");
                then.status(200).json_body(json!({ "wins": 1, "losses": 2, "ties": 3 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/stats/k2");
                then.status(200).json_body(json!({ "wins": 5, "losses": 0, "ties": 0 }));
            })
            .await;

        let cfg = Config::with_overrides([("MM_API_URL", server.base_url())]);
        let api = ApiClient::from_config(&cfg).unwrap();
        let entries = vec![entry("alpha", Some("k1")), entry("idle", None), entry("beta", Some("k2"))];

        let ranked = rank(collect_standings(&api, &entries).await.unwrap());
        assert_eq!(
            ranked,
            vec![
                Standing::new("beta", Stats { wins: 5, losses: 0, ties: 0 }),
                Standing::new("alpha", Stats { wins: 1, losses: 2, ties: 3 }),
            ]
        );
    }

    #[tokio::test]
    async fn leaderboard_without_login_is_a_no_op() {
        let home = tempfile::tempdir().unwrap();
        let cfg = Config::with_overrides([
            ("MM_HOME", home.path().to_string_lossy().into_owned()),
            ("MM_API_URL", "http://127.0.0.1:9".to_string()),
        ]);
        leaderboard(&cfg).await.unwrap();
    }
}
