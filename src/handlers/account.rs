//! `mm login`, `mm register`, `mm logout`.

use anyhow::{bail, Result};

use crate::{api::ApiClient, auth::TeamStore, config::Config, printer, prompt};

pub async fn login(cfg: &Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(t) => t,
        None => prompt::ask("Team token")?,
    };
    let client = ApiClient::from_config(cfg)?;
    let Some(team) = client.login(token.trim()).await? else {
        bail!("Invalid token");
    };
    TeamStore::from_config(cfg).save(&team)?;
    printer::success(&format!("Logged in as {}", team.name));
    Ok(())
}

pub async fn register(cfg: &Config, name: Option<String>, email: Option<String>) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => prompt::ask("Team name")?,
    };
    let email = match email {
        Some(e) => e,
        None => prompt::ask("Email")?,
    };
    let client = ApiClient::from_config(cfg)?;
    let Some(team) = client.register(name.trim(), email.trim()).await? else {
        bail!("Registration was rejected by the server");
    };
    TeamStore::from_config(cfg).save(&team)?;
    printer::success(&format!("Registered team {}", team.name));
    println!("Your team token is {}. Keep it safe: it is how teammates log in.", team.token);
    Ok(())
}

pub fn logout(cfg: &Config) -> Result<()> {
    if TeamStore::from_config(cfg).clear()? {
        println!("Logged out");
    } else {
        println!("Nobody is currently logged in");
    }
    Ok(())
}
