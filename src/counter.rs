use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

// The counter service sits behind a free-tier function host; cold starts
// can take a few seconds, so the timeout is generous.
const COUNTER_TIMEOUT: Duration = Duration::from_secs(10);

static COUNTER_CLIENT: OnceCell<Client> = OnceCell::new();

fn counter_client() -> Result<&'static Client> {
    COUNTER_CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(COUNTER_TIMEOUT)
            .build()
            .context("failed to build counter http client")
    })
}

/// Remote champion-pick counter. Best-effort and non-authoritative: failures
/// are logged by the caller and never touch prediction state.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub enabled: bool,
    pub url: Option<String>,
}

impl CounterConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("COUNTER_ENABLED")
            .map(|v| {
                let v = v.trim().to_ascii_lowercase();
                !matches!(v.as_str(), "0" | "false" | "no" | "off")
            })
            .unwrap_or(true);
        let url = env::var("COUNTER_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        CounterConfig { enabled, url }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinCount {
    #[serde(rename = "TeamName")]
    pub team: String,
    #[serde(rename = "NumberOfWins")]
    pub wins: u64,
}

#[derive(Debug, Serialize)]
struct IncrementRequest<'a> {
    team: &'a str,
    action: &'static str,
}

pub fn fetch_win_counts(cfg: &CounterConfig) -> Result<Vec<WinCount>> {
    if !cfg.enabled {
        return Ok(Vec::new());
    }
    let url = cfg.url.as_deref().context("counter url not configured")?;
    let client = counter_client()?;
    let counts = client
        .get(url)
        .send()
        .context("counter fetch failed")?
        .error_for_status()
        .context("counter fetch rejected")?
        .json::<Vec<WinCount>>()
        .context("counter response malformed")?;
    Ok(counts)
}

/// Ask the service to bump a team's pick count. Fire-and-forget at the call
/// site: no retry, the error only feeds the status log.
pub fn record_champion_pick(cfg: &CounterConfig, team: &str) -> Result<()> {
    if !cfg.enabled {
        return Ok(());
    }
    let url = cfg.url.as_deref().context("counter url not configured")?;
    let client = counter_client()?;
    client
        .post(url)
        .json(&IncrementRequest {
            team,
            action: "increment",
        })
        .send()
        .context("counter increment failed")?
        .error_for_status()
        .context("counter increment rejected")?;
    Ok(())
}

/// Share of recorded picks held by one team, in percent.
pub fn win_percentage(counts: &[WinCount], team: &str) -> Option<f64> {
    let total: u64 = counts.iter().map(|c| c.wins).sum();
    if total == 0 {
        return None;
    }
    let wins = counts.iter().find(|c| c.team == team)?.wins;
    Some(wins as f64 * 100.0 / total as f64)
}
