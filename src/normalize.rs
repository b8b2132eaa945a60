// shipctl - CLI for private-location ships and team agents
// Copyright (C) 2024 shipctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Parsing of vendor response bodies into canonical rows.
//!
//! Both vendors are loose about types: strings arrive as `null` or numbers,
//! epochs as floats. Every field here deserializes leniently and falls back
//! to its zero value, so a partially populated payload still renders. A body
//! that is not the expected JSON at all normalizes as an empty envelope.

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

/// One load-generating ship inside a private location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentRow {
    #[serde(rename = "id", default, deserialize_with = "lenient_string")]
    pub ship_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    /// Seconds since the Unix epoch; 0 means the ship never reported.
    #[serde(rename = "lastHeartBeat", default, deserialize_with = "lenient_i64")]
    pub last_heartbeat: i64,
}

impl AgentRow {
    pub fn last_beat(&self) -> String {
        format_heartbeat(self.last_heartbeat)
    }
}

/// A private location (harbour) and its ships, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrivateLocationGroup {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub ships: Vec<AgentRow>,
}

/// One agent registered under a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TeamAgentRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub agent_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub host_os: String,
}

/// One third-party integration configured for a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntegrationRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// A vendor answered, but with an error instead of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    Coded { code: String, message: String },
    /// Team API failures carry only the `meta.status` string.
    Status(String),
}

/// Normalized outcome of one response, rendered by `render::report`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Locations(Vec<PrivateLocationGroup>),
    Agents(Vec<TeamAgentRow>),
    Integrations(Vec<IntegrationRow>),
    Failure(ApiFailure),
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default, deserialize_with = "lenient_i64")]
    code: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct LocationsEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default, deserialize_with = "lenient_list")]
    result: Vec<PrivateLocationGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct AgentsEnvelope {
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default, deserialize_with = "lenient_list")]
    data: Vec<TeamAgentRow>,
}

#[derive(Debug, Default, Deserialize)]
struct IntegrationsEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default, deserialize_with = "lenient_list")]
    data: Vec<IntegrationRow>,
}

/// Normalizes a private-locations body. With `harbour_id`, only the group
/// with that id is kept; a miss yields an empty list.
pub fn private_locations(body: &[u8], harbour_id: Option<&str>) -> Report {
    let envelope: LocationsEnvelope = parse_or_default(body, "private-locations");

    if let Some(error) = envelope.error.filter(|e| e.code != 0) {
        return Report::Failure(ApiFailure::Coded {
            code: error.code.to_string(),
            message: error.message,
        });
    }

    let groups: Vec<PrivateLocationGroup> = match harbour_id {
        Some(harbour) => envelope
            .result
            .into_iter()
            .filter(|group| group.id == harbour)
            .collect(),
        None => envelope.result,
    };
    debug!("normalized {} private location(s)", groups.len());
    Report::Locations(groups)
}

pub fn team_agents(body: &[u8]) -> Report {
    let envelope: AgentsEnvelope = parse_or_default(body, "team agents");

    let status = envelope.meta.unwrap_or_default().status;
    if status != "success" {
        return Report::Failure(ApiFailure::Status(status));
    }
    debug!("normalized {} team agent(s)", envelope.data.len());
    Report::Agents(envelope.data)
}

pub fn integrations(body: &[u8]) -> Report {
    let envelope: IntegrationsEnvelope = parse_or_default(body, "integrations");

    if let Some(error) = envelope.error {
        let status_failed = !error.status.is_empty() && error.status != "0";
        if error.code != 0 || status_failed {
            let code = if error.status.is_empty() {
                error.code.to_string()
            } else {
                error.status
            };
            return Report::Failure(ApiFailure::Coded {
                code,
                message: error.message,
            });
        }
    }
    debug!("normalized {} integration(s)", envelope.data.len());
    Report::Integrations(envelope.data)
}

fn parse_or_default<T>(body: &[u8], what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_slice(body).unwrap_or_else(|err| {
        warn!("{what} response is not the expected JSON ({err}); rerun with --raw to inspect it");
        T::default()
    })
}

/// `0` stays the literal `0`; anything else becomes local time cut to
/// `YYYY-MM-DD HH:MM` (16 characters).
pub fn format_heartbeat(epoch: i64) -> String {
    if epoch == 0 {
        return "0".to_string();
    }
    match DateTime::from_timestamp(epoch, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string()
            .chars()
            .take(16)
            .collect(),
        None => format!("{epoch:<16}").chars().take(16).collect(),
    }
}

fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_str(&Value::deserialize(deserializer)?))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_i64(&Value::deserialize(deserializer)?))
}

/// `null` lists are empty and `null` entries are zero-value rows.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<Vec<Option<T>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
