// merakictl - CLI for rotating Meraki SSID pre-shared keys
// Copyright (C) 2026 merakictl contributors
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

//! Dashboard API records.
//!
//! Only the fields the rotation flow reads are typed; full SSID
//! configurations are kept as raw JSON so backups lose nothing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model substring shared by every Meraki wireless access point (MR33, MR46, ...).
pub const ACCESS_POINT_MARKER: &str = "MR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub network_id: Option<String>,
}

impl Device {
    pub fn is_access_point(&self) -> bool {
        self.model.contains(ACCESS_POINT_MARKER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ssid {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub encryption_mode: Option<String>,
    #[serde(default)]
    pub psk: Option<String>,
}

impl Ssid {
    /// Enabled with a PSK set; anything else cannot have its key rotated.
    pub fn is_eligible(&self) -> bool {
        self.enabled && self.has_psk()
    }

    pub fn has_psk(&self) -> bool {
        self.psk.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Body of the PSK update request.
#[derive(Debug, Serialize)]
pub struct PskUpdate<'a> {
    pub psk: &'a str,
}

pub fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => "*****".to_string(),
        _ => "-".to_string(),
    }
}

/// Renders a JSON scalar the way it should appear in a table or CSV cell.
pub fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

// v0 organization ids come back as numbers on some accounts.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
