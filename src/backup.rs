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

//! Local snapshots of an SSID taken before its PSK changes.
//!
//! Each run writes a timestamped JSON snapshot, refreshes `ssid.json` as
//! the latest copy, and appends one flattened row to `ssid.csv`.

use crate::client::ApiClient;
use crate::discovery::SsidRef;
use crate::error::RotateError;
use crate::model::value_to_str;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const LATEST_JSON: &str = "ssid.json";
pub const HISTORY_CSV: &str = "ssid.csv";

/// Flattened view of one snapshot.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CsvRow {
    pub auth_mode: String,
    pub enabled: String,
    pub name: String,
    pub psk: String,
    pub wpa_encryption_mode: String,
    pub date: String,
    pub time: String,
}

impl CsvRow {
    pub fn from_record(record: &Value, taken_at: &DateTime<Local>) -> Self {
        let field = |key: &str| record.get(key).map(value_to_str).unwrap_or_default();
        Self {
            auth_mode: field("authMode"),
            enabled: field("enabled"),
            name: field("name"),
            psk: field("psk"),
            wpa_encryption_mode: field("wpaEncryptionMode"),
            date: taken_at.format("%Y-%m-%d").to_string(),
            time: taken_at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Proof that the pre-change state of an SSID is on disk.
#[derive(Debug, Clone)]
pub struct Backup {
    pub network_id: String,
    pub network_name: String,
    pub number: u32,
    pub record: Value,
    pub snapshot: PathBuf,
    pub latest: PathBuf,
    pub csv: PathBuf,
}

impl Backup {
    pub fn create(
        client: &ApiClient,
        dir: &Path,
        target: &SsidRef,
        taken_at: DateTime<Local>,
    ) -> Result<Self> {
        info!("Let's take a look at the {} network.", target.name);
        let record: Value = client.get_json(&format!(
            "networks/{}/ssids/{}",
            target.network_id, target.number
        ))?;
        info!(
            "Checking '{}' with id {}.",
            target.network_name, target.network_id
        );

        ensure_dir(dir)?;
        info!("Backing up current settings to {}...", dir.display());

        let snapshot = dir.join(format!(
            "ssid-{}-{}-{}.json",
            target.network_id,
            target.number,
            taken_at.format("%Y%m%d_%H%M%S")
        ));
        write_json(&snapshot, &record)?;
        verify(&snapshot, &record)?;

        let latest = dir.join(LATEST_JSON);
        write_json(&latest, &record)?;

        let reread = read_json(&latest)?;
        if reread != record {
            return Err(RotateError::BackupMismatch(latest).into());
        }
        let csv = dir.join(HISTORY_CSV);
        append_csv(&csv, &CsvRow::from_record(&reread, &taken_at))?;

        Ok(Self {
            network_id: target.network_id.clone(),
            network_name: target.network_name.clone(),
            number: target.number,
            record,
            snapshot,
            latest,
            csv,
        })
    }
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        debug!("creating backup directory {}", dir.display());
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    Ok(())
}

pub fn write_json(path: &Path, record: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(record).context("serializing SSID")?;
    fs::write(path, pretty).with_context(|| format!("writing {:?}", path))
}

pub fn read_json(path: &Path) -> Result<Value> {
    info!("Reading {}...", path.display());
    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {:?}", path))
}

fn verify(path: &Path, expected: &Value) -> Result<()> {
    if read_json(path)? != *expected {
        return Err(RotateError::BackupMismatch(path.to_path_buf()).into());
    }
    Ok(())
}

/// Appends `row`, writing the header only when the file is new or empty.
pub fn append_csv(path: &Path, row: &CsvRow) -> Result<()> {
    let fresh = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {:?}", path))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(fresh)
        .from_writer(file);
    writer
        .serialize(row)
        .with_context(|| format!("writing row to {:?}", path))?;
    writer.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn taken_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn guest_record() -> Value {
        json!({
            "number": 4,
            "name": "Guest",
            "enabled": true,
            "splashPage": "None",
            "ssidAdminAccessible": false,
            "authMode": "psk",
            "psk": "oldpass1",
            "encryptionMode": "wpa",
            "wpaEncryptionMode": "WPA2 only",
            "ipAssignmentMode": "NAT mode",
            "minBitrate": 11,
            "bandSelection": "Dual band operation",
            "perClientBandwidthLimitUp": 0,
            "perClientBandwidthLimitDown": 0,
            "visible": true,
            "availableOnAllAps": true,
            "availabilityTags": []
        })
    }

    fn guest_ref() -> SsidRef {
        SsidRef {
            network_id: "N_1".into(),
            network_name: "HQ".into(),
            number: 4,
            name: "Guest".into(),
            encryption_mode: Some("wpa".into()),
        }
    }

    #[test]
    fn json_backup_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LATEST_JSON);
        let record = guest_record();

        write_json(&path, &record).unwrap();

        assert_eq!(read_json(&path).unwrap(), record);
    }

    #[test]
    fn csv_row_flattens_selected_fields() {
        let row = CsvRow::from_record(&guest_record(), &taken_at());
        assert_eq!(
            row,
            CsvRow {
                auth_mode: "psk".into(),
                enabled: "true".into(),
                name: "Guest".into(),
                psk: "oldpass1".into(),
                wpa_encryption_mode: "WPA2 only".into(),
                date: "2024-03-09".into(),
                time: "14:05:07".into(),
            }
        );

        let sparse = CsvRow::from_record(&json!({"name": "Open"}), &taken_at());
        assert_eq!(sparse.psk, "");
        assert_eq!(sparse.auth_mode, "");
    }

    #[test]
    fn csv_history_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(HISTORY_CSV);
        let row = CsvRow::from_record(&guest_record(), &taken_at());

        append_csv(&path, &row).unwrap();
        append_csv(&path, &row).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "authMode,enabled,name,psk,wpaEncryptionMode,date,time"
        );
        assert_eq!(
            lines[1],
            "psk,true,Guest,oldpass1,WPA2 only,2024-03-09,14:05:07"
        );
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn create_fetches_and_writes_all_files() {
        let server = MockServer::start();
        let fetch = server.mock(|when, then| {
            when.method(GET).path("/networks/N_1/ssids/4");
            then.status(200).json_body(guest_record());
        });
        let dir = tempdir().unwrap();
        let backup_dir = dir.path().join("backup");

        let client = ApiClient::new(&server.base_url(), "k").unwrap();
        let backup = Backup::create(&client, &backup_dir, &guest_ref(), taken_at()).unwrap();

        fetch.assert();
        assert!(backup_dir.is_dir());
        assert_eq!(backup.number, 4);
        assert_eq!(backup.network_name, "HQ");
        assert_eq!(backup.record, guest_record());
        assert_eq!(
            backup.snapshot,
            backup_dir.join("ssid-N_1-4-20240309_140507.json")
        );
        assert_eq!(read_json(&backup.snapshot).unwrap(), guest_record());
        assert_eq!(read_json(&backup.latest).unwrap(), guest_record());
        assert!(fs::read_to_string(&backup.csv).unwrap().contains("oldpass1"));
    }

    #[test]
    fn failed_fetch_writes_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/networks/N_1/ssids/4");
            then.status(429).body(r#"{"errors": ["Too many requests"]}"#);
        });
        let dir = tempdir().unwrap();
        let backup_dir = dir.path().join("backup");

        let client = ApiClient::new(&server.base_url(), "k").unwrap();
        assert!(Backup::create(&client, &backup_dir, &guest_ref(), taken_at()).is_err());
        assert!(!backup_dir.join(LATEST_JSON).exists());
    }
}
