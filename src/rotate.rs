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

//! The backup-then-update flow behind `merakictl rotate`.

use crate::backup::Backup;
use crate::client::{ApiClient, ResponseData};
use crate::discovery::{Discovery, SsidRef, discover};
use crate::model::PskUpdate;
use crate::prompt::Prompter;
use anyhow::Result;
use chrono::Local;
use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RotateOptions {
    pub org: Option<String>,
    pub ssid: String,
    pub network: Option<String>,
    pub backup_dir: PathBuf,
    pub min_psk_len: usize,
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum Outcome {
    Updated(ResponseData),
    Declined,
    DryRun,
}

/// Finds the SSID to work on, by name and optionally by network id or name.
pub fn select_target(discovery: &Discovery, ssid: &str, network: Option<&str>) -> Result<SsidRef> {
    info!("Is there a '{ssid}' network that can be changed?");
    let target = discovery.ssids.select(ssid, network)?;
    info!(
        "Yes! SSID({}) '{}' in '{}' ({}).",
        target.number, target.name, target.network_name, target.network_id
    );
    Ok(target.clone())
}

pub fn backup_target(client: &ApiClient, opts: &RotateOptions) -> Result<Backup> {
    let discovery = discover(client, opts.org.as_deref())?;
    let target = select_target(&discovery, &opts.ssid, opts.network.as_deref())?;
    Backup::create(client, &opts.backup_dir, &target, Local::now())
}

pub fn update_path(backup: &Backup) -> String {
    format!("networks/{}/ssids/{}", backup.network_id, backup.number)
}

/// Sends the new PSK. Taking a [`Backup`] ties every update to a snapshot
/// of the state it replaces.
pub fn update_psk(client: &ApiClient, backup: &Backup, psk: &str) -> Result<ResponseData> {
    let path = update_path(backup);
    info!("Updating PSK of '{}' at {}", backup.network_name, path);
    debug!("payload: {}", serde_json::to_string(&PskUpdate { psk })?);
    client.put_json(&path, &PskUpdate { psk })
}

pub fn rotate<R: BufRead, W: Write>(
    client: &ApiClient,
    opts: &RotateOptions,
    prompter: &mut Prompter<R, W>,
) -> Result<Outcome> {
    let backup = backup_target(client, opts)?;
    prompter.say(&format!(
        "Backed up '{}' to {} and {}",
        opts.ssid,
        backup.snapshot.display(),
        backup.csv.display()
    ))?;

    if opts.dry_run {
        prompter.say(&format!(
            "Dry run: would PUT {} with body {{\"psk\": \"<new password>\"}}",
            client.url(&update_path(&backup))?
        ))?;
        return Ok(Outcome::DryRun);
    }

    let psk = prompter.new_psk(opts.min_psk_len)?;
    if !prompter.confirm(&format!("Is '{psk}' the correct password? (Y/N) "))? {
        prompter.say("Okay. Nothing was changed.")?;
        return Ok(Outcome::Declined);
    }
    prompter.say("Let's go!")?;

    let response = update_psk(client, &backup, &psk)?;
    prompter.say(&response.body)?;
    Ok(Outcome::Updated(response))
}
