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

//! Walks organization -> networks -> access points -> SSIDs.

use crate::client::ApiClient;
use crate::error::RotateError;
use crate::model::{Device, Network, Organization, Ssid, mask};
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

pub fn list_organizations(client: &ApiClient) -> Result<Vec<Organization>> {
    client.get_json("organizations")
}

/// Picks the organization to work in: the one whose id or name equals
/// `selector`, or the first one the key can see.
pub fn resolve_organization(client: &ApiClient, selector: Option<&str>) -> Result<Organization> {
    let orgs = list_organizations(client)?;
    info!("Obtained list of {} organization(s)", orgs.len());
    let org = select_organization(orgs, selector)?;
    info!("Found '{}' with ID '{}'.", org.name, org.id);
    Ok(org)
}

fn select_organization(
    orgs: Vec<Organization>,
    selector: Option<&str>,
) -> Result<Organization, RotateError> {
    match selector {
        None => orgs.into_iter().next().ok_or(RotateError::NoOrganizations),
        Some(_) if orgs.is_empty() => Err(RotateError::NoOrganizations),
        Some(sel) => orgs
            .into_iter()
            .find(|o| o.id == sel || o.name == sel)
            .ok_or_else(|| RotateError::OrganizationNotFound(sel.to_string())),
    }
}

#[derive(Debug, Default, Clone)]
pub struct NetworkIndex {
    networks: Vec<Network>,
    by_name: HashMap<String, String>,
}

impl NetworkIndex {
    pub fn new(networks: Vec<Network>) -> Self {
        let mut by_name = HashMap::new();
        for net in &networks {
            if let Some(previous) = by_name.insert(net.name.clone(), net.id.clone()) {
                warn!(
                    "network name '{}' is used by {} and {}; name lookups resolve to {}",
                    net.name, previous, net.id, net.id
                );
            }
        }
        Self { networks, by_name }
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Network ids in the order the dashboard listed them.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.networks.iter().map(|n| n.id.as_str())
    }

    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.networks
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.name.as_str())
            .unwrap_or(id)
    }
}

pub fn list_networks(client: &ApiClient, org: &Organization) -> Result<NetworkIndex> {
    info!("Looking for network names and IDs...");
    let networks: Vec<Network> = client.get_json(&format!("organizations/{}/networks", org.id))?;
    for net in &networks {
        info!("Found network '{}' with net id '{}'.", net.name, net.id);
    }
    if networks.is_empty() {
        return Err(RotateError::NoNetworks(org.name.clone()).into());
    }
    info!("Network ID search complete.");
    Ok(NetworkIndex::new(networks))
}

/// Ids of the networks holding at least one access point, first occurrence
/// first. A network whose devices can't be listed is skipped.
pub fn wireless_networks(client: &ApiClient, index: &NetworkIndex) -> Result<Vec<String>> {
    info!("Looking for networks with WAPs.");
    let mut seen = HashSet::new();
    let mut wireless = Vec::new();

    for net_id in index.ids() {
        let devices: Vec<Device> = match client.get_json(&format!("networks/{net_id}/devices")) {
            Ok(devices) => devices,
            Err(err) => {
                warn!("skipping network {net_id}: {err:#}");
                continue;
            }
        };
        for ap in devices.iter().filter(|d| d.is_access_point()) {
            let ap_net = ap.network_id.as_deref().unwrap_or(net_id);
            if seen.insert(ap_net.to_string()) {
                info!("'{}' in network {} has WAPs.", index.name_of(ap_net), ap_net);
                wireless.push(ap_net.to_string());
            }
        }
    }

    info!("Found {} network(s) with MR devices.", wireless.len());
    if wireless.is_empty() {
        return Err(RotateError::NoWirelessNetworks.into());
    }
    Ok(wireless)
}

/// One eligible SSID as it exists in one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsidRef {
    pub network_id: String,
    pub network_name: String,
    pub number: u32,
    pub name: String,
    pub encryption_mode: Option<String>,
}

/// Eligible SSIDs by name. A name configured in several networks keeps one
/// entry per network.
#[derive(Debug, Default, Clone)]
pub struct SsidIndex {
    entries: BTreeMap<String, Vec<SsidRef>>,
}

impl SsidIndex {
    pub fn insert(&mut self, ssid: SsidRef) {
        self.entries.entry(ssid.name.clone()).or_default().push(ssid);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SsidRef> {
        self.entries.values().flatten()
    }

    /// Resolves the target SSID. `network` narrows the match by network id
    /// or name and is required when the name exists in several networks.
    pub fn select(&self, name: &str, network: Option<&str>) -> Result<&SsidRef, RotateError> {
        let candidates = self
            .entries
            .get(name)
            .ok_or_else(|| RotateError::SsidNotEligible(name.to_string()))?;

        let matching: Vec<&SsidRef> = match network {
            Some(net) => candidates
                .iter()
                .filter(|s| s.network_id == net || s.network_name == net)
                .collect(),
            None => candidates.iter().collect(),
        };

        match matching.as_slice() {
            [] => Err(RotateError::NetworkNotFound(
                network.unwrap_or_default().to_string(),
            )),
            [single] => Ok(*single),
            many => Err(RotateError::AmbiguousSsid {
                name: name.to_string(),
                networks: many
                    .iter()
                    .map(|s| format!("{} ({})", s.network_name, s.network_id))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

pub fn collect_ssids(
    client: &ApiClient,
    index: &NetworkIndex,
    wireless: &[String],
) -> Result<SsidIndex> {
    info!("Looking for SSIDs.");
    let mut found = SsidIndex::default();

    for net_id in wireless {
        let ssids: Vec<Ssid> = match client.get_json(&format!("networks/{net_id}/ssids")) {
            Ok(ssids) => ssids,
            Err(err) => {
                warn!("skipping SSIDs of network {net_id}: {err:#}");
                continue;
            }
        };
        info!("Checking {net_id} for SSIDs.");

        for ssid in ssids {
            let encryption = ssid.encryption_mode.as_deref().unwrap_or("no");
            if !ssid.is_eligible() {
                if ssid.enabled {
                    warn!(
                        "Found active SSID({}) '{}' with encryption mode '{}' but no password. Can't change this SSID, skipping!",
                        ssid.number, ssid.name, encryption
                    );
                } else {
                    debug!("SSID({}) '{}' is disabled", ssid.number, ssid.name);
                }
                continue;
            }
            info!(
                "Found active SSID({}) '{}' encryption mode: '{}' password: '{}'",
                ssid.number,
                ssid.name,
                encryption,
                mask(ssid.psk.as_deref())
            );
            found.insert(SsidRef {
                network_id: net_id.clone(),
                network_name: index.name_of(net_id).to_string(),
                number: ssid.number,
                name: ssid.name,
                encryption_mode: ssid.encryption_mode,
            });
        }
    }

    Ok(found)
}

/// Everything discovery learned, in pipeline order.
#[derive(Debug)]
pub struct Discovery {
    pub organization: Organization,
    pub networks: NetworkIndex,
    pub wireless: Vec<String>,
    pub ssids: SsidIndex,
}

pub fn discover(client: &ApiClient, org_selector: Option<&str>) -> Result<Discovery> {
    let organization = resolve_organization(client, org_selector)?;
    let networks = list_networks(client, &organization)?;
    let wireless = wireless_networks(client, &networks)?;
    let ssids = collect_ssids(client, &networks, &wireless)?;
    Ok(Discovery {
        organization,
        networks,
        wireless,
        ssids,
    })
}
