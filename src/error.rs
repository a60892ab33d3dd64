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

use std::path::PathBuf;
use thiserror::Error;

/// Terminal conditions of the rotation flow.
#[derive(Debug, Error)]
pub enum RotateError {
    #[error("no organizations are visible to this API key")]
    NoOrganizations,
    #[error("no organization matches `{0}`")]
    OrganizationNotFound(String),
    #[error("organization `{0}` has no networks")]
    NoNetworks(String),
    #[error("no network matches `{0}`")]
    NetworkNotFound(String),
    #[error("no network in the organization has a wireless access point")]
    NoWirelessNetworks,
    #[error("`{0}` is not an enabled SSID with a pre-shared key, so its PSK can't be changed")]
    SsidNotEligible(String),
    #[error("SSID `{name}` exists in several networks ({networks}); pick one with --network")]
    AmbiguousSsid { name: String, networks: String },
    #[error("backup {0:?} does not match the configuration fetched from the dashboard")]
    BackupMismatch(PathBuf),
    #[error("end of input while waiting for an answer")]
    InputClosed,
}
