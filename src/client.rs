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

use anyhow::{Context, Result, anyhow};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl ResponseData {
    /// Decodes the body into `T`, failing when the response was not JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let json = self
            .json
            .clone()
            .ok_or_else(|| anyhow!("expected a JSON response, got `{}`", self.body))?;
        serde_json::from_value(json).context("decoding response body")
    }
}

/// Authenticated handle on the Dashboard API.
///
/// Built once per run and passed by reference to every step that talks to
/// the dashboard.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let parsed = Url::parse(&normalized).context("parsing base URL")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static("merakictl/0.1"))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            api_key: api_key.to_string(),
        })
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        let normalized = path.trim_start_matches('/');
        self.base_url
            .join(normalized)
            .with_context(|| format!("joining path `{}` to base URL", path))
    }

    pub fn get(&self, path: &str) -> Result<ResponseData> {
        self.request(Method::GET, path, Option::<&Value>::None)
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path)?
            .decode()
            .with_context(|| format!("GET {path}"))
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseData> {
        self.request(Method::PUT, path, Some(body))
    }

    fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<ResponseData> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static("merakictl/0.1"));

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(body);
        }

        let response = request
            .send()
            .with_context(|| format!("sending {method} {path}"))?;

        let status = response.status();
        let text = response.text().context("reading response body")?;
        if !status.is_success() {
            return Err(anyhow!(
                "{} {} failed with HTTP {}: {}",
                method,
                path,
                status.as_u16(),
                text.trim()
            ));
        }
        let json = serde_json::from_str(&text).ok();

        Ok(ResponseData {
            status: status.as_u16(),
            body: text,
            json,
        })
    }
}
