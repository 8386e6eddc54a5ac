use crate::domain::{SecretKey, SecretMetadata, VersionInfo};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secret not found: {0}")]
    NotFound(String),
    #[error("unauthorized (check the Vault token)")]
    Unauthorized,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only view of a versioned key/value secret engine.
pub trait SecretStore {
    fn list_secrets(&self) -> StoreResult<Vec<SecretKey>>;
    fn metadata(&self, key: &SecretKey) -> StoreResult<SecretMetadata>;
    fn content(&self, id: &str, version: u32) -> StoreResult<String>;
}

/// KV v2 client speaking the Vault HTTP API.
pub struct VaultClient {
    base_url: String,
    token: String,
    mount_path: String,
    client: reqwest::blocking::Client,
}

impl VaultClient {
    pub fn new(url: &str, token: &str, mount_path: &str) -> StoreResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("vault-diff")
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            mount_path: mount_path.trim_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, section: &str, rest: &str) -> String {
        format!(
            "{}/v1/{}/{}/{}",
            self.base_url, self.mount_path, section, rest
        )
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> StoreResult<T> {
        debug!(url, "vault request");
        let resp = self
            .client
            .get(url)
            .header("X-Vault-Token", &self.token)
            .query(query)
            .send()
            .map_err(|err| StoreError::Transport(format!("{subject}: {err}")))?;

        match resp.status() {
            reqwest::StatusCode::NOT_FOUND => return Err(StoreError::NotFound(subject.to_string())),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(StoreError::Unauthorized);
            }
            status if !status.is_success() => {
                return Err(StoreError::Transport(format!("{subject}: HTTP {status}")));
            }
            _ => {}
        }

        resp.json::<T>()
            .map_err(|err| StoreError::Decode(format!("{subject}: {err}")))
    }

    fn list_dir(&self, path: &str, out: &mut Vec<SecretKey>) -> StoreResult<()> {
        let body: ListResponse =
            self.get_json(&self.url("metadata", path), &[("list", "true".to_string())], path)?;
        for entry in body.data.keys {
            if entry.ends_with('/') {
                self.list_dir(&format!("{path}{entry}"), out)?;
            } else {
                out.push(SecretKey::new(path, entry));
            }
        }
        Ok(())
    }
}

impl SecretStore for VaultClient {
    fn list_secrets(&self) -> StoreResult<Vec<SecretKey>> {
        let mut keys = Vec::new();
        self.list_dir("", &mut keys)?;
        Ok(keys)
    }

    fn metadata(&self, key: &SecretKey) -> StoreResult<SecretMetadata> {
        let id = key.identifier();
        let body: MetadataResponse = self.get_json(&self.url("metadata", &id), &[], &id)?;
        convert_metadata(body.data)
    }

    fn content(&self, id: &str, version: u32) -> StoreResult<String> {
        let body: DataResponse = self.get_json(
            &self.url("data", id),
            &[("version", version.to_string())],
            id,
        )?;
        render_content(body.data.data)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    data: RawMetadata,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    current_version: u32,
    #[serde(default)]
    versions: HashMap<String, RawVersion>,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    created_time: String,
    #[serde(default)]
    destroyed: bool,
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    data: DataEnvelope,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

fn convert_metadata(raw: RawMetadata) -> StoreResult<SecretMetadata> {
    let mut versions = BTreeMap::new();
    for (number, info) in raw.versions {
        let version = number
            .parse::<u32>()
            .map_err(|_| StoreError::Decode(format!("version key {number:?}")))?;
        let created_at = OffsetDateTime::parse(&info.created_time, &Rfc3339).map_err(|err| {
            StoreError::Decode(format!("created_time {:?}: {err}", info.created_time))
        })?;
        versions.insert(
            version,
            VersionInfo {
                version,
                created_at,
                destroyed: info.destroyed,
            },
        );
    }

    Ok(SecretMetadata {
        current_version: raw.current_version,
        versions,
    })
}

fn render_content(data: Option<Value>) -> StoreResult<String> {
    match data {
        None | Some(Value::Null) => Ok(String::new()),
        Some(value) => serde_json::to_string_pretty(&value)
            .map_err(|err| StoreError::Decode(err.to_string())),
    }
}
