use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

/// Store identifier split into its directory part and leaf name.
///
/// `path` is either empty or ends with `/`, so `path + name` is always the
/// identifier the store understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretKey {
    pub path: String,
    pub name: String,
}

impl SecretKey {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn from_identifier(id: &str) -> Self {
        match id.rfind('/') {
            Some(idx) => Self::new(&id[..=idx], &id[idx + 1..]),
            None => Self::new("", id),
        }
    }

    pub fn identifier(&self) -> String {
        format!("{}{}", self.path, self.name)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|part| !part.is_empty())
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: u32,
    pub created_at: OffsetDateTime,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMetadata {
    pub current_version: u32,
    pub versions: BTreeMap<u32, VersionInfo>,
}

impl SecretMetadata {
    pub fn get(&self, version: u32) -> Option<&VersionInfo> {
        self.versions.get(&version)
    }

    pub fn is_live(&self, version: u32) -> bool {
        self.get(version).is_some_and(|info| !info.destroyed)
    }

    /// Version a freshly listed secret starts on: the current one when it is
    /// still readable, otherwise the closest live version below it.
    pub fn initial_version(&self) -> u32 {
        if self.is_live(self.current_version) {
            return self.current_version;
        }
        self.versions
            .range(..self.current_version)
            .rev()
            .find(|(_, info)| !info.destroyed)
            .map(|(version, _)| *version)
            .unwrap_or(self.current_version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("malformed secret reference: {0:?} (expected <name>:<version>)")]
    Malformed(String),
    #[error("invalid secret version in {0:?}: must be a positive integer")]
    InvalidVersion(String),
}

/// `<secret-name>:<version>` as accepted on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub version: u32,
}

impl FromStr for SecretRef {
    type Err = ReferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((name, digits)) = value.rsplit_once(':') else {
            return Err(ReferenceError::Malformed(value.to_string()));
        };
        if name.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReferenceError::Malformed(value.to_string()));
        }

        let version = digits
            .parse::<u32>()
            .map_err(|_| ReferenceError::InvalidVersion(value.to_string()))?;
        if version == 0 {
            return Err(ReferenceError::InvalidVersion(value.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}
