use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Positive integer identifier for a project.
///
/// Ids are allocated monotonically (max existing id + 1) by the document
/// store; zero is never a valid project id.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Wrap a raw id value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The next id in allocation order.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl FromStr for ProjectId {
    type Err = TypeError;

    /// Parse a decimal project id. Only plain digit strings are accepted
    /// (no sign, no whitespace) — ids arrive as untrusted path segments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidProjectId(s.to_string()));
        }
        let value: u64 = s
            .parse()
            .map_err(|_| TypeError::InvalidProjectId(s.to_string()))?;
        if value == 0 {
            return Err(TypeError::InvalidProjectId(s.to_string()));
        }
        Ok(Self(value))
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content identifier for a binary asset: `{hash}.{ext}`.
///
/// The hash part is lowercase hex; the extension is a short alphanumeric
/// suffix (`png`, `svg`, `wav`, ...). The string form doubles as the asset's
/// container entry name and its serving filename, so parsing is strict:
/// nothing that could traverse a path survives validation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId {
    hash: String,
    ext: String,
}

impl AssetId {
    /// Build from already-validated parts.
    pub fn from_parts(hash: &str, ext: &str) -> Result<Self, TypeError> {
        format!("{hash}.{ext}").parse()
    }

    /// The hex hash part (without extension).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The file extension (without the dot).
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// The container entry / serving filename, e.g.
    /// `83a9787d4cb6f3b7632b4ddfebf74367.wav`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.hash, self.ext)
    }
}

impl FromStr for AssetId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidAssetId {
            id: s.to_string(),
            reason: reason.to_string(),
        };

        let (hash, ext) = s.rsplit_once('.').ok_or_else(|| invalid("missing extension"))?;
        if hash.is_empty() {
            return Err(invalid("empty hash"));
        }
        if !hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid("hash must be lowercase hex"));
        }
        if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(invalid("extension must be alphanumeric"));
        }
        Ok(Self {
            hash: hash.to_string(),
            ext: ext.to_string(),
        })
    }
}

impl TryFrom<String> for AssetId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.file_name()
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}.{})", self.hash, self.ext)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.hash, self.ext)
    }
}

/// Opaque bearer token identifying a project capability:
/// `{unix-millis}_{random-hex}`.
///
/// Not a cryptographic secret — a capability-like identifier handed to the
/// editor at creation time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectToken(String);

impl ProjectToken {
    /// Mint a fresh token for the given creation instant.
    pub fn mint(now: DateTime<Utc>) -> Self {
        let nonce: [u8; 16] = rand::random();
        Self(format!("{}_{}", now.timestamp_millis(), hex::encode(nonce)))
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are bearer-ish; keep them out of debug logs.
        write!(f, "ProjectToken(..)")
    }
}

impl fmt::Display for ProjectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
