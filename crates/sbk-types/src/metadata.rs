//! The `data.json` metadata document.
//!
//! Field names mirror the on-disk JSON exactly — existing containers must
//! keep parsing after a round-trip through this type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{ProjectId, ProjectToken};

/// Whether a project is listed publicly or restricted to its author.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Unshared,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible)
    }
}

impl FromStr for Visibility {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(Self::Visible),
            "unshared" => Ok(Self::Unshared),
            other => Err(TypeError::InvalidVisibility(other.to_string())),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Unshared => write!(f, "unshared"),
        }
    }
}

/// Engagement counters. Never negative; only ever reset wholesale on fork.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub views: u64,
    pub loves: u64,
    pub favorites: u64,
    pub remixes: u64,
}

/// The user-incrementable counters (remixes is driven by the fork engine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatKind {
    View,
    Love,
    Favorite,
}

impl Stats {
    /// All counters zeroed (fresh project, or fork reset).
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, kind: StatKind) {
        match kind {
            StatKind::View => self.views += 1,
            StatKind::Love => self.loves += 1,
            StatKind::Favorite => self.favorites += 1,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "views"),
            Self::Love => write!(f, "loves"),
            Self::Favorite => write!(f, "favorites"),
        }
    }
}

/// Remix lineage: the direct parent and the root of the remix tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemixLineage {
    pub parent: Option<ProjectId>,
    pub root: Option<ProjectId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorHistory {
    pub joined: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub id: Option<u64>,
    pub images: BTreeMap<String, String>,
}

/// The author block embedded in metadata.
///
/// There is no authentication layer; the username is an unauthenticated
/// string and the numeric id is a random tag, not a foreign key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub username: String,
    pub scratchteam: bool,
    pub history: AuthorHistory,
    pub profile: AuthorProfile,
}

impl Author {
    /// Build a fresh author block for `username` with a random numeric id.
    pub fn generated(username: &str) -> Self {
        Self {
            id: rand::random::<u64>() % 1_000_000_000,
            username: username.to_string(),
            scratchteam: false,
            history: AuthorHistory {
                joined: DateTime::UNIX_EPOCH,
            },
            profile: AuthorProfile::default(),
        }
    }
}

/// Creation / modification / shared timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub shared: DateTime<Utc>,
}

impl History {
    pub fn all_at(now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            modified: now,
            shared: now,
        }
    }
}

/// The full `data.json` document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub visibility: Visibility,
    pub public: bool,
    pub comments_allowed: bool,
    pub is_published: bool,
    pub author: Author,
    /// Cover-art reference: absolute URL or an internal asset path.
    pub image: String,
    pub images: BTreeMap<String, String>,
    pub history: History,
    pub stats: Stats,
    pub remix: RemixLineage,
    pub project_token: ProjectToken,
}

impl ProjectMetadata {
    /// Fresh metadata for a newly created (empty) project.
    pub fn fresh(id: ProjectId, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: "Untitled".to_string(),
            description: String::new(),
            instructions: String::new(),
            visibility: Visibility::Visible,
            public: true,
            comments_allowed: true,
            is_published: true,
            author: Author::generated(username),
            image: format!("local_assets/{id}_480x360.png"),
            images: BTreeMap::new(),
            history: History::all_at(now),
            stats: Stats::zeroed(),
            remix: RemixLineage::default(),
            project_token: ProjectToken::mint(now),
        }
    }

    /// Set visibility and keep the derived `public` flag in sync.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
        self.public = visibility.is_visible();
    }
}

/// One whitelisted metadata update.
///
/// Replaces the source platform's arbitrary dotted-path assignment: only the
/// fields listed here can be patched, so a patch can never conjure nested
/// shapes the rest of the system does not expect.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataPatch {
    Title(String),
    Description(String),
    Instructions(String),
    Visibility(Visibility),
    CommentsAllowed(bool),
    Image(String),
    AuthorUsername(String),
}

impl MetadataPatch {
    /// Parse a `(dotted-path, value)` pair against the patch whitelist.
    pub fn from_path(path: &str, value: &serde_json::Value) -> Result<Self, TypeError> {
        let expect_str = |value: &serde_json::Value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or(TypeError::PatchValue {
                    path: path.to_string(),
                    expected: "string",
                })
        };

        match path {
            "title" => Ok(Self::Title(expect_str(value)?)),
            "description" => Ok(Self::Description(expect_str(value)?)),
            "instructions" => Ok(Self::Instructions(expect_str(value)?)),
            "image" => Ok(Self::Image(expect_str(value)?)),
            "author.username" => Ok(Self::AuthorUsername(expect_str(value)?)),
            "visibility" => Ok(Self::Visibility(expect_str(value)?.parse()?)),
            "comments_allowed" => {
                let flag = value.as_bool().ok_or(TypeError::PatchValue {
                    path: path.to_string(),
                    expected: "boolean",
                })?;
                Ok(Self::CommentsAllowed(flag))
            }
            other => Err(TypeError::PatchPathNotAllowed(other.to_string())),
        }
    }

    /// Apply this patch. Exactly the named field changes (plus the `public`
    /// mirror for visibility); nothing else is touched.
    pub fn apply(&self, meta: &mut ProjectMetadata) {
        match self {
            Self::Title(title) => meta.title = title.clone(),
            Self::Description(text) => meta.description = text.clone(),
            Self::Instructions(text) => meta.instructions = text.clone(),
            Self::Visibility(v) => meta.set_visibility(*v),
            Self::CommentsAllowed(flag) => meta.comments_allowed = *flag,
            Self::Image(image) => meta.image = image.clone(),
            Self::AuthorUsername(name) => meta.author.username = name.clone(),
        }
    }
}
