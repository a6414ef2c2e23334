use std::fmt;

use sbk_archive::{COMMENTS_ENTRY, METADATA_ENTRY, PROGRAM_ENTRY};
use sbk_types::{CommentForest, Program, ProjectMetadata};

use crate::error::{StoreError, StoreResult};

/// The three logical documents a container holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `data.json` — platform metadata. Mandatory.
    Metadata,
    /// `project.json` — the program graph. Mandatory.
    Program,
    /// `comments.json` — the comment forest. Optional; absent means empty.
    Comments,
}

impl DocumentKind {
    /// The fixed container entry name for this document.
    pub fn entry_name(&self) -> &'static str {
        match self {
            Self::Metadata => METADATA_ENTRY,
            Self::Program => PROGRAM_ENTRY,
            Self::Comments => COMMENTS_ENTRY,
        }
    }

    /// Mandatory documents turn "entry absent" into a corruption-class
    /// error; optional ones fall back to a typed default.
    pub fn is_mandatory(&self) -> bool {
        !matches!(self, Self::Comments)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_name())
    }
}

/// A parsed logical document.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Metadata(ProjectMetadata),
    Program(Program),
    Comments(CommentForest),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Metadata(_) => DocumentKind::Metadata,
            Self::Program(_) => DocumentKind::Program,
            Self::Comments(_) => DocumentKind::Comments,
        }
    }

    pub fn entry_name(&self) -> &'static str {
        self.kind().entry_name()
    }

    /// Encode to the container's on-disk JSON form.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        let result = match self {
            Self::Metadata(meta) => serde_json::to_vec_pretty(meta),
            Self::Program(program) => program.to_bytes(),
            Self::Comments(forest) => serde_json::to_vec_pretty(forest),
        };
        result.map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
