use std::fmt;

use sbk_store::StoreError;
use sbk_types::ProjectId;

/// The stages of a fork, for failure reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForkStage {
    LoadSource,
    AllocateId,
    RenameAssets,
    BuildMetadata,
    AssembleArchive,
    Commit,
}

impl fmt::Display for ForkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadSource => "load-source",
            Self::AllocateId => "allocate-id",
            Self::RenameAssets => "rename-assets",
            Self::BuildMetadata => "build-metadata",
            Self::AssembleArchive => "assemble-archive",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Errors from fork operations.
///
/// Every failure before the commit leaves no trace of the new project. The
/// one partial outcome possible — the new container committed but the
/// source's remix counter not incremented — gets its own variant naming the
/// project that does exist.
#[derive(Debug, thiserror::Error)]
pub enum ForkError {
    /// The project to fork does not exist.
    #[error("source project {0} not found")]
    SourceNotFound(ProjectId),

    /// A fork stage failed; nothing was committed.
    #[error("fork of project {source_id} failed at {stage}: {source}")]
    Stage {
        source_id: ProjectId,
        stage: ForkStage,
        #[source]
        source: StoreError,
    },

    /// The new project was committed, but the follow-up write to the
    /// source's remix counter failed.
    #[error(
        "fork committed as project {new_id}, but incrementing project \
         {source_id}'s remix counter failed: {source}"
    )]
    ParentUpdate {
        source_id: ProjectId,
        new_id: ProjectId,
        #[source]
        source: StoreError,
    },
}

/// Result alias for fork operations.
pub type ForkResult<T> = Result<T, ForkError>;
