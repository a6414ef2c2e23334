use std::sync::Arc;

use sbk_assets::{AssetRegistry, AssetStore};
use sbk_fork::{ForkEngine, ForkOutcome};
use sbk_moderation::{Clock, ModerationConfig, ModerationGate, SystemClock, Verdict};
use sbk_store::{
    ContainerStore, Document, DocumentKind, DocumentStore, InMemoryContainerStore, StoreError,
};
use sbk_types::{
    validate_username, AssetId, CommentNode, MetadataPatch, Notifier, NullNotifier, Program,
    ProjectId, ProjectMetadata, Stats, StatKind, Visibility,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::actions::ActionTracker;
use crate::error::{ServiceError, ServiceResult};

/// Who is asking. Usernames are unauthenticated strings; `Admin` is the
/// explicit operator override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requester<'a> {
    Anonymous,
    User(&'a str),
    Admin,
}

impl Requester<'_> {
    /// Whether this requester may see/modify things restricted to `author`.
    fn is_author_or_admin(&self, author: &str) -> bool {
        match self {
            Self::Admin => true,
            Self::User(name) => *name == author,
            Self::Anonymous => false,
        }
    }
}

/// Service construction knobs.
#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    pub moderation: ModerationConfig,
}

/// A row in an author's project listing.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub image: String,
    pub author: String,
}

/// The project API the (out-of-scope) route layer binds to.
///
/// Owns all per-process state — the moderation gate's strike table and the
/// one-time-action tracker — so nothing lives in module globals and tests
/// get a fresh world per instance.
pub struct ProjectService {
    store: Arc<DocumentStore>,
    assets: AssetRegistry,
    gate: ModerationGate,
    fork_engine: ForkEngine,
    actions: ActionTracker,
    clock: Arc<dyn Clock>,
}

impl ProjectService {
    /// Assemble a service over the given backends, on the wall clock.
    pub fn new(
        containers: Arc<dyn ContainerStore>,
        assets: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> ServiceResult<Self> {
        Self::with_clock(containers, assets, notifier, config, Arc::new(SystemClock))
    }

    /// Assemble with an injected time source (tests drive the view window
    /// and suspension expiry through this).
    pub fn with_clock(
        containers: Arc<dyn ContainerStore>,
        assets: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> ServiceResult<Self> {
        let store = Arc::new(DocumentStore::new(containers));
        Ok(Self {
            assets: AssetRegistry::new(assets),
            gate: ModerationGate::with_clock(config.moderation, Arc::clone(&clock))?,
            fork_engine: ForkEngine::new(Arc::clone(&store), notifier),
            actions: ActionTracker::new(Arc::clone(&clock)),
            clock,
            store,
        })
    }

    /// Fully in-memory service with default config; for tests and embedding.
    pub fn in_memory() -> ServiceResult<Self> {
        Self::new(
            Arc::new(InMemoryContainerStore::new()),
            Arc::new(sbk_assets::InMemoryAssetStore::new()),
            Arc::new(NullNotifier),
            ServiceConfig::default(),
        )
    }

    // -- Projects ----------------------------------------------------------

    /// Create an empty project owned by `username`.
    pub fn create_project(&self, username: &str) -> ServiceResult<(ProjectId, ProjectMetadata)> {
        validate_username(username)?;
        let now = self.clock.now();
        let (handle, metadata) = self.store.create_with(|id| {
            (
                ProjectMetadata::fresh(id, username, now),
                Program::starter(),
            )
        })?;
        info!(id = %handle.id(), author = username, "project created");
        Ok((handle.id(), metadata))
    }

    /// Read one logical document, enforcing the visibility rule: `unshared`
    /// metadata and comment threads are only readable by the author or an
    /// admin. The program document stays readable (the player needs it to
    /// run shared links).
    pub fn read_document(
        &self,
        id: ProjectId,
        kind: DocumentKind,
        requester: Requester<'_>,
    ) -> ServiceResult<Document> {
        let meta = self.store.read_metadata(id)?;
        let restricted = matches!(kind, DocumentKind::Metadata | DocumentKind::Comments);
        if restricted
            && !meta.visibility.is_visible()
            && !requester.is_author_or_admin(&meta.author.username)
        {
            return Err(ServiceError::Forbidden);
        }
        if kind == DocumentKind::Metadata {
            return Ok(Document::Metadata(meta));
        }
        Ok(self.store.read_document(id, kind)?)
    }

    /// Apply whitelisted metadata patches and return the updated document.
    pub fn write_metadata_patch(
        &self,
        id: ProjectId,
        patches: &[MetadataPatch],
    ) -> ServiceResult<ProjectMetadata> {
        for patch in patches {
            if let MetadataPatch::AuthorUsername(name) = patch {
                validate_username(name)?;
            }
        }
        let updated = self.store.mutate_metadata(id, |meta| {
            for patch in patches {
                patch.apply(meta);
            }
            meta.clone()
        })?;
        Ok(updated)
    }

    /// Parse a `{dotted-path: value}` patch map (the wire form) against the
    /// whitelist and apply it.
    pub fn write_metadata_patch_json(
        &self,
        id: ProjectId,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> ServiceResult<ProjectMetadata> {
        let patches = patch
            .iter()
            .map(|(path, value)| MetadataPatch::from_path(path, value))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_metadata_patch(id, &patches)
    }

    pub fn set_visibility(
        &self,
        id: ProjectId,
        visibility: Visibility,
    ) -> ServiceResult<ProjectMetadata> {
        Ok(self.store.mutate_metadata(id, |meta| {
            meta.set_visibility(visibility);
            meta.clone()
        })?)
    }

    /// Delete a project; author or admin only. An admin may also delete a
    /// project whose metadata is too damaged to read.
    pub fn delete_project(&self, id: ProjectId, requester: Requester<'_>) -> ServiceResult<()> {
        match self.store.read_metadata(id) {
            Ok(meta) => {
                if !requester.is_author_or_admin(&meta.author.username) {
                    return Err(ServiceError::Forbidden);
                }
            }
            Err(
                e @ (StoreError::Corrupt { .. }
                | StoreError::MissingDocument { .. }
                | StoreError::Parse { .. }),
            ) => {
                if requester != Requester::Admin {
                    return Err(e.into());
                }
                warn!(%id, "admin deleting unreadable project");
            }
            Err(e) => return Err(e.into()),
        }
        self.store.delete(id)?;
        info!(%id, "project deleted");
        Ok(())
    }

    /// Projects authored by `username`, skipping unreadable containers.
    pub fn project_summaries_by_author(
        &self,
        username: &str,
    ) -> ServiceResult<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();
        for id in self.store.project_ids()? {
            match self.store.read_metadata(id) {
                Ok(meta) if meta.author.username == username => summaries.push(ProjectSummary {
                    id,
                    title: meta.title,
                    image: meta.image,
                    author: meta.author.username,
                }),
                Ok(_) => {}
                Err(e) => warn!(%id, error = %e, "skipping unreadable project"),
            }
        }
        Ok(summaries)
    }

    // -- Comments ----------------------------------------------------------

    /// Append a top-level comment. The moderation gate runs before anything
    /// is written; a blocked verdict prevents the write entirely.
    pub fn append_comment(
        &self,
        id: ProjectId,
        username: &str,
        text: &str,
    ) -> ServiceResult<CommentNode> {
        let node = self.gated_comment(id, username, text)?;
        let stored = node.clone();
        self.store
            .mutate_comments(id, |forest| forest.push_root(node))?;
        Ok(stored)
    }

    /// Append a reply under `parent`, anywhere in the thread.
    pub fn append_reply(
        &self,
        id: ProjectId,
        parent: Uuid,
        username: &str,
        text: &str,
    ) -> ServiceResult<CommentNode> {
        let node = self.gated_comment(id, username, text)?;
        let stored = node.clone();
        let attached = self
            .store
            .mutate_comments(id, |forest| forest.append_reply(&parent, node))?;
        if !attached {
            return Err(ServiceError::CommentNotFound(parent));
        }
        Ok(stored)
    }

    /// Shared write-side checks: project exists, comments are open, the
    /// author name is valid, and the gate allows the text.
    fn gated_comment(
        &self,
        id: ProjectId,
        username: &str,
        text: &str,
    ) -> ServiceResult<CommentNode> {
        let meta = self.store.read_metadata(id)?;
        if !meta.comments_allowed {
            return Err(ServiceError::CommentsClosed(id));
        }
        validate_username(username)?;
        match self.gate.enforce(username, text) {
            Verdict::Blocked {
                reason,
                retry_after,
            } => Err(ServiceError::blocked(reason, retry_after)),
            Verdict::Allowed => Ok(CommentNode::new(username, text, self.clock.now())),
        }
    }

    // -- Stats -------------------------------------------------------------

    /// One love/favorite per (project, user) ever; one view per rolling 24
    /// hours. Repeats are a [`ServiceError::Conflict`], not a silent no-op.
    pub fn increment_stat(
        &self,
        id: ProjectId,
        kind: StatKind,
        username: &str,
    ) -> ServiceResult<Stats> {
        validate_username(username)?;
        self.store.open(id)?;
        if !self.actions.try_claim(id, kind, username) {
            let message = match kind {
                StatKind::View => format!("view already counted today for project {id}"),
                kind => format!("already recorded {kind} for project {id}"),
            };
            return Err(ServiceError::Conflict(message));
        }
        match self.store.mutate_metadata(id, |meta| {
            meta.stats.increment(kind);
            meta.stats
        }) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                // The write never landed; give the action back.
                self.actions.release(id, kind, username);
                Err(e.into())
            }
        }
    }

    // -- Fork --------------------------------------------------------------

    /// Fork a project on behalf of `username`. The source author is
    /// notified best-effort by the engine.
    pub fn fork(&self, id: ProjectId, username: &str) -> ServiceResult<ForkOutcome> {
        validate_username(username)?;
        Ok(self.fork_engine.fork(id, username)?)
    }

    // -- Assets ------------------------------------------------------------

    /// Fetch an asset's bytes for serving.
    pub fn fetch_asset(&self, id: &AssetId) -> ServiceResult<Vec<u8>> {
        Ok(self.assets.fetch(id)?)
    }

    /// Store an asset (save flows extract uploaded assets through this).
    pub fn put_asset(&self, id: &AssetId, bytes: &[u8]) -> ServiceResult<()> {
        Ok(self.assets.put(id, bytes)?)
    }
}
