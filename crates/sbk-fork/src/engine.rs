use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use sbk_archive::{Container, COMMENTS_ENTRY, METADATA_ENTRY, PROGRAM_ENTRY};
use sbk_assets::{mint_renamed, rewrite_references};
use sbk_store::{Document, DocumentStore, StoreError};
use sbk_types::{
    AssetId, Author, History, Notifier, Program, ProjectId, ProjectMetadata, ProjectToken,
    RemixLineage, Stats, Visibility,
};
use tracing::{info, warn};

use crate::error::{ForkError, ForkResult, ForkStage};

/// A committed fork.
#[derive(Clone, Debug)]
pub struct ForkOutcome {
    pub new_id: ProjectId,
    pub metadata: ProjectMetadata,
}

/// Builds an independent copy of a project: fresh identity, renamed assets,
/// rewritten references, zeroed counters, remix lineage back to the source.
///
/// Nothing is visible to readers until the single commit write; the only
/// partial outcome possible is a committed fork whose source counter update
/// failed, which is reported as [`ForkError::ParentUpdate`] rather than
/// rolled back — the new project is real at that point.
pub struct ForkEngine {
    store: Arc<DocumentStore>,
    notifier: Arc<dyn Notifier>,
}

impl ForkEngine {
    pub fn new(store: Arc<DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Fork `source_id` on behalf of `requesting_username`.
    pub fn fork(&self, source_id: ProjectId, requesting_username: &str) -> ForkResult<ForkOutcome> {
        let stage_err = |stage: ForkStage| {
            move |source: StoreError| match source {
                StoreError::NotFound(id) if id == source_id => ForkError::SourceNotFound(id),
                source => ForkError::Stage {
                    source_id,
                    stage,
                    source,
                },
            }
        };

        // Load one consistent snapshot of the source container and parse
        // both mandatory documents out of it.
        let container = self
            .store
            .load_container(source_id)
            .map_err(stage_err(ForkStage::LoadSource))?;
        let source_meta: ProjectMetadata =
            parse_entry(&container, source_id, METADATA_ENTRY).map_err(stage_err(ForkStage::LoadSource))?;
        let mut program = Program::from_slice(
            entry_bytes(&container, source_id, PROGRAM_ENTRY)
                .map_err(stage_err(ForkStage::LoadSource))?,
        )
        .map_err(|source| {
            stage_err(ForkStage::LoadSource)(StoreError::Parse {
                id: source_id,
                entry: PROGRAM_ENTRY,
                source,
            })
        })?;

        // Mint a replacement identifier for every asset the program
        // references and the source actually carries. References the source
        // does not carry are left for the rewrite pass to report.
        let mut taken: HashSet<AssetId> = container
            .entry_names()
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        let mut renames: HashMap<AssetId, AssetId> = HashMap::new();
        let mut new_assets: Vec<(AssetId, Vec<u8>)> = Vec::new();
        for reference in program.asset_references() {
            let Some(bytes) = container.read_entry(&reference.file_name()) else {
                continue;
            };
            let renamed = mint_renamed(&reference, &taken);
            taken.insert(renamed.clone());
            new_assets.push((renamed.clone(), bytes.to_vec()));
            renames.insert(reference, renamed);
        }

        let available: HashSet<AssetId> = renames.values().cloned().collect();
        let report = rewrite_references(&mut program, &renames, &available);
        if !report.unresolved.is_empty() {
            warn!(
                %source_id,
                unresolved = report.unresolved.len(),
                "forked program references assets the source container does not carry"
            );
        }

        // Everything except the id is fixed before allocation, so the
        // committed metadata and the returned metadata cannot diverge.
        let template = derived_metadata(&source_meta, source_id, requesting_username);
        let program_bytes = program.to_bytes().map_err(|e| ForkError::Stage {
            source_id,
            stage: ForkStage::AssembleArchive,
            source: StoreError::Serialization(e.to_string()),
        })?;

        // Allocate the new id and commit the assembled container in one
        // step; the id is not observable until the save lands.
        let new_id = self
            .store
            .allocate_and_put(|new_id| {
                let mut metadata = template.clone();
                metadata.id = new_id;
                let mut assembled = Container::new();
                assembled.put_entry(PROGRAM_ENTRY, program_bytes.clone());
                assembled.put_entry(METADATA_ENTRY, Document::Metadata(metadata).to_bytes()?);
                assembled.put_entry(COMMENTS_ENTRY, b"[]".to_vec());
                for (asset_id, bytes) in &new_assets {
                    assembled.put_entry(&asset_id.file_name(), bytes.clone());
                }
                Ok(assembled)
            })
            .map_err(stage_err(ForkStage::Commit))?;
        let mut metadata = template;
        metadata.id = new_id;

        // Second commit write: the source's remix counter. Its own per-id
        // lock serializes this against concurrent source edits.
        self.store
            .mutate_metadata(source_id, |meta| meta.stats.remixes += 1)
            .map_err(|source| ForkError::ParentUpdate {
                source_id,
                new_id,
                source,
            })?;

        info!(%source_id, %new_id, author = requesting_username, "fork committed");

        // Best-effort, after all locks are released.
        self.notifier.notify(
            &source_meta.author.username,
            &remix_notice(&source_meta, &metadata, requesting_username),
        );

        Ok(ForkOutcome { new_id, metadata })
    }
}

/// The forked metadata, except for `id` (the caller stamps the allocated
/// id): a deep clone of the source with fresh ownership, timestamps, token,
/// zeroed stats, and lineage.
fn derived_metadata(
    source: &ProjectMetadata,
    source_id: ProjectId,
    requesting_username: &str,
) -> ProjectMetadata {
    let now = Utc::now();
    let mut meta = source.clone();
    meta.author = Author::generated(requesting_username);
    meta.history = History::all_at(now);
    meta.set_visibility(Visibility::Unshared);
    meta.stats = Stats::zeroed();
    meta.remix = RemixLineage {
        parent: Some(source_id),
        // Propagate to the true original.
        root: source.remix.root.or(Some(source_id)),
    };
    meta.project_token = ProjectToken::mint(now);
    meta
}

fn remix_notice(
    source: &ProjectMetadata,
    fork: &ProjectMetadata,
    requesting_username: &str,
) -> String {
    format!(
        "<p>{requesting_username} remixed your project \
         <a href=\"https://stackblocks.org/projects#{}\">{}</a> as \
         <a href=\"https://stackblocks.org/projects#{}\">{}</a>.</p>",
        source.id, source.title, fork.id, fork.title
    )
}

fn entry_bytes<'c>(
    container: &'c Container,
    id: ProjectId,
    entry: &'static str,
) -> Result<&'c [u8], StoreError> {
    container
        .read_entry(entry)
        .ok_or(StoreError::MissingDocument { id, entry })
}

fn parse_entry<T: serde::de::DeserializeOwned>(
    container: &Container,
    id: ProjectId,
    entry: &'static str,
) -> Result<T, StoreError> {
    let bytes = entry_bytes(container, id, entry)?;
    serde_json::from_slice(bytes).map_err(|source| StoreError::Parse { id, entry, source })
}
