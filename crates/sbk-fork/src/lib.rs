//! Fork engine for Stackblocks.
//!
//! A fork is an independent copy of a project: fresh id and ownership,
//! every asset re-identified (so the copies never collide with the
//! source's), program references rewritten in lockstep, counters reset,
//! and lineage recorded back to the parent and the root of the remix tree.
//! The source project is left intact apart from its remix counter.
//!
//! Stages: load source → allocate id → rename assets → build metadata →
//! assemble archive → commit. Failures before the commit leave no partial
//! state behind; see [`ForkError`] for the one reportable partial outcome.

pub mod engine;
pub mod error;

pub use engine::{ForkEngine, ForkOutcome};
pub use error::{ForkError, ForkResult, ForkStage};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::Utc;
    use sbk_archive::{COMMENTS_ENTRY, METADATA_ENTRY, PROGRAM_ENTRY};
    use sbk_store::{Document, DocumentKind, DocumentStore, InMemoryContainerStore, StoreError};
    use sbk_types::{
        AssetId, Program, ProjectId, ProjectMetadata, RecordingNotifier, Visibility,
    };
    use serde_json::json;

    const COSTUME: &str = "aa000000000000000000000000000000.png";
    const SOUND: &str = "bb000000000000000000000000000000.wav";
    const DANGLING: &str = "cc000000000000000000000000000000.png";

    fn program_with_assets(include_dangling: bool) -> Program {
        let mut costumes = vec![json!({
            "name": "costume1",
            "assetId": "aa000000000000000000000000000000",
            "md5ext": COSTUME,
            "dataFormat": "png"
        })];
        if include_dangling {
            costumes.push(json!({
                "name": "ghost",
                "assetId": "cc000000000000000000000000000000",
                "md5ext": DANGLING,
                "dataFormat": "png"
            }));
        }
        Program::from_value(json!({
            "targets": [{
                "costumes": costumes,
                "sounds": [{
                    "name": "pop",
                    "assetId": "bb000000000000000000000000000000",
                    "md5ext": SOUND,
                    "dataFormat": "wav"
                }]
            }]
        }))
    }

    struct Fixture {
        store: Arc<DocumentStore>,
        notifier: Arc<RecordingNotifier>,
        engine: ForkEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(DocumentStore::new(Arc::new(InMemoryContainerStore::new())));
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = ForkEngine::new(
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn sbk_types::Notifier>,
        );
        Fixture {
            store,
            notifier,
            engine,
        }
    }

    fn create_source(fx: &Fixture, username: &str, include_dangling: bool) -> ProjectId {
        let (handle, _) = fx
            .store
            .create_with(|id| {
                (
                    ProjectMetadata::fresh(id, username, Utc::now()),
                    program_with_assets(include_dangling),
                )
            })
            .unwrap();
        fx.store
            .update_container(handle.id(), |c| {
                c.put_entry(COSTUME, b"png bytes".to_vec());
                c.put_entry(SOUND, b"wav bytes".to_vec());
                Ok(())
            })
            .unwrap();
        handle.id()
    }

    fn asset_entries(fx: &Fixture, id: ProjectId) -> HashSet<AssetId> {
        fx.store
            .load_container(id)
            .unwrap()
            .entry_names()
            .iter()
            .filter_map(|n| n.parse().ok())
            .collect()
    }

    fn read_program(fx: &Fixture, id: ProjectId) -> Program {
        match fx.store.read_document(id, DocumentKind::Program).unwrap() {
            Document::Program(p) => p,
            other => panic!("unexpected document: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 1. The fork is a fresh, unshared project owned by the requester
    // -----------------------------------------------------------------------
    #[test]
    fn fork_mints_fresh_identity() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        let source_meta = fx.store.read_metadata(source_id).unwrap();

        let outcome = fx.engine.fork(source_id, "carol").unwrap();

        assert_ne!(outcome.new_id, source_id);
        let meta = &outcome.metadata;
        assert_eq!(meta.id, outcome.new_id);
        assert_eq!(meta.author.username, "carol");
        assert_ne!(meta.author.id, source_meta.author.id);
        assert_eq!(meta.visibility, Visibility::Unshared);
        assert!(!meta.public);
        assert_eq!(meta.stats.views, 0);
        assert_eq!(meta.stats.loves, 0);
        assert_eq!(meta.stats.favorites, 0);
        assert_eq!(meta.stats.remixes, 0);
        assert_ne!(meta.project_token, source_meta.project_token);
        // Content fields are deep-cloned.
        assert_eq!(meta.title, source_meta.title);
    }

    // -----------------------------------------------------------------------
    // 2. Lineage points at the parent, root propagates to the original
    // -----------------------------------------------------------------------
    #[test]
    fn lineage_parent_and_root() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);

        let first = fx.engine.fork(source_id, "bob").unwrap();
        assert_eq!(first.metadata.remix.parent, Some(source_id));
        assert_eq!(first.metadata.remix.root, Some(source_id));

        let second = fx.engine.fork(first.new_id, "carol").unwrap();
        assert_eq!(second.metadata.remix.parent, Some(first.new_id));
        assert_eq!(second.metadata.remix.root, Some(source_id), "root is the true original");
    }

    // -----------------------------------------------------------------------
    // 3. Every reference in the fork resolves; no identifier collides with
    //    the source's
    // -----------------------------------------------------------------------
    #[test]
    fn fork_assets_resolve_and_do_not_collide() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        let outcome = fx.engine.fork(source_id, "carol").unwrap();

        let source_assets = asset_entries(&fx, source_id);
        let fork_assets = asset_entries(&fx, outcome.new_id);
        assert_eq!(fork_assets.len(), 2);
        assert!(
            source_assets.is_disjoint(&fork_assets),
            "forked identifiers must not collide with the source's"
        );

        let references = read_program(&fx, outcome.new_id).asset_references();
        assert_eq!(references.len(), 2);
        for reference in &references {
            assert!(
                fork_assets.contains(reference),
                "reference {reference} must resolve in the fork container"
            );
        }

        // Asset bytes are copies of the originals.
        let container = fx.store.load_container(outcome.new_id).unwrap();
        let wav = references.iter().find(|r| r.ext() == "wav").unwrap();
        assert_eq!(container.read_entry(&wav.file_name()).unwrap(), b"wav bytes");
    }

    // -----------------------------------------------------------------------
    // 4. The parent's remix counter increments exactly once per fork
    // -----------------------------------------------------------------------
    #[test]
    fn parent_remix_counter_increments_once() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);

        fx.engine.fork(source_id, "bob").unwrap();
        assert_eq!(fx.store.read_metadata(source_id).unwrap().stats.remixes, 1);

        fx.engine.fork(source_id, "carol").unwrap();
        assert_eq!(fx.store.read_metadata(source_id).unwrap().stats.remixes, 2);
    }

    // -----------------------------------------------------------------------
    // 5. The fork starts with an empty comment thread
    // -----------------------------------------------------------------------
    #[test]
    fn fork_comments_start_empty() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        fx.store
            .mutate_comments(source_id, |forest| {
                forest.push_root(sbk_types::CommentNode::new("dave", "cool", Utc::now()));
            })
            .unwrap();

        let outcome = fx.engine.fork(source_id, "carol").unwrap();
        let container = fx.store.load_container(outcome.new_id).unwrap();
        assert_eq!(container.read_entry(COMMENTS_ENTRY).unwrap(), b"[]");
    }

    // -----------------------------------------------------------------------
    // 6. The source is untouched apart from its remix counter
    // -----------------------------------------------------------------------
    #[test]
    fn source_entries_survive_byte_identical() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        let before = fx.store.load_container(source_id).unwrap();

        fx.engine.fork(source_id, "carol").unwrap();

        let after = fx.store.load_container(source_id).unwrap();
        assert_eq!(
            after.read_entry(PROGRAM_ENTRY),
            before.read_entry(PROGRAM_ENTRY)
        );
        assert_eq!(after.read_entry(COSTUME), before.read_entry(COSTUME));
        assert_eq!(after.read_entry(SOUND), before.read_entry(SOUND));
        // data.json changed: the remix counter.
        assert_ne!(
            after.read_entry(METADATA_ENTRY),
            before.read_entry(METADATA_ENTRY)
        );
    }

    // -----------------------------------------------------------------------
    // 7. Dangling references do not fail the fork and are left unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn dangling_reference_survives_fork_unchanged() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", true);

        let outcome = fx.engine.fork(source_id, "carol").unwrap();
        let references = read_program(&fx, outcome.new_id).asset_references();
        let dangling: AssetId = DANGLING.parse().unwrap();
        assert!(
            references.contains(&dangling),
            "unresolvable reference must be left as-is"
        );
        // The two real assets were still renamed.
        assert_eq!(asset_entries(&fx, outcome.new_id).len(), 2);
    }

    // -----------------------------------------------------------------------
    // 8. Error paths
    // -----------------------------------------------------------------------
    #[test]
    fn fork_of_missing_project_is_source_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.engine.fork(ProjectId::new(404), "carol"),
            Err(ForkError::SourceNotFound(_))
        ));
    }

    #[test]
    fn fork_of_damaged_source_fails_at_load() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        fx.store
            .update_container(source_id, |c| {
                c.remove_entry(METADATA_ENTRY);
                Ok(())
            })
            .unwrap();

        match fx.engine.fork(source_id, "carol") {
            Err(ForkError::Stage {
                stage: ForkStage::LoadSource,
                source: StoreError::MissingDocument { .. },
                ..
            }) => {}
            other => panic!("expected load-source failure, got {other:?}"),
        }
        // Nothing was committed.
        assert_eq!(fx.store.project_ids().unwrap(), vec![source_id]);
    }

    // -----------------------------------------------------------------------
    // 9. The source author is notified, with links to both projects
    // -----------------------------------------------------------------------
    #[test]
    fn source_author_gets_a_remix_notice() {
        let fx = fixture();
        let source_id = create_source(&fx, "alice", false);
        let outcome = fx.engine.fork(source_id, "carol").unwrap();

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        let (recipient, message) = &sent[0];
        assert_eq!(recipient, "alice");
        assert!(message.contains("carol"));
        assert!(message.contains(&format!("#{source_id}")));
        assert!(message.contains(&format!("#{}", outcome.new_id)));
    }
}
