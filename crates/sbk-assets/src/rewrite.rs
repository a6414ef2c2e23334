//! Program-graph asset reference rewriting.
//!
//! Costume and sound entries carry two reference fields: `assetId` (the
//! bare hash) and `md5ext` (hash plus extension, doubling as the container
//! entry name). A rename must update both in lockstep or the player will
//! request assets that no longer exist.

use std::collections::{HashMap, HashSet};

use sbk_types::{AssetId, Program};
use serde_json::Value;
use tracing::warn;

const REFERENCE_LISTS: [&str; 2] = ["costumes", "sounds"];

/// What a rewrite pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Number of reference slots substituted.
    pub rewritten: usize,
    /// Distinct references that resolve to nothing: absent from the rename
    /// map *and* from the available asset set. These are left untouched.
    pub unresolved: Vec<AssetId>,
}

/// Substitute asset references in `program` per `renames`.
///
/// References not present in `renames` are left alone (partial renames are
/// fine — deduplication only renames what collided). A reference that is in
/// neither `renames` nor `available` is dangling; it is reported and left
/// as-is rather than failing the caller, since a broken costume is
/// recoverable and a refused fork is not.
pub fn rewrite_references(
    program: &mut Program,
    renames: &HashMap<AssetId, AssetId>,
    available: &HashSet<AssetId>,
) -> RewriteReport {
    let mut report = RewriteReport::default();
    let mut reported: HashSet<AssetId> = HashSet::new();

    let Some(targets) = program
        .as_value_mut()
        .get_mut("targets")
        .and_then(Value::as_array_mut)
    else {
        return report;
    };

    for target in targets {
        for list in REFERENCE_LISTS {
            let Some(items) = target.get_mut(list).and_then(Value::as_array_mut) else {
                continue;
            };
            for item in items {
                let Some(old) = reference_of(item) else {
                    continue;
                };
                if let Some(new) = renames.get(&old) {
                    set_reference(item, new);
                    report.rewritten += 1;
                } else if !available.contains(&old) && reported.insert(old.clone()) {
                    warn!(reference = %old, "program references an asset that exists nowhere; leaving it unchanged");
                    report.unresolved.push(old);
                }
            }
        }
    }
    report
}

/// The content identifier named by one costume/sound object.
fn reference_of(item: &Value) -> Option<AssetId> {
    if let Some(md5ext) = item.get("md5ext").and_then(Value::as_str) {
        return md5ext.parse().ok();
    }
    let asset_id = item.get("assetId").and_then(Value::as_str)?;
    let format = item.get("dataFormat").and_then(Value::as_str)?;
    format!("{asset_id}.{format}").parse().ok()
}

fn set_reference(item: &mut Value, new: &AssetId) {
    if let Some(obj) = item.as_object_mut() {
        obj.insert("assetId".into(), Value::String(new.hash().to_string()));
        obj.insert("md5ext".into(), Value::String(new.file_name()));
    }
}
