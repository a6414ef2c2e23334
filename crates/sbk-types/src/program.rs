//! The `project.json` program graph.
//!
//! The program is opaque to the store — targets, blocks, and variables are
//! carried as raw JSON — except for one structural convention: costume and
//! sound entries embed asset references (`assetId` / `md5ext`) that must be
//! kept in sync with the container's asset entries.

use serde_json::{json, Value};
use tracing::warn;

use crate::ids::AssetId;

/// The fields of a costume/sound object that name its asset.
const REFERENCE_LISTS: [&str; 2] = ["costumes", "sounds"];

/// The program graph document.
#[derive(Clone, Debug, PartialEq)]
pub struct Program(Value);

impl Program {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.0)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// The starter program every new project begins with: an empty stage
    /// with one backdrop and the stock "pop" sound.
    pub fn starter() -> Self {
        Self(json!({
            "targets": [{
                "isStage": true,
                "name": "Stage",
                "variables": {
                    "`jEk@4|i[#Fk?(8x)AV.-my variable": ["my variable", 0]
                },
                "lists": {},
                "broadcasts": {},
                "blocks": {},
                "comments": {},
                "currentCostume": 0,
                "costumes": [{
                    "name": "backdrop1",
                    "dataFormat": "svg",
                    "assetId": "cd21514d0531fdffb22204e0ec5ed84a",
                    "md5ext": "cd21514d0531fdffb22204e0ec5ed84a.svg",
                    "rotationCenterX": 240,
                    "rotationCenterY": 180
                }],
                "sounds": [{
                    "name": "pop",
                    "assetId": "83a9787d4cb6f3b7632b4ddfebf74367",
                    "dataFormat": "wav",
                    "format": "",
                    "rate": 48000,
                    "sampleCount": 1123,
                    "md5ext": "83a9787d4cb6f3b7632b4ddfebf74367.wav"
                }],
                "volume": 100,
                "layerOrder": 0,
                "tempo": 60,
                "videoTransparency": 50,
                "videoState": "on",
                "textToSpeechLanguage": null
            }],
            "monitors": [],
            "extensions": [],
            "meta": {
                "semver": "3.0.0",
                "vm": "11.1.0",
                "agent": "Stackblocks"
            }
        }))
    }

    /// Every distinct asset reference in the program, in first-seen order.
    ///
    /// Entries whose reference fields don't parse as a content identifier
    /// are skipped with a warning rather than failing the whole read —
    /// legacy programs contain the odd malformed costume.
    pub fn asset_references(&self) -> Vec<AssetId> {
        let mut seen = std::collections::HashSet::new();
        let mut refs = Vec::new();

        let Some(targets) = self.0.get("targets").and_then(Value::as_array) else {
            return refs;
        };
        for target in targets {
            for list in REFERENCE_LISTS {
                let Some(items) = target.get(list).and_then(Value::as_array) else {
                    continue;
                };
                for item in items {
                    let Some(raw) = reference_of(item) else {
                        continue;
                    };
                    match raw.parse::<AssetId>() {
                        Ok(id) => {
                            if seen.insert(id.clone()) {
                                refs.push(id);
                            }
                        }
                        Err(err) => {
                            warn!(reference = %raw, %err, "skipping unparsable asset reference");
                        }
                    }
                }
            }
        }
        refs
    }
}

/// Extract the content-identifier string from one costume/sound object:
/// `md5ext` when present, otherwise `assetId` + `dataFormat`.
fn reference_of(item: &Value) -> Option<String> {
    if let Some(md5ext) = item.get("md5ext").and_then(Value::as_str) {
        return Some(md5ext.to_string());
    }
    let asset_id = item.get("assetId").and_then(Value::as_str)?;
    let format = item.get("dataFormat").and_then(Value::as_str)?;
    Some(format!("{asset_id}.{format}"))
}
