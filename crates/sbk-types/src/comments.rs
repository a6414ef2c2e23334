//! The `comments.json` document: an ordered forest of comment nodes.
//!
//! The structure is a strict forest (parent-to-children only, no back
//! references), so a plain owned tree is safe to walk. Insertion order is
//! the only defined order — new roots go to the end of the top-level list,
//! new replies to the end of their parent's child list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One comment, with its (possibly nested) replies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: Uuid,
    pub username: String,
    pub text: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Build a new leaf comment with a fresh id.
    pub fn new(username: &str, text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            text: text.to_string(),
            created: now,
            replies: Vec::new(),
        }
    }
}

/// The whole comment document. Serializes as a JSON array (`[]` when empty)
/// so legacy `comments.json` entries keep parsing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentForest(Vec<CommentNode>);

impl CommentForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level comments, in insertion order.
    pub fn roots(&self) -> &[CommentNode] {
        &self.0
    }

    /// Number of top-level comments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of comments including every nested reply.
    pub fn total_count(&self) -> usize {
        fn count(nodes: &[CommentNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.replies)).sum()
        }
        count(&self.0)
    }

    /// Append a new top-level comment.
    pub fn push_root(&mut self, node: CommentNode) {
        self.0.push(node);
    }

    /// Find a comment anywhere in the forest.
    pub fn find(&self, id: &Uuid) -> Option<&CommentNode> {
        let mut stack: Vec<&CommentNode> = self.0.iter().collect();
        while let Some(node) = stack.pop() {
            if &node.id == id {
                return Some(node);
            }
            stack.extend(node.replies.iter());
        }
        None
    }

    /// Append `reply` to the child list of the comment with id `parent`.
    /// Returns `false` (and drops nothing into the tree) if the parent does
    /// not exist.
    pub fn append_reply(&mut self, parent: &Uuid, reply: CommentNode) -> bool {
        fn walk(nodes: &mut [CommentNode], parent: &Uuid, reply: &mut Option<CommentNode>) -> bool {
            for node in nodes {
                if &node.id == parent {
                    if let Some(reply) = reply.take() {
                        node.replies.push(reply);
                    }
                    return true;
                }
                if walk(&mut node.replies, parent, reply) {
                    return true;
                }
            }
            false
        }
        let mut slot = Some(reply);
        walk(&mut self.0, parent, &mut slot)
    }
}
