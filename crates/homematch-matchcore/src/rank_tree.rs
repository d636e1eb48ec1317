//! Price-ordered treap with a subtree maximum of `(quality, lowest id)`.
//!
//! Nodes are ordered by [`OfferKey`] (price first), and each node caches
//! the best rank found anywhere in its subtree. A query for "best rank
//! among keys priced at or below X" then walks a single root-to-leaf path.
//!
//! Nodes live in an arena and link by index. Heap priorities are derived
//! from the offer id, so the tree shape is a pure function of the key set.

use std::cmp::Reverse;

use homematch_types::OfferId;

use crate::price_quality_index::OfferKey;

type Link = Option<usize>;

/// Highest quality wins, then the lowest id.
type Rank = (usize, Reverse<OfferId>);

fn rank_of(key: &OfferKey) -> Rank {
    (key.quality, Reverse(key.id))
}

/// SplitMix64 finaliser.
fn mix(id: OfferId) -> u64 {
    let mut z = id.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Debug, Clone)]
struct Node {
    key: OfferKey,
    priority: u64,
    left: Link,
    right: Link,
    best: Rank,
}

#[derive(Debug, Default)]
pub(crate) struct RankTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Link,
    len: usize,
}

impl RankTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Insert a key. Keys are unique; the caller guarantees it is absent.
    pub(crate) fn insert(&mut self, key: OfferKey) {
        let node = self.alloc(key);
        let (lower, upper) = self.split(self.root, &key, false);
        let lower = self.merge(lower, Some(node));
        self.root = self.merge(lower, upper);
        self.len += 1;
    }

    /// Remove a key. Returns `false` if it was not present.
    pub(crate) fn remove(&mut self, key: &OfferKey) -> bool {
        let (lower, rest) = self.split(self.root, key, false);
        let (found, upper) = self.split(rest, key, true);
        if let Some(idx) = found {
            self.release(idx);
            self.len -= 1;
        }
        self.root = self.merge(lower, upper);
        found.is_some()
    }

    /// Id of the best-ranked key priced at or below `ceiling`.
    pub(crate) fn best_at_or_below(&self, ceiling: f64) -> Option<OfferId> {
        let mut cursor = self.root;
        let mut best: Option<Rank> = None;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if node.key.price <= ceiling {
                // the node and its whole left subtree qualify
                let mut candidate = rank_of(&node.key);
                if let Some(left) = node.left {
                    candidate = candidate.max(self.nodes[left].best);
                }
                best = best.max(Some(candidate));
                cursor = node.right;
            } else {
                cursor = node.left;
            }
        }
        best.map(|(_, Reverse(id))| id)
    }

    fn alloc(&mut self, key: OfferKey) -> usize {
        let node = Node {
            key,
            priority: mix(key.id),
            left: None,
            right: None,
            best: rank_of(&key),
        };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx].left = None;
        self.nodes[idx].right = None;
        self.free.push(idx);
    }

    fn refresh(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        let mut best = rank_of(&node.key);
        if let Some(left) = node.left {
            best = best.max(self.nodes[left].best);
        }
        if let Some(right) = node.right {
            best = best.max(self.nodes[right].best);
        }
        self.nodes[idx].best = best;
    }

    /// Split into `(< key, >= key)`, or `(<= key, > key)` when `inclusive`.
    fn split(&mut self, tree: Link, key: &OfferKey, inclusive: bool) -> (Link, Link) {
        let Some(idx) = tree else {
            return (None, None);
        };
        let goes_left = if inclusive {
            self.nodes[idx].key <= *key
        } else {
            self.nodes[idx].key < *key
        };
        if goes_left {
            let (lower, upper) = self.split(self.nodes[idx].right, key, inclusive);
            self.nodes[idx].right = lower;
            self.refresh(idx);
            (Some(idx), upper)
        } else {
            let (lower, upper) = self.split(self.nodes[idx].left, key, inclusive);
            self.nodes[idx].left = upper;
            self.refresh(idx);
            (lower, Some(idx))
        }
    }

    /// Merge two treaps where every key of `a` is below every key of `b`.
    fn merge(&mut self, a: Link, b: Link) -> Link {
        match (a, b) {
            (None, other) | (other, None) => other,
            (Some(x), Some(y)) => {
                if self.nodes[x].priority > self.nodes[y].priority {
                    let right = self.nodes[x].right;
                    self.nodes[x].right = self.merge(right, Some(y));
                    self.refresh(x);
                    Some(x)
                } else {
                    let left = self.nodes[y].left;
                    self.nodes[y].left = self.merge(Some(x), left);
                    self.refresh(y);
                    Some(y)
                }
            }
        }
    }
}
