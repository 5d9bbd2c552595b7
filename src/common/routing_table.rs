//! Simplified Kademlia routing table

use std::collections::BTreeMap;
use std::slice::Iter;

use crate::common::{Id, Node};

/// K = the default maximum size of a k-bucket.
pub const DEFAULT_BUCKET_SIZE_K: usize = 8;

/// Outcome of adding a node to a [RoutingTable] or a [KBucket].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The node was inserted at the most recently seen position.
    Added,
    /// The node was already tracked; it moved to the most recently seen
    /// position and its address was updated.
    Refreshed,
    /// The target bucket is full and was left untouched. Carries the least
    /// recently seen node, to be probed for liveness before anything is
    /// evicted (see [RoutingTable::touch] and [RoutingTable::replace]).
    Full(Node),
    /// The node is the local node, or the bucket tracks nothing; never added.
    Ignored,
}

#[derive(Debug, Clone)]
/// Simplified Kademlia routing table
pub struct RoutingTable {
    id: Id,
    k: usize,
    buckets: BTreeMap<u8, KBucket>,
}

impl RoutingTable {
    /// Create a new [RoutingTable] with a given id.
    pub fn new(id: Id) -> Self {
        RoutingTable {
            id,
            k: DEFAULT_BUCKET_SIZE_K,
            buckets: BTreeMap::new(),
        }
    }

    // === Options ===

    /// Set the maximum size of every k-bucket in this table.
    pub fn with_bucket_size(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    // === Getters ===

    /// Returns the [Id] of this node, where the distance is measured from.
    pub fn id(&self) -> &Id {
        &self.id
    }

    // === Public Methods ===

    /// Attempts to add a node to this routing table.
    ///
    /// A bucket is created lazily the first time a node routes to its
    /// partition. [AddOutcome::Full] leaves the bucket untouched; the caller
    /// decides whether the least recently seen node is refreshed
    /// ([RoutingTable::touch]) or evicted for the incoming one
    /// ([RoutingTable::replace]).
    pub fn add(&mut self, node: Node) -> AddOutcome {
        let distance = self.id.distance(node.id());

        if distance == 0 {
            // Do not add self to the routing_table
            return AddOutcome::Ignored;
        }

        let k = self.k;
        let bucket = self
            .buckets
            .entry(distance)
            .or_insert_with(|| KBucket::new(k));

        bucket.add(node)
    }

    /// Remove a node from this routing table.
    pub fn remove(&mut self, node_id: &Id) {
        let distance = self.id.distance(node_id);

        if let Some(bucket) = self.buckets.get_mut(&distance) {
            bucket.remove(node_id)
        }
    }

    /// Move an already tracked node to the most recently seen position of its
    /// bucket.
    pub fn touch(&mut self, node_id: &Id) {
        let distance = self.id.distance(node_id);

        if let Some(bucket) = self.buckets.get_mut(&distance) {
            bucket.touch(node_id)
        }
    }

    /// Evict `old_id` and insert `node`, applying an eviction decision made
    /// after [AddOutcome::Full]. Only meaningful when both ids map to the
    /// same partition.
    pub fn replace(&mut self, old_id: &Id, node: Node) {
        let distance = self.id.distance(node.id());

        if let Some(bucket) = self.buckets.get_mut(&distance) {
            bucket.remove(old_id);
            bucket.add(node);
        }
    }

    /// Return up to `limit` nodes closest to the target.
    ///
    /// The bucket the target maps to is probed first. If it cannot fill the
    /// quota, the remaining populated buckets are probed in order of how far
    /// their index is from the target's, lower index first on ties; the
    /// probing stops as soon as the quota is met. The accumulated result is
    /// ordered by ascending XOR distance to the target.
    ///
    /// A target equal to the local id returns an empty list; the local node
    /// is never a lookup result.
    pub fn closest(&self, target: &Id, limit: usize) -> Vec<Node> {
        let base = self.id.distance(target);

        if base == 0 {
            return Vec::new();
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(limit);

        if let Some(bucket) = self.buckets.get(&base) {
            nodes.extend(bucket.closest(target, limit));
        }

        if nodes.len() < limit {
            for index in self.expansion_order(base) {
                if let Some(bucket) = self.buckets.get(&index) {
                    nodes.extend(bucket.closest(target, limit - nodes.len()));
                }

                if nodes.len() >= limit {
                    break;
                }
            }
        }

        nodes.sort_by_key(|node| node.id().xor(target));

        nodes
    }

    /// Exact-id lookup across the whole table, probing buckets in the same
    /// order as [RoutingTable::closest] and stopping at the first match.
    ///
    /// The local id is not tracked here; callers resolve it before asking.
    pub fn find_exact(&self, target: &Id) -> Option<Node> {
        let base = self.id.distance(target);

        if base == 0 {
            return None;
        }

        if let Some(node) = self
            .buckets
            .get(&base)
            .and_then(|bucket| bucket.find_one(target))
        {
            return Some(node.clone());
        }

        for index in self.expansion_order(base) {
            if let Some(node) = self
                .buckets
                .get(&index)
                .and_then(|bucket| bucket.find_one(target))
            {
                return Some(node.clone());
            }
        }

        None
    }

    /// Returns `true` if this routing table is empty.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    /// Return the number of nodes in this routing table.
    pub fn size(&self) -> usize {
        self.buckets
            .values()
            .fold(0, |acc, bucket| acc + bucket.len())
    }

    /// Return the number of populated buckets in this routing table.
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().filter(|bucket| !bucket.is_empty()).count()
    }

    // === Private Methods ===

    /// Populated bucket indices other than `base`, ordered by how far their
    /// index is from it; the lower index wins a tie.
    ///
    /// This is bucket-index arithmetic, not a per-node distance recompute;
    /// nodes taken from each probed bucket are still distance-sorted.
    fn expansion_order(&self, base: u8) -> Vec<u8> {
        let mut indices: Vec<u8> = self
            .buckets
            .keys()
            .copied()
            .filter(|index| *index != base)
            .collect();

        indices.sort_by_key(|index| (index.abs_diff(base), *index));

        indices
    }

    #[cfg(test)]
    fn contains(&self, node_id: &Id) -> bool {
        let distance = self.id.distance(node_id);

        if let Some(bucket) = self.buckets.get(&distance) {
            if bucket.find_one(node_id).is_some() {
                return true;
            }
        }
        false
    }
}

/// Kbuckets are bounded, recency-ordered collections of nodes sharing one
/// distance partition; the least recently seen node sits at the front.
#[derive(Debug, Clone)]
pub struct KBucket {
    /// K (as in k-bucket) is the maximum number of nodes this bucket tracks.
    k: usize,
    /// Nodes in the k-bucket, sorted by the least recently seen.
    nodes: Vec<Node>,
}

impl KBucket {
    pub fn new(k: usize) -> Self {
        KBucket {
            k,
            nodes: Vec::with_capacity(k),
        }
    }

    // === Public Methods ===

    /// Add a node, refresh it if it is already tracked, or report the bucket
    /// as full without mutating it.
    pub fn add(&mut self, node: Node) -> AddOutcome {
        if let Some(index) = self
            .nodes
            .iter()
            .position(|existing| existing.id() == node.id())
        {
            // Re-adding an id refreshes its recency and updates its address.
            self.nodes.remove(index);
            self.nodes.push(node);

            AddOutcome::Refreshed
        } else if self.nodes.len() < self.k {
            self.nodes.push(node);

            AddOutcome::Added
        } else {
            match self.nodes.first() {
                Some(least_recently_seen) => AddOutcome::Full(least_recently_seen.clone()),
                None => AddOutcome::Ignored,
            }
        }
    }

    /// Remove the node with the given id if present.
    pub fn remove(&mut self, node_id: &Id) {
        self.nodes.retain(|node| node.id() != node_id);
    }

    /// Move the node with the given id to the most recently seen position.
    pub fn touch(&mut self, node_id: &Id) {
        if let Some(index) = self.nodes.iter().position(|node| node.id() == node_id) {
            let node = self.nodes.remove(index);
            self.nodes.push(node);
        }
    }

    /// Exact-id lookup. Never mutates.
    pub fn find_one(&self, node_id: &Id) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    /// Up to `n` nodes ordered by ascending XOR distance to the target.
    ///
    /// The sort is stable, so nodes at equal distance keep their recency
    /// order. Never mutates.
    pub fn closest(&self, target: &Id, n: usize) -> Vec<Node> {
        let mut nodes = self.nodes.clone();

        nodes.sort_by_key(|node| node.id().xor(target));
        nodes.truncate(n);

        nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> Iter<'_, Node> {
        self.nodes.iter()
    }
}
