use std::collections::{hash_map, HashMap, HashSet};

use crate::api::{CommentId, CommentRecord, Time, Tz};

/// One comment with its replies. Building, counting, lookup and dropping
/// work at any depth; the derived impls (clone, comparison, serialization)
/// still recurse once per level.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    /// The record as received, with any pre-nested replies moved out
    #[serde(flatten)]
    pub record: CommentRecord,

    /// Normalized creation time, the sort key among siblings
    pub created_at: Time,

    /// Child comments in chronological order
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> &CommentId {
        &self.record.id
    }

    /// Depth-first, in display order
    pub fn find_in<'a>(nodes: &'a [CommentNode], id: &CommentId) -> Option<&'a CommentNode> {
        let mut stack = nodes.iter().rev().collect::<Vec<_>>();
        while let Some(n) = stack.pop() {
            if n.id() == id {
                return Some(n);
            }
            stack.extend(n.replies.iter().rev());
        }
        None
    }
}

// Reply chains can be as deep as the backend lets them be, so tear them down
// without recursing
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut n) = stack.pop() {
            stack.append(&mut n.replies);
        }
    }
}

/// Total number of comments in a forest, replies included
pub fn count_nodes(nodes: &[CommentNode]) -> usize {
    let mut stack = nodes.iter().collect::<Vec<_>>();
    let mut total = 0;
    while let Some(n) = stack.pop() {
        total += 1;
        stack.extend(&n.replies);
    }
    total
}

/// Build a tree with zone-less timestamps read as UTC
pub fn build_tree(records: impl IntoIterator<Item = CommentRecord>) -> Vec<CommentNode> {
    TreeBuilder::default().build(records)
}

/// Turns the flat comment list of a prayer request into reply trees.
///
/// The builder holds no state between calls: every `build` starts from
/// scratch, so a thread is refreshed by re-fetching and rebuilding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeBuilder {
    zone: Tz,
}

impl Default for TreeBuilder {
    fn default() -> TreeBuilder {
        TreeBuilder { zone: Tz::UTC }
    }
}

/// Parent/child links between positions of the deduplicated record list
struct Links {
    roots: Vec<usize>,
    replies: Vec<Vec<usize>>,
    parent_of: Vec<Option<usize>>,
}

fn flatten_into(mut r: CommentRecord, out: &mut Vec<CommentRecord>) {
    let nested = std::mem::take(&mut r.replies);
    let id = r.id.clone();
    out.push(r);
    for mut child in nested {
        if child.parent_interaction_id.is_none() {
            child.parent_interaction_id = Some(id.clone());
        }
        flatten_into(child, out);
    }
}

/// Single pass in input order. A reply that shows up before its parent waits
/// until the parent is seen; if it never is, the reply becomes a root.
fn link(records: &[CommentRecord]) -> Links {
    let mut seen = HashMap::<&CommentId, usize>::new();
    let mut awaiting = HashMap::<&CommentId, Vec<usize>>::new();
    let mut links = Links {
        roots: Vec::new(),
        replies: vec![Vec::new(); records.len()],
        parent_of: vec![None; records.len()],
    };
    for (i, r) in records.iter().enumerate() {
        seen.insert(&r.id, i);
        if let Some(waiting) = awaiting.remove(&r.id) {
            for &child in &waiting {
                links.parent_of[child] = Some(i);
            }
            links.replies[i].extend(waiting);
        }
        match &r.parent_interaction_id {
            None => links.roots.push(i),
            Some(parent) => match seen.get(parent) {
                Some(&p) => {
                    links.replies[p].push(i);
                    links.parent_of[i] = Some(p);
                }
                None => awaiting.entry(parent).or_default().push(i),
            },
        }
    }

    let mut orphans = awaiting.into_values().flatten().collect::<Vec<_>>();
    if !orphans.is_empty() {
        orphans.sort_unstable();
        tracing::debug!(
            num_orphans = orphans.len(),
            "promoting replies whose parent is not in the thread"
        );
        links.roots.extend(orphans);
    }
    links
}

fn mark_reachable(from: usize, links: &Links, reached: &mut [bool]) {
    let mut stack = vec![from];
    while let Some(i) = stack.pop() {
        if !reached[i] {
            reached[i] = true;
            stack.extend(&links.replies[i]);
        }
    }
}

/// Comments whose parent chain loops never hang below a root. Break each such
/// loop at its earliest comment, which becomes a root.
fn break_cycles(records: &[CommentRecord], links: &mut Links) {
    let n = links.parent_of.len();
    let mut reached = vec![false; n];
    for r in links.roots.clone() {
        mark_reachable(r, links, &mut reached);
    }
    for i in 0..n {
        if reached[i] {
            continue;
        }
        // Everything above an unreached comment is unreached too, so walking
        // up has to end up going around a loop
        let mut on_path = HashSet::new();
        let mut j = i;
        while on_path.insert(j) {
            j = links.parent_of[j].expect("unreached comment has no parent");
        }
        let mut earliest = j;
        let mut k = links.parent_of[j].expect("comment in a loop has no parent");
        while k != j {
            earliest = earliest.min(k);
            k = links.parent_of[k].expect("comment in a loop has no parent");
        }
        if let Some(p) = links.parent_of[earliest].take() {
            links.replies[p].retain(|&c| c != earliest);
        }
        tracing::warn!(
            comment = %records[earliest].id,
            "comment parent references form a loop, promoting a comment to root"
        );
        links.roots.push(earliest);
        mark_reachable(earliest, links, &mut reached);
    }
}

fn sort_siblings(siblings: &mut [usize], at: &[Time]) {
    siblings.sort_unstable_by_key(|&i| (at[i], i));
}

/// Builds the subtree below `root` with an explicit stack of nodes whose
/// replies are still being filled in
fn assemble(
    root: usize,
    records: &mut [Option<CommentRecord>],
    at: &[Time],
    links: &mut Links,
) -> CommentNode {
    let mut open = |i: usize| {
        let mut children = std::mem::take(&mut links.replies[i]);
        sort_siblings(&mut children, at);
        let record = records[i]
            .take()
            .expect("comment placed twice in the tree");
        let node = CommentNode {
            record,
            created_at: at[i],
            replies: Vec::with_capacity(children.len()),
        };
        (node, children.into_iter())
    };

    let mut stack = vec![open(root)];
    loop {
        let next = stack.last_mut().and_then(|(_, pending)| pending.next());
        if let Some(c) = next {
            stack.push(open(c));
            continue;
        }
        let (done, _) = stack.pop().expect("assembly stack emptied early");
        match stack.last_mut() {
            Some((parent, _)) => parent.replies.push(done),
            None => return done,
        }
    }
}

impl TreeBuilder {
    /// `zone` is used for timestamps that carry no offset
    pub fn new(zone: Tz) -> TreeBuilder {
        TreeBuilder { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Returns the root comments, every level sorted by creation time (ties
    /// keep input order). Only `COMMENT` records take part. A later record
    /// with an already-seen id replaces the earlier one in place.
    pub fn build(&self, records: impl IntoIterator<Item = CommentRecord>) -> Vec<CommentNode> {
        let mut flat = Vec::new();
        for r in records {
            flatten_into(r, &mut flat);
        }

        let mut deduped = Vec::<CommentRecord>::with_capacity(flat.len());
        let mut position = HashMap::<CommentId, usize>::new();
        for r in flat.into_iter().filter(|r| r.is_comment()) {
            match position.entry(r.id.clone()) {
                hash_map::Entry::Occupied(e) => {
                    tracing::warn!(comment = %r.id, "duplicate comment id, keeping the last one");
                    deduped[*e.get()] = r;
                }
                hash_map::Entry::Vacant(e) => {
                    e.insert(deduped.len());
                    deduped.push(r);
                }
            }
        }

        let at = deduped
            .iter()
            .map(|r| r.timestamp.normalize_in(&self.zone))
            .collect::<Vec<_>>();
        let mut links = link(&deduped);
        break_cycles(&deduped, &mut links);

        let mut roots = std::mem::take(&mut links.roots);
        sort_siblings(&mut roots, &at);
        let mut records = deduped.into_iter().map(Some).collect::<Vec<_>>();
        roots
            .into_iter()
            .map(|r| assemble(r, &mut records, &at, &mut links))
            .collect()
    }
}

/// Summary figures for a thread header
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ThreadStats {
    pub total: usize,
    pub top_level: usize,
    pub participants: usize,
    pub max_depth: usize,
}

impl ThreadStats {
    pub fn of(nodes: &[CommentNode]) -> ThreadStats {
        let mut users = HashSet::new();
        let mut max_depth = 0;
        let mut stack = nodes.iter().map(|n| (n, 1)).collect::<Vec<_>>();
        while let Some((n, depth)) = stack.pop() {
            users.insert(&n.record.user_id);
            max_depth = max_depth.max(depth);
            stack.extend(n.replies.iter().map(|c| (c, depth + 1)));
        }
        ThreadStats {
            total: count_nodes(nodes),
            top_level: nodes.len(),
            participants: users.len(),
            max_depth,
        }
    }
}
