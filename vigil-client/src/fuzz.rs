#![cfg(test)]

use std::collections::{HashMap, HashSet};

use chrono::{Duration, TimeZone, Utc};

use crate::{
    api::{CommentId, CommentRecord, InteractionType, RawTimestamp},
    build_tree, count_nodes, CommentNode,
};

/// (id, parent id, minutes after a base date, kind)
type Input = Vec<(u8, Option<u8>, i16, InteractionType)>;

fn records(input: &Input) -> Vec<CommentRecord> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    input
        .iter()
        .map(|&(id, parent, minutes, kind)| {
            let mut r = CommentRecord::stub(&id.to_string());
            r.parent_interaction_id = parent.map(|p| CommentId::new(p.to_string()));
            r.kind = kind;
            r.timestamp = match minutes % 7 {
                0 => RawTimestamp::from("not-a-date"),
                _ => RawTimestamp::from(base + Duration::minutes(i64::from(minutes))),
            };
            r
        })
        .collect()
}

/// Records that survive: comments only, last one per id
fn effective(records: &[CommentRecord]) -> HashMap<CommentId, CommentRecord> {
    records
        .iter()
        .filter(|r| r.is_comment())
        .map(|r| (r.id.clone(), r.clone()))
        .collect()
}

/// Map every node to the id of the node it hangs below in the tree
fn tree_parents(
    nodes: &[CommentNode],
    parent: Option<&CommentId>,
    out: &mut Vec<(CommentId, Option<CommentId>)>,
) {
    for n in nodes {
        out.push((n.id().clone(), parent.cloned()));
        tree_parents(&n.replies, Some(n.id()), out);
    }
}

fn assert_sorted(nodes: &[CommentNode]) {
    for w in nodes.windows(2) {
        assert!(w[0].created_at <= w[1].created_at, "siblings out of order");
    }
    for n in nodes {
        assert_sorted(&n.replies);
    }
}

fn loops_back(id: &CommentId, records: &HashMap<CommentId, CommentRecord>) -> bool {
    let mut seen = HashSet::new();
    let mut cur = id;
    while seen.insert(cur) {
        match records
            .get(cur)
            .and_then(|r| r.parent_interaction_id.as_ref())
        {
            Some(p) if records.contains_key(p) => cur = p,
            _ => return false,
        }
    }
    true
}

#[test]
fn every_comment_placed_once() {
    bolero::check!()
        .with_type::<Input>()
        .cloned()
        .for_each(|input| {
            let records = records(&input);
            let expected = effective(&records);
            let tree = build_tree(records);

            assert_eq!(count_nodes(&tree), expected.len());
            let mut placed = Vec::new();
            tree_parents(&tree, None, &mut placed);
            let ids = placed.iter().map(|(id, _)| id).collect::<HashSet<_>>();
            assert_eq!(ids.len(), placed.len(), "comment placed twice");
            assert!(ids.iter().all(|id| expected.contains_key(*id)));

            for (id, tree_parent) in &placed {
                let declared = expected[id].parent_interaction_id.as_ref();
                match tree_parent {
                    Some(p) => assert_eq!(Some(p), declared),
                    None => assert!(
                        declared.map_or(true, |p| !expected.contains_key(p))
                            || loops_back(id, &expected),
                        "comment {id} promoted to root for no reason"
                    ),
                }
            }

            assert_sorted(&tree);
        })
}

#[test]
fn input_order_does_not_change_structure() {
    bolero::check!()
        .with_type::<Input>()
        .cloned()
        .for_each(|mut input| {
            // Unique ids, and parents with a lower id only, so no loops
            let mut seen = HashSet::new();
            input.retain(|(id, _, _, _)| seen.insert(*id));
            for (id, parent, _, kind) in input.iter_mut() {
                *parent = parent.filter(|p| *p < *id);
                *kind = InteractionType::Comment;
            }

            let mut forward = Vec::new();
            tree_parents(&build_tree(records(&input)), None, &mut forward);
            input.reverse();
            let mut backward = Vec::new();
            tree_parents(&build_tree(records(&input)), None, &mut backward);

            forward.sort();
            backward.sort();
            assert_eq!(forward, backward);
            assert_eq!(forward.len(), input.len());
        })
}
