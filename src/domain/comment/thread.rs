use std::collections::HashMap;

use super::aggregate::Comment;

// ============================================================================
// Thread Reconstruction
// ============================================================================
//
// Builds the nested parent/child view from the flat approved-comment list
// the repository returns. A comment whose parent is missing from the load
// (for example because the parent was rejected) becomes a root instead of
// being dropped. Ordering is fully determined by sorting on
// (publication time, id), never by map iteration order.
//
// ============================================================================

/// One comment plus its ordered replies. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadNode {
    pub comment: Comment,
    pub children: Vec<ThreadNode>,
}

/// Builds the comment tree from a flat list. O(n log n) in the number of
/// comments for one article, dominated by the per-level sorts.
pub fn build_thread(comments: Vec<Comment>) -> Vec<ThreadNode> {
    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();

    let mut index: HashMap<i64, usize> = HashMap::with_capacity(slots.len());
    for (i, slot) in slots.iter().enumerate() {
        if let Some(id) = slot.as_ref().and_then(Comment::id) {
            index.insert(id.value(), i);
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots: Vec<usize> = Vec::new();

    for i in 0..slots.len() {
        let parent = slots[i].as_ref().map(|c| c.parent());
        match parent.and_then(|p| p.parent_id()) {
            Some(parent_id) => match index.get(&parent_id.value()) {
                Some(&parent_ix) if parent_ix != i => children[parent_ix].push(i),
                // Parent filtered out of the load: promote to root.
                _ => roots.push(i),
            },
            None => roots.push(i),
        }
    }

    sort_siblings(&mut roots, &slots);
    for list in &mut children {
        sort_siblings(list, &slots);
    }

    roots
        .into_iter()
        .filter_map(|ix| attach(ix, &mut slots, &children))
        .collect()
}

/// Ascending by (publication time, id). The id tie-break keeps the output
/// byte-identical for equal timestamps.
fn sort_siblings(siblings: &mut [usize], slots: &[Option<Comment>]) {
    siblings.sort_by_key(|&ix| {
        slots[ix].as_ref().map(|c| {
            (
                c.pub_time().unwrap_or_else(|| c.created_at()),
                c.id().map(|id| id.value()).unwrap_or_default(),
            )
        })
    });
}

/// Moves a comment out of its slot and recursively collects its children.
/// Taking the slot means a node already placed is never revisited, which
/// keeps the build acyclic even against inconsistent parent links.
fn attach(
    ix: usize,
    slots: &mut Vec<Option<Comment>>,
    children: &[Vec<usize>],
) -> Option<ThreadNode> {
    let comment = slots[ix].take()?;
    let child_nodes = children[ix]
        .iter()
        .filter_map(|&child_ix| attach(child_ix, slots, children))
        .collect();
    Some(ThreadNode {
        comment,
        children: child_nodes,
    })
}
