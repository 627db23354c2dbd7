//! Id allocation helpers for subtrees.

use std::collections::BTreeSet;

use crate::{
    document::model::{Folder, Subtree},
    foundation::core::FolderId,
};

/// Give every non-empty folder under (and including) `folder` a fresh id from `subtree`.
///
/// Empty slots keep the sentinel. Returns `(old, new)` pairs in visit order.
pub fn remap_folder_ids(folder: &mut Folder, subtree: &mut Subtree) -> Vec<(FolderId, FolderId)> {
    let mut pairs = Vec::new();
    folder.walk_mut(&mut |f| {
        if !f.id.is_empty() {
            let fresh = FolderId(subtree.allocate_id());
            pairs.push((f.id, fresh));
            f.id = fresh;
        }
    });
    pairs
}

/// First non-empty folder id that appears more than once, if any.
pub fn first_duplicate(subtree: &Subtree) -> Option<FolderId> {
    let mut seen = BTreeSet::new();
    subtree
        .folder_ids()
        .into_iter()
        .find(|id| !seen.insert(*id))
}

/// Move the counter past every used id. Returns the previous value when it had to move.
pub fn advance_counter(subtree: &mut Subtree) -> Option<u32> {
    let floor = subtree.max_used_id().saturating_add(1).max(1);
    if subtree.next_id < floor {
        let before = subtree.next_id;
        subtree.next_id = floor;
        return Some(before);
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/document/ids.rs"]
mod tests;
