//! Applies [`Patch`] operations to a document.

use json_render_pointer::{add_by_path, get_by_path, parse_json_pointer, remove_by_path, set_by_path};
use json_render_util::optional_equal;
use serde_json::Value;

use super::types::{Patch, PatchError};

fn is_strict_descendant(from: &str, path: &str) -> bool {
    let from = parse_json_pointer(from);
    let path = parse_json_pointer(path);
    path.len() > from.len() && path[..from.len()] == from[..]
}

/// Applies one operation. On error the document is left as it was.
///
/// `add` inserts into arrays and creates-or-replaces object members,
/// `replace` overwrites without shifting, and `remove` on a missing path is a
/// no-op. `test` compares with JS number semantics, so `1` equals `1.0`.
pub fn apply_patch(doc: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    match patch {
        Patch::Add { path, value } => add_by_path(doc, path, value.clone())?,
        Patch::Replace { path, value } => set_by_path(doc, path, value.clone())?,
        Patch::Remove { path } => {
            remove_by_path(doc, path);
        }
        Patch::Copy { from, path } => {
            let source = get_by_path(doc, from)
                .cloned()
                .ok_or_else(|| PatchError::SourceNotFound { from: from.clone() })?;
            add_by_path(doc, path, source)?;
        }
        Patch::Move { from, path } => {
            if is_strict_descendant(from, path) {
                return Err(PatchError::MoveIntoSelf {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let source = remove_by_path(doc, from)
                .ok_or_else(|| PatchError::SourceNotFound { from: from.clone() })?;
            if let Err(err) = add_by_path(doc, path, source.clone()) {
                // Put the source back so a failed move has no effect. Arrays
                // regain the exact slot; an object member moves to the end.
                add_by_path(doc, from, source)?;
                return Err(err.into());
            }
        }
        Patch::Test { path, value } => {
            if !optional_equal(get_by_path(doc, path), value.as_ref()) {
                return Err(PatchError::TestFailed { path: path.clone() });
            }
        }
    }
    Ok(())
}

/// Applies operations in order, stopping at the first failure. Operations
/// before the failing one keep their effect.
pub fn apply_patches(doc: &mut Value, patches: &[Patch]) -> Result<(), PatchError> {
    patches.iter().try_for_each(|patch| apply_patch(doc, patch))
}
