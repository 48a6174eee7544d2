//! Building templates from the current week and projecting templates back
//! onto it.
//!
//! Export and import share one component-reference normalization: every
//! entry collapses to a plain name string, and names that cannot be
//! resolved against the live inventory are dropped with a warning rather
//! than carried through with placeholder metadata.

mod export;
mod import;

pub use export::{build_template, export_template};
pub use import::{apply_template, import_template, ImportError, ImportReport, WeekWindow};

use tracing::warn;

use crate::inventory::InventoryStore;
use crate::models::ComponentRef;

/// Normalizes heterogeneous component references to name strings.
///
/// Name-bearing references pass through as-is; id-only references must
/// resolve against the inventory and are dropped otherwise.
pub(crate) fn resolve_refs(refs: &[ComponentRef], inventory: &InventoryStore) -> Vec<String> {
    let mut names = Vec::with_capacity(refs.len());
    for reference in refs {
        if let Some(name) = reference.name() {
            names.push(name.to_string());
            continue;
        }
        let id = match reference.id() {
            Some(id) => id,
            None => continue,
        };
        match inventory.components().find(|c| c.id == id) {
            Some(component) => names.push(component.name.clone()),
            None => warn!(%id, "dropping id-only component reference with no inventory record"),
        }
    }
    names
}
