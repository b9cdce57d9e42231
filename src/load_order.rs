//! # Load Order
//!
//! Strategy trait deciding which root wins when several roots provide the
//! same virtual path.
//!
//! ## Responsibility
//! - Put the candidate roots in a total order before fusion
//! - Roots later in the order overwrite earlier ones on collision
//!
//! ## Dependencies
//! - [`FsError`] for rejecting orders that are not permutations
//!
//! ## Usage
//!
//! ```rust
//! use assetfs::LoadOrderProvider;
//!
//! /// Loads anything under a "patches" directory last, so it wins.
//! struct PatchesLast;
//!
//! impl LoadOrderProvider for PatchesLast {
//!     fn order_paths(&self, candidates: &[String]) -> Vec<String> {
//!         let mut ordered = candidates.to_vec();
//!         ordered.sort_by_key(|path| path.contains("/patches/"));
//!         ordered
//!     }
//! }
//! ```

use crate::FsError;

// ============================================================================
// Trait Definition
// ============================================================================

/// Strategy for ordering fusion roots by load priority.
///
/// Called exactly once per manager build, with the physical path of every
/// root. The result must contain the same paths, in any order; the manager
/// rejects anything else with [`FsError::LoadOrder`].
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Closures
///
/// Any `Fn(&[String]) -> Vec<String> + Send + Sync` is a provider:
///
/// ```rust
/// use assetfs::ResourceManager;
///
/// let reversed = |c: &[String]| c.iter().rev().cloned().collect::<Vec<_>>();
/// let builder = ResourceManager::builder().load_order(reversed);
/// ```
pub trait LoadOrderProvider: Send + Sync {
    /// Return `candidates` in load order, lowest priority first.
    fn order_paths(&self, candidates: &[String]) -> Vec<String>;
}

impl<F> LoadOrderProvider for F
where
    F: Fn(&[String]) -> Vec<String> + Send + Sync,
{
    fn order_paths(&self, candidates: &[String]) -> Vec<String> {
        self(candidates)
    }
}

// ============================================================================
// Default Policy
// ============================================================================

/// Orders roots by the case-insensitive name of their final path component,
/// ascending. Full paths break ties so the order is total.
///
/// ```rust
/// use assetfs::{AlphabeticLoadOrder, LoadOrderProvider};
///
/// let ordered = AlphabeticLoadOrder.order_paths(&[
///     "/mods/Zebra".to_string(),
///     "/base/assets".to_string(),
///     "/mods/beta.zip".to_string(),
/// ]);
/// assert_eq!(ordered, vec!["/base/assets", "/mods/beta.zip", "/mods/Zebra"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphabeticLoadOrder;

impl LoadOrderProvider for AlphabeticLoadOrder {
    fn order_paths(&self, candidates: &[String]) -> Vec<String> {
        let mut ordered = candidates.to_vec();
        ordered.sort_by(|a, b| {
            final_component(a)
                .to_lowercase()
                .cmp(&final_component(b).to_lowercase())
                .then_with(|| a.cmp(b))
        });
        ordered
    }
}

fn final_component(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

// ============================================================================
// Application
// ============================================================================

/// Run `provider` and map its answer back to indices into `candidates`.
pub(crate) fn apply(
    provider: &dyn LoadOrderProvider,
    candidates: &[String],
) -> Result<Vec<usize>, FsError> {
    let ordered = provider.order_paths(candidates);
    let mut used = vec![false; candidates.len()];
    let mut indices = Vec::with_capacity(candidates.len());

    for path in &ordered {
        let slot = candidates
            .iter()
            .enumerate()
            .position(|(i, c)| !used[i] && c == path)
            .ok_or_else(|| FsError::LoadOrder {
                details: format!("unknown or repeated root: {path}"),
            })?;
        used[slot] = true;
        indices.push(slot);
    }

    let dropped: Vec<&str> = candidates
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(c, _)| c.as_str())
        .collect();
    if !dropped.is_empty() {
        return Err(FsError::LoadOrder {
            details: format!("roots dropped: {}", dropped.join(", ")),
        });
    }
    Ok(indices)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alphabetic_ignores_case_and_parent_dirs() {
        let ordered = AlphabeticLoadOrder.order_paths(&strings(&["/z/apple", "/a/Banana", "/m/cherry/"]));
        assert_eq!(ordered, strings(&["/z/apple", "/a/Banana", "/m/cherry/"]));
    }

    #[test]
    fn alphabetic_breaks_ties_by_full_path() {
        let ordered = AlphabeticLoadOrder.order_paths(&strings(&["/b/assets", "/a/ASSETS"]));
        assert_eq!(ordered, strings(&["/a/ASSETS", "/b/assets"]));
    }

    #[test]
    fn final_component_handles_separators() {
        assert_eq!(final_component("/x/y/"), "y");
        assert_eq!(final_component("c:\\games\\mods"), "mods");
        assert_eq!(final_component("plain"), "plain");
    }

    #[test]
    fn closures_are_providers() {
        let reversed = |c: &[String]| c.iter().rev().cloned().collect::<Vec<_>>();
        let candidates = strings(&["a", "b", "c"]);
        assert_eq!(apply(&reversed, &candidates).unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn apply_maps_duplicates_to_distinct_slots() {
        let candidates = strings(&["same", "same"]);
        assert_eq!(apply(&AlphabeticLoadOrder, &candidates).unwrap(), vec![0, 1]);
    }

    #[test]
    fn apply_rejects_unknown_roots() {
        let bogus = |_: &[String]| vec!["elsewhere".to_string()];
        let err = apply(&bogus, &strings(&["a"])).unwrap_err();
        assert!(matches!(err, FsError::LoadOrder { .. }));
    }

    #[test]
    fn apply_rejects_dropped_roots() {
        let first_only = |c: &[String]| c[..1].to_vec();
        let err = apply(&first_only, &strings(&["a", "b"])).unwrap_err();
        assert!(err.to_string().contains("roots dropped: b"));
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn LoadOrderProvider> = Box::new(AlphabeticLoadOrder);
        assert_eq!(provider.order_paths(&strings(&["b", "a"])), strings(&["a", "b"]));
    }
}
