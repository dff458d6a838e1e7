//! Z-order registry for window stacking.
//!
//! Ranks are kept as a dense `1..N` permutation: every raise or removal
//! renormalizes immediately, and entries for surfaces that no longer exist
//! are pruned lazily on the next mutation via the caller-supplied aliveness
//! check.

use crate::window::WindowId;

/// Assigns and renormalizes stacking order among mounted surfaces.
#[derive(Debug, Default)]
pub struct ZOrderRegistry {
    /// (surface, rank) pairs; rank 1 is the bottom of the stack.
    mapping: Vec<(WindowId, u32)>,
}

impl ZOrderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a surface to the top of the stack.
    ///
    /// Unknown surfaces are inserted. Renormalization is synchronous with
    /// the raise; two consecutive raises never interleave with a stale
    /// pruning pass.
    pub fn raise(&mut self, id: WindowId) {
        let top = self.mapping.len() as u32 + 1;
        match self.mapping.iter_mut().find(|(wid, _)| *wid == id) {
            Some(entry) => entry.1 = top,
            None => self.mapping.push((id, top)),
        }
        self.renormalize();
    }

    /// Remove a surface.
    pub fn remove(&mut self, id: WindowId) {
        self.mapping.retain(|(wid, _)| *wid != id);
        self.renormalize();
    }

    /// Prune entries whose surface is gone, then renormalize.
    pub fn prune(&mut self, alive: impl Fn(WindowId) -> bool) {
        self.mapping.retain(|(wid, _)| alive(*wid));
        self.renormalize();
    }

    /// Rank of a surface (1 = bottom, N = top).
    pub fn rank_of(&self, id: WindowId) -> Option<u32> {
        self.mapping
            .iter()
            .find(|(wid, _)| *wid == id)
            .map(|(_, rank)| *rank)
    }

    /// The topmost surface, if any.
    pub fn top(&self) -> Option<WindowId> {
        self.mapping
            .iter()
            .max_by_key(|(_, rank)| *rank)
            .map(|(wid, _)| *wid)
    }

    /// Surfaces ordered bottom to top.
    pub fn ordered(&self) -> Vec<WindowId> {
        let mut sorted = self.mapping.clone();
        sorted.sort_by_key(|(_, rank)| *rank);
        sorted.into_iter().map(|(wid, _)| wid).collect()
    }

    /// All (surface, rank) pairs in insertion order.
    pub fn ranks(&self) -> &[(WindowId, u32)] {
        &self.mapping
    }

    /// Number of tracked surfaces.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    fn renormalize(&mut self) {
        self.mapping.sort_by_key(|(_, rank)| *rank);
        for (i, entry) in self.mapping.iter_mut().enumerate() {
            entry.1 = i as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks_are_dense(reg: &ZOrderRegistry) -> bool {
        let mut ranks: Vec<u32> = reg.ranks().iter().map(|(_, r)| *r).collect();
        ranks.sort_unstable();
        ranks.iter().enumerate().all(|(i, r)| *r == i as u32 + 1)
    }

    #[test]
    fn test_raise_puts_on_top() {
        let mut reg = ZOrderRegistry::new();
        reg.raise(1);
        reg.raise(2);
        reg.raise(3);
        assert_eq!(reg.top(), Some(3));

        reg.raise(1);
        assert_eq!(reg.top(), Some(1));
        assert_eq!(reg.ordered(), vec![2, 3, 1]);
    }

    #[test]
    fn test_ranks_always_dense_permutation() {
        let mut reg = ZOrderRegistry::new();
        for id in 1..=5 {
            reg.raise(id);
        }
        // Arbitrary raise sequence.
        for id in [3, 3, 1, 5, 2, 4, 1] {
            reg.raise(id);
            assert!(ranks_are_dense(&reg));
            assert_eq!(reg.len(), 5);
        }
    }

    #[test]
    fn test_remove_renormalizes() {
        let mut reg = ZOrderRegistry::new();
        for id in 1..=4 {
            reg.raise(id);
        }
        reg.remove(2);
        assert!(ranks_are_dense(&reg));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.ordered(), vec![1, 3, 4]);
    }

    #[test]
    fn test_prune_detached_surfaces() {
        let mut reg = ZOrderRegistry::new();
        for id in 1..=4 {
            reg.raise(id);
        }
        reg.prune(|id| id % 2 == 0);
        assert_eq!(reg.ordered(), vec![2, 4]);
        assert!(ranks_are_dense(&reg));
    }

    #[test]
    fn test_rank_of_missing() {
        let reg = ZOrderRegistry::new();
        assert_eq!(reg.rank_of(9), None);
        assert_eq!(reg.top(), None);
    }
}
