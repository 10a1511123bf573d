use std::collections::HashSet;

use trawl_drivers::Bounds;

/// Row identities observed on the current page.
///
/// Bounds are only meaningful until the next scroll, so the set is cleared
/// whenever the page advances.
#[derive(Debug, Default)]
pub struct SeenSet {
    rows: HashSet<Bounds>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bounds: &Bounds) -> bool {
        self.rows.contains(bounds)
    }

    /// Returns `true` if `bounds` was not already present.
    pub fn insert(&mut self, bounds: Bounds) -> bool {
        self.rows.insert(bounds)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bounds> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut seen = SeenSet::new();
        let row = Bounds::new(0, 100, 1080, 400);
        assert!(seen.insert(row));
        assert!(!seen.insert(row));
        assert_eq!(seen.len(), 1);
        assert!(seen.contains(&row));

        seen.clear();
        assert!(seen.is_empty());
        assert!(!seen.contains(&row));
    }
}
