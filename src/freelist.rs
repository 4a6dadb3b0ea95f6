use std::collections::BTreeMap;

/// The free registry: the set of disjoint `(offset, size)`
/// regions covering every unallocated byte of the arena. The
/// map is keyed by offset, so iteration always runs in address
/// order, which is what makes the best-fit tie-break below
/// deterministic.
pub(crate) struct FreeList {
    regions: BTreeMap<usize, usize>,
}

impl FreeList {
    pub fn new() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Finds the best-fitting free region for a request:
    /// the smallest region whose size is at least `size`.
    /// Replacement while scanning is strict (`<`), so among
    /// regions of equal minimal size the lowest offset wins,
    /// since the scan runs in offset order. Read-only: a
    /// failed lookup has no side effects.
    pub fn find_fit(&self, size: usize) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (&offset, &region_size) in &self.regions {
            if region_size < size {
                continue;
            }

            match best {
                Some((_, best_size)) if region_size >= best_size => {}
                _ => best = Some((offset, region_size)),
            }
        }

        best
    }

    pub fn insert(&mut self, offset: usize, size: usize) {
        self.regions.insert(offset, size);
    }

    pub fn remove(&mut self, offset: usize) -> Option<usize> {
        self.regions.remove(&offset)
    }

    /// Removes and returns the size of the region starting
    /// exactly at `offset`, if there is one. This is the
    /// adjacency probe used for forward coalescing on release:
    /// the caller passes the first byte past a freed block.
    pub fn take_at(&mut self, offset: usize) -> Option<usize> {
        self.regions.remove(&offset)
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Total free bytes across all regions.
    pub fn total(&self) -> usize {
        self.regions.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.regions.iter().map(|(&offset, &size)| (offset, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_fit_picks_smallest_region() {
        let mut free = FreeList::new();
        free.insert(0, 40);
        free.insert(50, 10);
        free.insert(70, 25);

        assert_eq!(free.find_fit(8), Some((50, 10)));
        assert_eq!(free.find_fit(20), Some((70, 25)));
        assert_eq!(free.find_fit(30), Some((0, 40)));
        assert_eq!(free.find_fit(41), None);
    }

    #[test]
    fn best_fit_ties_break_to_lowest_offset() {
        let mut free = FreeList::new();
        free.insert(80, 16);
        free.insert(10, 16);
        free.insert(40, 16);

        // All three qualify with the same size; the scan runs
        // in offset order and only replaces on strictly
        // smaller, so the first one encountered is kept.
        assert_eq!(free.find_fit(16), Some((10, 16)));
    }

    #[test]
    fn take_at_only_matches_exact_offsets() {
        let mut free = FreeList::new();
        free.insert(30, 20);

        assert_eq!(free.take_at(31), None);
        assert_eq!(free.take_at(30), Some(20));
        assert_eq!(free.len(), 0);
    }

    #[test]
    fn failed_lookup_leaves_the_set_untouched() {
        let mut free = FreeList::new();
        free.insert(0, 10);
        free.insert(20, 5);

        assert_eq!(free.find_fit(100), None);
        assert_eq!(free.len(), 2);
        assert_eq!(free.total(), 15);
    }
}
