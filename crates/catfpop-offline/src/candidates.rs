// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_core::CpdError;

/// Arena of live segmentation candidates.
///
/// Every slot stores the candidate's start index, its base cost `F(start)`,
/// and the running category counts of `[start, current)` in one flat slab
/// (`num_categories` cells per slot). Pruned slots go on a free list and are
/// reused by later inserts, so once the arena reaches its high-water mark the
/// scan no longer allocates. `order` lists active slots by ascending start.
#[derive(Clone, Debug)]
pub struct CandidateArena {
    num_categories: usize,
    starts: Vec<usize>,
    base_costs: Vec<f64>,
    masses: Vec<u64>,
    active: Vec<bool>,
    counts: Vec<u64>,
    free: Vec<usize>,
    order: Vec<usize>,
}

impl CandidateArena {
    pub fn new(num_categories: usize) -> Self {
        Self {
            num_categories,
            starts: vec![],
            base_costs: vec![],
            masses: vec![],
            active: vec![],
            counts: vec![],
            free: vec![],
            order: vec![],
        }
    }

    pub fn num_categories(&self) -> usize {
        self.num_categories
    }

    /// Number of active candidates.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Slots ever allocated, active or free.
    pub fn capacity(&self) -> usize {
        self.starts.len()
    }

    /// Active slots in ascending start order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Adds a candidate with empty counts. Starts must be inserted in
    /// increasing order.
    pub fn insert(&mut self, start: usize, base_cost: f64) -> usize {
        debug_assert!(
            self.order
                .last()
                .is_none_or(|&slot| self.starts[slot] < start),
            "candidates must be inserted in increasing start order"
        );

        let k = self.num_categories;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.starts[slot] = start;
                self.base_costs[slot] = base_cost;
                self.masses[slot] = 0;
                self.active[slot] = true;
                self.counts[slot * k..(slot + 1) * k].fill(0);
                slot
            }
            None => {
                let slot = self.starts.len();
                self.starts.push(start);
                self.base_costs.push(base_cost);
                self.masses.push(0);
                self.active.push(true);
                self.counts.extend(std::iter::repeat_n(0u64, k));
                slot
            }
        };
        self.order.push(slot);
        slot
    }

    /// Adds one occurrence of `category` to every active candidate.
    pub fn observe_label(&mut self, category: usize) {
        debug_assert!(category < self.num_categories);
        let k = self.num_categories;
        for &slot in &self.order {
            self.counts[slot * k + category] += 1;
            self.masses[slot] += 1;
        }
    }

    /// Adds a count row to every active candidate.
    pub fn observe_row(&mut self, row: &[u64], row_mass: u64) -> Result<(), CpdError> {
        debug_assert_eq!(row.len(), self.num_categories);
        let k = self.num_categories;
        for &slot in &self.order {
            let cells = &mut self.counts[slot * k..(slot + 1) * k];
            for (cell, &add) in cells.iter_mut().zip(row) {
                *cell = cell.checked_add(add).ok_or_else(|| {
                    CpdError::numeric_overflow(format!(
                        "candidate count overflow at start={}",
                        self.starts[slot]
                    ))
                })?;
            }
            self.masses[slot] = self.masses[slot].checked_add(row_mass).ok_or_else(|| {
                CpdError::numeric_overflow(format!(
                    "candidate mass overflow at start={}",
                    self.starts[slot]
                ))
            })?;
        }
        Ok(())
    }

    pub fn start(&self, slot: usize) -> usize {
        self.starts[slot]
    }

    pub fn base_cost(&self, slot: usize) -> f64 {
        self.base_costs[slot]
    }

    pub fn mass(&self, slot: usize) -> u64 {
        self.masses[slot]
    }

    pub fn counts(&self, slot: usize) -> &[u64] {
        let k = self.num_categories;
        &self.counts[slot * k..(slot + 1) * k]
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active[slot]
    }

    /// Marks `slot` pruned. Its data stays readable until the next insert;
    /// call [`Self::compact`] to drop it from `order`.
    pub fn prune(&mut self, slot: usize) {
        debug_assert!(self.active[slot], "slot {slot} pruned twice");
        self.active[slot] = false;
        self.free.push(slot);
    }

    /// Removes pruned slots from the iteration order.
    pub fn compact(&mut self) {
        let active = &self.active;
        self.order.retain(|&slot| active[slot]);
    }
}
