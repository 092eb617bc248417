// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_core::{CategoricalSequence, CpdError};

/// Running per-category counts of one segment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: Vec<u64>,
    total: u64,
}

fn count_overflow(category: usize) -> CpdError {
    CpdError::numeric_overflow(format!("category count overflow at category={category}"))
}

impl CategoryCounts {
    pub fn new(num_categories: usize) -> Result<Self, CpdError> {
        if num_categories == 0 {
            return Err(CpdError::invalid_input(
                "num_categories must be >= 1; got 0",
            ));
        }
        Ok(Self {
            counts: vec![0; num_categories],
            total: 0,
        })
    }

    pub fn num_categories(&self) -> usize {
        self.counts.len()
    }

    /// Records one occurrence of `category`.
    pub fn observe(&mut self, category: usize) -> Result<(), CpdError> {
        let num_categories = self.counts.len();
        let slot = self.counts.get_mut(category).ok_or_else(|| {
            CpdError::invalid_input(format!(
                "category out of range: category={category}, num_categories={num_categories}"
            ))
        })?;
        *slot = slot.checked_add(1).ok_or_else(|| count_overflow(category))?;
        self.total = self
            .total
            .checked_add(1)
            .ok_or_else(|| count_overflow(category))?;
        Ok(())
    }

    /// Adds a full count row (length `num_categories`).
    pub fn observe_row(&mut self, row: &[u64]) -> Result<(), CpdError> {
        if row.len() != self.counts.len() {
            return Err(CpdError::invalid_input(format!(
                "count row length mismatch: got {}, expected {}",
                row.len(),
                self.counts.len()
            )));
        }
        for (category, (slot, &add)) in self.counts.iter_mut().zip(row).enumerate() {
            *slot = slot.checked_add(add).ok_or_else(|| count_overflow(category))?;
            self.total = self
                .total
                .checked_add(add)
                .ok_or_else(|| count_overflow(category))?;
        }
        Ok(())
    }

    /// Adds observation `t` of `x`, whichever storage backs it.
    pub fn observe_at(&mut self, x: &CategoricalSequence<'_>, t: usize) -> Result<(), CpdError> {
        if t >= x.n {
            return Err(CpdError::invalid_input(format!(
                "observation index out of range: t={t}, n={}",
                x.n
            )));
        }
        match x.label(t) {
            Some(label) => self.observe(label),
            None => {
                let mut row = vec![0u64; x.num_categories];
                x.copy_row(t, &mut row);
                self.observe_row(&row)
            }
        }
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.total = 0;
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Total count mass; equals the segment length for label input.
    pub fn total(&self) -> u64 {
        self.total
    }
}
