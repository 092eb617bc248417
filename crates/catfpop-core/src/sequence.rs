// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;

/// Memory layout of an `n x K` count matrix.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryLayout {
    /// Row-major: the K counts of observation `t` are adjacent.
    #[default]
    CContiguous,
    /// Column-major: the n counts of category `k` are adjacent.
    FContiguous,
}

/// Borrowed observation storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceData<'a> {
    /// One category index per observation.
    Labels(&'a [usize]),
    /// Per-observation category counts (one-hot rows for single draws).
    Counts {
        values: &'a [u32],
        layout: MemoryLayout,
    },
}

/// Validated, read-only view over a categorical sequence.
///
/// Construction checks every observation against the alphabet once, so the
/// detectors can index without re-validating in the hot loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoricalSequence<'a> {
    pub data: SequenceData<'a>,
    pub n: usize,
    pub num_categories: usize,
}

fn check_num_categories(num_categories: usize) -> Result<(), CpdError> {
    if num_categories == 0 {
        return Err(CpdError::invalid_input(
            "num_categories must be >= 1; got 0",
        ));
    }
    Ok(())
}

impl<'a> CategoricalSequence<'a> {
    /// Builds a view over category labels in `[0, num_categories)`.
    pub fn from_labels(labels: &'a [usize], num_categories: usize) -> Result<Self, CpdError> {
        check_num_categories(num_categories)?;

        if let Some((t, &label)) = labels
            .iter()
            .enumerate()
            .find(|(_, label)| **label >= num_categories)
        {
            return Err(CpdError::invalid_input(format!(
                "observation out of range at t={t}: category={label}, num_categories={num_categories}"
            )));
        }

        Ok(Self {
            data: SequenceData::Labels(labels),
            n: labels.len(),
            num_categories,
        })
    }

    /// Builds a view over an `n x num_categories` count matrix.
    pub fn from_counts(
        values: &'a [u32],
        n: usize,
        num_categories: usize,
        layout: MemoryLayout,
    ) -> Result<Self, CpdError> {
        check_num_categories(num_categories)?;

        let expected_len = n.checked_mul(num_categories).ok_or_else(|| {
            CpdError::invalid_input("n*num_categories overflow while validating shape")
        })?;
        if values.len() != expected_len {
            return Err(CpdError::invalid_input(format!(
                "count matrix length mismatch: got {}, expected {expected_len} (n={n}, num_categories={num_categories})",
                values.len()
            )));
        }

        Ok(Self {
            data: SequenceData::Counts { values, layout },
            n,
            num_categories,
        })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the label at `t` for label-backed views.
    pub fn label(&self, t: usize) -> Option<usize> {
        match self.data {
            SequenceData::Labels(labels) => labels.get(t).copied(),
            SequenceData::Counts { .. } => None,
        }
    }

    /// Count of `category` observed at index `t`.
    ///
    /// # Panics
    /// Panics if `t >= n` or `category >= num_categories`.
    pub fn count(&self, t: usize, category: usize) -> u32 {
        assert!(
            t < self.n && category < self.num_categories,
            "count index out of bounds: t={t}, category={category}, n={}, num_categories={}",
            self.n,
            self.num_categories
        );
        match self.data {
            SequenceData::Labels(labels) => u32::from(labels[t] == category),
            SequenceData::Counts {
                values,
                layout: MemoryLayout::CContiguous,
            } => values[t * self.num_categories + category],
            SequenceData::Counts {
                values,
                layout: MemoryLayout::FContiguous,
            } => values[category * self.n + t],
        }
    }

    /// Writes the counts of observation `t` into `row` (length `num_categories`).
    pub fn copy_row(&self, t: usize, row: &mut [u64]) {
        debug_assert_eq!(row.len(), self.num_categories);
        match self.data {
            SequenceData::Labels(labels) => {
                row.fill(0);
                row[labels[t]] = 1;
            }
            SequenceData::Counts {
                values,
                layout: MemoryLayout::CContiguous,
            } => {
                let start = t * self.num_categories;
                for (dst, &src) in row
                    .iter_mut()
                    .zip(&values[start..start + self.num_categories])
                {
                    *dst = u64::from(src);
                }
            }
            SequenceData::Counts {
                values,
                layout: MemoryLayout::FContiguous,
            } => {
                for (category, dst) in row.iter_mut().enumerate() {
                    *dst = u64::from(values[category * self.n + t]);
                }
            }
        }
    }
}

/// Expands labels into a row-major one-hot count matrix.
pub fn one_hot(labels: &[usize], num_categories: usize) -> Result<Vec<u32>, CpdError> {
    let view = CategoricalSequence::from_labels(labels, num_categories)?;
    let len = view
        .n
        .checked_mul(num_categories)
        .ok_or_else(|| CpdError::invalid_input("n*num_categories overflow in one_hot"))?;
    let mut out = vec![0u32; len];
    for (t, &label) in labels.iter().enumerate() {
        out[t * num_categories + label] = 1;
    }
    Ok(out)
}
