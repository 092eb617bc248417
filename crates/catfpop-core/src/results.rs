// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{CpdError, Diagnostics};

/// One fitted segment `[start, end)` and its unpenalized cost.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub cost: f64,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Checks that `change_points` is strictly increasing and inside `(0, n)`.
pub fn validate_change_points(n: usize, change_points: &[usize]) -> Result<(), CpdError> {
    let mut previous = 0usize;
    for (idx, &cp) in change_points.iter().enumerate() {
        if cp == 0 || cp >= n {
            return Err(CpdError::invalid_input(format!(
                "change point {cp} at position {idx} must lie strictly inside (0, {n})"
            )));
        }
        if cp <= previous {
            return Err(CpdError::invalid_input(format!(
                "change points must be strictly increasing; got {cp} after {previous}"
            )));
        }
        previous = cp;
    }
    Ok(())
}

/// Final segmentation of a categorical sequence.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    /// Strictly increasing indices in `[1, n - 1]`.
    pub change_points: Vec<usize>,
    /// `change_points` followed by `n` (empty for an empty sequence).
    pub breakpoints: Vec<usize>,
    pub segments: Vec<Segment>,
    /// Sum of segment costs plus penalty times the number of change points.
    pub total_cost: f64,
    /// Optimal predecessor of every prefix endpoint `0..=n`; entry 0 is 0.
    pub predecessors: Vec<usize>,
    pub diagnostics: Diagnostics,
}

impl Segmentation {
    pub fn new(
        n: usize,
        change_points: Vec<usize>,
        segments: Vec<Segment>,
        total_cost: f64,
        predecessors: Vec<usize>,
        diagnostics: Diagnostics,
    ) -> Result<Self, CpdError> {
        validate_change_points(n, &change_points)?;

        if !total_cost.is_finite() {
            return Err(CpdError::numeric_overflow(format!(
                "segmentation total_cost must be finite; got {total_cost}"
            )));
        }
        if predecessors.len() != n + 1 {
            return Err(CpdError::invalid_input(format!(
                "predecessor table length mismatch: got {}, expected {}",
                predecessors.len(),
                n + 1
            )));
        }

        let mut breakpoints = change_points.clone();
        if n > 0 {
            breakpoints.push(n);
        }

        if segments.len() != breakpoints.len() {
            return Err(CpdError::invalid_input(format!(
                "segment count mismatch: got {}, expected {}",
                segments.len(),
                breakpoints.len()
            )));
        }
        let mut start = 0usize;
        for (segment, &end) in segments.iter().zip(&breakpoints) {
            if segment.start != start || segment.end != end {
                return Err(CpdError::invalid_input(format!(
                    "segment [{}, {}) does not match expected [{start}, {end})",
                    segment.start, segment.end
                )));
            }
            start = end;
        }

        Ok(Self {
            change_points,
            breakpoints,
            segments,
            total_cost,
            predecessors,
            diagnostics,
        })
    }

    /// Result for an empty sequence: no segments, cost 0.
    pub fn empty(diagnostics: Diagnostics) -> Self {
        Self {
            change_points: vec![],
            breakpoints: vec![],
            segments: vec![],
            total_cost: 0.0,
            predecessors: vec![0],
            diagnostics,
        }
    }

    pub fn n(&self) -> usize {
        self.breakpoints.last().copied().unwrap_or(0)
    }

    pub fn num_change_points(&self) -> usize {
        self.change_points.len()
    }

    /// Predecessor table with `-1` marking the start of the sequence.
    pub fn path(&self) -> Vec<i64> {
        self.predecessors
            .iter()
            .enumerate()
            .map(|(t, &tau)| if t == 0 { -1 } else { tau as i64 })
            .collect()
    }
}
