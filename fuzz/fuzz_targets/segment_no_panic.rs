// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use catfpop_core::{CategoricalSequence, CpdError, MemoryLayout};
use catfpop_offline::{evaluate_segmentation, segment, segment_counts};
use libfuzzer_sys::fuzz_target;

const MAX_OBSERVATIONS: usize = 4_096;

fn penalty_from(bytes: [u8; 2]) -> f64 {
    // Mostly small finite penalties, with a slice of invalid ones.
    match bytes[0] % 16 {
        0 => -1.0,
        1 => f64::NAN,
        2 => f64::INFINITY,
        _ => f64::from(u16::from_le_bytes(bytes)) / 1024.0,
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let num_categories = usize::from(data[0] % 9);
    let penalty = penalty_from([data[1], data[2]]);
    let use_counts = data[3] % 2 == 1;
    let body = &data[4..data.len().min(4 + MAX_OBSERVATIONS)];

    let labels: Vec<usize> = body
        .iter()
        .map(|&byte| usize::from(byte) % (num_categories + 1))
        .collect();

    let outcome = if use_counts && num_categories > 0 {
        let n = body.len() / num_categories;
        let values: Vec<u32> = body[..n * num_categories]
            .iter()
            .map(|&byte| u32::from(byte % 4))
            .collect();
        segment_counts(&values, n, num_categories, MemoryLayout::CContiguous, penalty)
    } else {
        segment(&labels, num_categories, penalty)
    };

    match outcome {
        Ok(result) => {
            assert!(result.total_cost.is_finite());
            for window in result.change_points.windows(2) {
                assert!(window[0] < window[1]);
            }
            if !use_counts || num_categories == 0 {
                let view = CategoricalSequence::from_labels(&labels, num_categories)
                    .expect("segment accepted these labels");
                let evaluated = evaluate_segmentation(&view, &result.change_points, penalty)
                    .expect("returned change points are valid");
                let scale = 1.0 + evaluated.total_cost.abs();
                assert!((evaluated.total_cost - result.total_cost).abs() <= 1e-8 * scale);
            }
        }
        Err(CpdError::InvalidInput(_)) => {}
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});
