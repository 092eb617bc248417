// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_core::CpdError;

/// Marks a prefix endpoint whose predecessor was never written.
pub(crate) const NO_PREDECESSOR: usize = usize::MAX;

/// Follows `predecessors` back from `n` and returns the change points in
/// ascending order.
pub fn reconstruct_change_points(n: usize, predecessors: &[usize]) -> Result<Vec<usize>, CpdError> {
    if predecessors.len() != n + 1 {
        return Err(CpdError::invalid_input(format!(
            "invalid DP backtrack state: predecessor table has length {}, expected {}",
            predecessors.len(),
            n + 1
        )));
    }

    let mut reverse = vec![];
    let mut cursor = n;
    let mut hops = 0usize;

    while cursor > 0 {
        hops = hops
            .checked_add(1)
            .ok_or_else(|| CpdError::resource_limit("backtrack hop overflow"))?;
        if hops > n + 1 {
            return Err(CpdError::invalid_input(
                "invalid DP backtrack state: cycle detected",
            ));
        }

        let tau = predecessors[cursor];
        if tau == NO_PREDECESSOR {
            return Err(CpdError::invalid_input(format!(
                "invalid DP backtrack state: missing predecessor at t={cursor}"
            )));
        }
        if tau >= cursor {
            return Err(CpdError::invalid_input(format!(
                "invalid DP backtrack state: predecessor tau={tau} is not < t={cursor}"
            )));
        }
        if tau == 0 {
            break;
        }
        reverse.push(tau);
        cursor = tau;
    }

    reverse.reverse();
    Ok(reverse)
}

#[cfg(test)]
mod tests {
    use super::{NO_PREDECESSOR, reconstruct_change_points};

    #[test]
    fn follows_chain_to_origin() {
        // 0 <- 3 <- 5 <- 8
        let predecessors = [0, 0, 0, 0, 3, 3, 5, 5, 5];
        let change_points = reconstruct_change_points(8, &predecessors).expect("valid chain");
        assert_eq!(change_points, vec![3, 5]);
    }

    #[test]
    fn single_segment_has_no_change_points() {
        let predecessors = [0, 0, 0, 0];
        assert!(reconstruct_change_points(3, &predecessors)
            .expect("valid")
            .is_empty());
        assert!(reconstruct_change_points(0, &[0]).expect("valid").is_empty());
    }

    #[test]
    fn rejects_missing_or_forward_predecessors() {
        let err = reconstruct_change_points(3, &[0, 0, 0, NO_PREDECESSOR])
            .expect_err("missing predecessor");
        assert!(err.to_string().contains("missing predecessor at t=3"));

        let err = reconstruct_change_points(3, &[0, 0, 3, 2]).expect_err("forward pointer");
        assert!(err.to_string().contains("is not < t=2"));

        let err = reconstruct_change_points(3, &[0, 0]).expect_err("short table");
        assert!(err.to_string().contains("predecessor table has length 2"));
    }
}
