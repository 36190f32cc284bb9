use munkres::{solve_assignment, WeightMatrix};
use ndarray::ArrayView2;

use crate::error::{Error, Result};

/// Row-indexed assignment: `result[row]` is the matched column, if any.
pub type Assignment = Vec<Option<usize>>;

/// Minimum-cost bipartite matching over a (possibly rectangular) cost matrix.
///
/// Implementations must return exactly one entry per row and use every column
/// at most once. They may pair rows with zero-benefit columns; callers filter
/// those out.
pub trait AssignmentSolver: Send {
    fn solve(&self, costs: ArrayView2<'_, f64>) -> Result<Assignment>;
}

/// Hungarian algorithm from the `munkres` crate.
///
/// The matrix is padded to square with zero cost; rows landing on a padding
/// column come back unassigned.
#[derive(Debug, Default, Clone, Copy)]
pub struct MunkresSolver;

impl AssignmentSolver for MunkresSolver {
    fn solve(&self, costs: ArrayView2<'_, f64>) -> Result<Assignment> {
        let (rows, cols) = costs.dim();

        if rows == 0 || cols == 0 {
            return Ok(vec![None; rows]);
        }

        if let Some(bad) = costs.iter().find(|c| !c.is_finite()) {
            return Err(Error::assignment(format!(
                "cost matrix {}x{} contains non-finite value {}",
                rows, cols, bad
            )));
        }

        let n = rows.max(cols);
        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < rows && c < cols {
                costs[[r, c]]
            } else {
                0.0
            }
        });

        let positions = solve_assignment(&mut mat)
            .map_err(|err| Error::assignment(format!("{:?}", err)))?;

        let mut assignment = vec![None; rows];
        for pos in positions {
            if pos.row < rows && pos.column < cols {
                assignment[pos.row] = Some(pos.column);
            }
        }

        Ok(assignment)
    }
}
