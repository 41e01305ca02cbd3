use crate::math::Array2;

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the system is (numerically) singular. Used for the
/// normal-equation fits; the matrices involved are small (tens of columns),
/// so no factorization machinery is warranted.
pub fn solve_linear_system(a: &Array2<f64>, b: &[f64]) -> Option<Vec<f64>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "solve_linear_system requires a square matrix");
    assert_eq!(n, b.len(), "right-hand side length mismatch");

    // Augmented working copy.
    let mut aug = vec![vec![0.0f64; n + 1]; n];
    for r in 0..n {
        for c in 0..n {
            aug[r][c] = a[(r, c)];
        }
        aug[r][n] = b[r];
    }

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if aug[row][col].abs() > aug[pivot][col].abs() {
                pivot = row;
            }
        }
        if aug[pivot][col].abs() < 1e-12 {
            return None;
        }
        aug.swap(col, pivot);

        for row in col + 1..n {
            let factor = aug[row][col] / aug[col][col];
            for c in col..=n {
                aug[row][c] -= factor * aug[col][c];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut acc = aug[row][n];
        for c in row + 1..n {
            acc -= aug[row][c] * x[c];
        }
        x[row] = acc / aug[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        let a = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 3.0]).unwrap();
        let x = solve_linear_system(&a, &[5.0, 10.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9, "x0 = {}", x[0]);
        assert!((x[1] - 3.0).abs() < 1e-9, "x1 = {}", x[1]);
    }

    #[test]
    fn singular_system_returns_none() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        assert!(solve_linear_system(&a, &[1.0, 2.0]).is_none());
    }
}
