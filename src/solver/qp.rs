//! Reduced problem over the cut buffer
//!
//! Solves
//!
//! ```text
//! max_alpha  b'alpha - 1/2 alpha' H alpha
//! s.t.       alpha >= 0,  sum(alpha) <= 1
//! ```
//!
//! by pairwise (SMO-style) coordinate moves on the simplex. The inequality is
//! turned into an equality with an implicit slack coordinate whose Hessian
//! row and linear term are zero. Any feasible alpha yields a valid lower
//! bound on the training objective, and warm starting from the previous
//! solution makes the bound non-decreasing across bundle iterations.

/// Stopping parameters for the reduced problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QpConfig {
    pub max_iterations: usize,
    /// Stop when the Frank-Wolfe gap is below `tol_rel * max(1, |objective|)`
    pub tol_rel: f64,
}

impl Default for QpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tol_rel: 1e-10,
        }
    }
}

/// Outcome of one reduced-problem solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QpResult {
    /// `b'alpha - 1/2 alpha' H alpha` at the returned alpha
    pub dual_objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Coordinate index that may be the slack variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coord {
    Slack,
    Cut(usize),
}

/// Solve the reduced problem in place, starting from the feasible `alpha`
pub fn solve_simplex(h: &[Vec<f64>], b: &[f64], alpha: &mut [f64], config: &QpConfig) -> QpResult {
    let n = alpha.len();
    debug_assert_eq!(h.len(), n);
    debug_assert_eq!(b.len(), n);

    // Gradient of the minimization form 1/2 a'Ha - b'a
    let mut grad: Vec<f64> = (0..n)
        .map(|i| {
            h[i].iter()
                .zip(alpha.iter())
                .map(|(hij, aj)| hij * aj)
                .sum::<f64>()
                - b[i]
        })
        .collect();
    let mut slack = (1.0 - alpha.iter().sum::<f64>()).max(0.0);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        // Coordinate to grow: smallest gradient (slack has gradient 0)
        let mut grow = Coord::Slack;
        let mut grow_grad = 0.0;
        for (i, &g) in grad.iter().enumerate() {
            if g < grow_grad {
                grow = Coord::Cut(i);
                grow_grad = g;
            }
        }

        // Coordinate to shrink: largest gradient among positive coordinates
        let mut shrink = None;
        let mut shrink_grad = f64::NEG_INFINITY;
        if slack > 0.0 {
            shrink = Some(Coord::Slack);
            shrink_grad = 0.0;
        }
        for (i, &g) in grad.iter().enumerate() {
            if alpha[i] > 0.0 && g > shrink_grad {
                shrink = Some(Coord::Cut(i));
                shrink_grad = g;
            }
        }

        let objective = minimization_objective(&grad, b, alpha);
        let fw_gap = alpha
            .iter()
            .zip(&grad)
            .map(|(a, g)| a * g)
            .sum::<f64>()
            - grow_grad;
        if fw_gap <= config.tol_rel * objective.abs().max(1.0) {
            converged = true;
            break;
        }

        let shrink = match shrink {
            Some(s) if s != grow => s,
            _ => {
                converged = true;
                break;
            }
        };

        let diff = shrink_grad - grow_grad;
        let curvature = hessian(h, grow, grow) + hessian(h, shrink, shrink)
            - 2.0 * hessian(h, grow, shrink);
        let available = match shrink {
            Coord::Slack => slack,
            Coord::Cut(v) => alpha[v],
        };
        let step = if curvature > 0.0 {
            (diff / curvature).min(available)
        } else {
            available
        };
        if step <= 0.0 {
            converged = true;
            break;
        }

        match grow {
            Coord::Slack => slack += step,
            Coord::Cut(u) => alpha[u] += step,
        }
        match shrink {
            Coord::Slack => slack = (slack - step).max(0.0),
            Coord::Cut(v) => {
                alpha[v] -= step;
                if alpha[v] < 0.0 || step == available {
                    alpha[v] = 0.0;
                }
            }
        }

        for (i, g) in grad.iter_mut().enumerate() {
            let row = &h[i];
            let up = match grow {
                Coord::Slack => 0.0,
                Coord::Cut(u) => row[u],
            };
            let down = match shrink {
                Coord::Slack => 0.0,
                Coord::Cut(v) => row[v],
            };
            *g += step * (up - down);
        }

        iterations += 1;
    }

    QpResult {
        dual_objective: -minimization_objective(&grad, b, alpha),
        iterations,
        converged,
    }
}

/// `1/2 a'Ha - b'a` from the gradient `Ha - b`
fn minimization_objective(grad: &[f64], b: &[f64], alpha: &[f64]) -> f64 {
    // 1/2 a'Ha - b'a = 1/2 a'(Ha - b) - 1/2 b'a
    alpha
        .iter()
        .zip(grad.iter().zip(b))
        .map(|(a, (g, bi))| 0.5 * a * (g - bi))
        .sum()
}

fn hessian(h: &[Vec<f64>], i: Coord, j: Coord) -> f64 {
    match (i, j) {
        (Coord::Cut(i), Coord::Cut(j)) => h[i][j],
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `b'alpha - 1/2 alpha' H alpha`, evaluated directly
    fn dual_objective(h: &[Vec<f64>], b: &[f64], alpha: &[f64]) -> f64 {
        let quad: f64 = alpha
            .iter()
            .enumerate()
            .map(|(i, ai)| {
                ai * h[i]
                    .iter()
                    .zip(alpha)
                    .map(|(hij, aj)| hij * aj)
                    .sum::<f64>()
            })
            .sum();
        alpha.iter().zip(b).map(|(a, bi)| a * bi).sum::<f64>() - 0.5 * quad
    }

    #[test]
    fn test_single_cut_interior_solution() {
        // max 2a - 2a^2 on [0, 1] -> a = 0.5, value 0.5
        let h = vec![vec![4.0]];
        let b = vec![2.0];
        let mut alpha = vec![0.0];
        let result = solve_simplex(&h, &b, &mut alpha, &QpConfig::default());
        assert!(result.converged);
        assert_relative_eq!(alpha[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.dual_objective, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_single_cut_bound_active() {
        // max 4a - a^2/2 on [0, 1] -> a = 1, value 3.5
        let h = vec![vec![1.0]];
        let b = vec![4.0];
        let mut alpha = vec![0.0];
        let result = solve_simplex(&h, &b, &mut alpha, &QpConfig::default());
        assert_relative_eq!(alpha[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.dual_objective, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_useless_cuts_stay_zero() {
        let h = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let b = vec![-1.0, -2.0];
        let mut alpha = vec![0.0, 0.0];
        let result = solve_simplex(&h, &b, &mut alpha, &QpConfig::default());
        assert_eq!(alpha, vec![0.0, 0.0]);
        assert_eq!(result.dual_objective, 0.0);
    }

    #[test]
    fn test_two_cuts_split_weight() {
        // Orthogonal unit cuts with large offsets: optimum on sum(alpha) = 1
        // at alpha = (0.5, 0.5): value 10 - 0.25 = 9.75
        let h = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let b = vec![10.0, 10.0];
        let mut alpha = vec![0.0, 0.0];
        let result = solve_simplex(&h, &b, &mut alpha, &QpConfig::default());
        assert_relative_eq!(alpha[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(alpha[1], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.dual_objective, 9.75, epsilon = 1e-9);
        assert_relative_eq!(
            dual_objective(&h, &b, &alpha),
            result.dual_objective,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_warm_start_never_decreases_objective() {
        let h = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let b = vec![1.0, 1.5];
        let mut alpha = vec![0.0, 0.0];
        let first = solve_simplex(&[vec![2.0]], &b[..1], &mut alpha[..1], &QpConfig::default());
        let second = solve_simplex(&h, &b, &mut alpha, &QpConfig::default());
        assert!(second.dual_objective >= first.dual_objective - 1e-12);
        assert!(alpha.iter().all(|&a| a >= 0.0));
        assert!(alpha.iter().sum::<f64>() <= 1.0 + 1e-12);
    }
}
