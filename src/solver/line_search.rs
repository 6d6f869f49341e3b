//! Exact line search for the OCAS update
//!
//! Along `w(t) = (1 - t) w_old + t w_new` the objective is
//!
//! ```text
//! F(t) = 1/2 (|w_old|^2 + 2 t B0 + t^2 A0) + sum_i max(0, C_i + t B_i)
//! ```
//!
//! with `C_i = c_i (1 - m_i_old)` and `B_i = c_i (m_i_old - m_i_new)` for the
//! margins `m` and per-example costs `c`. It is piecewise quadratic with a
//! kink wherever a hinge term switches, so the minimizer is found by walking
//! the sorted kinks while the right derivative stays negative.

use crate::utils::sort_with_payload;

/// Halvings tried when the chosen step fails to decrease the objective
const MAX_RETRIES: usize = 30;

/// Outcome of a line search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchResult {
    /// Step size along `w_old -> w_new`, never negative
    pub step: f64,
    /// Objective value at `step`
    pub objective: f64,
    /// Objective value at step 0
    pub initial_objective: f64,
    /// Number of step halvings applied
    pub retries: usize,
}

/// Quadratic coefficients of `1/2 |w(t)|^2` and the hinge terms
pub struct LineSearch<'a> {
    old_output: &'a [f64],
    new_output: &'a [f64],
    costs: &'a [f64],
    a0: f64,
    b0: f64,
    sq_norm_old: f64,
}

impl<'a> LineSearch<'a> {
    /// `a0 = |w_new - w_old|^2`, `b0 = <w_old, w_new> - |w_old|^2`
    pub fn new(
        old_output: &'a [f64],
        new_output: &'a [f64],
        costs: &'a [f64],
        a0: f64,
        b0: f64,
        sq_norm_old: f64,
    ) -> Self {
        debug_assert_eq!(old_output.len(), new_output.len());
        debug_assert_eq!(old_output.len(), costs.len());
        Self {
            old_output,
            new_output,
            costs,
            a0,
            b0,
            sq_norm_old,
        }
    }

    /// Objective at step `t`
    pub fn objective(&self, t: f64) -> f64 {
        let hinge: f64 = self
            .old_output
            .iter()
            .zip(self.new_output)
            .zip(self.costs)
            .map(|((&old, &new), &c)| (c * (1.0 - old) + t * c * (old - new)).max(0.0))
            .sum();
        0.5 * (self.sq_norm_old + 2.0 * t * self.b0 + t * t * self.a0) + hinge
    }

    /// Minimize the objective over `t >= 0`
    pub fn search(&self) -> LineSearchResult {
        let mut grad = self.b0;
        let mut kinks = Vec::new();
        let mut slopes = Vec::new();

        for ((&old, &new), &c) in self.old_output.iter().zip(self.new_output).zip(self.costs) {
            let ci = c * (1.0 - old);
            let bi = c * (old - new);
            let val = if bi != 0.0 { -ci / bi } else { f64::NEG_INFINITY };

            if val > 0.0 {
                kinks.push(val);
                slopes.push(bi);
            }
            // Terms active just to the right of t = 0
            if (bi < 0.0 && val > 0.0) || (bi > 0.0 && val <= 0.0) {
                grad += bi;
            }
        }

        let mut t = 0.0;
        if grad < 0.0 {
            sort_with_payload(&mut kinks, &mut slopes);
            let mut i = 0;
            loop {
                if i == kinks.len() {
                    if self.a0 > 0.0 {
                        t -= grad / self.a0;
                    }
                    break;
                }
                let t_next = kinks[i];
                let grad_before = grad + self.a0 * (t_next - t);
                if grad_before >= 0.0 {
                    t -= grad / self.a0;
                    break;
                }
                // Crossing a kink always raises the derivative by |B_i|
                t = t_next;
                grad = grad_before + slopes[i].abs();
                i += 1;
                if grad >= 0.0 {
                    break;
                }
            }
        }
        let mut t = t.max(0.0);

        let initial_objective = self.objective(0.0);
        let mut objective = self.objective(t);
        let mut retries = 0;
        while objective > initial_objective && t > 0.0 && retries < MAX_RETRIES {
            t *= 0.5;
            objective = self.objective(t);
            retries += 1;
        }
        if objective > initial_objective {
            t = 0.0;
            objective = initial_objective;
        }

        LineSearchResult {
            step: t,
            objective,
            initial_objective,
            retries,
        }
    }
}
