//! OCAS bundle solver over the Weighted-Degree feature space
//!
//! Minimizes
//!
//! ```text
//! F(w, b) = 1/2 (|w|^2 + b^2) + sum_i c_i max(0, 1 - y_i (<w, phi(x_i)> + b))
//! ```
//!
//! with `c_i = C1` for positive and `C2` for negative examples. Each
//! iteration adds one cutting plane of the risk term, solves the reduced
//! problem over the cut buffer for a lower bound and a candidate iterate,
//! and (for [`Method::Ocas`]) line-searches between the best iterate so far
//! and the candidate.

use crate::core::{
    ExitStatus, IterationStats, Method, OcasConfig, Result, StringFeatures, TrainingReport,
    WDError,
};
use crate::kernel::WdScorer;
use crate::solver::cuts::CutStore;
use crate::solver::line_search::LineSearch;
use crate::solver::qp::{solve_simplex, QpConfig};
use crate::utils::{dot, interpolate, sq_norm};
use log::{debug, info, warn};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Offset of the next cut's evaluation point from the line-search step
const MU: f64 = 0.1;

/// Trained weights and the run summary
#[derive(Debug, Clone)]
pub struct OcasSolution {
    pub w: Vec<f64>,
    pub bias: f64,
    pub report: TrainingReport,
}

/// Best iterate of the cutting-plane method
struct BestIterate {
    w: Vec<f64>,
    bias: f64,
    primal: f64,
    training_errors: usize,
}

/// Optimizer state: the current and previous iterates plus cut scratch space
///
/// Features, labels and scorer are borrowed read-only for the whole run.
pub struct OcasSolver<'a, F: StringFeatures> {
    features: &'a F,
    labels: &'a [f64],
    costs: Vec<f64>,
    scorer: &'a WdScorer,
    config: &'a OcasConfig,
    w: Vec<f64>,
    old_w: Vec<f64>,
    bias: f64,
    old_bias: f64,
    /// Dense accumulator for the cut under construction
    scratch: Vec<f64>,
}

impl<'a, F: StringFeatures> OcasSolver<'a, F> {
    /// Allocate a zero iterate; inputs must already be validated
    ///
    /// Fails with [`WDError::DimensionOverflow`] when the three dense
    /// buffers of the feature space cannot be allocated.
    pub fn new(
        features: &'a F,
        labels: &'a [f64],
        scorer: &'a WdScorer,
        config: &'a OcasConfig,
    ) -> Result<Self> {
        let costs = labels
            .iter()
            .map(|&y| if y > 0.0 { config.c1 } else { config.c2 })
            .collect();
        Ok(Self {
            features,
            labels,
            costs,
            scorer,
            config,
            w: zeroed(scorer)?,
            old_w: zeroed(scorer)?,
            bias: 0.0,
            old_bias: 0.0,
            scratch: zeroed(scorer)?,
        })
    }

    /// Margin `y_i (<w, phi(x_i)> + b)` of example `i` at the current iterate
    fn margin(&self, i: usize) -> f64 {
        let score = self.scorer.score(self.features.feature_vector(i), &self.w);
        self.labels[i] * (score + self.bias)
    }

    /// Margins of all examples at the current iterate
    #[cfg(not(feature = "parallel"))]
    pub fn compute_output(&self, output: &mut [f64]) {
        for (i, out) in output.iter_mut().enumerate() {
            *out = self.margin(i);
        }
    }

    /// Margins of all examples at the current iterate
    #[cfg(feature = "parallel")]
    pub fn compute_output(&self, output: &mut [f64]) {
        output
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, out)| *out = self.margin(i));
    }

    /// Build the cut `sum_{i in cut} c_i y_i phi(x_i)` and store it
    pub fn add_new_cut(&mut self, cut: &[usize], store: &mut CutStore) -> usize {
        let features = self.features;
        let scorer = self.scorer;
        let coefficients: Vec<(usize, f64)> = cut
            .iter()
            .map(|&i| (i, self.costs[i] * self.labels[i]))
            .collect();
        let single = scorer.layout().w_dim_single_char();

        self.scratch.fill(0.0);
        let fill_slab = |(j, slab): (usize, &mut [f64])| {
            for &(i, coef) in &coefficients {
                scorer.accumulate_position(features.feature_vector(i), j, coef, slab);
            }
        };
        #[cfg(feature = "parallel")]
        self.scratch
            .par_chunks_mut(single)
            .enumerate()
            .for_each(fill_slab);
        #[cfg(not(feature = "parallel"))]
        self.scratch.chunks_mut(single).enumerate().for_each(fill_slab);

        let bias = if self.config.use_bias {
            coefficients.iter().map(|&(_, coef)| coef).sum()
        } else {
            0.0
        };
        let offset = cut.iter().map(|&i| self.costs[i]).sum();
        store.add_cut(&self.scratch, bias, offset)
    }

    /// Set the iterate to `sum_t alpha_t a_t`, keeping the previous one as old
    ///
    /// Returns `(|w|^2, <w, w_old>)`, both including the bias dimension.
    pub fn compute_w(&mut self, alpha: &[f64], store: &CutStore) -> (f64, f64) {
        std::mem::swap(&mut self.w, &mut self.old_w);
        self.old_bias = self.bias;

        self.w.fill(0.0);
        let mut bias = 0.0;
        for (cut, &a) in store.cuts().iter().zip(alpha) {
            if a > 0.0 {
                cut.add_scaled_to(a, &mut self.w);
                bias += a * cut.bias();
            }
        }
        self.bias = bias;

        let sq_norm_w = sq_norm(&self.w) + bias * bias;
        let dp_w_old_w = dot(&self.w, &self.old_w) + bias * self.old_bias;
        (sq_norm_w, dp_w_old_w)
    }

    /// Move to `(1 - t) w_old + t w`, returning the new `|w|^2` with bias
    pub fn update_w(&mut self, t: f64) -> f64 {
        let sq = interpolate(&mut self.w, &self.old_w, t);
        self.bias = self.old_bias * (1.0 - t) + t * self.bias;
        sq + self.bias * self.bias
    }

    /// Run bundle iterations until a stopping rule fires
    pub fn solve(self) -> Result<OcasSolution> {
        let store = CutStore::new(self.config.bufsize);
        self.solve_with_cuts(store)
    }

    /// Run bundle iterations on top of cuts already in `store`
    ///
    /// Stored cuts must come from the same examples, labels and costs, so
    /// that they remain lower bounds of the risk. They start with zero
    /// weight. The store's capacity bounds the run instead of `bufsize`.
    pub fn solve_with_cuts(mut self, mut store: CutStore) -> Result<OcasSolution> {
        if store.is_full() {
            return Err(WDError::InvalidParameter(format!(
                "Cut buffer has no free slot ({} of {} used)",
                store.len(),
                store.capacity()
            )));
        }

        let start = Instant::now();
        let n = self.labels.len();
        let qp_config = QpConfig::default();

        let mut alpha: Vec<f64> = Vec::with_capacity(store.capacity());
        alpha.resize(store.len(), 0.0);
        let mut output = vec![0.0; n];
        let mut old_output = vec![0.0; n];

        // w = 0: every example is inside the margin
        let mut new_cut: Vec<usize> = (0..n).collect();
        let mut sq_norm_w = 0.0;
        let mut primal: f64 = self.costs.iter().sum();
        let mut dual: f64 = 0.0;
        let mut training_errors = n;
        let mut iterations = 0;
        let mut trace = Vec::new();
        let mut best: Option<BestIterate> = None;

        info!(
            "OCAS training: {} examples, w_dim={}, method={:?}, C1={}, C2={}, bufsize={}",
            n,
            self.w.len(),
            self.config.method,
            self.config.c1,
            self.config.c2,
            store.capacity()
        );

        let status = loop {
            iterations += 1;

            self.add_new_cut(&new_cut, &mut store);
            alpha.push(0.0);

            let qp = solve_simplex(store.gram(), &store.offsets(), &mut alpha, &qp_config);
            if !qp.converged {
                debug!("reduced problem stopped after {} iterations", qp.iterations);
            }
            dual = dual.max(qp.dual_objective);
            store.record_activity(&alpha);

            let sq_norm_old = sq_norm_w;
            let (sq_norm_new, dp_w_old_w) = self.compute_w(&alpha, &store);

            let mut xi = 0.0;
            training_errors = 0;
            match self.config.method {
                Method::CuttingPlane => {
                    sq_norm_w = sq_norm_new;
                    self.compute_output(&mut output);
                    new_cut.clear();
                    for (i, &out) in output.iter().enumerate() {
                        if out <= 0.0 {
                            training_errors += 1;
                        }
                        if out <= 1.0 {
                            xi += self.costs[i] * (1.0 - out);
                            new_cut.push(i);
                        }
                    }
                    let current = 0.5 * sq_norm_w + xi;
                    if best.as_ref().map_or(true, |b| current < b.primal) {
                        best = Some(BestIterate {
                            w: self.w.clone(),
                            bias: self.bias,
                            primal: current,
                            training_errors,
                        });
                    }
                    if let Some(b) = &best {
                        primal = b.primal;
                        training_errors = b.training_errors;
                    }
                }
                Method::Ocas => {
                    std::mem::swap(&mut output, &mut old_output);
                    self.compute_output(&mut output);

                    let a0 = sq_norm_new - 2.0 * dp_w_old_w + sq_norm_old;
                    let b0 = dp_w_old_w - sq_norm_old;
                    let search =
                        LineSearch::new(&old_output, &output, &self.costs, a0, b0, sq_norm_old)
                            .search();
                    debug!(
                        "line search: t={} objective {:.6} -> {:.6} ({} halvings)",
                        search.step, search.initial_objective, search.objective, search.retries
                    );

                    let t1 = search.step;
                    let t2 = t1 + MU * (1.0 - t1);
                    sq_norm_w = self.update_w(t1);

                    new_cut.clear();
                    for i in 0..n {
                        if old_output[i] * (1.0 - t2) + t2 * output[i] <= 1.0 {
                            new_cut.push(i);
                        }
                        output[i] = old_output[i] * (1.0 - t1) + t1 * output[i];
                        if output[i] <= 1.0 {
                            xi += self.costs[i] * (1.0 - output[i]);
                        }
                        if output[i] <= 0.0 {
                            training_errors += 1;
                        }
                    }
                    primal = 0.5 * sq_norm_w + xi;
                }
            }

            trace.push(IterationStats {
                iteration: iterations,
                primal_objective: primal,
                dual_objective: dual,
                cut_count: store.len(),
                training_errors,
            });
            debug!(
                "iter {:4}: primal={:.6} dual={:.6} gap={:.3e} cuts={} nnz_alpha={} errors={}",
                iterations,
                primal,
                dual,
                primal - dual,
                store.len(),
                alpha.iter().filter(|&&a| a > 0.0).count(),
                training_errors
            );

            let gap = primal - dual;
            if gap <= self.config.epsilon * primal.abs() {
                break ExitStatus::Converged;
            }
            if gap <= self.config.tol_abs {
                break ExitStatus::AbsoluteTolerance;
            }
            if primal <= self.config.qp_bound {
                break ExitStatus::ObjectiveBound;
            }
            if let Some(limit) = self.config.max_time {
                if start.elapsed() >= limit {
                    break ExitStatus::MaxTime;
                }
            }
            if iterations >= self.config.max_iterations {
                break ExitStatus::MaxIterations;
            }
            if store.is_full() {
                match store.evict_idle(&mut alpha) {
                    Some(victim) => debug!("evicted idle cut {victim}"),
                    None => break ExitStatus::BufferFull,
                }
            }
        };

        if let Some(b) = best {
            self.w = b.w;
            self.bias = b.bias;
        }

        let report = TrainingReport {
            status,
            iterations,
            primal_objective: primal,
            dual_objective: dual,
            cut_count: store.len(),
            training_errors,
            elapsed: start.elapsed(),
            trace,
        };

        if report.is_converged() {
            info!(
                "OCAS finished ({:?}) after {} iterations: primal={:.6} dual={:.6}",
                status, iterations, primal, dual
            );
        } else {
            warn!(
                "OCAS stopped before reaching the requested gap ({:?}) after {} iterations: relative gap {:.3e}",
                status,
                iterations,
                report.relative_gap()
            );
        }

        Ok(OcasSolution {
            w: self.w,
            bias: if self.config.use_bias { self.bias } else { 0.0 },
            report,
        })
    }
}

/// Zero-filled dense buffer over the scorer's feature space
fn zeroed(scorer: &WdScorer) -> Result<Vec<f64>> {
    let layout = scorer.layout();
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(layout.w_dim())
        .map_err(|_| WDError::DimensionOverflow {
            alphabet_size: layout.alphabet_size(),
            degree: layout.degree(),
            string_length: layout.string_length(),
        })?;
    buffer.resize(layout.w_dim(), 0.0);
    Ok(buffer)
}
