use crate::error::{FitError, Result};

/// Relative change a loss must undercut to count as progress.
/// Negative: the loss has to drop by more than 0.1% of the best so far.
pub const DEFAULT_EPSILON: f64 = -1e-3;

/// Consecutive stalled updates before stopping.
pub const DEFAULT_PATIENCE: usize = 10;

/// Tracks the best loss and how many updates in a row failed to improve on it
/// by more than `epsilon` (relative).
#[derive(Debug, Clone)]
pub struct EarlyStop {
    min_loss: f64,
    satisfaction_count: usize,
    epsilon: f64,
    patience: usize,
}

impl Default for EarlyStop {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON, DEFAULT_PATIENCE)
    }
}

impl EarlyStop {
    pub fn new(epsilon: f64, patience: usize) -> Self {
        Self {
            min_loss: f64::INFINITY,
            satisfaction_count: 0,
            epsilon,
            patience,
        }
    }

    /// Returns `(is_new_best, should_stop)`.
    ///
    /// The relative delta is taken against the minimum seen *before* this
    /// loss. On the first call the minimum is infinite and the delta is NaN,
    /// which never satisfies `delta >= epsilon`, so the first call does not
    /// count toward patience.
    ///
    /// A minimum of exactly zero leaves the relative change undefined and is
    /// reported as [`FitError::ZeroMinimumLoss`] without touching the state.
    pub fn update(&mut self, loss: f64) -> Result<(bool, bool)> {
        if self.min_loss == 0.0 {
            return Err(FitError::ZeroMinimumLoss);
        }
        let delta = (loss - self.min_loss) / self.min_loss;

        let is_new_best = loss < self.min_loss;
        if is_new_best {
            self.min_loss = loss;
        }

        if delta >= self.epsilon {
            self.satisfaction_count += 1;
        } else {
            self.satisfaction_count = 0;
        }

        Ok((is_new_best, self.should_stop()))
    }

    pub fn should_stop(&self) -> bool {
        self.satisfaction_count >= self.patience
    }

    pub fn min_loss(&self) -> f64 {
        self.min_loss
    }

    pub fn satisfaction_count(&self) -> usize {
        self.satisfaction_count
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn patience(&self) -> usize {
        self.patience
    }
}
