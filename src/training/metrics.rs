//! Regression fit metrics

use std::fmt;

/// Error summary of predictions against targets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegressionMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute from paired predictions and targets
    pub fn compute(predictions: &[f64], targets: &[f64]) -> Self {
        let n = predictions.len().min(targets.len());
        if n == 0 {
            return Self::default();
        }
        let nf = n as f64;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (p, t) in predictions.iter().zip(targets) {
            let err = p - t;
            abs_sum += err.abs();
            sq_sum += err * err;
        }

        let mean = targets[..n].iter().sum::<f64>() / nf;
        let total_var: f64 = targets[..n].iter().map(|t| (t - mean).powi(2)).sum();
        // Constant targets: perfect fit scores 1, anything else 0
        let r2 = if total_var > 0.0 {
            1.0 - sq_sum / total_var
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        RegressionMetrics {
            mae: abs_sum / nf,
            rmse: (sq_sum / nf).sqrt(),
            r2,
            n_samples: n,
        }
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE: {:.3} | RMSE: {:.3} | R²: {:.4} ({} samples)",
            self.mae, self.rmse, self.r2, self.n_samples
        )
    }
}
