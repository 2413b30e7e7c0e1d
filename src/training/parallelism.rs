//! Thread-count setting for tree fitting

use crate::{GradeError, Result};

/// How trees in a forest are fitted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// Fit trees one after another on the calling thread
    #[default]
    Sequential,
    /// Fit trees on a dedicated pool of `n` threads
    Parallel(usize),
}

impl Parallelism {
    /// Create from a job count.
    ///
    /// - `0` → all available cores
    /// - `1` → sequential
    /// - `n > 1` → parallel with n threads
    pub fn from_jobs(n_jobs: usize) -> Self {
        match n_jobs {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }

    /// Downgrade to sequential when there are too few trees to share out
    pub fn correct_for_workload(self, n_items: usize) -> Self {
        match self {
            Self::Sequential => Self::Sequential,
            Self::Parallel(n) => {
                let threads = n.min(n_items).max(1);
                if threads <= 1 {
                    Self::Sequential
                } else {
                    Self::Parallel(threads)
                }
            }
        }
    }

    /// Run `op` sequentially or inside a rayon pool of the configured size
    pub fn install<T, F>(self, op: F) -> Result<T>
    where
        F: FnOnce(bool) -> T + Send,
        T: Send,
    {
        match self {
            Self::Sequential => Ok(op(false)),
            Self::Parallel(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| GradeError::Config(format!("Failed to start thread pool: {}", e)))?;
                Ok(pool.install(|| op(true)))
            }
        }
    }
}
