//! Ordered compensation for multi-step writes.
//!
//! After each successful mutating step, register the action that undoes it.
//! If a later step fails, [`Saga::finish`] runs the registered actions in
//! reverse order before handing the original error back.

use std::fmt::Display;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, info};

type Compensation = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), String>> + Send>;

/// A named sequence of compensating actions.
pub struct Saga {
    name: &'static str,
    steps: Vec<(&'static str, Compensation)>,
}

impl Saga {
    /// Start a new saga.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Register the compensation for a step that just succeeded.
    pub fn on_rollback<F, Fut, E>(&mut self, step: &'static str, compensate: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + 'static,
    {
        self.steps.push((
            step,
            Box::new(move || async move { compensate().await.map_err(|e| e.to_string()) }.boxed()),
        ));
    }

    /// Number of registered compensations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no compensation is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run all compensations, newest first.
    ///
    /// A failing compensation is logged and the remaining ones still run.
    pub async fn rollback(self) {
        if self.steps.is_empty() {
            return;
        }

        info!(saga = self.name, steps = self.steps.len(), "Rolling back");

        for (step, compensate) in self.steps.into_iter().rev() {
            if let Err(e) = compensate().await {
                error!(saga = self.name, step, error = %e, "Compensation failed");
            }
        }
    }

    /// Commit on success, roll back on error, and pass the result through.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.rollback().await;
        }
        result
    }
}
