//! # Work unit: an opaque, zero-argument callable.
//!
//! [`Work`] wraps a closure that *creates* a future when the executor starts it.
//! The pool never calls the closure; it only stores it, labels it and forwards it.
//!
//! Two constructors:
//! - [`Work::new`] for async closures (`FnOnce() -> impl Future<Output = ()>`)
//! - [`Work::blocking`] for synchronous closures, run on tokio's blocking pool
//!
//! ## Example
//! ```rust
//! use uniqpool::Work;
//!
//! let w = Work::new(|| async { /* refresh cache */ });
//! assert!(w.label().is_none());
//!
//! let b = Work::blocking(|| { /* CPU-bound rebuild */ }).with_label("index");
//! assert_eq!(b.label(), Some("index"));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future produced by starting a [`Work`].
pub type BoxWorkFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Opaque unit of work forwarded to an [`Execute`](crate::Execute) implementation.
pub struct Work {
    label: Option<Arc<str>>,
    f: Box<dyn FnOnce() -> BoxWorkFuture + Send + 'static>,
}

impl Work {
    /// Wraps an async closure. The closure runs only when the executor starts the work.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            label: None,
            f: Box::new(move || Box::pin(f()) as BoxWorkFuture),
        }
    }

    /// Wraps a synchronous closure; it runs via [`tokio::task::spawn_blocking`].
    ///
    /// A panic inside the closure is resumed on the awaiting task, so executors
    /// observe it the same way as a panic in async work.
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(move || async move {
            if let Err(err) = tokio::task::spawn_blocking(f).await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        })
    }

    /// Attaches a label used in logs and events.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn label_arc(&self) -> Option<Arc<str>> {
        self.label.clone()
    }

    /// Consumes the work and produces the future to execute.
    pub fn start(self) -> BoxWorkFuture {
        (self.f)()
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
