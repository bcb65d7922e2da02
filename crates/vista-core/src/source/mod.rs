use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a backend (mocked or real).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Asynchronous provider of one section's collection.
///
/// Implementations only need to settle eventually; deadlines and
/// cancellation are applied by the caller.
#[async_trait]
pub trait DataSource<T>: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<T>, SourceError>;
}

/// Adapts a closure returning a future into a [`DataSource`].
pub struct FnSource<F> {
    f: F,
}

impl<F> FnSource<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F, Fut> DataSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, SourceError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, SourceError> {
        (self.f)().await
    }
}
