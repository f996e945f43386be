//! Invocable check logic

use async_trait::async_trait;
use checkup_core::{CheckFailure, Parameters};
use std::fmt;
use std::future::Future;

/// A unit of health check logic addressable by reference
///
/// Parameters arrive already preprocessed (environment indirection
/// resolved). Returning `Ok(())` marks the check healthy.
#[async_trait]
pub trait Check: Send + Sync + fmt::Debug {
    /// Run the check with its named arguments
    async fn call(&self, params: &Parameters) -> Result<(), CheckFailure>;
}

/// Adapter turning a synchronous closure into a [`Check`]
#[derive(Clone)]
pub struct FnCheck<F> {
    f: F,
}

impl<F> fmt::Debug for FnCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCheck").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Check for FnCheck<F>
where
    F: Fn(&Parameters) -> Result<(), CheckFailure> + Send + Sync,
{
    async fn call(&self, params: &Parameters) -> Result<(), CheckFailure> {
        (self.f)(params)
    }
}

/// Adapter turning an async closure into a [`Check`]
#[derive(Clone)]
pub struct AsyncFnCheck<F> {
    f: F,
}

impl<F> fmt::Debug for AsyncFnCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnCheck").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Check for AsyncFnCheck<F>
where
    F: Fn(Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailure>> + Send + 'static,
{
    async fn call(&self, params: &Parameters) -> Result<(), CheckFailure> {
        (self.f)(params.clone()).await
    }
}

/// Wrap a synchronous closure as a check
pub fn check_fn<F>(f: F) -> FnCheck<F>
where
    F: Fn(&Parameters) -> Result<(), CheckFailure> + Send + Sync,
{
    FnCheck { f }
}

/// Wrap an async closure as a check
pub fn async_check_fn<F, Fut>(f: F) -> AsyncFnCheck<F>
where
    F: Fn(Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailure>> + Send + 'static,
{
    AsyncFnCheck { f }
}
