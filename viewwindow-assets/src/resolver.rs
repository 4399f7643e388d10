use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{AssetError, AssetId};

/// Fetches the bytes behind an asset identifier (network, disk, cache, auth...).
///
/// Resolvers run on the caller's single-threaded executor, so they need not be `Send`.
#[async_trait(?Send)]
pub trait AssetResolver {
    async fn resolve(&self, id: &AssetId) -> Result<Bytes, AssetError>;
}

#[async_trait(?Send)]
impl<T: AssetResolver + ?Sized> AssetResolver for Rc<T> {
    async fn resolve(&self, id: &AssetId) -> Result<Bytes, AssetError> {
        (**self).resolve(id).await
    }
}

/// Adapts a closure returning a future into an [`AssetResolver`].
pub struct FnResolver<F> {
    f: F,
}

impl<F> FnResolver<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait(?Send)]
impl<F, Fut> AssetResolver for FnResolver<F>
where
    F: Fn(AssetId) -> Fut + 'static,
    Fut: Future<Output = Result<Bytes, AssetError>> + 'static,
{
    async fn resolve(&self, id: &AssetId) -> Result<Bytes, AssetError> {
        (self.f)(id.clone()).await
    }
}

impl<F> std::fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}
