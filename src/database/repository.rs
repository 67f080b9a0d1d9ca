//! # Repository trait
//!
//! Common lookups every table-backed repository offers. Entity-specific
//! queries live as inherent methods on each repository.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;

    type Id: Send + Sync + ?Sized;

    async fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;

    async fn find_all(&self) -> Result<Vec<Self::Entity>>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: &Self::Id) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}
