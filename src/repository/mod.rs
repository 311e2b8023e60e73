//! Persistence seam for resources: an async repository trait and two stores.

mod keys;
mod memory;
mod postgres;

pub use keys::{KeyGenerator, SequenceKeys, UuidKeys};
pub use memory::MemoryRepository;
pub use postgres::PgDocumentRepository;

use crate::error::AppError;
use crate::query::{Filter, Page};
use crate::reflect::{Describe, Identified};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

/// Identity types usable in paths, table keys and ordered listings.
pub trait ResourceId:
    Clone + Eq + Hash + Ord + Debug + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> ResourceId for T where
    T: Clone + Eq + Hash + Ord + Debug + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// A described, identified entity exposed as a collection.
pub trait Resource: Describe + Identified<Id: ResourceId> + Clone + Serialize + DeserializeOwned {
    /// Collection name, used as the table name and conventional URL segment.
    const NAME: &'static str;
}

#[async_trait]
pub trait Repository<E: Resource>: Send + Sync {
    async fn find(&self, id: &E::Id) -> Result<Option<E>, AppError>;

    /// Matching entities in id order.
    async fn list(&self, filter: &Filter, page: Page) -> Result<Vec<E>, AppError>;

    async fn count(&self, filter: &Filter) -> Result<u64, AppError>;

    /// Stores a new entity, assigning an identity when it has none.
    async fn insert(&self, entity: E) -> Result<E, AppError>;

    /// Replaces a stored entity; `NotFound` when its identity is unknown.
    async fn save(&self, entity: E) -> Result<E, AppError>;

    /// Stores every entity or none of them; `Conflict` names the first identity already taken.
    async fn insert_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError>;

    /// Replaces every entity or none of them; `NotFound` names the first unknown identity.
    async fn save_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError>;

    /// Returns whether anything was removed.
    async fn delete(&self, id: &E::Id) -> Result<bool, AppError>;

    /// Distinct string values of `field` starting with `prefix` (case-insensitive), ascending.
    async fn autocomplete(&self, field: &str, prefix: &str, limit: u32) -> Result<Vec<String>, AppError>;
}

/// Identity of an entity about to be saved.
pub(crate) fn required_id<E: Resource>(entity: &E) -> Result<E::Id, AppError> {
    entity
        .id()
        .cloned()
        .ok_or_else(|| AppError::Validation(format!("{} has no identity", E::NAME)))
}
