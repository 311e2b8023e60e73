//! Generic CRUD over a repository, with the Update pattern applied on modification.

use super::RequestValidator;
use crate::config::Settings;
use crate::error::AppError;
use crate::query::{Filter, Page};
use crate::reflect::{ClassDescriptor, DescriptorRegistry};
use crate::repository::{Repository, Resource};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a merge-and-save: the stored entity and whether anything changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Updated<E> {
    pub entity: E,
    pub changed: bool,
}

pub struct CrudService<E: Resource> {
    repository: Arc<dyn Repository<E>>,
    registry: Arc<DescriptorRegistry>,
    default_page_size: u32,
    max_page_size: u32,
    bulk_limit: usize,
}

impl<E: Resource> CrudService<E> {
    pub fn new(repository: Arc<dyn Repository<E>>, settings: &Settings) -> Self {
        Self::with_registry(repository, Arc::clone(DescriptorRegistry::global()), settings)
    }

    pub fn with_registry(repository: Arc<dyn Repository<E>>, registry: Arc<DescriptorRegistry>, settings: &Settings) -> Self {
        CrudService {
            repository,
            registry,
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
            bulk_limit: settings.bulk_limit,
        }
    }

    pub fn descriptor(&self) -> Result<Arc<ClassDescriptor<E>>, AppError> {
        Ok(self.registry.describe::<E>()?)
    }

    pub fn page(&self, limit: Option<u32>, offset: Option<u32>) -> Page {
        Page::clamped(limit, offset, self.default_page_size, self.max_page_size)
    }

    /// List matching entities; limit defaults to the page size and is clamped to the maximum.
    pub async fn list(&self, filter: &Filter, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<E>, AppError> {
        filter.validate(&*self.descriptor()?)?;
        self.repository.list(filter, self.page(limit, offset)).await
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        filter.validate(&*self.descriptor()?)?;
        self.repository.count(filter).await
    }

    pub async fn read(&self, id: &E::Id) -> Result<E, AppError> {
        self.repository
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", E::NAME, id)))
    }

    /// Query by example over the non-null scalar fields of `probe`.
    pub async fn find_by_example(&self, probe: &E, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<E>, AppError> {
        let filter = Filter::by_example(&*self.descriptor()?, probe)?;
        self.repository.list(&filter, self.page(limit, offset)).await
    }

    pub async fn find_any_of(&self, probes: &[E], limit: Option<u32>, offset: Option<u32>) -> Result<Vec<E>, AppError> {
        let filter = Filter::any_of_examples(&*self.descriptor()?, probes)?;
        self.repository.list(&filter, self.page(limit, offset)).await
    }

    pub async fn autocomplete(&self, field: &str, prefix: &str, limit: Option<u32>) -> Result<Vec<String>, AppError> {
        Filter::new().starts_with(field, prefix).validate(&*self.descriptor()?)?;
        let limit = self.page(limit, None).limit;
        self.repository.autocomplete(field, prefix, limit).await
    }

    /// Validate, build from the insertable fields of `payload`, store.
    pub async fn create(&self, payload: &E) -> Result<E, AppError> {
        let descriptor = self.descriptor()?;
        RequestValidator::validate_insert(&*descriptor, payload)?;
        let entity = descriptor.instantiate(&self.registry, payload)?;
        let created = self.repository.insert(entity).await?;
        tracing::info!(resource = E::NAME, id = ?created.id(), "created");
        Ok(created)
    }

    /// Merge `payload` into the stored entity `id`; persisted only when something changed.
    /// The identity in the path wins over any identity in the payload.
    pub async fn update(&self, id: &E::Id, payload: &E) -> Result<Updated<E>, AppError> {
        let descriptor = self.descriptor()?;
        RequestValidator::validate_update(&*descriptor, payload)?;
        let merged = self.merged(&descriptor, id, payload).await?;
        if !merged.changed {
            tracing::debug!(resource = E::NAME, id = %id, "update without changes");
            return Ok(merged);
        }
        let entity = self.repository.save(merged.entity).await?;
        tracing::info!(resource = E::NAME, id = %id, "updated");
        Ok(Updated { entity, changed: true })
    }

    /// Stored entity `id` with `payload` merged in, not yet saved.
    async fn merged(&self, descriptor: &ClassDescriptor<E>, id: &E::Id, payload: &E) -> Result<Updated<E>, AppError> {
        let mut entity = self.read(id).await?;
        let mut source = payload.clone();
        source.set_id(Some(id.clone()));
        let changed = descriptor.update(&self.registry, &mut entity, &source)?;
        entity.set_id(Some(id.clone()));
        Ok(Updated { entity, changed })
    }

    pub async fn delete(&self, id: &E::Id) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound(format!("{} {}", E::NAME, id)));
        }
        tracing::info!(resource = E::NAME, id = %id, "deleted");
        Ok(())
    }

    /// All items are validated and checked against stored identities before any is stored;
    /// the batch is then written as a whole.
    pub async fn bulk_create(&self, payloads: &[E]) -> Result<Vec<E>, AppError> {
        self.check_bulk(payloads.len(), "create")?;
        let descriptor = self.descriptor()?;
        let mut entities = Vec::with_capacity(payloads.len());
        for payload in payloads {
            RequestValidator::validate_insert(&*descriptor, payload)?;
            entities.push(descriptor.instantiate(&self.registry, payload)?);
        }
        let mut seen = HashSet::with_capacity(entities.len());
        for id in entities.iter().filter_map(|e| e.id()) {
            if !seen.insert(id.clone()) || self.repository.find(id).await?.is_some() {
                return Err(AppError::Conflict(format!("{} {} already exists", E::NAME, id)));
            }
        }
        let created = self.repository.insert_many(entities).await?;
        tracing::info!(resource = E::NAME, count = created.len(), "bulk created");
        Ok(created)
    }

    /// Each item must carry a distinct identity of a stored entity. Every merge is computed
    /// first; the changed entities are then saved as a whole.
    pub async fn bulk_update(&self, payloads: &[E]) -> Result<Vec<Updated<E>>, AppError> {
        self.check_bulk(payloads.len(), "update")?;
        let descriptor = self.descriptor()?;
        let mut ids = Vec::with_capacity(payloads.len());
        let mut seen = HashSet::with_capacity(payloads.len());
        for payload in payloads {
            let id = payload
                .id()
                .cloned()
                .ok_or_else(|| AppError::Validation("each item must have an id".into()))?;
            if !seen.insert(id.clone()) {
                return Err(AppError::Validation(format!("duplicate id in bulk update: {}", id)));
            }
            RequestValidator::validate_update(&*descriptor, payload)?;
            ids.push(id);
        }
        let mut out = Vec::with_capacity(payloads.len());
        for (id, payload) in ids.iter().zip(payloads) {
            out.push(self.merged(&descriptor, id, payload).await?);
        }
        let dirty: Vec<E> = out.iter().filter(|u| u.changed).map(|u| u.entity.clone()).collect();
        if !dirty.is_empty() {
            let mut saved = self.repository.save_many(dirty).await?.into_iter();
            for item in out.iter_mut().filter(|u| u.changed) {
                if let Some(entity) = saved.next() {
                    item.entity = entity;
                }
            }
        }
        tracing::info!(
            resource = E::NAME,
            count = out.len(),
            changed = out.iter().filter(|u| u.changed).count(),
            "bulk updated"
        );
        Ok(out)
    }

    fn check_bulk(&self, len: usize, op: &str) -> Result<(), AppError> {
        if len > self.bulk_limit {
            return Err(AppError::BadRequest(format!(
                "bulk {} limited to {} items",
                op, self.bulk_limit
            )));
        }
        Ok(())
    }
}
