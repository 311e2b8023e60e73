//! In-process repository, id-ordered.

use super::{required_id, KeyGenerator, Repository, Resource};
use crate::error::AppError;
use crate::query::{Filter, Page};
use crate::reflect::{ClassDescriptor, DescriptorRegistry};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryRepository<E: Resource> {
    rows: RwLock<BTreeMap<E::Id, E>>,
    keys: Arc<dyn KeyGenerator<E::Id>>,
    registry: Arc<DescriptorRegistry>,
}

impl<E: Resource> MemoryRepository<E> {
    pub fn new(keys: Arc<dyn KeyGenerator<E::Id>>) -> Self {
        Self::with_registry(keys, Arc::clone(DescriptorRegistry::global()))
    }

    pub fn with_registry(keys: Arc<dyn KeyGenerator<E::Id>>, registry: Arc<DescriptorRegistry>) -> Self {
        MemoryRepository {
            rows: RwLock::new(BTreeMap::new()),
            keys,
            registry,
        }
    }

    fn descriptor(&self) -> Result<Arc<ClassDescriptor<E>>, AppError> {
        Ok(self.registry.describe::<E>()?)
    }

    fn assign_id(&self, entity: &mut E) -> E::Id {
        match entity.id() {
            Some(id) => id.clone(),
            None => {
                let id = self.keys.next_key();
                entity.set_id(Some(id.clone()));
                id
            }
        }
    }

    fn matching<'a>(
        descriptor: &ClassDescriptor<E>,
        filter: &Filter,
        rows: &'a BTreeMap<E::Id, E>,
    ) -> Result<Vec<&'a E>, AppError> {
        let mut out = Vec::new();
        for entity in rows.values() {
            if filter.matches(descriptor, entity)? {
                out.push(entity);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl<E: Resource> Repository<E> for MemoryRepository<E> {
    async fn find(&self, id: &E::Id) -> Result<Option<E>, AppError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &Filter, page: Page) -> Result<Vec<E>, AppError> {
        let descriptor = self.descriptor()?;
        let rows = self.rows.read().await;
        let matching = Self::matching(&descriptor, filter, &rows)?;
        Ok(matching.into_iter().skip(page.skip()).take(page.take()).cloned().collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, AppError> {
        let descriptor = self.descriptor()?;
        let rows = self.rows.read().await;
        Ok(Self::matching(&descriptor, filter, &rows)?.len() as u64)
    }

    async fn insert(&self, mut entity: E) -> Result<E, AppError> {
        let id = self.assign_id(&mut entity);
        let mut rows = self.rows.write().await;
        if rows.contains_key(&id) {
            return Err(AppError::Conflict(format!("{} {} already exists", E::NAME, id)));
        }
        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn save(&self, entity: E) -> Result<E, AppError> {
        let id = required_id(&entity)?;
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(stored) => {
                *stored = entity.clone();
                Ok(entity)
            }
            None => Err(AppError::NotFound(format!("{} {}", E::NAME, id))),
        }
    }

    async fn insert_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        let mut rows = self.rows.write().await;
        let mut batch = Vec::with_capacity(entities.len());
        let mut seen = HashSet::with_capacity(entities.len());
        for mut entity in entities {
            let id = self.assign_id(&mut entity);
            if rows.contains_key(&id) || !seen.insert(id.clone()) {
                return Err(AppError::Conflict(format!("{} {} already exists", E::NAME, id)));
            }
            batch.push((id, entity));
        }
        let mut out = Vec::with_capacity(batch.len());
        for (id, entity) in batch {
            rows.insert(id, entity.clone());
            out.push(entity);
        }
        Ok(out)
    }

    async fn save_many(&self, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        let mut rows = self.rows.write().await;
        let mut batch = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = required_id(&entity)?;
            if !rows.contains_key(&id) {
                return Err(AppError::NotFound(format!("{} {}", E::NAME, id)));
            }
            batch.push((id, entity));
        }
        let mut out = Vec::with_capacity(batch.len());
        for (id, entity) in batch {
            rows.insert(id, entity.clone());
            out.push(entity);
        }
        Ok(out)
    }

    async fn delete(&self, id: &E::Id) -> Result<bool, AppError> {
        Ok(self.rows.write().await.remove(id).is_some())
    }

    async fn autocomplete(&self, field: &str, prefix: &str, limit: u32) -> Result<Vec<String>, AppError> {
        let descriptor = self.descriptor()?;
        let prefix = prefix.to_lowercase();
        let rows = self.rows.read().await;
        let mut values = BTreeSet::new();
        for entity in rows.values() {
            if let Some(s) = descriptor.get(entity, field)?.as_str() {
                if s.to_lowercase().starts_with(&prefix) {
                    values.insert(s.to_string());
                }
            }
        }
        Ok(values.into_iter().take(limit as usize).collect())
    }
}
