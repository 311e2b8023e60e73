//! Shared state of one resource's routes.

use crate::config::Settings;
use crate::repository::{Repository, Resource};
use crate::service::CrudService;
use std::sync::Arc;

pub struct ResourceState<E: Resource> {
    pub service: Arc<CrudService<E>>,
    /// Maximum request body in bytes.
    pub body_limit: usize,
}

impl<E: Resource> ResourceState<E> {
    pub fn new(repository: Arc<dyn Repository<E>>, settings: &Settings) -> Self {
        ResourceState {
            service: Arc::new(CrudService::new(repository, settings)),
            body_limit: settings.body_limit,
        }
    }
}

impl<E: Resource> Clone for ResourceState<E> {
    fn clone(&self) -> Self {
        ResourceState {
            service: Arc::clone(&self.service),
            body_limit: self.body_limit,
        }
    }
}
