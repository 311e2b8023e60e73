//! crudkit: the Update pattern over described entities, with repositories and REST resources on top.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod reflect;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod telemetry;

pub use config::Settings;
pub use error::{AppError, ConfigError, ReflectError};
pub use query::{Condition, Filter, Page};
pub use reflect::{ClassBuilder, ClassDescriptor, DescriptorRegistry, Describe, FieldKind, Identified, Update};
pub use repository::{KeyGenerator, MemoryRepository, PgDocumentRepository, Repository, Resource, ResourceId, SequenceKeys, UuidKeys};
pub use routes::{common_routes, mount, resource_routes};
pub use service::{CrudService, RequestValidator, Updated};
pub use state::ResourceState;
pub use telemetry::init_tracing;
