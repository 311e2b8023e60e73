//! CrudService: generic CRUD and the Update pattern over a repository.

mod crud;
mod validation;
pub use crud::{CrudService, Updated};
pub use validation::RequestValidator;
