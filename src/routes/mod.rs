mod common;
mod resource;

pub use common::common_routes;
pub use resource::{mount, resource_routes};
