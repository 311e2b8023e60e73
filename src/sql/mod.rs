//! Safe SQL builder for document tables: identifiers validated, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
