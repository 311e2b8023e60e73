//! The Update pattern: per-class field tables and the merge strategies applied
//! by `update(target, source)`.
//!
//! A type opts in by implementing [`Describe`], registering each field with a
//! typed accessor pair and a structural kind:
//!
//! ```
//! use crudkit::reflect::{ClassBuilder, Describe, Update};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Contact {
//!     name: Option<String>,
//!     email: Option<String>,
//! }
//!
//! impl Describe for Contact {
//!     fn describe(class: &mut ClassBuilder<Self>) {
//!         class.scalar("name", |c| &c.name, |c| &mut c.name).not_null().length(80);
//!         class.scalar("email", |c| &c.email, |c| &mut c.email);
//!     }
//! }
//!
//! let mut target = Contact { name: Some("Ada".into()), email: Some("ada@example.org".into()) };
//! let source = Contact { name: None, email: None };
//! assert!(target.update(&source).unwrap());
//! assert_eq!(target.name.as_deref(), Some("Ada"));
//! assert_eq!(target.email, None);
//! ```

mod class;
mod field;
mod identity;
mod mapping;
mod merge;
mod policy;
mod registry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use class::{ClassBuilder, ClassDescriptor, Describe, Update};
pub use field::{FieldDescriptor, Getter, GetterMut, Reflector};
pub use identity::Identified;
pub use mapping::Mapping;
pub use merge::{
    EntityCollectionMerge, EntityMapMerge, EntityMerge, MergeStrategy, ScalarCollectionMerge,
    ScalarMapMerge, ScalarMerge,
};
pub use policy::{FieldKind, FieldOptions, FieldPolicy};
pub use registry::DescriptorRegistry;
