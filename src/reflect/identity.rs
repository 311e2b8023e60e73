//! Entity identity contract used by collection and map reconciliation.

use std::hash::Hash;

/// A type carrying a nullable identity value.
///
/// An item whose identity is `None` is always new. An item with an identity is
/// matched against existing target items and, when no match exists, is still
/// created rather than rejected.
pub trait Identified {
    type Id: Clone + Eq + Hash + Send + Sync + 'static;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Option<Self::Id>);
}
