//! Per-field structural kind and declared policy flags.

use serde::Serialize;

/// Structural kind of a field, fixed when the class descriptor is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Scalar,
    Entity,
    EntityCollection,
    ScalarCollection,
    EntityMap,
    ScalarMap,
}

impl FieldKind {
    /// Plain value fields; the only ones that take part in projections and filters.
    pub fn is_value(self) -> bool {
        matches!(self, FieldKind::Scalar)
    }

    pub fn is_collection(self) -> bool {
        matches!(self, FieldKind::EntityCollection | FieldKind::ScalarCollection)
    }

    pub fn is_map(self) -> bool {
        matches!(self, FieldKind::EntityMap | FieldKind::ScalarMap)
    }
}

/// Declared policy of one field.
///
/// `nullable = false` is the protective mode: a null source value never erases
/// the target value during merge, and the field is required on insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldPolicy {
    pub nullable: bool,
    pub insertable: bool,
    pub updatable: bool,
    /// Advisory maximum length for string content, in chars.
    pub length: Option<usize>,
    /// Explicit iteration key; fields without one follow in declaration order.
    pub order: Option<i32>,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        FieldPolicy {
            nullable: true,
            insertable: true,
            updatable: true,
            length: None,
            order: None,
        }
    }
}

/// Chained policy setters returned by every `ClassBuilder` field registration.
pub struct FieldOptions<'a> {
    policy: &'a mut FieldPolicy,
}

impl<'a> FieldOptions<'a> {
    pub(crate) fn new(policy: &'a mut FieldPolicy) -> Self {
        FieldOptions { policy }
    }

    pub fn nullable(self, nullable: bool) -> Self {
        self.policy.nullable = nullable;
        self
    }

    /// Protective mode: null from a source never clears this field.
    pub fn not_null(self) -> Self {
        self.nullable(false)
    }

    pub fn updatable(self, updatable: bool) -> Self {
        self.policy.updatable = updatable;
        self
    }

    pub fn read_only(self) -> Self {
        self.updatable(false)
    }

    pub fn insertable(self, insertable: bool) -> Self {
        self.policy.insertable = insertable;
        self
    }

    pub fn length(self, length: usize) -> Self {
        self.policy.length = Some(length);
        self
    }

    pub fn order(self, order: i32) -> Self {
        self.policy.order = Some(order);
        self
    }
}
