//! Field descriptors: typed accessor pairs plus the merge strategy of their kind.

use super::merge::{self, MergeStrategy};
use super::policy::{FieldKind, FieldPolicy};
use super::registry::DescriptorRegistry;
use crate::error::ReflectError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;

pub type Getter<T, V> = fn(&T) -> &Option<V>;
pub type GetterMut<T, V> = fn(&mut T) -> &mut Option<V>;

/// Typed accessor pair for one field of `T` holding `Option<V>`.
pub struct Reflector<T, V> {
    name: &'static str,
    get: Getter<T, V>,
    get_mut: GetterMut<T, V>,
}

impl<T, V> Clone for Reflector<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Reflector<T, V> {}

impl<T, V> Reflector<T, V> {
    pub(crate) fn new(name: &'static str, get: Getter<T, V>, get_mut: GetterMut<T, V>) -> Self {
        Reflector { name, get, get_mut }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<'a>(&self, source: &'a T) -> Option<&'a V> {
        (self.get)(source).as_ref()
    }

    pub fn slot<'a>(&self, target: &'a mut T) -> &'a mut Option<V> {
        (self.get_mut)(target)
    }

    /// Replace the field value, returning the previous one.
    pub fn set(&self, target: &mut T, value: Option<V>) -> Option<V> {
        std::mem::replace((self.get_mut)(target), value)
    }
}

impl<T, V> fmt::Debug for Reflector<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<V>())
            .finish()
    }
}

/// Type-erased view of a field used by the class descriptor.
pub(crate) trait FieldSlot<T>: Send + Sync {
    fn merge(
        &self,
        registry: &DescriptorRegistry,
        policy: &FieldPolicy,
        target: &mut T,
        source: &T,
    ) -> Result<bool, ReflectError>;

    fn is_null(&self, source: &T) -> bool;

    fn read(&self, source: &T) -> Result<Value, serde_json::Error>;

    fn write(&self, target: &mut T, value: Value) -> Result<(), serde_json::Error>;

    fn reflector(&self) -> &(dyn Any + Send + Sync);
}

struct TypedSlot<T, V, S> {
    reflector: Reflector<T, V>,
    strategy: S,
}

impl<T, V, S> FieldSlot<T> for TypedSlot<T, V, S>
where
    T: 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: MergeStrategy<V>,
{
    fn merge(
        &self,
        registry: &DescriptorRegistry,
        policy: &FieldPolicy,
        target: &mut T,
        source: &T,
    ) -> Result<bool, ReflectError> {
        let incoming = self.reflector.get(source);
        merge::apply(&self.strategy, registry, policy, self.reflector.slot(target), incoming)
    }

    fn is_null(&self, source: &T) -> bool {
        self.reflector.get(source).is_none()
    }

    fn read(&self, source: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.reflector.get(source))
    }

    fn write(&self, target: &mut T, value: Value) -> Result<(), serde_json::Error> {
        let value: Option<V> = serde_json::from_value(value)?;
        self.reflector.set(target, value);
        Ok(())
    }

    fn reflector(&self) -> &(dyn Any + Send + Sync) {
        &self.reflector
    }
}

/// One updatable property of a class. Immutable once the class descriptor is built.
pub struct FieldDescriptor<T> {
    name: &'static str,
    kind: FieldKind,
    policy: FieldPolicy,
    value_type: TypeId,
    value_type_name: &'static str,
    slot: Box<dyn FieldSlot<T>>,
}

impl<T: 'static> FieldDescriptor<T> {
    pub(crate) fn new<V, S>(
        name: &'static str,
        get: Getter<T, V>,
        get_mut: GetterMut<T, V>,
        strategy: S,
    ) -> Self
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        S: MergeStrategy<V>,
    {
        FieldDescriptor {
            name,
            kind: S::KIND,
            policy: FieldPolicy::default(),
            value_type: TypeId::of::<V>(),
            value_type_name: std::any::type_name::<V>(),
            slot: Box::new(TypedSlot {
                reflector: Reflector::new(name, get, get_mut),
                strategy,
            }),
        }
    }

    pub(crate) fn policy_mut(&mut self) -> &mut FieldPolicy {
        &mut self.policy
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn is_updatable(&self) -> bool {
        self.policy.updatable
    }

    pub fn is_insertable(&self) -> bool {
        self.policy.insertable
    }

    pub fn is_nullable(&self) -> bool {
        self.policy.nullable
    }

    /// Null propagation is allowed for this field (same flag as `is_nullable`).
    pub fn is_dynamic(&self) -> bool {
        self.policy.nullable
    }

    pub fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    pub fn is_map(&self) -> bool {
        self.kind.is_map()
    }

    pub fn is_value(&self) -> bool {
        self.kind.is_value()
    }

    pub fn length(&self) -> Option<usize> {
        self.policy.length
    }

    pub fn order(&self) -> Option<i32> {
        self.policy.order
    }

    /// Declared value type, i.e. the `V` of `Option<V>`.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    pub fn declares<V: 'static>(&self) -> bool {
        self.value_type == TypeId::of::<V>()
    }

    pub fn is_null(&self, source: &T) -> bool {
        self.slot.is_null(source)
    }

    pub(crate) fn merge(
        &self,
        registry: &DescriptorRegistry,
        target: &mut T,
        source: &T,
    ) -> Result<bool, ReflectError> {
        self.slot.merge(registry, &self.policy, target, source)
    }

    pub(crate) fn read(&self, source: &T) -> Result<Value, serde_json::Error> {
        self.slot.read(source)
    }

    pub(crate) fn write(&self, target: &mut T, value: Value) -> Result<(), serde_json::Error> {
        self.slot.write(target, value)
    }

    pub(crate) fn reflector<V: 'static>(&self) -> Option<Reflector<T, V>> {
        self.slot.reflector().downcast_ref::<Reflector<T, V>>().copied()
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("policy", &self.policy)
            .field("value_type", &self.value_type_name)
            .finish()
    }
}
