//! Class descriptors: the per-class merge plan, built once and cached by the registry.

use super::field::{FieldDescriptor, Getter, GetterMut, Reflector};
use super::identity::Identified;
use super::mapping::Mapping;
use super::merge::{
    EntityCollectionMerge, EntityMapMerge, EntityMerge, MergeStrategy, ScalarCollectionMerge,
    ScalarMapMerge, ScalarMerge,
};
use super::policy::FieldOptions;
use super::registry::DescriptorRegistry;
use crate::error::ReflectError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A type whose fields take part in the Update pattern.
///
/// `Default` is the zero-argument factory used to materialize new nested instances.
pub trait Describe: Default + Send + Sync + 'static {
    fn describe(class: &mut ClassBuilder<Self>);
}

/// `target.update(&source)` through the process-wide registry.
pub trait Update: Describe {
    fn update(&mut self, source: &Self) -> Result<bool, ReflectError> {
        DescriptorRegistry::global().update(self, source)
    }
}

impl<T: Describe> Update for T {}

/// Collects the field table of `T` during `Describe::describe`.
pub struct ClassBuilder<T> {
    class: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Describe> ClassBuilder<T> {
    pub(crate) fn new() -> Self {
        ClassBuilder {
            class: std::any::type_name::<T>(),
            fields: Vec::new(),
        }
    }

    fn push<V, S>(
        &mut self,
        name: &'static str,
        get: Getter<T, V>,
        get_mut: GetterMut<T, V>,
        strategy: S,
    ) -> FieldOptions<'_>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        S: MergeStrategy<V>,
    {
        self.fields.push(FieldDescriptor::new(name, get, get_mut, strategy));
        let index = self.fields.len() - 1;
        FieldOptions::new(self.fields[index].policy_mut())
    }

    pub fn scalar<V>(&mut self, name: &'static str, get: Getter<T, V>, get_mut: GetterMut<T, V>) -> FieldOptions<'_>
    where
        V: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.push(name, get, get_mut, ScalarMerge)
    }

    pub fn entity<E>(&mut self, name: &'static str, get: Getter<T, E>, get_mut: GetterMut<T, E>) -> FieldOptions<'_>
    where
        E: Describe + Serialize + DeserializeOwned,
    {
        self.push(name, get, get_mut, EntityMerge)
    }

    pub fn entity_collection<E>(
        &mut self,
        name: &'static str,
        get: Getter<T, Vec<E>>,
        get_mut: GetterMut<T, Vec<E>>,
    ) -> FieldOptions<'_>
    where
        E: Describe + Identified + Serialize + DeserializeOwned,
    {
        self.push(name, get, get_mut, EntityCollectionMerge)
    }

    pub fn scalar_collection<C>(&mut self, name: &'static str, get: Getter<T, C>, get_mut: GetterMut<T, C>) -> FieldOptions<'_>
    where
        C: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.push(name, get, get_mut, ScalarCollectionMerge)
    }

    pub fn entity_map<M>(&mut self, name: &'static str, get: Getter<T, M>, get_mut: GetterMut<T, M>) -> FieldOptions<'_>
    where
        M: Mapping + Serialize + DeserializeOwned,
        M::Value: Describe,
    {
        self.push(name, get, get_mut, EntityMapMerge)
    }

    pub fn scalar_map<M>(&mut self, name: &'static str, get: Getter<T, M>, get_mut: GetterMut<T, M>) -> FieldOptions<'_>
    where
        M: Mapping + Serialize + DeserializeOwned,
        M::Value: Clone + PartialEq,
    {
        self.push(name, get, get_mut, ScalarMapMerge)
    }

    /// Explicitly ordered fields first (ascending), then declaration order.
    pub(crate) fn build(self) -> Result<ClassDescriptor<T>, ReflectError> {
        let mut fields = self.fields;
        fields.sort_by_key(|f| (f.order().is_none(), f.order()));

        let mut by_name = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if by_name.insert(field.name(), index).is_some() {
                return Err(ReflectError::DuplicateField {
                    class: self.class,
                    field: field.name().to_string(),
                });
            }
        }
        let select = |keep: fn(&FieldDescriptor<T>) -> bool| -> Vec<usize> {
            fields
                .iter()
                .enumerate()
                .filter(|(_, f)| keep(f))
                .map(|(i, _)| i)
                .collect()
        };
        let updatable = select(|f| f.is_updatable());
        let insertable = select(|f| f.is_insertable());
        let scalar = select(|f| f.is_updatable() && f.is_value());

        Ok(ClassDescriptor {
            class: self.class,
            by_name,
            updatable,
            insertable,
            scalar,
            fields,
        })
    }
}

/// Full field table of one class, partitioned into updatable, insertable and
/// scalar-updatable views.
pub struct ClassDescriptor<T> {
    class: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    by_name: HashMap<&'static str, usize>,
    updatable: Vec<usize>,
    insertable: Vec<usize>,
    scalar: Vec<usize>,
}

impl<T: Describe> ClassDescriptor<T> {
    pub(crate) fn build() -> Result<Self, ReflectError> {
        let mut builder = ClassBuilder::new();
        T::describe(&mut builder);
        builder.build()
    }

    pub fn class_name(&self) -> &'static str {
        self.class
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> + '_ {
        self.fields.iter()
    }

    pub fn updatable_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> + '_ {
        self.updatable.iter().map(move |&i| &self.fields[i])
    }

    pub fn insertable_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> + '_ {
        self.insertable.iter().map(move |&i| &self.fields[i])
    }

    /// Updatable plain-value fields, the ones eligible for filter projection.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescriptor<T>> + '_ {
        self.scalar.iter().map(move |&i| &self.fields[i])
    }

    pub fn field(&self, name: &str) -> Result<&FieldDescriptor<T>, ReflectError> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| ReflectError::NoSuchField {
                class: self.class,
                field: name.to_string(),
            })
    }

    /// Typed accessor pair for `name`, which must be declared as `Option<V>`.
    pub fn reflector<V: 'static>(&self, name: &str) -> Result<Reflector<T, V>, ReflectError> {
        let field = self.field(name)?;
        field.reflector::<V>().ok_or_else(|| ReflectError::TypeMismatch {
            class: self.class,
            field: name.to_string(),
            declared: field.value_type_name(),
            requested: std::any::type_name::<V>(),
        })
    }

    pub fn new_instance(&self) -> T {
        T::default()
    }

    /// Merges every updatable field of `source` into `target`.
    ///
    /// All fields are applied; the result is the OR of the per-field flags.
    pub fn update(&self, registry: &DescriptorRegistry, target: &mut T, source: &T) -> Result<bool, ReflectError> {
        let mut changed = false;
        for field in self.updatable_fields() {
            let field_changed = field.merge(registry, target, source)?;
            if field_changed {
                tracing::trace!(class = self.class, field = field.name(), "field changed");
            }
            changed |= field_changed;
        }
        Ok(changed)
    }

    /// New instance populated from the insertable fields of `source`.
    pub fn instantiate(&self, registry: &DescriptorRegistry, source: &T) -> Result<T, ReflectError> {
        let mut created = self.new_instance();
        for field in self.insertable_fields() {
            field.merge(registry, &mut created, source)?;
        }
        Ok(created)
    }

    pub fn get(&self, source: &T, name: &str) -> Result<Value, ReflectError> {
        let field = self.field(name)?;
        field.read(source).map_err(|e| self.conversion(name, e))
    }

    pub fn set(&self, target: &mut T, name: &str, value: Value) -> Result<(), ReflectError> {
        let field = self.field(name)?;
        field.write(target, value).map_err(|e| self.conversion(name, e))
    }

    /// Non-null scalar values of `source`, in field order.
    pub fn project_values(&self, source: &T) -> Result<Vec<(&'static str, Value)>, ReflectError> {
        let mut values = Vec::with_capacity(self.scalar.len());
        for field in self.scalar_fields() {
            if field.is_null(source) {
                continue;
            }
            let value = field.read(source).map_err(|e| self.conversion(field.name(), e))?;
            values.push((field.name(), value));
        }
        Ok(values)
    }

    /// Per scalar field, every non-null value across `sources`; fields without any are omitted.
    pub fn project_value_lists(&self, sources: &[T]) -> Result<Vec<(&'static str, Vec<Value>)>, ReflectError> {
        let mut lists = Vec::new();
        for field in self.scalar_fields() {
            let mut values = Vec::new();
            for source in sources.iter().filter(|s| !field.is_null(s)) {
                values.push(field.read(source).map_err(|e| self.conversion(field.name(), e))?);
            }
            if !values.is_empty() {
                lists.push((field.name(), values));
            }
        }
        Ok(lists)
    }

    fn conversion(&self, field: &str, err: serde_json::Error) -> ReflectError {
        ReflectError::Conversion {
            class: self.class,
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}

impl<T> fmt::Debug for ClassDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("class", &self.class)
            .field("fields", &self.fields)
            .finish()
    }
}
