//! Merge strategies, one per structural field kind.
//!
//! Every strategy sees a non-null source value; the null rules shared by all
//! kinds live in [`apply`].

use super::class::{ClassDescriptor, Describe};
use super::identity::Identified;
use super::mapping::Mapping;
use super::policy::{FieldKind, FieldPolicy};
use super::registry::DescriptorRegistry;
use crate::error::ReflectError;
use std::collections::{HashMap, HashSet};

/// Applies a non-null source value onto the target slot of one field.
pub trait MergeStrategy<V>: Send + Sync + 'static {
    const KIND: FieldKind;

    fn merge_value(
        &self,
        registry: &DescriptorRegistry,
        target: &mut Option<V>,
        source: &V,
    ) -> Result<bool, ReflectError>;
}

/// Shared null handling, then kind-specific dispatch.
///
/// A null source leaves the target untouched when the field is not nullable,
/// and clears it otherwise.
pub(crate) fn apply<V, S>(
    strategy: &S,
    registry: &DescriptorRegistry,
    policy: &FieldPolicy,
    target: &mut Option<V>,
    source: Option<&V>,
) -> Result<bool, ReflectError>
where
    S: MergeStrategy<V>,
{
    match source {
        None if !policy.nullable => Ok(false),
        None => Ok(target.take().is_some()),
        Some(value) => strategy.merge_value(registry, target, value),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarMerge;

impl<V> MergeStrategy<V> for ScalarMerge
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    const KIND: FieldKind = FieldKind::Scalar;

    fn merge_value(
        &self,
        _registry: &DescriptorRegistry,
        target: &mut Option<V>,
        source: &V,
    ) -> Result<bool, ReflectError> {
        Ok(replace_if_different(target, source))
    }
}

/// Whole-value replacement when the content differs at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarCollectionMerge;

impl<C> MergeStrategy<C> for ScalarCollectionMerge
where
    C: Clone + PartialEq + Send + Sync + 'static,
{
    const KIND: FieldKind = FieldKind::ScalarCollection;

    fn merge_value(
        &self,
        _registry: &DescriptorRegistry,
        target: &mut Option<C>,
        source: &C,
    ) -> Result<bool, ReflectError> {
        Ok(replace_if_different(target, source))
    }
}

fn replace_if_different<V: Clone + PartialEq>(target: &mut Option<V>, source: &V) -> bool {
    if target.as_ref() == Some(source) {
        return false;
    }
    *target = Some(source.clone());
    true
}

/// Single nested entity, merged recursively in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityMerge;

impl<E: Describe> MergeStrategy<E> for EntityMerge {
    const KIND: FieldKind = FieldKind::Entity;

    fn merge_value(
        &self,
        registry: &DescriptorRegistry,
        target: &mut Option<E>,
        source: &E,
    ) -> Result<bool, ReflectError> {
        let descriptor = registry.describe::<E>()?;
        match target {
            Some(existing) => descriptor.update(registry, existing, source),
            None => {
                let mut created = descriptor.new_instance();
                descriptor.update(registry, &mut created, source)?;
                *target = Some(created);
                Ok(true)
            }
        }
    }
}

/// Collection of identified entities, reconciled by identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityCollectionMerge;

impl<E> MergeStrategy<Vec<E>> for EntityCollectionMerge
where
    E: Describe + Identified,
{
    const KIND: FieldKind = FieldKind::EntityCollection;

    fn merge_value(
        &self,
        registry: &DescriptorRegistry,
        target: &mut Option<Vec<E>>,
        source: &Vec<E>,
    ) -> Result<bool, ReflectError> {
        let was_null = target.is_none();
        let items = target.get_or_insert_with(Vec::new);
        if source.is_empty() {
            if items.is_empty() {
                return Ok(was_null);
            }
            items.clear();
            return Ok(true);
        }
        let descriptor = registry.describe::<E>()?;
        let changed = reconcile(registry, &descriptor, items, source)?;
        Ok(changed || was_null)
    }
}

enum Incoming<'a, E: Identified> {
    Known(&'a E::Id),
    Anonymous(&'a E),
}

/// Rebuilds `items` as: existing items matched by identity (target order),
/// then newly created items (source order).
///
/// Duplicate source identities collapse onto the first position with the
/// content of the last occurrence. Target items without identity, duplicated
/// in the target, or absent from the source are dropped.
fn reconcile<E>(
    registry: &DescriptorRegistry,
    descriptor: &ClassDescriptor<E>,
    items: &mut Vec<E>,
    source: &[E],
) -> Result<bool, ReflectError>
where
    E: Describe + Identified,
{
    let mut latest: HashMap<&E::Id, &E> = HashMap::with_capacity(source.len());
    let mut incoming = Vec::with_capacity(source.len());
    for item in source {
        match item.id() {
            Some(id) => {
                if latest.insert(id, item).is_none() {
                    incoming.push(Incoming::Known(id));
                }
            }
            None => incoming.push(Incoming::Anonymous(item)),
        }
    }

    let mut changed = false;
    let mut matched: HashSet<E::Id> = HashSet::with_capacity(items.len());
    let mut rebuilt = Vec::with_capacity(source.len());
    for mut existing in std::mem::take(items) {
        let id = existing.id().cloned();
        let counterpart = id
            .as_ref()
            .filter(|id| !matched.contains(*id))
            .and_then(|id| latest.get(id).copied());
        match (id, counterpart) {
            (Some(id), Some(from)) => {
                changed |= descriptor.update(registry, &mut existing, from)?;
                matched.insert(id);
                rebuilt.push(existing);
            }
            _ => changed = true,
        }
    }

    for entry in incoming {
        let from = match entry {
            Incoming::Known(id) if matched.contains(id) => continue,
            Incoming::Known(id) => match latest.get(id) {
                Some(from) => *from,
                None => continue,
            },
            Incoming::Anonymous(from) => from,
        };
        let mut created = descriptor.new_instance();
        descriptor.update(registry, &mut created, from)?;
        rebuilt.push(created);
        changed = true;
    }

    *items = rebuilt;
    Ok(changed)
}

/// Map of entities, reconciled key by key with recursive merge of values.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityMapMerge;

impl<M> MergeStrategy<M> for EntityMapMerge
where
    M: Mapping,
    M::Value: Describe,
{
    const KIND: FieldKind = FieldKind::EntityMap;

    fn merge_value(
        &self,
        registry: &DescriptorRegistry,
        target: &mut Option<M>,
        source: &M,
    ) -> Result<bool, ReflectError> {
        let was_null = target.is_none();
        let map = target.get_or_insert_with(M::default);
        if source.is_empty() {
            return Ok(clear_map(map) || was_null);
        }
        let descriptor = registry.describe::<M::Value>()?;
        let mut changed = remove_stale_keys(map, source) || was_null;
        for (key, value) in source.entries() {
            match map.get_mut(key) {
                Some(existing) => changed |= descriptor.update(registry, existing, value)?,
                None => {
                    let mut created = descriptor.new_instance();
                    descriptor.update(registry, &mut created, value)?;
                    map.insert(key.clone(), created);
                    changed = true;
                }
            }
        }
        Ok(changed)
    }
}

/// Map of plain values, reconciled key by key with value equality.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarMapMerge;

impl<M> MergeStrategy<M> for ScalarMapMerge
where
    M: Mapping,
    M::Value: Clone + PartialEq,
{
    const KIND: FieldKind = FieldKind::ScalarMap;

    fn merge_value(
        &self,
        _registry: &DescriptorRegistry,
        target: &mut Option<M>,
        source: &M,
    ) -> Result<bool, ReflectError> {
        let was_null = target.is_none();
        let map = target.get_or_insert_with(M::default);
        if source.is_empty() {
            return Ok(clear_map(map) || was_null);
        }
        let mut changed = remove_stale_keys(map, source) || was_null;
        for (key, value) in source.entries() {
            match map.get_mut(key) {
                Some(current) if current == value => {}
                Some(current) => {
                    *current = value.clone();
                    changed = true;
                }
                None => {
                    map.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
        }
        Ok(changed)
    }
}

fn clear_map<M: Mapping>(map: &mut M) -> bool {
    if map.is_empty() {
        return false;
    }
    map.clear();
    true
}

fn remove_stale_keys<M: Mapping>(map: &mut M, source: &M) -> bool {
    let stale = map.keys_missing_from(source);
    for key in &stale {
        map.remove(key);
    }
    !stale.is_empty()
}
