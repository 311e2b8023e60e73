//! Process-lifetime cache of class descriptors, one per type.
//!
//! Descriptors are populated once and read many times. The registry lock is
//! only held to hand out a per-class cell, so building one class never blocks
//! callers asking for another; concurrent first callers of the same class
//! wait on that class's cell and all observe the same instance.

use super::class::{ClassDescriptor, Describe};
use crate::error::ReflectError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type Built<T> = Result<Arc<ClassDescriptor<T>>, ReflectError>;
type Cell = Arc<OnceLock<Box<dyn Any + Send + Sync>>>;

#[derive(Default)]
pub struct DescriptorRegistry {
    classes: RwLock<HashMap<TypeId, Cell>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry used by [`Update`](super::Update).
    pub fn global() -> &'static Arc<DescriptorRegistry> {
        static GLOBAL: OnceLock<Arc<DescriptorRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DescriptorRegistry::new()))
    }

    /// Descriptor of `T`, built on first request. Construction errors are cached too.
    pub fn describe<T: Describe>(&self) -> Result<Arc<ClassDescriptor<T>>, ReflectError> {
        let cell = self.cell(TypeId::of::<T>());
        let built = cell.get_or_init(|| {
            let built: Built<T> = ClassDescriptor::<T>::build().map(Arc::new);
            match &built {
                Ok(descriptor) => tracing::debug!(
                    class = descriptor.class_name(),
                    fields = descriptor.fields().count(),
                    "built class descriptor"
                ),
                Err(err) => tracing::warn!(error = %err, "class descriptor rejected"),
            }
            Box::new(built)
        });
        match built.downcast_ref::<Built<T>>() {
            Some(built) => built.clone(),
            None => unreachable!("descriptor cells are keyed by TypeId"),
        }
    }

    /// `target.update(source)` using this registry for nested descriptors.
    pub fn update<T: Describe>(&self, target: &mut T, source: &T) -> Result<bool, ReflectError> {
        self.describe::<T>()?.update(self, target, source)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.get().is_some())
    }

    pub fn len(&self) -> usize {
        self.classes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, key: TypeId) -> Cell {
        if let Some(cell) = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(cell);
        }
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(classes.entry(key).or_default())
    }
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry").field("classes", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::fixtures::{Address, Order, Twice};
    use std::thread;

    #[test]
    fn same_class_yields_same_instance() {
        let registry = DescriptorRegistry::new();
        let first = registry.describe::<Order>().unwrap();
        let second = registry.describe::<Order>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains::<Order>());
        assert!(!registry.contains::<Address>());
    }

    #[test]
    fn construction_errors_are_cached() {
        let registry = DescriptorRegistry::new();
        let first = registry.describe::<Twice>().unwrap_err();
        assert!(matches!(first, ReflectError::DuplicateField { ref field, .. } if field == "a"));
        assert!(registry.contains::<Twice>());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.describe::<Twice>().unwrap_err(), first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn nested_descriptors_are_built_lazily() {
        let registry = DescriptorRegistry::new();
        let mut target = Order::default();
        let source = Order {
            address: Some(Address {
                street: Some("Main".into()),
                city: None,
            }),
            ..Order::default()
        };
        assert!(registry.update(&mut target, &source).unwrap());
        assert!(registry.contains::<Address>());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_first_access_publishes_one_descriptor() {
        let registry = DescriptorRegistry::new();
        let seen: Vec<Arc<ClassDescriptor<Order>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.describe::<Order>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(seen.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
