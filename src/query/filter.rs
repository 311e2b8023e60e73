//! Predicates over scalar fields, built by hand or projected from example instances.

use crate::error::ReflectError;
use crate::reflect::{ClassDescriptor, Describe};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equals { field: String, value: Value },
    AnyOf { field: String, values: Vec<Value> },
    /// Case-insensitive prefix match on string values.
    StartsWith { field: String, prefix: String },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. } | Condition::AnyOf { field, .. } | Condition::StartsWith { field, .. } => field,
        }
    }

    fn accepts(&self, actual: &Value) -> bool {
        match self {
            Condition::Equals { value, .. } => actual == value,
            Condition::AnyOf { values, .. } => values.contains(actual),
            Condition::StartsWith { prefix, .. } => actual
                .as_str()
                .is_some_and(|s| s.to_lowercase().starts_with(&prefix.to_lowercase())),
        }
    }
}

/// Conjunction of conditions; the empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn any_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::AnyOf {
            field: field.into(),
            values,
        });
        self
    }

    pub fn starts_with(mut self, field: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.conditions.push(Condition::StartsWith {
            field: field.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Query by example: one equality per non-null scalar field of `probe`.
    pub fn by_example<T: Describe>(descriptor: &ClassDescriptor<T>, probe: &T) -> Result<Self, ReflectError> {
        let conditions = descriptor
            .project_values(probe)?
            .into_iter()
            .map(|(field, value)| Condition::Equals {
                field: field.to_string(),
                value,
            })
            .collect();
        Ok(Filter { conditions })
    }

    /// Query by several examples: per scalar field, the values seen across `probes`.
    pub fn any_of_examples<T: Describe>(descriptor: &ClassDescriptor<T>, probes: &[T]) -> Result<Self, ReflectError> {
        let conditions = descriptor
            .project_value_lists(probes)?
            .into_iter()
            .map(|(field, values)| Condition::AnyOf {
                field: field.to_string(),
                values,
            })
            .collect();
        Ok(Filter { conditions })
    }

    /// Every condition must name a scalar, updatable field of `T`.
    pub fn validate<T: Describe>(&self, descriptor: &ClassDescriptor<T>) -> Result<(), ReflectError> {
        for condition in &self.conditions {
            let name = condition.field();
            if !descriptor.scalar_fields().any(|f| f.name() == name) {
                return Err(ReflectError::NoSuchField {
                    class: descriptor.class_name(),
                    field: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn matches<T: Describe>(&self, descriptor: &ClassDescriptor<T>, entity: &T) -> Result<bool, ReflectError> {
        for condition in &self.conditions {
            let actual = descriptor.get(entity, condition.field())?;
            if !condition.accepts(&actual) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::fixtures::{Address, Order};
    use serde_json::json;

    fn descriptor() -> ClassDescriptor<Order> {
        ClassDescriptor::build().unwrap()
    }

    fn order(id: i64, reference: &str) -> Order {
        Order {
            id: Some(id),
            reference: Some(reference.into()),
            ..Order::default()
        }
    }

    #[test]
    fn example_ignores_nulls_and_non_scalar_fields() {
        let probe = Order {
            reference: Some("R-1".into()),
            address: Some(Address::default()),
            created_by: Some("alice".into()),
            ..Order::default()
        };
        let filter = Filter::by_example(&descriptor(), &probe).unwrap();
        assert_eq!(filter, Filter::new().eq("reference", "R-1"));
    }

    #[test]
    fn empty_example_matches_everything() {
        let filter = Filter::by_example(&descriptor(), &Order::default()).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&descriptor(), &order(1, "R-1")).unwrap());
    }

    #[test]
    fn any_of_examples_collects_values_per_field() {
        let filter = Filter::any_of_examples(&descriptor(), &[order(1, "A"), Order::default(), order(2, "B")]).unwrap();
        assert_eq!(
            filter.conditions(),
            &[
                Condition::AnyOf { field: "id".into(), values: vec![json!(1), json!(2)] },
                Condition::AnyOf { field: "reference".into(), values: vec![json!("A"), json!("B")] },
            ]
        );
        assert!(filter.matches(&descriptor(), &order(2, "A")).unwrap());
        assert!(!filter.matches(&descriptor(), &order(3, "A")).unwrap());
    }

    #[test]
    fn starts_with_ignores_case() {
        let filter = Filter::new().starts_with("reference", "ab");
        assert!(filter.matches(&descriptor(), &order(1, "ABC-1")).unwrap());
        assert!(!filter.matches(&descriptor(), &order(1, "XABC")).unwrap());
        assert!(!filter.matches(&descriptor(), &Order::default()).unwrap());
    }

    #[test]
    fn validate_rejects_unknown_and_structural_fields() {
        let d = descriptor();
        assert!(Filter::new().eq("reference", "x").validate(&d).is_ok());
        for field in ["nope", "lines", "created_by"] {
            let err = Filter::new().eq(field, "x").validate(&d).unwrap_err();
            assert!(matches!(err, ReflectError::NoSuchField { .. }), "{field}");
        }
    }

    #[test]
    fn conditions_serialize_with_op_tag() {
        let value = serde_json::to_value(Filter::new().eq("reference", "x")).unwrap();
        assert_eq!(
            value,
            json!({ "conditions": [{ "op": "equals", "field": "reference", "value": "x" }] })
        );
    }
}
