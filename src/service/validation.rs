//! Request validation from field policies.

use crate::error::AppError;
use crate::reflect::{ClassDescriptor, Describe, FieldDescriptor};

pub struct RequestValidator;

impl RequestValidator {
    /// Insert payload: every non-nullable insertable field present, strings within `length`.
    pub fn validate_insert<T: Describe>(descriptor: &ClassDescriptor<T>, payload: &T) -> Result<(), AppError> {
        let missing: Vec<&str> = descriptor
            .insertable_fields()
            .filter(|f| !f.is_nullable() && f.is_null(payload))
            .map(|f| f.name())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::ValueRequired(missing.join(", ")));
        }
        for field in descriptor.insertable_fields() {
            check_length(descriptor, field, payload)?;
        }
        Ok(())
    }

    /// Update payload: only lengths are checked, absent values are merge input.
    pub fn validate_update<T: Describe>(descriptor: &ClassDescriptor<T>, payload: &T) -> Result<(), AppError> {
        for field in descriptor.updatable_fields() {
            check_length(descriptor, field, payload)?;
        }
        Ok(())
    }
}

fn check_length<T: Describe>(
    descriptor: &ClassDescriptor<T>,
    field: &FieldDescriptor<T>,
    payload: &T,
) -> Result<(), AppError> {
    let Some(max) = field.length() else { return Ok(()) };
    if !field.is_value() || field.is_null(payload) {
        return Ok(());
    }
    if let Some(s) = descriptor.get(payload, field.name())?.as_str() {
        if s.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field.name(),
                max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::fixtures::Order;

    fn descriptor() -> ClassDescriptor<Order> {
        ClassDescriptor::build().unwrap()
    }

    #[test]
    fn insert_reports_every_missing_required_field() {
        let err = RequestValidator::validate_insert(&descriptor(), &Order::default()).unwrap_err();
        match err {
            AppError::ValueRequired(fields) => assert_eq!(fields, "id, reference"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn length_counts_characters() {
        let mut order = Order {
            id: Some(1),
            reference: Some("ø".repeat(16)),
            ..Order::default()
        };
        assert!(RequestValidator::validate_insert(&descriptor(), &order).is_ok());
        order.reference = Some("x".repeat(17));
        assert!(matches!(
            RequestValidator::validate_update(&descriptor(), &order),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn update_tolerates_missing_values() {
        assert!(RequestValidator::validate_update(&descriptor(), &Order::default()).is_ok());
    }
}
