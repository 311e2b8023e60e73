mod common;

use common::{address, contact, customer, full_customer, Customer};
use crudkit::{AppError, CrudService, Filter, MemoryRepository, ReflectError, SequenceKeys, Settings};
use std::sync::Arc;

fn service_with(settings: &Settings) -> CrudService<Customer> {
    let repository = Arc::new(MemoryRepository::<Customer>::new(Arc::new(SequenceKeys::default())));
    CrudService::new(repository, settings)
}

fn service() -> CrudService<Customer> {
    service_with(&Settings::default())
}

async fn seeded(names: &[&str]) -> CrudService<Customer> {
    let service = service();
    for name in names {
        service.create(&customer(name)).await.unwrap();
    }
    service
}

#[tokio::test]
async fn create_assigns_identity_and_requires_protected_fields() {
    let service = service();
    let created = service.create(&customer("Ada")).await.unwrap();
    assert_eq!(created.id, Some(1));

    let err = service.create(&Customer::default()).await.unwrap_err();
    assert!(matches!(err, AppError::ValueRequired(ref f) if f == "name"));
    assert!(err.is_business());
}

#[tokio::test]
async fn create_rejects_overlong_strings() {
    let err = service().create(&customer(&"x".repeat(41))).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn update_merges_and_reports_changes() {
    let service = service();
    let created = service
        .create(&Customer {
            id: None,
            ..full_customer()
        })
        .await
        .unwrap();
    let id = created.id.unwrap();

    let unchanged = service.update(&id, &created).await.unwrap();
    assert!(!unchanged.changed);

    let payload = Customer {
        id: Some(999),
        tier: Some(9),
        contacts: Some(vec![contact(Some(2), "b2"), contact(None, "new")]),
        ..created.clone()
    };
    let updated = service.update(&id, &payload).await.unwrap();
    assert!(updated.changed);
    assert_eq!(updated.entity.id, Some(id));
    assert_eq!(updated.entity.tier, Some(9));
    let values: Vec<_> = updated
        .entity
        .contacts
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.value.clone().unwrap())
        .collect();
    assert_eq!(values, ["b2", "new"]);
    assert_eq!(service.read(&id).await.unwrap(), updated.entity);
    assert!(matches!(service.read(&999).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_keeps_protected_values_on_null() {
    let service = seeded(&["Ada"]).await;
    let updated = service.update(&1, &Customer::default()).await.unwrap();
    assert!(!updated.changed);
    assert_eq!(updated.entity.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn update_of_missing_entity_is_not_found() {
    let err = service().update(&5, &customer("x")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn list_count_and_query_by_example() {
    let service = seeded(&["Ada", "Grace", "Ada"]).await;
    let filter = Filter::new().eq("name", "Ada");
    assert_eq!(service.count(&filter).await.unwrap(), 2);
    assert_eq!(service.list(&Filter::new(), Some(2), Some(2)).await.unwrap().len(), 1);

    let found = service.find_by_example(&customer("Grace"), None, None).await.unwrap();
    assert_eq!(found.iter().map(|c| c.id.unwrap()).collect::<Vec<_>>(), [2]);

    let probes = [customer("Grace"), customer("Ada")];
    assert_eq!(service.find_any_of(&probes, None, None).await.unwrap().len(), 3);

    let err = service.list(&Filter::new().eq("address", "x"), None, None).await.unwrap_err();
    assert!(matches!(err, AppError::Reflect(ReflectError::NoSuchField { .. })));
}

#[tokio::test]
async fn autocomplete_only_on_scalar_fields() {
    let service = seeded(&["Ada", "adam", "Grace", "Ada"]).await;
    assert_eq!(service.autocomplete("name", "ad", None).await.unwrap(), ["Ada", "adam"]);
    assert_eq!(service.autocomplete("name", "ad", Some(1)).await.unwrap(), ["Ada"]);
    assert!(service.autocomplete("tags", "v", None).await.is_err());
}

#[tokio::test]
async fn delete_then_not_found() {
    let service = seeded(&["Ada"]).await;
    service.delete(&1).await.unwrap();
    assert!(matches!(service.delete(&1).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn bulk_operations_respect_limit_and_identity() {
    let settings = Settings {
        bulk_limit: 2,
        ..Settings::default()
    };
    let service = service_with(&settings);
    let created = service.bulk_create(&[customer("Ada"), customer("Grace")]).await.unwrap();
    assert_eq!(created.len(), 2);

    let err = service
        .bulk_create(&[customer("a"), customer("b"), customer("c")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = service.bulk_update(&[customer("anonymous")]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let edits = [
        Customer {
            address: Some(address("Main 1", "Oslo")),
            ..created[0].clone()
        },
        created[1].clone(),
    ];
    let updated = service.bulk_update(&edits).await.unwrap();
    assert_eq!(updated.iter().map(|u| u.changed).collect::<Vec<_>>(), [true, false]);
}

#[tokio::test]
async fn bulk_create_validates_before_storing() {
    let service = service();
    let err = service
        .bulk_create(&[customer("Ada"), Customer::default()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValueRequired(_)));
    assert_eq!(service.count(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn bulk_create_stores_nothing_when_an_identity_is_taken() {
    let service = seeded(&["Ada"]).await;
    let taken = Customer {
        id: Some(1),
        ..customer("Impostor")
    };
    let err = service.bulk_create(&[customer("Grace"), taken]).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(service.count(&Filter::new()).await.unwrap(), 1);

    let twins = [
        Customer {
            id: Some(40),
            ..customer("Castor")
        },
        Customer {
            id: Some(40),
            ..customer("Pollux")
        },
    ];
    assert!(matches!(service.bulk_create(&twins).await, Err(AppError::Conflict(_))));
    assert_eq!(service.count(&Filter::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn bulk_update_saves_nothing_when_an_item_is_missing() {
    let service = seeded(&["Ada"]).await;
    let stored = service.read(&1).await.unwrap();
    let edits = [
        Customer {
            email: Some("new@example.com".into()),
            ..stored.clone()
        },
        Customer {
            id: Some(999),
            ..customer("Ghost")
        },
    ];
    let err = service.bulk_update(&edits).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(service.read(&1).await.unwrap(), stored);

    let repeated = [stored.clone(), stored.clone()];
    assert!(matches!(service.bulk_update(&repeated).await, Err(AppError::Validation(_))));
}
