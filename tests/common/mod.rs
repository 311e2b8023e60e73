#![allow(dead_code)]

use crudkit::{ClassBuilder, Describe, Identified, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl Describe for Address {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("street", |a| &a.street, |a| &mut a.street).length(60);
        class.scalar("city", |a| &a.city, |a| &mut a.city).not_null();
        class.scalar("zip", |a| &a.zip, |a| &mut a.zip);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Option<i64>,
    pub kind: Option<String>,
    pub value: Option<String>,
}

impl Identified for Contact {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

impl Describe for Contact {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("id", |c| &c.id, |c| &mut c.id);
        class.scalar("kind", |c| &c.kind, |c| &mut c.kind);
        class.scalar("value", |c| &c.value, |c| &mut c.value);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub tier: Option<i32>,
    pub address: Option<Address>,
    pub contacts: Option<Vec<Contact>>,
    pub tags: Option<Vec<String>>,
    pub scores: Option<BTreeMap<String, i64>>,
    pub sites: Option<BTreeMap<String, Address>>,
}

impl Identified for Customer {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

impl Describe for Customer {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("id", |c| &c.id, |c| &mut c.id).read_only();
        class.scalar("name", |c| &c.name, |c| &mut c.name).not_null().length(40);
        class.scalar("email", |c| &c.email, |c| &mut c.email);
        class.scalar("tier", |c| &c.tier, |c| &mut c.tier);
        class.entity("address", |c| &c.address, |c| &mut c.address);
        class.entity_collection("contacts", |c| &c.contacts, |c| &mut c.contacts);
        class.scalar_collection("tags", |c| &c.tags, |c| &mut c.tags);
        class.scalar_map("scores", |c| &c.scores, |c| &mut c.scores);
        class.entity_map("sites", |c| &c.sites, |c| &mut c.sites);
    }
}

impl Resource for Customer {
    const NAME: &'static str = "customers";
}

pub fn contact(id: Option<i64>, value: &str) -> Contact {
    Contact {
        id,
        kind: Some("email".into()),
        value: Some(value.into()),
    }
}

pub fn address(street: &str, city: &str) -> Address {
    Address {
        street: Some(street.into()),
        city: Some(city.into()),
        zip: None,
    }
}

pub fn customer(name: &str) -> Customer {
    Customer {
        name: Some(name.into()),
        ..Customer::default()
    }
}

/// A fully populated customer with id 1.
pub fn full_customer() -> Customer {
    Customer {
        id: Some(1),
        name: Some("Ada".into()),
        email: Some("ada@example.org".into()),
        tier: Some(2),
        address: Some(address("Main 1", "Oslo")),
        contacts: Some(vec![contact(Some(1), "a"), contact(Some(2), "b")]),
        tags: Some(vec!["vip".into()]),
        scores: Some(BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)])),
        sites: Some(BTreeMap::from([("hq".to_string(), address("Main 1", "Oslo"))])),
    }
}
