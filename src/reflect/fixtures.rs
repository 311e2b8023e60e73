//! Sample entities shared by unit tests.

use super::{ClassBuilder, Describe, Identified};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
}

impl Describe for Address {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("street", |a| &a.street, |a| &mut a.street).length(40);
        class.scalar("city", |a| &a.city, |a| &mut a.city).not_null();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: Option<i64>,
    pub label: Option<String>,
    pub quantity: Option<i32>,
}

impl Identified for Line {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

impl Describe for Line {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("id", |l| &l.id, |l| &mut l.id);
        class.scalar("label", |l| &l.label, |l| &mut l.label);
        class.scalar("quantity", |l| &l.quantity, |l| &mut l.quantity);
    }
}

pub fn line(id: Option<i64>, label: &str) -> Line {
    Line {
        id,
        label: Some(label.to_string()),
        quantity: None,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<String>,
    pub address: Option<Address>,
    pub lines: Option<Vec<Line>>,
    pub tags: Option<Vec<String>>,
    pub counters: Option<BTreeMap<String, i64>>,
    pub stops: Option<BTreeMap<String, Address>>,
}

impl Identified for Order {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

impl Describe for Order {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("id", |o| &o.id, |o| &mut o.id).not_null();
        class.scalar("reference", |o| &o.reference, |o| &mut o.reference).not_null().length(16);
        class.scalar("note", |o| &o.note, |o| &mut o.note);
        class
            .scalar("created_by", |o| &o.created_by, |o| &mut o.created_by)
            .read_only();
        class.entity("address", |o| &o.address, |o| &mut o.address);
        class.entity_collection("lines", |o| &o.lines, |o| &mut o.lines);
        class.scalar_collection("tags", |o| &o.tags, |o| &mut o.tags);
        class.scalar_map("counters", |o| &o.counters, |o| &mut o.counters);
        class.entity_map("stops", |o| &o.stops, |o| &mut o.stops);
    }
}

/// Declares the same field name twice.
#[derive(Default)]
pub struct Twice {
    a: Option<i32>,
}

impl Describe for Twice {
    fn describe(class: &mut ClassBuilder<Self>) {
        class.scalar("a", |t| &t.a, |t| &mut t.a);
        class.scalar("a", |t| &t.a, |t| &mut t.a);
    }
}
