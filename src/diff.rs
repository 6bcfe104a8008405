use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Entities whose editable fields can be compared one by one.
///
/// Nested data that is not listed here (rosters, embedded teams, server
/// timestamps) never shows up in a diff. Text fields should go through
/// [`text_value`] so stored padding never counts as an edit.
pub trait Editable {
    fn editable_fields(&self) -> Vec<(&'static str, Value)>;
}

/// Trimmed JSON string, the form-side reading of a stored text value.
pub fn text_value(value: &str) -> Value {
    Value::String(value.trim().to_string())
}

/// Frozen copy of an entity taken when an editor opens.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    entity: T,
}

impl<T: Clone> Snapshot<T> {
    pub fn take(entity: &T) -> Self {
        Self {
            entity: entity.clone(),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn get(&self) -> &T {
        &self.entity
    }
}

/// Wire field name → new value, only for fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    fields: BTreeMap<&'static str, Value>,
}

impl ChangeSet {
    pub fn between<T: Editable>(snapshot: &Snapshot<T>, edited: &T) -> Self {
        let before = snapshot.get().editable_fields();
        let fields = edited
            .editable_fields()
            .into_iter()
            .filter(|(name, value)| {
                before
                    .iter()
                    .find(|(b, _)| b == name)
                    .is_none_or(|(_, old)| old != value)
            })
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}
