use serde_json::{Map, Value};

use crate::{DocumentId, DocumentStoreError, ID_FIELD, Result};

/// Selects documents within a collection.
///
/// Equality predicates compare top-level fields exactly. Range predicates
/// (`gte`) only match integer fields. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    equals: Map<String, Value>,
    at_least: Vec<(String, i64)>,
}

impl Filter {
    /// Creates a filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching the document with the given ID.
    pub fn by_id(id: impl Into<DocumentId>) -> Self {
        Self::new().eq_id(ID_FIELD, id)
    }

    /// Requires `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(field.into(), value.into());
        self
    }

    /// Requires `field` to hold the given ID.
    pub fn eq_id(self, field: impl Into<String>, id: impl Into<DocumentId>) -> Self {
        let id: DocumentId = id.into();
        self.eq(field, id.to_string())
    }

    /// Requires integer `field` to be greater than or equal to `min`.
    pub fn gte(mut self, field: impl Into<String>, min: i64) -> Self {
        self.at_least.push((field.into(), min));
        self
    }

    /// Returns the equality predicates as a JSON object.
    pub fn equalities(&self) -> Value {
        Value::Object(self.equals.clone())
    }

    /// Returns true if the filter carries range predicates.
    pub fn has_ranges(&self) -> bool {
        !self.at_least.is_empty()
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, document: &Value) -> bool {
        let Some(fields) = document.as_object() else {
            return false;
        };

        let equal = self
            .equals
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected));

        equal
            && self.at_least.iter().all(|(field, min)| {
                fields
                    .get(field)
                    .and_then(Value::as_i64)
                    .is_some_and(|actual| actual >= *min)
            })
    }
}

/// Describes a modification applied to a single matched document.
///
/// `set` assigns whole field values; `inc` adds a signed amount to an integer
/// field, treating a missing field as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    set: Map<String, Value>,
    inc: Vec<(String, i64)>,
}

impl UpdateSpec {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `value` to `field`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Adds `by` to the integer `field`.
    pub fn inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.inc.push((field.into(), by));
        self
    }

    /// Returns true if the update does nothing.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty()
    }

    /// Applies the update to a document in place.
    ///
    /// The document is left untouched if any part of the update is invalid.
    pub fn apply(&self, document: &mut Value) -> Result<()> {
        let fields = document
            .as_object()
            .ok_or_else(|| DocumentStoreError::InvalidDocument("not a JSON object".to_string()))?;

        if self.set.contains_key(ID_FIELD) || self.inc.iter().any(|(f, _)| f == ID_FIELD) {
            return Err(DocumentStoreError::InvalidUpdate(
                "the _id field is immutable".to_string(),
            ));
        }

        let mut increments = Vec::with_capacity(self.inc.len());
        for (field, by) in &self.inc {
            let current = match fields.get(field) {
                None | Some(Value::Null) => 0,
                Some(value) => value.as_i64().ok_or_else(|| {
                    DocumentStoreError::InvalidUpdate(format!("field '{field}' is not an integer"))
                })?,
            };
            let next = current.checked_add(*by).ok_or_else(|| {
                DocumentStoreError::InvalidUpdate(format!("increment of '{field}' overflows"))
            })?;
            increments.push((field.clone(), next));
        }

        let Some(fields) = document.as_object_mut() else {
            return Err(DocumentStoreError::InvalidDocument(
                "not a JSON object".to_string(),
            ));
        };
        for (field, value) in &self.set {
            fields.insert(field.clone(), value.clone());
        }
        for (field, next) in increments {
            fields.insert(field, Value::from(next));
        }
        Ok(())
    }
}

/// Extracts the [`DocumentId`] from a document's `_id` field.
pub fn document_id_of(document: &Value) -> Result<DocumentId> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| DocumentStoreError::InvalidDocument("missing or malformed _id".to_string()))
}
