use serde_json::Value;

use crate::{Collection, Document, ID_FIELD};

/// Conjunction of field-equality conditions on top-level document fields.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// `(field, value)` pairs that must all be equal for a document to match.
    pub conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching the document with the given primary id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(ID_FIELD, Value::String(id.into()))
    }

    /// Adds an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Returns true if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// Attaches every document of `from` whose `foreign_field` equals the input's
/// `local_field` as an array under `as_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub from: Collection,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
}

/// Flattens the array at `path` into one output document per element.
///
/// Inputs whose array is missing or empty are dropped unless
/// `preserve_null_and_empty` is set, in which case they pass through with
/// the field removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwind {
    pub path: String,
    pub preserve_null_and_empty: bool,
}

/// A single step of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Lookup(Lookup),
    Unwind(Unwind),
    Match(Filter),
}

impl Stage {
    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Lookup(_) => "lookup",
            Stage::Unwind(_) => "unwind",
            Stage::Match(_) => "match",
        }
    }
}

/// Ordered sequence of stages evaluated by the store as one logical operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Creates an empty pipeline, which passes every document through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lookup stage.
    pub fn lookup(
        mut self,
        from: Collection,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.stages.push(Stage::Lookup(Lookup {
            from,
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        }));
        self
    }

    /// Appends an unwind stage that drops documents with nothing to unwind.
    pub fn unwind(mut self, path: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind(Unwind {
            path: path.into(),
            preserve_null_and_empty: false,
        }));
        self
    }

    /// Appends an unwind stage that keeps documents with nothing to unwind.
    pub fn unwind_preserving(mut self, path: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind(Unwind {
            path: path.into(),
            preserve_null_and_empty: true,
        }));
        self
    }

    /// Appends a match stage.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    /// Returns the stage names in evaluation order, for logs.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }
}
