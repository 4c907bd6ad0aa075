//! Per-evaluation context
//!
//! A [`FormulaContext`] is the snapshot of document state a single
//! evaluation runs against: field values, mentioned entities, sibling
//! items, and the clock. The host builds a fresh context per evaluation and
//! the engine never mutates it, so concurrent evaluations cannot observe
//! each other's state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::services::{ExternalServices, NoServices};
use crate::value::Value;

/// An entity mentioned in the current document (person, project, ...)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef {
    /// Stable identifier assigned by the host
    pub id: String,
    /// Display name
    pub name: String,
    /// Host-defined kind, e.g. "person" or "project"
    pub entity_type: String,
}

/// A sibling item of the current document (list entry, child page, ...)
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRef {
    /// Host path of the item
    pub path: String,
    /// Display title
    pub title: String,
    /// Field values of the item, for aggregate functions
    pub fields: HashMap<String, Value>,
}

/// Snapshot of document state for one evaluation
#[derive(Clone)]
pub struct FormulaContext {
    /// Path of the document being evaluated
    pub doc_path: String,
    /// Identifier of the formula block within the document
    pub block_id: String,
    /// The evaluation's notion of "now"; `NOW()`/`TODAY()` read this so a
    /// single preview cycle is internally consistent
    pub now: DateTime<Utc>,
    /// Field values of the current document
    pub fields: HashMap<String, Value>,
    /// Entities mentioned in the current document
    pub mentions: Vec<EntityRef>,
    /// Sibling items of the current document
    pub siblings: Vec<ItemRef>,
    /// Providers for the I/O-bound contextual functions
    pub services: Arc<dyn ExternalServices>,
}

impl FormulaContext {
    /// Start building a context
    pub fn builder() -> FormulaContextBuilder {
        FormulaContextBuilder::default()
    }

    /// Look up a field value, `None` when absent
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Find a mention by display name (case-insensitive)
    pub fn mention(&self, name: &str) -> Option<&EntityRef> {
        self.mentions
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for FormulaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaContext")
            .field("doc_path", &self.doc_path)
            .field("block_id", &self.block_id)
            .field("now", &self.now)
            .field("fields", &self.fields)
            .field("mentions", &self.mentions)
            .field("siblings", &self.siblings)
            .finish_non_exhaustive()
    }
}

impl Default for FormulaContext {
    fn default() -> Self {
        FormulaContext::builder().build()
    }
}

/// Builder for [`FormulaContext`]
#[derive(Default)]
pub struct FormulaContextBuilder {
    doc_path: Option<String>,
    block_id: Option<String>,
    now: Option<DateTime<Utc>>,
    fields: HashMap<String, Value>,
    mentions: Vec<EntityRef>,
    siblings: Vec<ItemRef>,
    services: Option<Arc<dyn ExternalServices>>,
}

impl FormulaContextBuilder {
    /// Set the path of the document being evaluated
    pub fn doc_path<S: Into<String>>(mut self, path: S) -> Self {
        self.doc_path = Some(path.into());
        self
    }

    /// Set the identifier of the formula block
    pub fn block_id<S: Into<String>>(mut self, id: S) -> Self {
        self.block_id = Some(id.into());
        self
    }

    /// Pin the evaluation clock (defaults to the wall clock at build time)
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Add a single field value
    pub fn field<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Replace the full field map
    pub fn fields(mut self, fields: HashMap<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    /// Add a mentioned entity
    pub fn mention(mut self, mention: EntityRef) -> Self {
        self.mentions.push(mention);
        self
    }

    /// Replace the mention list
    pub fn mentions(mut self, mentions: Vec<EntityRef>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Add a sibling item
    pub fn sibling(mut self, sibling: ItemRef) -> Self {
        self.siblings.push(sibling);
        self
    }

    /// Replace the sibling list
    pub fn siblings(mut self, siblings: Vec<ItemRef>) -> Self {
        self.siblings = siblings;
        self
    }

    /// Set the external service providers
    pub fn services(mut self, services: Arc<dyn ExternalServices>) -> Self {
        self.services = Some(services);
        self
    }

    /// Finish building the snapshot
    pub fn build(self) -> FormulaContext {
        FormulaContext {
            doc_path: self.doc_path.unwrap_or_default(),
            block_id: self.block_id.unwrap_or_default(),
            now: self.now.unwrap_or_else(Utc::now),
            fields: self.fields,
            mentions: self.mentions,
            siblings: self.siblings,
            services: self.services.unwrap_or_else(|| Arc::new(NoServices)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_defaults() {
        let ctx = FormulaContext::builder().build();
        assert_eq!(ctx.doc_path, "");
        assert_eq!(ctx.block_id, "");
        assert!(ctx.fields.is_empty());
        assert!(ctx.mentions.is_empty());
        assert!(ctx.siblings.is_empty());
    }

    #[test]
    fn test_field_lookup() {
        let ctx = FormulaContext::builder()
            .doc_path("notes/today.md")
            .field("price", 100.0)
            .field("label", "invoice")
            .build();

        assert_eq!(ctx.field("price"), Some(&Value::Number(100.0)));
        assert_eq!(ctx.field("label"), Some(&Value::text("invoice")));
        assert_eq!(ctx.field("missing"), None);
    }

    #[test]
    fn test_mention_lookup_is_case_insensitive() {
        let ctx = FormulaContext::builder()
            .mention(EntityRef {
                id: "e1".into(),
                name: "Ada Lovelace".into(),
                entity_type: "person".into(),
            })
            .build();

        assert!(ctx.mention("ada lovelace").is_some());
        assert!(ctx.mention("Grace Hopper").is_none());
    }
}
