//! Schema cache for template-driven records.
//!
//! Templates are keyed by the pair `(template id, source)`. Two exporters may
//! announce the same numeric id with different layouts; each keeps its own.
//! A registered template is immutable: redefinition swaps in a new
//! `Arc<Template>`, so a reader holding the old one never observes a partial
//! update.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::TemplateError;

/// One schema slot: field type and its fixed byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field_type: u16,
    pub length: u16,
}

impl FieldSpec {
    pub fn new(field_type: u16, length: u16) -> Self {
        Self { field_type, length }
    }
}

/// Identity of the stream that announced a template.
///
/// `exporter` names the sender (for NetFlow, the exporter address as seen by
/// the collector); `domain` is the sender-local partition (the v9 header
/// `source_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub exporter: String,
    pub domain: u32,
}

impl SourceKey {
    pub fn new(exporter: impl Into<String>) -> Self {
        Self {
            exporter: exporter.into(),
            domain: 0,
        }
    }

    pub fn with_domain(mut self, domain: u32) -> Self {
        self.domain = domain;
        self
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exporter, self.domain)
    }
}

impl From<&str> for SourceKey {
    fn from(value: &str) -> Self {
        SourceKey::new(value)
    }
}

/// A previously announced record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: u16,
    pub source: SourceKey,
    pub fields: Vec<FieldSpec>,
    /// Leading fields that describe the option scope (options templates).
    pub scope_field_count: usize,
    pub record_len: usize,
}

impl Template {
    pub fn new(id: u16, source: SourceKey, fields: Vec<FieldSpec>) -> Result<Self, TemplateError> {
        if fields.is_empty() {
            return Err(TemplateError::Empty { id });
        }
        let record_len: usize = fields.iter().map(|f| usize::from(f.length)).sum();
        let max = usize::from(u16::MAX);
        if record_len > max {
            return Err(TemplateError::TooLong {
                id,
                length: record_len,
                max,
            });
        }
        Ok(Self {
            id,
            source,
            fields,
            scope_field_count: 0,
            record_len,
        })
    }

    pub fn with_scope_fields(mut self, count: usize) -> Self {
        self.scope_field_count = count.min(self.fields.len());
        self
    }
}

type TemplateKey = (u16, SourceKey);

/// Plain associative template store for one decode session.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{FieldSpec, SourceKey, TemplateCache};
///
/// let mut cache = TemplateCache::new();
/// let fields = vec![FieldSpec::new(1, 4), FieldSpec::new(2, 4)];
/// cache.define(5, SourceKey::new("A"), fields).unwrap();
/// assert_eq!(cache.lookup(5, &SourceKey::new("A")).unwrap().record_len, 8);
/// assert!(cache.lookup(5, &SourceKey::new("B")).is_none());
/// ```
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: HashMap<TemplateKey, Arc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the template for `(id, source)`.
    pub fn define(
        &mut self,
        id: u16,
        source: SourceKey,
        fields: Vec<FieldSpec>,
    ) -> Result<Arc<Template>, TemplateError> {
        let template = Template::new(id, source, fields)?;
        Ok(self.insert(template))
    }

    /// Register an already built template (e.g. an options template).
    pub fn insert(&mut self, template: Template) -> Arc<Template> {
        let key = (template.id, template.source.clone());
        let template = Arc::new(template);
        let replaced = self.templates.insert(key, Arc::clone(&template)).is_some();
        debug!(
            id = template.id,
            source = %template.source,
            fields = template.fields.len(),
            replaced,
            "template defined"
        );
        template
    }

    pub fn lookup(&self, id: u16, source: &SourceKey) -> Option<&Template> {
        self.templates
            .get(&(id, source.clone()))
            .map(|template| template.as_ref())
    }

    pub fn lookup_shared(&self, id: u16, source: &SourceKey) -> Option<Arc<Template>> {
        self.templates.get(&(id, source.clone())).cloned()
    }

    /// Drop every template announced by `source`.
    pub fn forget_source(&mut self, source: &SourceKey) -> usize {
        let before = self.templates.len();
        self.templates.retain(|(_, key), _| key != source);
        before - self.templates.len()
    }

    pub fn reset(&mut self) {
        debug!(evicted = self.templates.len(), "template cache reset");
        self.templates.clear();
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Template cache shared between concurrently decoded streams.
///
/// `define` and `lookup` take the lock for the whole operation, so a lookup
/// sees either the previous template or the complete new one.
#[derive(Debug, Default, Clone)]
pub struct SharedTemplateCache {
    inner: Arc<RwLock<TemplateCache>>,
}

impl SharedTemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(
        &self,
        id: u16,
        source: SourceKey,
        fields: Vec<FieldSpec>,
    ) -> Result<Arc<Template>, TemplateError> {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        cache.define(id, source, fields)
    }

    pub fn insert(&self, template: Template) -> Arc<Template> {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        cache.insert(template)
    }

    pub fn lookup(&self, id: u16, source: &SourceKey) -> Option<Arc<Template>> {
        let cache = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        cache.lookup_shared(id, source)
    }

    pub fn forget_source(&self, source: &SourceKey) -> usize {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        cache.forget_source(source)
    }

    pub fn reset(&self) {
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        cache.reset();
    }

    pub fn len(&self) -> usize {
        let cache = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
