//! Schema catalog
//!
//! The catalog is the read-only lookup the compiler consults for every
//! filtered path. It is shared across concurrent view builds, so
//! implementations must be `Send + Sync` and never mutate on read.

use std::collections::BTreeMap;
use std::fmt;

use super::types::{FieldKind, FieldSpec, LabelKind};

/// Prefix under which frame-level fields live
pub const FRAMES_PREFIX: &str = "frames.";

/// Read-only field lookup
pub trait SchemaCatalog: fmt::Debug + Send + Sync {
    /// Looks up a field by full dotted path (frame fields use `frames.`)
    fn get_field(&self, path: &str) -> Option<&FieldSpec>;

    /// Sample-level fields: top level only, or every nested path if `flat`
    fn get_field_schema(&self, flat: bool) -> Vec<&FieldSpec>;

    /// Frame-level fields, paths still carrying the `frames.` prefix
    fn get_frame_field_schema(&self, flat: bool) -> Vec<&FieldSpec>;

    /// Storage path of `path`, mapping each component to its storage name
    fn db_path(&self, path: &str) -> String {
        let mut prefix = String::new();
        let mut parts = Vec::new();
        for component in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(component);
            let db = self
                .get_field(&prefix)
                .map(|f| f.db_field.as_str())
                .unwrap_or(component);
            parts.push(db.to_string());
        }
        parts.join(".")
    }

    /// Every label field, sample- and frame-level, sorted by path
    fn label_fields(&self) -> Vec<&FieldSpec> {
        let mut fields: Vec<&FieldSpec> = self
            .get_field_schema(true)
            .into_iter()
            .chain(self.get_frame_field_schema(true))
            .filter(|f| f.kind.label_kind().is_some())
            .collect();
        fields.sort_by(|a, b| a.path.cmp(&b.path));
        fields
    }
}

/// In-memory catalog keyed by full path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn select(&self, frames: bool, flat: bool) -> Vec<&FieldSpec> {
        self.fields
            .values()
            .filter(|f| f.path.starts_with(FRAMES_PREFIX) == frames)
            .filter(|f| {
                let rel = if frames {
                    &f.path[FRAMES_PREFIX.len()..]
                } else {
                    f.path.as_str()
                };
                flat || !rel.contains('.')
            })
            .collect()
    }
}

impl SchemaCatalog for Schema {
    fn get_field(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.get(path)
    }

    fn get_field_schema(&self, flat: bool) -> Vec<&FieldSpec> {
        self.select(false, flat)
    }

    fn get_frame_field_schema(&self, flat: bool) -> Vec<&FieldSpec> {
        self.select(true, flat)
    }
}

/// Builds a `Schema`, expanding label fields into their attributes
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: BTreeMap<String, FieldSpec>,
}

impl SchemaBuilder {
    /// Adds a plain field
    pub fn field(mut self, path: impl Into<String>, kind: FieldKind) -> Self {
        let spec = FieldSpec::new(path, kind);
        self.fields.insert(spec.path.clone(), spec);
        self
    }

    /// Adds a field whose storage name differs from its path component
    pub fn field_with_db(
        mut self,
        path: impl Into<String>,
        kind: FieldKind,
        db_field: impl Into<String>,
    ) -> Self {
        let spec = FieldSpec::new(path, kind).with_db_field(db_field);
        self.fields.insert(spec.path.clone(), spec);
        self
    }

    /// Adds a label field.
    ///
    /// Label-list containers register their element list (`gt.detections`)
    /// and put attributes on the elements; singular labels carry them
    /// directly. `attributes` extend or override the kind's builtins.
    pub fn label(
        mut self,
        path: impl Into<String>,
        kind: LabelKind,
        attributes: &[(&str, FieldKind)],
    ) -> Self {
        let path = path.into();
        self.fields
            .insert(path.clone(), FieldSpec::new(path.clone(), FieldKind::label(kind)));

        let (element_path, element_kind) = match (kind.list_attribute(), kind.element_kind()) {
            (Some(attr), Some(element)) => {
                let element_path = format!("{}.{}", path, attr);
                self.fields.insert(
                    element_path.clone(),
                    FieldSpec::new(
                        element_path.clone(),
                        FieldKind::list(FieldKind::label(element)),
                    ),
                );
                (element_path, element)
            }
            _ => (path, kind),
        };

        let mut attrs: Vec<(String, FieldKind)> = vec![
            ("id".to_string(), FieldKind::ObjectId),
            ("tags".to_string(), FieldKind::list(FieldKind::String)),
        ];
        attrs.extend(
            element_kind
                .builtin_attributes()
                .into_iter()
                .map(|(name, kind)| (name.to_string(), kind)),
        );
        attrs.extend(attributes.iter().map(|(n, k)| (n.to_string(), k.clone())));

        for (name, kind) in attrs {
            let spec = FieldSpec::new(format!("{}.{}", element_path, name), kind);
            self.fields.insert(spec.path.clone(), spec);
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}
