//! Path classification
//!
//! Decides which assembler consumes a filtered path. A path is resolved to
//! `(path, parent_path, spec)`; the parent decides the route:
//!
//! - parent is a label (singular, or a label-list container) → label filters
//! - parent is a list of plain embedded documents → field filters
//! - anything else → the document-level match
//!
//! Filters on a label list's element attributes (`gt.detections.label`)
//! classify against the container (`gt`), not the element list.

use crate::schema::{FieldSpec, LabelKind, SchemaCatalog};

use super::errors::{FilterError, FilterResult};
use super::spec::{FilterSpec, Filters};

/// Sample tags are filtered by their own stage
pub const TAGS_PATH: &str = "tags";

/// What a filtered path's parent is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Label(LabelKind),
    EmbeddedList,
    Other,
}

/// A filtered path resolved against the schema
#[derive(Debug, Clone)]
pub struct ClassifiedPath<'a> {
    pub path: &'a str,
    pub parent_path: String,
    pub field: &'a FieldSpec,
    pub parent: ParentKind,
    pub spec: &'a FilterSpec,
}

impl ClassifiedPath<'_> {
    /// Label kind of the parent if the parent is a label
    pub fn label_kind(&self) -> Option<LabelKind> {
        match self.parent {
            ParentKind::Label(kind) => Some(kind),
            ParentKind::EmbeddedList | ParentKind::Other => None,
        }
    }
}

/// Whether a path is handled outside the classifier
pub fn is_reserved_path(path: &str) -> bool {
    path == TAGS_PATH || path.starts_with('_')
}

fn parent_of(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Shared normalization for both classifiers
fn classify<'a>(
    catalog: &'a dyn SchemaCatalog,
    path: &'a str,
    spec: &'a FilterSpec,
) -> FilterResult<Option<ClassifiedPath<'a>>> {
    if is_reserved_path(path) {
        return Ok(None);
    }

    let field = catalog
        .get_field(path)
        .ok_or_else(|| FilterError::unknown_field(path))?;

    let mut parent_path = parent_of(path);
    let mut parent_field = catalog.get_field(parent_path);

    if parent_field.map(|f| f.kind.is_label_list()).unwrap_or(false) {
        parent_path = parent_of(parent_path);
        parent_field = catalog.get_field(parent_path);
    }

    let parent = match parent_field {
        Some(f) if parent_path != path => match f.kind.label_kind() {
            Some(kind) => ParentKind::Label(kind),
            None if f.kind.is_embedded_list() => ParentKind::EmbeddedList,
            None => ParentKind::Other,
        },
        _ => ParentKind::Other,
    };

    Ok(Some(ClassifiedPath {
        path,
        parent_path: parent_path.to_string(),
        field,
        parent,
        spec,
    }))
}

/// Paths whose parent is not a label, in sorted-path order
pub fn classify_scalar_paths<'a>(
    catalog: &'a dyn SchemaCatalog,
    filters: &'a Filters,
) -> FilterResult<Vec<ClassifiedPath<'a>>> {
    let mut out = Vec::new();
    for (path, spec) in filters {
        if let Some(c) = classify(catalog, path, spec)? {
            if c.label_kind().is_none() {
                out.push(c);
            }
        }
    }
    Ok(out)
}

/// Paths whose parent is a label (singular or list), in sorted-path order
pub fn classify_label_paths<'a>(
    catalog: &'a dyn SchemaCatalog,
    filters: &'a Filters,
) -> FilterResult<Vec<ClassifiedPath<'a>>> {
    let mut out = Vec::new();
    for (path, spec) in filters {
        if let Some(c) = classify(catalog, path, spec)? {
            if c.label_kind().is_some() {
                out.push(c);
            }
        }
    }
    Ok(out)
}
