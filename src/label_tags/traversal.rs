//! Which label fields carry tags, and where
//!
//! Kept apart from expression generation so the field walk can be checked
//! without rendering anything.

use crate::schema::{SchemaCatalog, FRAMES_PREFIX};

/// Document level a label field lives at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLevel {
    Sample,
    Frame,
}

/// One label field contributing tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSource {
    /// Public path of the label field (`gt`, `frames.cls`)
    pub path: String,
    /// Storage path relative to its level (`gt`, `cls`)
    pub db_path: String,
    pub level: TagLevel,
    /// Element attribute of label-list containers (`detections`)
    pub list_attribute: Option<&'static str>,
}

impl TagSource {
    /// Storage path of the tags array relative to the label's level
    pub fn relative_tags_path(&self) -> String {
        match self.list_attribute {
            Some(attr) => format!("{}.{}.tags", self.db_path, attr),
            None => format!("{}.tags", self.db_path),
        }
    }

    /// Storage path of the tags array from the document root
    pub fn tags_path(&self) -> String {
        match self.level {
            TagLevel::Sample => self.relative_tags_path(),
            TagLevel::Frame => format!("{}{}", FRAMES_PREFIX, self.relative_tags_path()),
        }
    }
}

/// Every label field, sample level first then frame level, each sorted by path
pub fn label_tag_sources(catalog: &dyn SchemaCatalog) -> Vec<TagSource> {
    let mut sources: Vec<TagSource> = catalog
        .label_fields()
        .into_iter()
        .map(|field| {
            let db = catalog.db_path(&field.path);
            let (level, db_path) = match db.strip_prefix(FRAMES_PREFIX) {
                Some(rel) if field.path.starts_with(FRAMES_PREFIX) => {
                    (TagLevel::Frame, rel.to_string())
                }
                _ => (TagLevel::Sample, db.clone()),
            };
            TagSource {
                path: field.path.clone(),
                db_path,
                level,
                list_attribute: field.label_list_attribute(),
            }
        })
        .collect();
    sources.sort_by_key(|s| s.level == TagLevel::Frame);
    sources
}
