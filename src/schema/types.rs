//! Field type definitions
//!
//! Field kinds form a closed sum type. Every predicate builder matches on it
//! exhaustively, so adding a kind is a compile error until each builder has
//! decided what to do with it.

use serde::{Deserialize, Serialize};

/// Annotation document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Classification,
    Classifications,
    Detection,
    Detections,
    Polyline,
    Polylines,
    Keypoint,
    Keypoints,
    TemporalDetection,
    TemporalDetections,
    Segmentation,
    Heatmap,
    Regression,
}

impl LabelKind {
    pub const ALL: [LabelKind; 13] = [
        LabelKind::Classification,
        LabelKind::Classifications,
        LabelKind::Detection,
        LabelKind::Detections,
        LabelKind::Polyline,
        LabelKind::Polylines,
        LabelKind::Keypoint,
        LabelKind::Keypoints,
        LabelKind::TemporalDetection,
        LabelKind::TemporalDetections,
        LabelKind::Segmentation,
        LabelKind::Heatmap,
        LabelKind::Regression,
    ];

    /// Name of the attribute holding the elements of a label-list container
    pub fn list_attribute(&self) -> Option<&'static str> {
        match self {
            LabelKind::Classifications => Some("classifications"),
            LabelKind::Detections => Some("detections"),
            LabelKind::Polylines => Some("polylines"),
            LabelKind::Keypoints => Some("keypoints"),
            LabelKind::TemporalDetections => Some("detections"),
            LabelKind::Classification
            | LabelKind::Detection
            | LabelKind::Polyline
            | LabelKind::Keypoint
            | LabelKind::TemporalDetection
            | LabelKind::Segmentation
            | LabelKind::Heatmap
            | LabelKind::Regression => None,
        }
    }

    /// Element type of a label-list container
    pub fn element_kind(&self) -> Option<LabelKind> {
        match self {
            LabelKind::Classifications => Some(LabelKind::Classification),
            LabelKind::Detections => Some(LabelKind::Detection),
            LabelKind::Polylines => Some(LabelKind::Polyline),
            LabelKind::Keypoints => Some(LabelKind::Keypoint),
            LabelKind::TemporalDetections => Some(LabelKind::TemporalDetection),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.list_attribute().is_some()
    }

    pub fn is_keypoints(&self) -> bool {
        matches!(self, LabelKind::Keypoint | LabelKind::Keypoints)
    }

    /// Attributes every instance of this kind carries besides `id` and `tags`
    pub fn builtin_attributes(&self) -> Vec<(&'static str, FieldKind)> {
        let float_list = || FieldKind::list(FieldKind::Float);
        match self {
            LabelKind::Classification => vec![
                ("label", FieldKind::String),
                ("confidence", FieldKind::Float),
            ],
            LabelKind::Detection => vec![
                ("label", FieldKind::String),
                ("confidence", FieldKind::Float),
                ("bounding_box", float_list()),
            ],
            LabelKind::Polyline => vec![
                ("label", FieldKind::String),
                ("confidence", FieldKind::Float),
                ("closed", FieldKind::Bool),
                ("filled", FieldKind::Bool),
            ],
            LabelKind::Keypoint => vec![
                ("label", FieldKind::String),
                ("points", FieldKind::list(float_list())),
                ("confidence", float_list()),
            ],
            LabelKind::TemporalDetection => vec![
                ("label", FieldKind::String),
                ("confidence", FieldKind::Float),
                ("support", FieldKind::FrameSupport),
            ],
            LabelKind::Regression => vec![
                ("value", FieldKind::Float),
                ("confidence", FieldKind::Float),
            ],
            LabelKind::Segmentation | LabelKind::Heatmap => vec![("mask_path", FieldKind::String)],
            LabelKind::Classifications
            | LabelKind::Detections
            | LabelKind::Polylines
            | LabelKind::Keypoints
            | LabelKind::TemporalDetections => Vec::new(),
        }
    }
}

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    String,
    ObjectId,
    Int,
    Float,
    Date,
    DateTime,
    /// `[first, last]` frame range
    FrameSupport,
    /// Free-form dictionary
    Dict,
    List {
        element: Box<FieldKind>,
    },
    /// Embedded document that is not a label
    Embedded,
    /// Embedded annotation document
    Label {
        label: LabelKind,
    },
}

impl FieldKind {
    pub fn list(element: FieldKind) -> Self {
        FieldKind::List {
            element: Box::new(element),
        }
    }

    pub fn label(kind: LabelKind) -> Self {
        FieldKind::Label { label: kind }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::ObjectId => "object_id",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::FrameSupport => "frame_support",
            FieldKind::Dict => "dict",
            FieldKind::List { .. } => "list",
            FieldKind::Embedded => "embedded",
            FieldKind::Label { .. } => "label",
        }
    }

    /// Label kind if this is a label field
    pub fn label_kind(&self) -> Option<LabelKind> {
        match self {
            FieldKind::Label { label } => Some(*label),
            _ => None,
        }
    }

    /// Element kind if this is a list field
    pub fn element(&self) -> Option<&FieldKind> {
        match self {
            FieldKind::List { element } => Some(element.as_ref()),
            _ => None,
        }
    }

    /// `List<Label>`: the element container inside a label-list field
    pub fn is_label_list(&self) -> bool {
        matches!(self.element(), Some(FieldKind::Label { .. }))
    }

    /// `List<Embedded>` holding plain (non-label) documents
    pub fn is_embedded_list(&self) -> bool {
        matches!(self.element(), Some(FieldKind::Embedded))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int | FieldKind::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::DateTime)
    }
}

/// Media type of a dataset or group slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    PointCloud,
    ThreeD,
    Group,
}

/// A resolved field in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Full dotted path (`ground_truth.detections.label`)
    pub path: String,
    /// Field data type
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Storage name of the last path component (`id` is stored as `_id`)
    pub db_field: String,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        let path = path.into();
        let name = path.rsplit('.').next().unwrap_or_default();
        let db_field = if name == "id" {
            "_id".to_string()
        } else {
            name.to_string()
        };
        Self {
            path,
            kind,
            db_field,
        }
    }

    pub fn with_db_field(mut self, db_field: impl Into<String>) -> Self {
        self.db_field = db_field.into();
        self
    }

    /// Last path component
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Whether this is a label-list container (`Detections`, `Classifications`, ...)
    pub fn is_list_of_labels(&self) -> bool {
        self.kind.label_kind().map(|k| k.is_list()).unwrap_or(false)
    }

    /// Attribute holding the container's elements, if any
    pub fn label_list_attribute(&self) -> Option<&'static str> {
        self.kind.label_kind().and_then(|k| k.list_attribute())
    }
}
