//! Shared helpers for integration tests
//!
//! `Executor` is a small in-memory reference engine for compiled stages. It
//! covers the operators the compiler emits, with the executor's semantics
//! for missing fields, arrays and mixed-type comparison, so tests can check
//! what a pipeline keeps instead of how it is spelled.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use aeroview::schema::{FieldKind, LabelKind, MediaType, Schema, SchemaCatalog, Skeleton, SkeletonRegistry};
use aeroview::stages::Stage;
use aeroview::view::{CompilerConfig, Dataset, InMemoryDatasets, ViewCompiler, ViewRequest};
use regex::RegexBuilder;
use serde_json::{json, Map, Value};

/// Element attributes of label-list containers
const LIST_ATTRIBUTES: [&str; 4] = ["detections", "classifications", "polylines", "keypoints"];

// =============================================================================
// Fixtures
// =============================================================================

pub const ID_A: &str = "64b7f0c2a1b2c3d4e5f60701";
pub const ID_B: &str = "64b7f0c2a1b2c3d4e5f60702";
pub const ID_C: &str = "64b7f0c2a1b2c3d4e5f60703";
pub const GROUP_1: &str = "64b7f0c2a1b2c3d4e5f60801";
pub const GROUP_2: &str = "64b7f0c2a1b2c3d4e5f60802";

pub fn oid(hex: &str) -> Value {
    json!({"$oid": hex})
}

/// Image dataset with scalar, label and keypoint fields
pub fn image_dataset() -> Dataset {
    let schema: Arc<dyn SchemaCatalog> = Arc::new(
        Schema::builder()
            .field("id", FieldKind::ObjectId)
            .field("filepath", FieldKind::String)
            .field("tags", FieldKind::list(FieldKind::String))
            .field("metadata", FieldKind::Dict)
            .field("reviewed", FieldKind::Bool)
            .field("count", FieldKind::Int)
            .field("score", FieldKind::Float)
            .field("captured_at", FieldKind::DateTime)
            .field("notes", FieldKind::list(FieldKind::Embedded))
            .field("notes.author", FieldKind::String)
            .label("label", LabelKind::Classification, &[])
            .label("other", LabelKind::Classification, &[])
            .label("gt", LabelKind::Detections, &[("iscrowd", FieldKind::Bool)])
            .label("kp", LabelKind::Keypoints, &[("visible", FieldKind::list(FieldKind::Bool))])
            .build(),
    );
    Dataset::new("images", MediaType::Image, schema).with_skeletons(
        SkeletonRegistry::new().with_field("kp", Skeleton::new(["nose", "left_eye", "right_eye"])),
    )
}

/// Video dataset with sample- and frame-level labels
pub fn video_dataset() -> Dataset {
    let schema: Arc<dyn SchemaCatalog> = Arc::new(
        Schema::builder()
            .field("id", FieldKind::ObjectId)
            .field("tags", FieldKind::list(FieldKind::String))
            .field("metadata", FieldKind::Dict)
            .field("frames.id", FieldKind::ObjectId)
            .field("frames.frame_number", FieldKind::Int)
            .label("events", LabelKind::TemporalDetections, &[])
            .label("frames.objs", LabelKind::Detections, &[])
            .label("frames.scene", LabelKind::Classification, &[])
            .build(),
    );
    Dataset::new("videos", MediaType::Video, schema)
}

/// Grouped dataset with three slices
pub fn group_dataset() -> Dataset {
    let schema: Arc<dyn SchemaCatalog> = Arc::new(
        Schema::builder()
            .field("id", FieldKind::ObjectId)
            .field("filepath", FieldKind::String)
            .field("group", FieldKind::Embedded)
            .field("group.id", FieldKind::ObjectId)
            .field("group.name", FieldKind::String)
            .label("gt", LabelKind::Detections, &[])
            .build(),
    );
    Dataset::new("groups", MediaType::Group, schema).with_groups(
        "group",
        [
            ("left".to_string(), MediaType::Image),
            ("right".to_string(), MediaType::Image),
            ("pcd".to_string(), MediaType::PointCloud),
        ],
        Some("left".into()),
    )
}

/// Image dataset without any label field
pub fn plain_dataset() -> Dataset {
    let schema: Arc<dyn SchemaCatalog> = Arc::new(
        Schema::builder()
            .field("id", FieldKind::ObjectId)
            .field("filepath", FieldKind::String)
            .field("tags", FieldKind::list(FieldKind::String))
            .build(),
    );
    Dataset::new("plain", MediaType::Image, schema)
}

/// Decodes a request the way the wire layer does
pub fn request(value: Value) -> ViewRequest {
    serde_json::from_value(value).unwrap()
}

/// Stages compiled for `value` by the default compiler
pub fn compile(value: Value) -> Vec<Stage> {
    compiler()
        .get_view(&request(value))
        .unwrap()
        .stages()
        .to_vec()
}

pub fn compiler() -> ViewCompiler {
    compiler_with(CompilerConfig::default())
}

pub fn compiler_with(config: CompilerConfig) -> ViewCompiler {
    let source = InMemoryDatasets::new()
        .with(image_dataset())
        .with(video_dataset())
        .with(group_dataset())
        .with(plain_dataset());
    ViewCompiler::new(Arc::new(source), config)
}

pub fn classification(label: &str, tags: &[&str]) -> Value {
    json!({"_cls": "Classification", "label": label, "tags": tags})
}

pub fn detection(label: &str, confidence: f64, tags: &[&str]) -> Value {
    json!({"_cls": "Detection", "label": label, "confidence": confidence, "tags": tags})
}

pub fn detections(items: Vec<Value>) -> Value {
    json!({"_cls": "Detections", "detections": items})
}

pub fn ids(docs: &[Value]) -> Vec<String> {
    docs.iter()
        .map(|d| d["_id"]["$oid"].as_str().unwrap_or("").to_string())
        .collect()
}

// =============================================================================
// Reference executor
// =============================================================================

#[derive(Debug, Default)]
pub struct Executor {
    skeletons: BTreeMap<String, Vec<String>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skeleton(mut self, field: &str, labels: &[&str]) -> Self {
        self.skeletons
            .insert(field.to_string(), labels.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn run(&self, stages: &[Stage], docs: Vec<Value>) -> Vec<Value> {
        stages
            .iter()
            .fold(docs, |docs, stage| self.apply(stage, docs))
    }

    fn apply(&self, stage: &Stage, docs: Vec<Value>) -> Vec<Value> {
        match stage {
            Stage::Match { filter } => docs.into_iter().filter(|d| matches(filter, d)).collect(),
            Stage::MatchTags { tags, matching } => docs
                .into_iter()
                .filter(|d| {
                    let has = resolve(d, "tags")
                        .iter()
                        .any(|t| tags.iter().any(|x| t.as_str() == Some(x.as_str())));
                    has == *matching
                })
                .collect(),
            Stage::SetField { field, expr, .. } => docs
                .into_iter()
                .map(|mut d| {
                    let value = eval(expr, &d, &Map::new());
                    set_path(&mut d, field, value);
                    d
                })
                .collect(),
            Stage::FilterLabels {
                field,
                filter,
                only_matches,
            } => docs
                .into_iter()
                .filter_map(|mut d| {
                    let root = d.clone();
                    let kept = map_labels(&mut d, field, &mut |label| {
                        let vars = vars_with("this", label.clone());
                        truthy(&eval(filter, &root, &vars))
                    });
                    if *only_matches && kept == 0 {
                        None
                    } else {
                        Some(d)
                    }
                })
                .collect(),
            Stage::FilterKeypoints {
                field,
                filter,
                labels,
                only_matches,
            } => docs
                .into_iter()
                .filter_map(|mut d| {
                    let kept = self.filter_points(&mut d, field, filter.as_ref(), labels.as_deref());
                    if *only_matches && kept == 0 {
                        None
                    } else {
                        Some(d)
                    }
                })
                .collect(),
            Stage::ExcludeFields { field_names } => docs
                .into_iter()
                .map(|mut d| {
                    for name in field_names {
                        remove_path(&mut d, name);
                    }
                    d
                })
                .collect(),
            Stage::SelectFields { field_names } => docs
                .into_iter()
                .map(|d| {
                    let mut out = json!({"_id": d["_id"].clone()});
                    for name in field_names {
                        if let Some(v) = get_path(&d, name) {
                            set_path(&mut out, name, v.clone());
                        }
                    }
                    out
                })
                .collect(),
            Stage::Select { sample_ids, .. } => docs
                .into_iter()
                .filter(|d| {
                    d["_id"]["$oid"]
                        .as_str()
                        .map(|id| sample_ids.iter().any(|s| s == id))
                        .unwrap_or(false)
                })
                .collect(),
            Stage::SelectBy { field, values, .. } => docs
                .into_iter()
                .filter(|d| {
                    resolve(d, field)
                        .iter()
                        .any(|v| values.iter().any(|x| bson_eq(v, x)))
                })
                .collect(),
            Stage::Exclude { sample_ids } => docs
                .into_iter()
                .filter(|d| {
                    d["_id"]["$oid"]
                        .as_str()
                        .map(|id| !sample_ids.iter().any(|s| s == id))
                        .unwrap_or(true)
                })
                .collect(),
            Stage::SelectGroupSlices { slices, .. } => docs
                .into_iter()
                .filter(|d| match slices {
                    Some(slices) => d["group"]["name"]
                        .as_str()
                        .map(|n| slices.iter().any(|s| s == n))
                        .unwrap_or(false),
                    None => true,
                })
                .collect(),
            Stage::Limit { limit } => docs.into_iter().take(*limit).collect(),
            Stage::Skip { skip } => docs.into_iter().skip(*skip).collect(),
            other => panic!("reference executor does not run {}", other.name()),
        }
    }

    /// Blanks pruned points; returns how many keypoints keep a point
    fn filter_points(
        &self,
        doc: &mut Value,
        field: &str,
        filter: Option<&Value>,
        labels: Option<&[String]>,
    ) -> usize {
        let skeleton = self.skeletons.get(field).cloned().unwrap_or_default();
        let root = doc.clone();
        let mut kept = 0;
        let Some(container) = get_path_mut(doc, field) else {
            return 0;
        };
        let keypoints: Vec<&mut Value> = match container.get_mut("keypoints") {
            Some(Value::Array(items)) => items.iter_mut().collect(),
            _ => vec![container],
        };
        for kp in keypoints {
            let n = kp["points"].as_array().map(Vec::len).unwrap_or(0);
            let mut keep = vec![true; n];
            if let Some(labels) = labels {
                for (i, k) in keep.iter_mut().enumerate() {
                    *k = skeleton.get(i).map(|l| labels.contains(l)).unwrap_or(false);
                }
            }
            if let Some(filter) = filter {
                for (i, k) in keep.iter_mut().enumerate() {
                    let mut point = Map::new();
                    if let Some(obj) = kp.as_object() {
                        for (name, value) in obj {
                            if let Some(arr) = value.as_array() {
                                if arr.len() == n {
                                    point.insert(name.clone(), arr[i].clone());
                                }
                            }
                        }
                    }
                    let vars = vars_with("this", Value::Object(point));
                    *k = *k && truthy(&eval(filter, &root, &vars));
                }
            }
            if let Some(points) = kp["points"].as_array_mut() {
                for (i, p) in points.iter_mut().enumerate() {
                    if !keep[i] {
                        *p = Value::Null;
                    }
                }
            }
            if keep.iter().any(|k| *k) {
                kept += 1;
            }
        }
        kept
    }
}

/// Names of the points still present in a keypoint label
pub fn remaining_points(keypoint: &Value, skeleton: &[&str]) -> Vec<String> {
    keypoint["points"]
        .as_array()
        .map(|points| {
            points
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.is_null())
                .filter_map(|(i, _)| skeleton.get(i).map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Applies `keep` to every label under `field`; returns labels kept
fn map_labels(doc: &mut Value, field: &str, keep: &mut dyn FnMut(&Value) -> bool) -> usize {
    if let Some(rel) = field.strip_prefix("frames.") {
        let mut kept = 0;
        if let Some(Value::Array(frames)) = doc.get_mut("frames") {
            for frame in frames {
                kept += map_labels(frame, rel, keep);
            }
        }
        return kept;
    }

    let Some(container) = get_path_mut(doc, field) else {
        return 0;
    };
    if container.is_null() {
        return 0;
    }
    for attr in LIST_ATTRIBUTES {
        if let Some(Value::Array(items)) = container.get_mut(attr) {
            items.retain(|item| keep(item));
            return items.len();
        }
    }
    if keep(container) {
        1
    } else {
        *container = Value::Null;
        0
    }
}

// =============================================================================
// Paths
// =============================================================================

fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |v, k| v.get(k))
}

fn get_path_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(doc, |v, k| v.get_mut(k))
}

fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut current = doc;
    let parts: Vec<&str> = path.split('.').collect();
    for part in &parts[..parts.len() - 1] {
        if !current.get(*part).map(Value::is_object).unwrap_or(false) {
            current[*part] = json!({});
        }
        current = &mut current[*part];
    }
    current[parts[parts.len() - 1]] = value;
}

fn remove_path(doc: &mut Value, path: &str) {
    if let Some(rel) = path.strip_prefix("frames.") {
        if let Some(Value::Array(frames)) = doc.get_mut("frames") {
            for frame in frames {
                remove_path(frame, rel);
            }
        }
        return;
    }
    let (parent, last) = match path.rfind('.') {
        Some(i) => (get_path_mut(doc, &path[..i]), &path[i + 1..]),
        None => (Some(doc), path),
    };
    if let Some(Value::Object(obj)) = parent {
        obj.remove(last);
    }
}

/// Every value reachable at `path`, descending through arrays
fn resolve(doc: &Value, path: &str) -> Vec<Value> {
    fn walk(v: &Value, parts: &[&str], out: &mut Vec<Value>) {
        match (v, parts.split_first()) {
            (Value::Array(items), _) if !parts.is_empty() => {
                for item in items {
                    walk(item, parts, out);
                }
            }
            (Value::Array(items), None) => out.extend(items.iter().cloned()),
            (_, None) => out.push(v.clone()),
            (Value::Object(obj), Some((head, rest))) => {
                if let Some(next) = obj.get(*head) {
                    walk(next, rest, out);
                }
            }
            _ => {}
        }
    }
    let parts: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    walk(doc, &parts, &mut out);
    out
}

// =============================================================================
// Values
// =============================================================================

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => match obj.get("$numberDouble").and_then(Value::as_str) {
            Some("NaN") => Some(f64::NAN),
            Some("Infinity") => Some(f64::INFINITY),
            Some("-Infinity") => Some(f64::NEG_INFINITY),
            Some(other) => other.parse().ok(),
            None => None,
        },
        _ => None,
    }
}

/// Type rank in the executor's cross-type sort order
fn rank(v: &Value) -> u8 {
    if number(v).is_some() {
        return 1;
    }
    match v {
        Value::Null => 0,
        Value::String(_) => 2,
        Value::Object(obj) if obj.contains_key("$oid") => 5,
        Value::Object(obj) if obj.contains_key("$date") => 7,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 6,
        Value::Number(_) => 1,
    }
}

fn bson_cmp(a: &Value, b: &Value) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match ra {
        1 => {
            let (x, y) = (number(a).unwrap_or(0.0), number(b).unwrap_or(0.0));
            match (x.is_nan(), y.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            }
        }
        2 => a.as_str().cmp(&b.as_str()),
        5 => a["$oid"].as_str().cmp(&b["$oid"].as_str()),
        7 => a["$date"].as_str().cmp(&b["$date"].as_str()),
        6 => a.as_bool().cmp(&b.as_bool()),
        4 => {
            let (x, y) = (a.as_array().unwrap(), b.as_array().unwrap());
            for (p, q) in x.iter().zip(y) {
                let o = bson_cmp(p, q);
                if o != Ordering::Equal {
                    return o;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn bson_eq(a: &Value, b: &Value) -> bool {
    bson_cmp(a, b) == Ordering::Equal
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        other => number(other).map(|n| n != 0.0).unwrap_or(true),
    }
}

// =============================================================================
// Document-level conditions
// =============================================================================

pub fn matches(filter: &Value, doc: &Value) -> bool {
    let Some(obj) = filter.as_object() else {
        return false;
    };
    obj.iter().all(|(key, cond)| match key.as_str() {
        "$and" => each(cond).iter().all(|c| matches(c, doc)),
        "$or" => each(cond).iter().any(|c| matches(c, doc)),
        "$nor" => !each(cond).iter().any(|c| matches(c, doc)),
        "$expr" => truthy(&eval(cond, doc, &Map::new())),
        path => field_matches(&resolve(doc, path), cond),
    })
}

fn each(v: &Value) -> Vec<Value> {
    v.as_array().cloned().unwrap_or_default()
}

fn field_matches(candidates: &[Value], cond: &Value) -> bool {
    let ops = match cond.as_object() {
        Some(obj) if obj.keys().all(|k| k.starts_with('$')) && !is_extended(cond) => obj.clone(),
        _ => {
            let mut m = Map::new();
            m.insert("$eq".into(), cond.clone());
            m
        }
    };
    if ops.contains_key("$regex") {
        let pattern = ops["$regex"].as_str().unwrap_or("");
        let insensitive = ops
            .get("$options")
            .and_then(Value::as_str)
            .map(|o| o.contains('i'))
            .unwrap_or(false);
        let re = RegexBuilder::new(pattern)
            .case_insensitive(insensitive)
            .build()
            .unwrap();
        return candidates
            .iter()
            .any(|c| c.as_str().map(|s| re.is_match(s)).unwrap_or(false));
    }
    ops.iter().all(|(op, arg)| {
        let eq_any = |target: &Value| {
            if target.is_null() {
                candidates.is_empty() || candidates.iter().any(Value::is_null)
            } else {
                candidates.iter().any(|c| bson_eq(c, target))
            }
        };
        let in_any = || each(arg).iter().any(|t| eq_any(t));
        let cmp_any = |want: &dyn Fn(Ordering) -> bool| {
            candidates
                .iter()
                .filter(|c| rank(c) == rank(arg) && !number(c).map(f64::is_nan).unwrap_or(false))
                .any(|c| want(bson_cmp(c, arg)))
        };
        match op.as_str() {
            "$eq" => eq_any(arg),
            "$ne" => !eq_any(arg),
            "$in" => in_any(),
            "$nin" => !in_any(),
            "$gt" => cmp_any(&|o| o == Ordering::Greater),
            "$gte" => cmp_any(&|o| o != Ordering::Less),
            "$lt" => cmp_any(&|o| o == Ordering::Less),
            "$lte" => cmp_any(&|o| o != Ordering::Greater),
            other => panic!("reference executor does not support {}", other),
        }
    })
}

fn is_extended(v: &Value) -> bool {
    v.get("$oid").is_some() || v.get("$date").is_some() || v.get("$numberDouble").is_some()
}

// =============================================================================
// Expressions
// =============================================================================

fn vars_with(name: &str, value: Value) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert(name.to_string(), value);
    vars
}

fn lookup(root: &Value, path: &str) -> Value {
    let mut current = root.clone();
    for part in path.split('.') {
        current = match current {
            Value::Object(obj) => obj.get(part).cloned().unwrap_or(Value::Null),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|i| i.get(part).cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
            _ => Value::Null,
        };
    }
    current
}

fn args(v: &Value, doc: &Value, vars: &Map<String, Value>) -> Vec<Value> {
    match v {
        Value::Array(items) => items.iter().map(|i| eval(i, doc, vars)).collect(),
        other => vec![eval(other, doc, vars)],
    }
}

pub fn eval(expr: &Value, doc: &Value, vars: &Map<String, Value>) -> Value {
    match expr {
        Value::String(s) if s.starts_with("$$") => {
            let rest = &s[2..];
            let (name, path) = match rest.find('.') {
                Some(i) => (&rest[..i], Some(&rest[i + 1..])),
                None => (rest, None),
            };
            let base = vars.get(name).cloned().unwrap_or(Value::Null);
            match path {
                Some(p) => lookup(&base, p),
                None => base,
            }
        }
        Value::String(s) if s.starts_with('$') => lookup(doc, &s[1..]),
        Value::Array(items) => Value::Array(items.iter().map(|i| eval(i, doc, vars)).collect()),
        Value::Object(obj) if obj.len() == 1 && !is_extended(expr) => {
            let (op, arg) = obj.iter().next().unwrap();
            if !op.starts_with('$') {
                return Value::Object(
                    obj.iter()
                        .map(|(k, v)| (k.clone(), eval(v, doc, vars)))
                        .collect(),
                );
            }
            eval_op(op, arg, doc, vars)
        }
        Value::Object(obj) if !is_extended(expr) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), eval(v, doc, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn eval_op(op: &str, arg: &Value, doc: &Value, vars: &Map<String, Value>) -> Value {
    let bound = |name: &str, value: Value| {
        let mut v = vars.clone();
        v.insert(name.to_string(), value);
        v
    };
    match op {
        "$literal" => arg.clone(),
        "$and" => Value::Bool(args(arg, doc, vars).iter().all(truthy)),
        "$or" => Value::Bool(args(arg, doc, vars).iter().any(truthy)),
        "$not" => Value::Bool(!truthy(&args(arg, doc, vars)[0])),
        "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" => {
            let a = args(arg, doc, vars);
            let o = bson_cmp(&a[0], &a[1]);
            Value::Bool(match op {
                "$eq" => o == Ordering::Equal,
                "$ne" => o != Ordering::Equal,
                "$gt" => o == Ordering::Greater,
                "$gte" => o != Ordering::Less,
                "$lt" => o == Ordering::Less,
                _ => o != Ordering::Greater,
            })
        }
        "$in" => {
            let a = args(arg, doc, vars);
            let hay = a[1].as_array().cloned().unwrap_or_default();
            Value::Bool(hay.iter().any(|h| bson_eq(h, &a[0])))
        }
        "$size" => Value::from(eval(arg, doc, vars).as_array().map(Vec::len).unwrap_or(0)),
        "$filter" => {
            let input = eval(&arg["input"], doc, vars);
            let name = arg["as"].as_str().unwrap_or("this");
            match input {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .filter(|item| truthy(&eval(&arg["cond"], doc, &bound(name, item.clone()))))
                        .collect(),
                ),
                _ => Value::Null,
            }
        }
        "$map" => {
            let input = eval(&arg["input"], doc, vars);
            let name = arg["as"].as_str().unwrap_or("this");
            match input {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| eval(&arg["in"], doc, &bound(name, item)))
                        .collect(),
                ),
                _ => Value::Null,
            }
        }
        "$reduce" => {
            let input = eval(&arg["input"], doc, vars);
            let initial = eval(&arg["initialValue"], doc, vars);
            match input {
                Value::Array(items) => items.into_iter().fold(initial, |acc, item| {
                    let mut v = bound("value", acc);
                    v.insert("this".into(), item);
                    eval(&arg["in"], doc, &v)
                }),
                _ => Value::Null,
            }
        }
        "$concatArrays" => {
            let mut out = Vec::new();
            for part in args(arg, doc, vars) {
                match part {
                    Value::Array(items) => out.extend(items),
                    _ => return Value::Null,
                }
            }
            Value::Array(out)
        }
        "$cond" => {
            if truthy(&eval(&arg["if"], doc, vars)) {
                eval(&arg["then"], doc, vars)
            } else {
                eval(&arg["else"], doc, vars)
            }
        }
        "$ifNull" => {
            let a = args(arg, doc, vars);
            if a[0].is_null() {
                a[1].clone()
            } else {
                a[0].clone()
            }
        }
        "$setUnion" => {
            let mut out: Vec<Value> = Vec::new();
            for part in args(arg, doc, vars) {
                for item in part.as_array().cloned().unwrap_or_default() {
                    if !out.iter().any(|o| bson_eq(o, &item)) {
                        out.push(item);
                    }
                }
            }
            out.sort_by(bson_cmp);
            Value::Array(out)
        }
        "$arrayToObject" => {
            let input = eval(arg, doc, vars);
            let mut obj = Map::new();
            for pair in input.as_array().cloned().unwrap_or_default() {
                if let Some(k) = pair["k"].as_str() {
                    obj.insert(k.to_string(), pair["v"].clone());
                }
            }
            Value::Object(obj)
        }
        "$arrayElemAt" => {
            let a = args(arg, doc, vars);
            let idx = a[1].as_i64().unwrap_or(0) as usize;
            a[0].as_array()
                .and_then(|items| items.get(idx).cloned())
                .unwrap_or(Value::Null)
        }
        "$regexMatch" => {
            let input = eval(&arg["input"], doc, vars);
            let insensitive = arg["options"].as_str().map(|o| o.contains('i')).unwrap_or(false);
            let re = RegexBuilder::new(arg["regex"].as_str().unwrap_or(""))
                .case_insensitive(insensitive)
                .build()
                .unwrap();
            Value::Bool(input.as_str().map(|s| re.is_match(s)).unwrap_or(false))
        }
        other => panic!("reference executor does not support {}", other),
    }
}
