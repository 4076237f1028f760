//! Element-level aggregation expressions
//!
//! `Expr` is evaluated per document (or per list element when a stage binds
//! `$$this`). It is a plain data structure; rendering to the executor's
//! operator syntax happens in `to_json` and nowhere else.

use serde_json::{json, Map, Value};

use super::literal::Literal;

/// What a field reference is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRoot {
    /// The current document (`$path`)
    Document,
    /// A bound variable (`$$this.path`, `$$value`)
    Var(String),
}

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "$eq",
            CmpOp::Ne => "$ne",
            CmpOp::Gt => "$gt",
            CmpOp::Gte => "$gte",
            CmpOp::Lt => "$lt",
            CmpOp::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field {
        root: FieldRoot,
        path: Option<String>,
    },
    Literal(Literal),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `needle in haystack`
    In {
        needle: Box<Expr>,
        haystack: Box<Expr>,
    },
    Size(Box<Expr>),
    /// Keeps elements of `input` for which `cond` holds, with `$$this` bound
    Filter {
        input: Box<Expr>,
        cond: Box<Expr>,
    },
    Map {
        input: Box<Expr>,
        var: String,
        body: Box<Expr>,
    },
    /// Left fold with `$$value` (accumulator) and `$$this` (element) bound
    Reduce {
        input: Box<Expr>,
        initial: Box<Expr>,
        body: Box<Expr>,
    },
    ConcatArrays(Vec<Expr>),
    Cond {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    IfNull(Box<Expr>, Box<Expr>),
    /// Present and not null
    Exists(Box<Expr>),
    SetUnion(Box<Expr>),
    ArrayToObject(Box<Expr>),
    ArrayElemAt(Box<Expr>, i64),
    /// Case-insensitive regex test
    RegexMatch {
        input: Box<Expr>,
        pattern: String,
    },
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// Field of the current document
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field {
            root: FieldRoot::Document,
            path: Some(path.into()),
        }
    }

    /// A bound variable itself
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Field {
            root: FieldRoot::Var(name.into()),
            path: None,
        }
    }

    /// Field of a bound variable
    pub fn var_field(name: impl Into<String>, path: impl Into<String>) -> Self {
        Expr::Field {
            root: FieldRoot::Var(name.into()),
            path: Some(path.into()),
        }
    }

    /// The element bound by filter/reduce
    pub fn this() -> Self {
        Self::var("this")
    }

    /// Field of the element bound by filter/reduce
    pub fn this_field(path: impl Into<String>) -> Self {
        Self::var_field("this", path)
    }

    pub fn lit(value: impl Into<Literal>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn empty_array() -> Self {
        Expr::Literal(Literal::empty_array())
    }

    /// Extends a field reference by one more path component.
    ///
    /// Non-field expressions are returned unchanged.
    pub fn child(&self, name: &str) -> Self {
        match self {
            Expr::Field { root, path } => Expr::Field {
                root: root.clone(),
                path: Some(match path {
                    Some(p) => format!("{}.{}", p, name),
                    None => name.to_string(),
                }),
            },
            other => other.clone(),
        }
    }

    fn cmp(self, op: CmpOp, other: Expr) -> Self {
        Expr::Cmp {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: Expr) -> Self {
        self.cmp(CmpOp::Eq, other)
    }

    pub fn ne(self, other: Expr) -> Self {
        self.cmp(CmpOp::Ne, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        self.cmp(CmpOp::Gt, other)
    }

    pub fn gte(self, other: Expr) -> Self {
        self.cmp(CmpOp::Gte, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        self.cmp(CmpOp::Lt, other)
    }

    pub fn lte(self, other: Expr) -> Self {
        self.cmp(CmpOp::Lte, other)
    }

    pub fn is_in(self, values: Vec<Literal>) -> Self {
        Expr::In {
            needle: Box::new(self),
            haystack: Box::new(Expr::Literal(Literal::Array(values))),
        }
    }

    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut items) => {
                items.push(other);
                Expr::And(items)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut items) => {
                items.push(other);
                Expr::Or(items)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn exists(self) -> Self {
        Expr::Exists(Box::new(self))
    }

    pub fn size(self) -> Self {
        Expr::Size(Box::new(self))
    }

    pub fn filter(self, cond: Expr) -> Self {
        Expr::Filter {
            input: Box::new(self),
            cond: Box::new(cond),
        }
    }

    pub fn reduce(self, body: Expr, initial: Expr) -> Self {
        Expr::Reduce {
            input: Box::new(self),
            initial: Box::new(initial),
            body: Box::new(body),
        }
    }

    pub fn map(self, var: impl Into<String>, body: Expr) -> Self {
        Expr::Map {
            input: Box::new(self),
            var: var.into(),
            body: Box::new(body),
        }
    }

    /// `self ++ other`
    pub fn extend(self, other: Expr) -> Self {
        Expr::ConcatArrays(vec![self, other])
    }

    pub fn if_else(self, then: Expr, otherwise: Expr) -> Self {
        Expr::Cond {
            test: Box::new(self),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn if_null(self, fallback: Expr) -> Self {
        Expr::IfNull(Box::new(self), Box::new(fallback))
    }

    pub fn at(self, index: i64) -> Self {
        Expr::ArrayElemAt(Box::new(self), index)
    }

    pub fn regex_match(self, pattern: impl Into<String>) -> Self {
        Expr::RegexMatch {
            input: Box::new(self),
            pattern: pattern.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Field { root, path } => {
                let prefix = match root {
                    FieldRoot::Document => "$".to_string(),
                    FieldRoot::Var(name) => format!("$${}", name),
                };
                match (root, path) {
                    (FieldRoot::Document, Some(p)) => Value::String(format!("{}{}", prefix, p)),
                    (FieldRoot::Var(_), Some(p)) => Value::String(format!("{}.{}", prefix, p)),
                    (_, None) => Value::String(prefix),
                }
            }
            Expr::Literal(lit) => match lit {
                Literal::String(s) if s.starts_with('$') => json!({"$literal": s}),
                Literal::Array(_) => json!({"$literal": lit.to_json()}),
                other => other.to_json(),
            },
            Expr::And(items) => json!({"$and": render_all(items)}),
            Expr::Or(items) => json!({"$or": render_all(items)}),
            Expr::Not(inner) => json!({"$not": [inner.to_json()]}),
            Expr::Cmp { op, left, right } => {
                let mut obj = Map::new();
                obj.insert(
                    op.as_str().to_string(),
                    json!([left.to_json(), right.to_json()]),
                );
                Value::Object(obj)
            }
            Expr::In { needle, haystack } => {
                json!({"$in": [needle.to_json(), haystack.to_json()]})
            }
            Expr::Size(inner) => json!({"$size": inner.to_json()}),
            Expr::Filter { input, cond } => json!({
                "$filter": {"input": input.to_json(), "as": "this", "cond": cond.to_json()}
            }),
            Expr::Map { input, var, body } => json!({
                "$map": {"input": input.to_json(), "as": var, "in": body.to_json()}
            }),
            Expr::Reduce {
                input,
                initial,
                body,
            } => json!({
                "$reduce": {
                    "input": input.to_json(),
                    "initialValue": initial.to_json(),
                    "in": body.to_json(),
                }
            }),
            Expr::ConcatArrays(items) => json!({"$concatArrays": render_all(items)}),
            Expr::Cond {
                test,
                then,
                otherwise,
            } => json!({
                "$cond": {"if": test.to_json(), "then": then.to_json(), "else": otherwise.to_json()}
            }),
            Expr::IfNull(value, fallback) => {
                json!({"$ifNull": [value.to_json(), fallback.to_json()]})
            }
            Expr::Exists(inner) => json!({"$gt": [inner.to_json(), null]}),
            Expr::SetUnion(inner) => json!({"$setUnion": [inner.to_json()]}),
            Expr::ArrayToObject(inner) => json!({"$arrayToObject": inner.to_json()}),
            Expr::ArrayElemAt(inner, index) => json!({"$arrayElemAt": [inner.to_json(), index]}),
            Expr::RegexMatch { input, pattern } => json!({
                "$regexMatch": {"input": input.to_json(), "regex": pattern, "options": "i"}
            }),
            Expr::Object(entries) => {
                let mut obj = Map::new();
                for (key, value) in entries {
                    obj.insert(key.clone(), value.to_json());
                }
                Value::Object(obj)
            }
        }
    }
}

fn render_all(items: &[Expr]) -> Vec<Value> {
    items.iter().map(Expr::to_json).collect()
}
