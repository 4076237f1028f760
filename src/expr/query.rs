//! Document-level conditions
//!
//! A `Query` decides whether a whole document is kept. It renders to the
//! executor's match syntax (`{"path": {"$gte": 5}}`, `{"$and": [...]}`).

use serde_json::{json, Map, Value};

use super::expression::Expr;
use super::literal::Literal;

/// Comparison applied to a single path
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Eq(Literal),
    Ne(Literal),
    Gt(Literal),
    Gte(Literal),
    Lt(Literal),
    Lte(Literal),
    In(Vec<Literal>),
    Nin(Vec<Literal>),
    /// Case-insensitive regex
    Regex(String),
}

impl QueryOp {
    pub fn op_name(&self) -> &'static str {
        match self {
            QueryOp::Eq(_) => "$eq",
            QueryOp::Ne(_) => "$ne",
            QueryOp::Gt(_) => "$gt",
            QueryOp::Gte(_) => "$gte",
            QueryOp::Lt(_) => "$lt",
            QueryOp::Lte(_) => "$lte",
            QueryOp::In(_) => "$in",
            QueryOp::Nin(_) => "$nin",
            QueryOp::Regex(_) => "$regex",
        }
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match self {
            QueryOp::Eq(v)
            | QueryOp::Ne(v)
            | QueryOp::Gt(v)
            | QueryOp::Gte(v)
            | QueryOp::Lt(v)
            | QueryOp::Lte(v) => {
                obj.insert(self.op_name().to_string(), v.to_json());
            }
            QueryOp::In(values) | QueryOp::Nin(values) => {
                obj.insert(
                    self.op_name().to_string(),
                    Value::Array(values.iter().map(Literal::to_json).collect()),
                );
            }
            QueryOp::Regex(pattern) => {
                obj.insert("$regex".to_string(), Value::String(pattern.clone()));
                obj.insert("$options".to_string(), Value::String("i".to_string()));
            }
        }
        Value::Object(obj)
    }
}

/// Document-level boolean condition
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    And(Vec<Query>),
    Or(Vec<Query>),
    Nor(Vec<Query>),
    Field { path: String, op: QueryOp },
    /// Escape hatch into the expression language
    Expr(Expr),
}

impl Query {
    pub fn field(path: impl Into<String>, op: QueryOp) -> Self {
        Query::Field {
            path: path.into(),
            op,
        }
    }

    /// Conjunction; a single operand is returned unwrapped
    pub fn and(mut queries: Vec<Query>) -> Self {
        if queries.len() == 1 {
            queries.remove(0)
        } else {
            Query::And(queries)
        }
    }

    /// Disjunction; a single operand is returned unwrapped
    pub fn or(mut queries: Vec<Query>) -> Self {
        if queries.len() == 1 {
            queries.remove(0)
        } else {
            Query::Or(queries)
        }
    }

    /// Negation via `$nor`
    pub fn not(query: Query) -> Self {
        Query::Nor(vec![query])
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::And(qs) => json!({"$and": qs.iter().map(Query::to_json).collect::<Vec<_>>()}),
            Query::Or(qs) => json!({"$or": qs.iter().map(Query::to_json).collect::<Vec<_>>()}),
            Query::Nor(qs) => json!({"$nor": qs.iter().map(Query::to_json).collect::<Vec<_>>()}),
            Query::Field { path, op } => {
                let mut obj = Map::new();
                obj.insert(path.clone(), op.to_json());
                Value::Object(obj)
            }
            Query::Expr(expr) => json!({"$expr": expr.to_json()}),
        }
    }
}
