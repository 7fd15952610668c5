//! Structured query specification and its AQL rendering.
//!
//! A [`QuerySpec`] is what the query builders compile to. Transports either
//! render it to AQL ([`QuerySpec::to_aql`]) or evaluate it directly.

use {
    crate::err::{ClientError, ClientResult},
    serde::{Deserialize, Serialize},
    serde_json::{json, Map, Value},
    std::{cmp::Ordering, fmt::Write},
};

/// Comparison operator in a filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn aql(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies this operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
        }
    }
}

/// Attribute of one of the collections a query draws from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    pub collection: String,
    pub field: String,
}

impl FieldPath {
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
        }
    }
}

/// Right-hand side of a filter: a literal or another attribute (join).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Value(Value),
    Field(FieldPath),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub left: FieldPath,
    pub op: Comparison,
    pub right: Operand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn aql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: FieldPath,
    pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSpec {
    pub offset: u64,
    pub count: u64,
}

/// A compiled query: nested loops over `collections` in order, filters,
/// sort keys applied in order, optional limit, returning one loop variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub collections: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub limit: Option<LimitSpec>,
    /// Index into `collections` of the loop whose documents are returned.
    #[serde(default)]
    pub returning: usize,
}

/// AQL text plus bind variables, as posted to the cursor endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AqlQuery {
    pub query: String,
    #[serde(rename = "bindVars")]
    pub bind_vars: Map<String, Value>,
}

impl AqlQuery {
    pub fn to_cursor_body(&self, batch_size: u32) -> Value {
        json!({
            "query": self.query,
            "bindVars": self.bind_vars,
            "batchSize": batch_size,
        })
    }
}

impl QuerySpec {
    /// Position of the loop drawing from `collection` (first occurrence).
    pub fn loop_index(&self, collection: &str) -> Option<usize> {
        self.collections.iter().position(|c| c == collection)
    }

    /// Reject specs that cannot be executed.
    pub fn validate(&self) -> ClientResult<()> {
        if self.collections.is_empty() {
            return Err(ClientError::MalformedQuery(
                "query draws from no collection".to_string(),
            ));
        }
        if self.returning >= self.collections.len() {
            return Err(ClientError::MalformedQuery(format!(
                "returned loop {} out of range for {} collections",
                self.returning,
                self.collections.len()
            )));
        }

        let paths = self
            .filters
            .iter()
            .flat_map(|f| {
                let right = match &f.right {
                    Operand::Field(path) => Some(path),
                    Operand::Value(_) => None,
                };
                std::iter::once(&f.left).chain(right)
            })
            .chain(self.sort.iter().map(|s| &s.field));

        for path in paths {
            if self.loop_index(&path.collection).is_none() {
                return Err(ClientError::MalformedQuery(format!(
                    "'{}.{}' refers to a collection the query does not draw from",
                    path.collection, path.field
                )));
            }
            if path.field.is_empty() {
                return Err(ClientError::MalformedQuery(
                    "empty attribute name".to_string(),
                ));
            }
        }

        if let Some(limit) = self.limit {
            if limit.count == 0 {
                return Err(ClientError::MalformedQuery(
                    "limit count must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Render to AQL. Collection names, attribute names and values are all
    /// passed as bind variables.
    pub fn to_aql(&self) -> ClientResult<AqlQuery> {
        self.validate()?;

        let mut bind_vars = Map::new();
        let mut query = String::new();

        for (i, collection) in self.collections.iter().enumerate() {
            bind_vars.insert(format!("@c{}", i), Value::String(collection.clone()));
            let _ = writeln!(query, "FOR doc{i} IN @@c{i}");
        }

        let mut attr_counter = 0usize;
        let mut attr = |path: &FieldPath, bind_vars: &mut Map<String, Value>| -> String {
            let name = format!("a{}", attr_counter);
            attr_counter += 1;
            bind_vars.insert(name.clone(), Value::String(path.field.clone()));
            let index = self.loop_index(&path.collection).unwrap_or_default();
            format!("doc{}[@{}]", index, name)
        };

        for (i, filter) in self.filters.iter().enumerate() {
            let left = attr(&filter.left, &mut bind_vars);
            let right = match &filter.right {
                Operand::Value(value) => {
                    let name = format!("v{}", i);
                    bind_vars.insert(name.clone(), value.clone());
                    format!("@{}", name)
                }
                Operand::Field(path) => attr(path, &mut bind_vars),
            };
            let _ = writeln!(query, "FILTER {} {} {}", left, filter.op.aql(), right);
        }

        if !self.sort.is_empty() {
            let keys: Vec<String> = self
                .sort
                .iter()
                .map(|s| format!("{} {}", attr(&s.field, &mut bind_vars), s.direction.aql()))
                .collect();
            let _ = writeln!(query, "SORT {}", keys.join(", "));
        }

        if let Some(limit) = self.limit {
            bind_vars.insert("offset".to_string(), json!(limit.offset));
            bind_vars.insert("count".to_string(), json!(limit.count));
            query.push_str("LIMIT @offset, @count\n");
        }

        let _ = write!(query, "RETURN doc{}", self.returning);

        Ok(AqlQuery { query, bind_vars })
    }
}

/// Total order over JSON values following the store's type ordering:
/// null < bool < number < string < array < object.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(a), Value::Object(b)) => {
            let mut a_keys: Vec<&String> = a.keys().collect();
            let mut b_keys: Vec<&String> = b.keys().collect();
            a_keys.sort();
            b_keys.sort();
            a_keys
                .iter()
                .zip(b_keys.iter())
                .map(|(ka, kb)| {
                    ka.cmp(kb)
                        .then_with(|| compare_values(&a[ka.as_str()], &b[kb.as_str()]))
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| a_keys.len().cmp(&b_keys.len()))
        }
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sorted_spec() -> QuerySpec {
        QuerySpec {
            collections: vec!["foo_1".to_string()],
            filters: vec![FilterSpec {
                left: FieldPath::new("foo_1", "little_number"),
                op: Comparison::Gt,
                right: Operand::Value(json!(2)),
            }],
            sort: vec![
                SortSpec {
                    field: FieldPath::new("foo_1", "little_number"),
                    direction: SortDirection::Asc,
                },
                SortSpec {
                    field: FieldPath::new("foo_1", "_key"),
                    direction: SortDirection::Asc,
                },
            ],
            limit: Some(LimitSpec { offset: 0, count: 10 }),
            returning: 0,
        }
    }

    #[test]
    fn renders_filters_sort_and_limit_with_bind_vars() {
        let aql = sorted_spec().to_aql().unwrap();
        assert_eq!(
            aql.query,
            "FOR doc0 IN @@c0\n\
             FILTER doc0[@a0] > @v0\n\
             SORT doc0[@a1] ASC, doc0[@a2] ASC\n\
             LIMIT @offset, @count\n\
             RETURN doc0"
        );
        assert_eq!(aql.bind_vars["@c0"], json!("foo_1"));
        assert_eq!(aql.bind_vars["a0"], json!("little_number"));
        assert_eq!(aql.bind_vars["v0"], json!(2));
        assert_eq!(aql.bind_vars["a2"], json!("_key"));
        assert_eq!(aql.bind_vars["count"], json!(10));
    }

    #[test]
    fn renders_joins_in_collection_order() {
        let spec = QuerySpec {
            collections: vec!["users".to_string(), "posts".to_string()],
            filters: vec![FilterSpec {
                left: FieldPath::new("posts", "author"),
                op: Comparison::Eq,
                right: Operand::Field(FieldPath::new("users", "_id")),
            }],
            returning: 1,
            ..Default::default()
        };

        let aql = spec.to_aql().unwrap();
        assert_eq!(
            aql.query,
            "FOR doc0 IN @@c0\nFOR doc1 IN @@c1\nFILTER doc1[@a0] == doc0[@a1]\nRETURN doc1"
        );
    }

    #[test]
    fn rejects_unknown_collections_and_empty_queries() {
        assert!(matches!(
            QuerySpec::default().validate(),
            Err(ClientError::MalformedQuery(_))
        ));

        let mut spec = sorted_spec();
        spec.sort[0].field.collection = "elsewhere".to_string();
        assert!(matches!(spec.to_aql(), Err(ClientError::MalformedQuery(_))));
    }

    #[test]
    fn orders_values_across_types() {
        assert_eq!(compare_values(&json!(1), &json!(33)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!(3.0)), Ordering::Equal);
        assert_eq!(compare_values(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!(10)), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
    }

    #[test]
    fn comparison_operators() {
        assert!(Comparison::Le.holds(Ordering::Equal));
        assert!(!Comparison::Lt.holds(Ordering::Equal));
        assert!(Comparison::Ne.holds(Ordering::Greater));
    }
}
