use {
    crate::{
        document::DocumentId,
        err::{ClientError, ClientResult},
        query::AqlQuery,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// Which edge ends a traversal follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    #[default]
    Outbound,
    Inbound,
    Any,
}

impl TraversalDirection {
    pub fn aql(self) -> &'static str {
        match self {
            TraversalDirection::Outbound => "OUTBOUND",
            TraversalDirection::Inbound => "INBOUND",
            TraversalDirection::Any => "ANY",
        }
    }
}

impl std::str::FromStr for TraversalDirection {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outbound" => Ok(TraversalDirection::Outbound),
            "inbound" => Ok(TraversalDirection::Inbound),
            "any" => Ok(TraversalDirection::Any),
            other => Err(ClientError::MalformedQuery(format!(
                "unknown traversal direction '{}'",
                other
            ))),
        }
    }
}

/// A breadth-first walk along one edge collection.
///
/// Reached vertices are unique by id and never include `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalSpec {
    pub start: DocumentId,
    pub edge_collection: String,
    pub direction: TraversalDirection,
    pub min_depth: u32,
    pub max_depth: u32,
}

impl TraversalSpec {
    pub fn new(start: DocumentId, edge_collection: impl Into<String>) -> Self {
        Self {
            start,
            edge_collection: edge_collection.into(),
            direction: TraversalDirection::default(),
            min_depth: 1,
            max_depth: 1,
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.edge_collection.is_empty() {
            return Err(ClientError::MalformedQuery(
                "traversal needs an edge collection".to_string(),
            ));
        }
        if self.min_depth == 0 || self.min_depth > self.max_depth {
            return Err(ClientError::MalformedQuery(format!(
                "invalid traversal depth {}..{}",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }

    pub fn to_aql(&self) -> ClientResult<AqlQuery> {
        self.validate()?;

        let query = format!(
            "FOR v IN {}..{} {} @start @@edges \
             OPTIONS {{ order: \"bfs\", uniqueVertices: \"global\" }}\n\
             RETURN DISTINCT v",
            self.min_depth,
            self.max_depth,
            self.direction.aql()
        );

        let mut bind_vars = Map::new();
        bind_vars.insert("start".to_string(), Value::String(self.start.to_string()));
        bind_vars.insert(
            "@edges".to_string(),
            Value::String(self.edge_collection.clone()),
        );

        Ok(AqlQuery { query, bind_vars })
    }
}
