use serde::{Deserialize, Serialize};

/// Name of the database every server has.
pub const SYSTEM_DATABASE: &str = "_system";

/// Identifies the database an operation targets.
///
/// Passed explicitly into every document- and collection-level call; there is
/// no implicit "current database".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DatabaseSpec {
    pub db: String,
}

impl DatabaseSpec {
    pub fn new(db: impl Into<String>) -> Self {
        Self { db: db.into() }
    }

    pub fn system() -> Self {
        Self::new(SYSTEM_DATABASE)
    }

    pub fn name(&self) -> &str {
        &self.db
    }
}

impl Default for DatabaseSpec {
    fn default() -> Self {
        Self::system()
    }
}

impl<AsStr: AsRef<str>> From<AsStr> for DatabaseSpec {
    fn from(value: AsStr) -> Self {
        Self::new(value.as_ref())
    }
}

impl std::fmt::Display for DatabaseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.db)
    }
}
