use serde::Serialize;

/// Identity of a cached query: an operation name plus its parameters.
///
/// Parameters are stored as canonical JSON (object keys sorted), so two
/// parameter values that serialize to the same JSON share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    operation: String,
    params: String,
}

impl QueryKey {
    pub fn new<P: Serialize + ?Sized>(operation: impl Into<String>, params: &P) -> Self {
        let value = serde_json::to_value(params).unwrap_or(serde_json::Value::Null);
        Self {
            operation: operation.into(),
            params: value.to_string(),
        }
    }

    /// A key for an operation without parameters.
    pub fn bare(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: "null".to_string(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.operation, self.params)
    }
}

/// Which cache entries an invalidation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Key(QueryKey),
    /// Every key of one operation, whatever its parameters. Operation names
    /// are dotted, so `assignments` also covers `assignments.pending`.
    Operation(String),
}

impl Invalidation {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Operation(op) => key
                .operation
                .strip_prefix(op.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn key_is_canonical_over_field_order() {
        let mut a = HashMap::new();
        a.insert("page", 1);
        a.insert("page_size", 10);
        let b = serde_json::json!({"page_size": 10, "page": 1});
        assert_eq!(QueryKey::new("instances.list", &a), QueryKey::new("instances.list", &b));
    }

    #[test]
    fn operation_invalidation_ignores_params() {
        let key = QueryKey::new("assignments.pending", &serde_json::json!({"page": 2}));
        assert!(Invalidation::Operation("assignments.pending".into()).matches(&key));
        assert!(Invalidation::Operation("assignments".into()).matches(&key));
        assert!(!Invalidation::Operation("assign".into()).matches(&key));
        assert!(!Invalidation::Operation("assignments.mine".into()).matches(&key));
        assert!(!Invalidation::Key(QueryKey::bare("assignments.pending")).matches(&key));
    }
}
