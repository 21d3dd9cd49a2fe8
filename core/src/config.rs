use crate::document::MOVIE_FIELDS;

/// What to do with a `field:` qualifier outside the configured field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Fail the query with [`crate::SearchError::UnknownField`].
    Reject,
    /// Silently search the default field instead.
    DefaultField,
}

/// Closed field set and qualifier policy shared by the query parser and the
/// evaluator.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Supported fields, in schema order. Unqualified atoms search all of
    /// them.
    pub fields: Vec<String>,
    /// Target of the `DefaultField` fallback policy.
    pub default_field: String,
    pub unknown_field: UnknownFieldPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            fields: MOVIE_FIELDS.iter().map(|f| f.to_string()).collect(),
            default_field: "title".to_string(),
            unknown_field: UnknownFieldPolicy::Reject,
        }
    }
}

impl SearchConfig {
    pub fn is_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}
