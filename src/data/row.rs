use crate::data::value_accessor;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One record managed by the grid. Shared, never mutated in place.
pub type Row = Arc<Value>;

/// Caller-supplied stable key for a row
pub type KeyFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// How two rows are decided to be "the same row"
#[derive(Clone, Default)]
pub enum RowIdentity {
    /// Same allocation (`Arc::ptr_eq`)
    #[default]
    Reference,
    /// Equal keys
    Key(KeyFn),
}

impl RowIdentity {
    /// Identity keyed on the text of one (possibly dotted) field
    pub fn field(path: impl Into<String>) -> Self {
        let path = path.into();
        RowIdentity::Key(Arc::new(move |row: &Value| {
            value_accessor::to_text(value_accessor::resolve(row, &path))
        }))
    }

    pub fn with_key<F>(key_fn: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        RowIdentity::Key(Arc::new(key_fn))
    }

    pub fn same(&self, a: &Row, b: &Row) -> bool {
        match self {
            RowIdentity::Reference => Arc::ptr_eq(a, b),
            RowIdentity::Key(key_fn) => Arc::ptr_eq(a, b) || key_fn(a) == key_fn(b),
        }
    }
}

impl fmt::Debug for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIdentity::Reference => write!(f, "Reference"),
            RowIdentity::Key(_) => write!(f, "Key(..)"),
        }
    }
}

/// Wrap plain JSON records as grid rows
pub fn rows_from_values(values: Vec<Value>) -> Vec<Row> {
    values.into_iter().map(Arc::new).collect()
}
