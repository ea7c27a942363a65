//! Extension scalar functions
//!
//! Hosts register `(name, arity, callable)` entries before serving starts;
//! every connection gets the whole registry installed when it is opened.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

/// Callable behind an extension function. Receives the evaluated arguments.
pub type ScalarFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A single extension function.
#[derive(Clone)]
pub struct ExtensionFunction {
    pub name: String,
    /// Number of arguments, or `-1` for variadic.
    pub arity: i32,
    pub func: ScalarFn,
}

impl fmt::Debug for ExtensionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Ordered set of extension functions applied to each connection at open.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<ExtensionFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function. A later registration with the same name and arity
    /// replaces the earlier one when installed.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: i32, func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.push(ExtensionFunction {
            name: name.into(),
            arity,
            func: Arc::new(func),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Install every registered function on `conn`.
    pub fn install(&self, conn: &Connection) -> rusqlite::Result<()> {
        for ext in &self.functions {
            let func = AssertUnwindSafe(Arc::clone(&ext.func));
            conn.create_scalar_function(
                ext.name.as_str(),
                ext.arity,
                FunctionFlags::SQLITE_UTF8,
                move |ctx| {
                    let func = &func;
                    let args = (0..ctx.len())
                        .map(|i| owned(ctx.get_raw(i)))
                        .collect::<Vec<_>>();
                    (func.0)(&args).map_err(|msg| rusqlite::Error::UserFunctionError(msg.into()))
                },
            )?;
        }
        Ok(())
    }
}

fn owned(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Read an argument as seconds, accepting numbers and numeric text.
pub fn as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Real(f) => Some(*f),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_function_is_callable() {
        let conn = Connection::open_in_memory().unwrap();
        let mut registry = FunctionRegistry::new();
        registry.register("double_it", 1, |args| match &args[0] {
            Value::Integer(n) => Ok(Value::Integer(n * 2)),
            other => Err(format!("cannot double {other:?}")),
        });
        registry.install(&conn).unwrap();

        let doubled: i64 = conn.query_row("select double_it(21)", [], |r| r.get(0)).unwrap();
        assert_eq!(doubled, 42);
    }

    #[test]
    fn test_function_error_surfaces_as_sql_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut registry = FunctionRegistry::new();
        registry.register("always_fails", 0, |_| Err("nope".to_string()));
        registry.install(&conn).unwrap();

        let err = conn
            .query_row("select always_fails()", [], |r| r.get::<_, i64>(0))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_as_seconds() {
        assert_eq!(as_seconds(&Value::Real(0.5)), Some(0.5));
        assert_eq!(as_seconds(&Value::Integer(2)), Some(2.0));
        assert_eq!(as_seconds(&Value::Text("0.01".into())), Some(0.01));
        assert_eq!(as_seconds(&Value::Null), None);
    }
}
