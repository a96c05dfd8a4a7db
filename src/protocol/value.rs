//! Untyped protocol values
//!
//! The transport hands over arguments in this shape. Nothing past the
//! decoder in `event.rs` ever sees a `Value`.

/// Dynamically typed argument as produced by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Key/value pairs in wire order
    Map(Vec<(Value, Value)>),
    /// Opaque extension value (window and buffer handles)
    Ext(i8, Vec<u8>),
}

impl Value {
    /// Integer view (floats are truncated)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Non-negative integer view
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }

    /// Float view (integers are widened)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Look up a string key in a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Replay files are TOML; tables become string-keyed maps
impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::String(d.to_string()),
            toml::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Float(3.9).as_i64(), Some(3));
        assert_eq!(Value::Integer(-1).as_u64(), None);
        assert_eq!(Value::Integer(7).as_f64(), Some(7.0));
        assert_eq!(Value::from("x").as_i64(), None);
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn test_map_lookup() {
        let map = Value::Map(vec![
            (Value::from("bold"), Value::from(true)),
            (Value::from("foreground"), Value::from(0xFF0000i64)),
        ]);
        assert_eq!(map.get("bold"), Some(&Value::Bool(true)));
        assert_eq!(map.get("foreground").and_then(Value::as_i64), Some(0xFF0000));
        assert_eq!(map.get("italic"), None);
        assert_eq!(Value::Nil.get("bold"), None);
    }

    #[test]
    fn test_from_toml() {
        let parsed: toml::Value = toml::from_str(r#"e = ["grid_clear", [1]]"#).unwrap();
        let value = Value::from(parsed);
        let e = value.get("e").and_then(Value::as_array).unwrap();
        assert_eq!(e[0].as_str(), Some("grid_clear"));
        assert_eq!(e[1].as_array().map(|a| a.len()), Some(1));
    }
}
