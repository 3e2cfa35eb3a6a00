// ── Structured-field accessor ──
//
// Typed, fail-fast lookups into the JSON payload. A field that is absent
// or of the wrong kind stops processing with `SchemaMismatch`; nothing is
// ever coerced. Every node remembers the path it was reached by so errors
// point at the offending field.

use serde_json::Value;

use crate::error::CoreError;

/// JSON kinds the payload schema distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl Kind {
    /// Whether `value` is of this kind. Floats are not integers.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Runtime kind name used in mismatch messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Node ─────────────────────────────────────────────────────────────

/// A borrowed JSON value plus the path it was reached by.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Dotted path from the root, e.g. `WlanGroupList[0].wlans`.
    pub fn path(&self) -> &str {
        if self.path.is_empty() { "$" } else { &self.path }
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.path)
        }
    }

    fn of_kind(self, kind: Kind) -> Result<Self, CoreError> {
        if kind.matches(self.value) {
            Ok(self)
        } else {
            Err(CoreError::mismatch(self.path(), kind, describe(self.value)))
        }
    }

    // ── Field lookups ───────────────────────────────────────────────

    /// `get_field`: the named member, which must exist and be of `kind`.
    pub fn field(&self, name: &str, kind: Kind) -> Result<Node<'a>, CoreError> {
        self.field_any(&[name], kind)
    }

    /// First present member among `names` (canonical name first, then
    /// compatibility aliases). The present member must be of `kind`.
    pub fn field_any(&self, names: &[&str], kind: Kind) -> Result<Node<'a>, CoreError> {
        match self.optional_any(names, kind)? {
            Some(node) => Ok(node),
            None => {
                let canonical = names.first().copied().unwrap_or_default();
                Err(CoreError::mismatch(&self.child_path(canonical), kind, "missing"))
            }
        }
    }

    /// Like [`field`](Self::field) but an absent member is `None`.
    pub fn optional(&self, name: &str, kind: Kind) -> Result<Option<Node<'a>>, CoreError> {
        self.optional_any(&[name], kind)
    }

    pub fn optional_any(
        &self,
        names: &[&str],
        kind: Kind,
    ) -> Result<Option<Node<'a>>, CoreError> {
        let Some(object) = self.value.as_object() else {
            return Err(CoreError::mismatch(self.path(), Kind::Object, describe(self.value)));
        };
        names
            .iter()
            .find_map(|name| object.get(*name).map(|value| (*name, value)))
            .map(|(name, value)| {
                Node {
                    value,
                    path: self.child_path(name),
                }
                .of_kind(kind)
            })
            .transpose()
    }

    // ── Array access ────────────────────────────────────────────────

    /// Element `index` of an array node, which must be of `kind`.
    pub fn index(&self, index: usize, kind: Kind) -> Result<Node<'a>, CoreError> {
        let items = self.items()?;
        let path = format!("{}[{index}]", self.path);
        match items.get(index) {
            Some(value) => Node { value, path }.of_kind(kind),
            None => Err(CoreError::mismatch(
                &path,
                kind,
                format!("missing (array length {})", items.len()),
            )),
        }
    }

    /// Every element of an array node, each required to be of `kind`.
    pub fn elements(&self, kind: Kind) -> Result<Vec<Node<'a>>, CoreError> {
        let len = self.items()?.len();
        (0..len).map(|i| self.index(i, kind)).collect()
    }

    /// Visit every element in order, stopping at the first error.
    pub fn for_each<F>(&self, kind: Kind, mut visit: F) -> Result<(), CoreError>
    where
        F: FnMut(Node<'a>) -> Result<(), CoreError>,
    {
        for element in self.elements(kind)? {
            visit(element)?;
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.items()?.is_empty())
    }

    fn items(&self) -> Result<&'a Vec<Value>, CoreError> {
        self.value
            .as_array()
            .ok_or_else(|| CoreError::mismatch(self.path(), Kind::Array, describe(self.value)))
    }

    // ── Scalars ─────────────────────────────────────────────────────

    pub fn as_str(&self) -> Result<&'a str, CoreError> {
        self.value
            .as_str()
            .ok_or_else(|| CoreError::mismatch(self.path(), Kind::String, describe(self.value)))
    }

    pub fn as_i64(&self) -> Result<i64, CoreError> {
        self.value
            .as_i64()
            .ok_or_else(|| CoreError::mismatch(self.path(), Kind::Integer, describe(self.value)))
    }

    /// Shorthand for a required string member.
    pub fn str_field(&self, name: &str) -> Result<&'a str, CoreError> {
        self.field(name, Kind::String)?.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mismatch_parts(err: CoreError) -> (String, Kind, String) {
        match err {
            CoreError::SchemaMismatch {
                path,
                expected,
                found,
            } => (path, expected, found),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_reports_full_path() {
        let doc = json!({ "WlanGroupList": [{ "wlans": [{ "radios": "5 GHz" }] }] });
        let root = Node::root(&doc);
        let wlan = root
            .field("WlanGroupList", Kind::Array)
            .and_then(|l| l.index(0, Kind::Object))
            .and_then(|g| g.field("wlans", Kind::Array))
            .and_then(|w| w.index(0, Kind::Object))
            .unwrap();

        assert_eq!(wlan.str_field("radios").unwrap(), "5 GHz");
        let (path, expected, found) = mismatch_parts(wlan.str_field("ssidName").unwrap_err());
        assert_eq!(path, "WlanGroupList[0].wlans[0].ssidName");
        assert_eq!(expected, Kind::String);
        assert_eq!(found, "missing");
    }

    #[test]
    fn wrong_kind_is_never_coerced() {
        let doc = json!({ "port": "1812", "attempts": 3, "ratio": 1.5, "list": {} });
        let root = Node::root(&doc);

        let (_, expected, found) = mismatch_parts(root.field("port", Kind::Integer).unwrap_err());
        assert_eq!((expected, found.as_str()), (Kind::Integer, "string"));

        let (_, _, found) = mismatch_parts(root.field("attempts", Kind::String).unwrap_err());
        assert_eq!(found, "integer");

        let (_, _, found) = mismatch_parts(root.field("ratio", Kind::Integer).unwrap_err());
        assert_eq!(found, "float");

        let (path, expected, found) = mismatch_parts(root.field("list", Kind::Array).unwrap_err());
        assert_eq!((path.as_str(), expected, found.as_str()), ("list", Kind::Array, "object"));
    }

    #[test]
    fn aliases_resolve_in_order() {
        let doc = json!({ "attemps": 2 });
        let root = Node::root(&doc);
        let node = root
            .optional_any(&["attempts", "attemps"], Kind::Integer)
            .unwrap()
            .unwrap();
        assert_eq!(node.as_i64().unwrap(), 2);
        assert_eq!(node.path(), "attemps");

        assert!(root.optional("timeout", Kind::Integer).unwrap().is_none());
    }

    #[test]
    fn index_out_of_range_is_a_mismatch() {
        let doc = json!({ "servers": [{ "ip": "10.0.0.1" }] });
        let servers = Node::root(&doc).field("servers", Kind::Array).unwrap();
        let (path, _, found) = mismatch_parts(servers.index(1, Kind::Object).unwrap_err());
        assert_eq!(path, "servers[1]");
        assert_eq!(found, "missing (array length 1)");
    }

    #[test]
    fn for_each_stops_at_first_error() {
        let doc = json!({ "items": [{ "a": "x" }, "oops", { "a": "y" }] });
        let items = Node::root(&doc).field("items", Kind::Array).unwrap();
        let mut seen = Vec::new();
        let result = items.for_each(Kind::Object, |item| {
            seen.push(item.str_field("a")?);
            Ok(())
        });
        assert!(result.is_err());
        assert!(seen.is_empty(), "elements are validated before visiting");
    }

    #[test]
    fn field_on_non_object_fails() {
        let doc = json!(["not", "an", "object"]);
        let (path, expected, _) = mismatch_parts(Node::root(&doc).str_field("x").unwrap_err());
        assert_eq!((path.as_str(), expected), ("$", Kind::Object));
    }
}
