use toml::{Table, Value};

use crate::schema::{Node, Schema};

/// Build a `toml::Table` from environment variables matching `{PREFIX}__*`.
///
/// `__` separates nesting levels and a single `_` is part of the field name.
/// Segments match declared field names case-insensitively, so
/// `PREFIX__DRYRUN` sets `dryRun`; undeclared segments are lowercased. Each value is parsed according to the schema
/// node at its path: booleans, numbers, strings and comma-separated arrays.
/// Where the schema has nothing to say the value is guessed:
/// bool → integer → float → string.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
    schema: &Schema,
) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, raw) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let (segments, node) = resolve_path(schema, rest);
        let value = parse_for(node, &raw);
        insert_nested(&mut table, &segments, value);
    }

    table
}

fn insert_nested(table: &mut Table, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        table.insert(first.clone(), value);
        return;
    }
    let sub = table
        .entry(first.clone())
        .or_insert_with(|| Value::Table(Table::new()));
    if let Value::Table(sub_table) = sub {
        insert_nested(sub_table, rest, value);
    }
}

/// Leaf node of a schema without its wrappers.
fn unwrap_node(schema: &Schema) -> &Schema {
    match schema.node() {
        Node::Optional(inner) | Node::Default { inner, .. } => unwrap_node(inner),
        Node::Option(option) => unwrap_node(option.inner_type()),
        _ => schema,
    }
}

/// Key path for an env suffix, spelled the way the schema declares it, and
/// the schema node at that path if there is one.
fn resolve_path<'s>(schema: &'s Schema, rest: &str) -> (Vec<String>, Option<&'s Schema>) {
    let mut current = Some(unwrap_node(schema));
    let mut segments = Vec::new();
    for raw in rest.split("__") {
        let (name, next) = match current.map(Schema::node) {
            Some(Node::Object(shape)) => match shape
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(raw))
            {
                Some((name, field)) => (name.to_string(), Some(field)),
                None => (raw.to_lowercase(), None),
            },
            Some(Node::Record(values)) => (raw.to_lowercase(), Some(values.as_ref())),
            _ => (raw.to_lowercase(), None),
        };
        segments.push(name);
        current = next.map(unwrap_node);
    }
    (segments, current)
}

fn parse_for(schema: Option<&Schema>, raw: &str) -> Value {
    let Some(schema) = schema else {
        return guess(raw);
    };
    match schema.node() {
        Node::Boolean => parse_bool(raw).map_or_else(|| guess(raw), Value::Boolean),
        Node::Number => parse_number(raw).unwrap_or_else(|| guess(raw)),
        Node::String | Node::Enum(_) => Value::String(raw.to_string()),
        Node::Array(element) => {
            let element = Some(unwrap_node(element));
            let items = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| parse_for(element, item))
                .collect();
            Value::Array(items)
        }
        _ => guess(raw),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Integer when the text is one, else a finite float.
pub(crate) fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Schema-less parsing: bool → integer → float → string.
fn guess(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // "NaN" and "inf" parse as floats; only a dot makes it one
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::app_schema;
    use crate::schema::Shape;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn env(pairs: &[(&str, &str)]) -> Table {
        env_to_table("MYAPP", vars(pairs), &app_schema())
    }

    #[test]
    fn simple_key() {
        let table = env(&[("MYAPP__HOST", "0.0.0.0")]);
        assert_eq!(table["host"].as_str(), Some("0.0.0.0"));
    }

    #[test]
    fn nested_key_with_single_underscore() {
        let table = env(&[("MYAPP__DATABASE__POOL_SIZE", "10")]);
        assert_eq!(table["database"]["pool_size"].as_integer(), Some(10));
    }

    #[test]
    fn string_field_keeps_numeric_text() {
        let table = env(&[("MYAPP__HOST", "1234"), ("MYAPP__DATABASE__URL", "true")]);
        assert_eq!(table["host"].as_str(), Some("1234"));
        assert_eq!(table["database"]["url"].as_str(), Some("true"));
    }

    #[test]
    fn boolean_field_accepts_switch_words() {
        assert_eq!(env(&[("MYAPP__VERBOSE", "yes")])["verbose"].as_bool(), Some(true));
        assert_eq!(env(&[("MYAPP__VERBOSE", "0")])["verbose"].as_bool(), Some(false));
    }

    #[test]
    fn array_field_splits_on_commas() {
        let table = env(&[("MYAPP__TAGS", "a, b,,c")]);
        let tags: Vec<&str> = table["tags"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn camel_case_fields_match_case_insensitively() {
        let schema = Schema::object(
            Shape::new()
                .field("dryRun", Schema::boolean())
                .field(
                    "netConfig",
                    Schema::object(Shape::new().field("maxRetries", Schema::number())),
                ),
        );
        let table = env_to_table(
            "APP",
            vars(&[
                ("APP__DRYRUN", "yes"),
                ("APP__NETCONFIG__MAXRETRIES", "3"),
                ("APP__OTHERKEY", "x"),
            ]),
            &schema,
        );
        assert_eq!(table["dryRun"].as_bool(), Some(true));
        assert_eq!(table["netConfig"]["maxRetries"].as_integer(), Some(3));
        assert_eq!(table["otherkey"].as_str(), Some("x"));
    }

    #[test]
    fn record_values_use_record_schema() {
        let table = env(&[("MYAPP__LABELS__TEAM", "42")]);
        assert_eq!(table["labels"]["team"].as_str(), Some("42"));
    }

    #[test]
    fn unknown_keys_are_guessed() {
        let table = env(&[
            ("MYAPP__RATE", "1.5"),
            ("MYAPP__OFFSET", "-5"),
            ("MYAPP__DEBUG", "FALSE"),
            ("MYAPP__NAME", "hello world"),
            ("MYAPP__ODD", "inf"),
        ]);
        assert_eq!(table["rate"].as_float(), Some(1.5));
        assert_eq!(table["offset"].as_integer(), Some(-5));
        assert_eq!(table["debug"].as_bool(), Some(false));
        assert_eq!(table["name"].as_str(), Some("hello world"));
        assert_eq!(table["odd"].as_str(), Some("inf"));
    }

    #[test]
    fn unparseable_number_falls_back() {
        let table = env(&[("MYAPP__PORT", "eighty")]);
        assert_eq!(table["port"].as_str(), Some("eighty"));
    }

    #[test]
    fn prefix_must_match_exactly() {
        assert!(env(&[("OTHER__HOST", "x")]).is_empty());
        assert!(env(&[("MYAPP", "x")]).is_empty());
        assert!(env(&[("MYAPP__", "x")]).is_empty());
        assert!(env(&[("MYAPP_HOST", "x")]).is_empty());
    }
}
