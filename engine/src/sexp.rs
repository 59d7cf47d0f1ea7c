//! S-expression plist helpers shared by the config loader and the wire
//! protocol. Keywords may arrive as `Value::Keyword("key")` (elisp-style
//! parser) or `Value::Symbol(":key")` (default parser); both are accepted.

use lexpr::Value;

/// Find the value following `:key` in a plist.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Render an atom the way a plist reader expects: keywords and symbols
/// without their leading colon, booleans as `t`/`nil`.
pub fn atom_string(value: &Value) -> String {
    match value {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => fmt_bool(*b).to_string(),
        Value::Nil | Value::Null => "nil".to_string(),
        other => other.to_string(),
    }
}

/// Whether a value reads as elisp `nil`.
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null | Value::Bool(false) => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Extract a keyword value from a plist as a string.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    get_value(value, key).map(atom_string)
}

/// Extract a floating-point value from a plist.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Elements of a proper list. Non-list values yield nothing.
pub fn list_items(value: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        items.push(pair.car());
        current = pair.cdr();
    }
    items
}

/// Key/value pairs of a plist, keys without their leading colon.
pub fn plist_pairs(value: &Value) -> Vec<(String, &Value)> {
    list_items(value)
        .chunks(2)
        .filter_map(|chunk| match chunk {
            [key, val] => Some((atom_string(key), *val)),
            _ => None,
        })
        .collect()
}

/// Elisp boolean literal.
pub fn fmt_bool(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}

/// Escape a string for s-expression output.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn error_response(reason: &str) -> String {
    format!(
        "(:type :response :status :error :reason \"{}\")",
        escape_string(reason)
    )
}

pub fn ok_response() -> String {
    "(:type :response :status :ok)".to_string()
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, String)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        lexpr::from_str(s).unwrap()
    }

    #[test]
    fn test_get_keyword_symbol_form() {
        let v = parse("(:type :frame :timestamp 1200)");
        assert_eq!(get_keyword(&v, "type").as_deref(), Some("frame"));
        assert_eq!(get_keyword(&v, "timestamp").as_deref(), Some("1200"));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_float_and_nil() {
        let v = parse("(:radius 0.003 :drag t :hover nil)");
        assert_eq!(get_float(&v, "radius"), Some(0.003));
        assert!(!is_nil(get_value(&v, "drag").unwrap()));
        assert!(is_nil(get_value(&v, "hover").unwrap()));
    }

    #[test]
    fn test_nested_plist() {
        let v = parse("(:screen (:width-px 1920 :height-px 1080))");
        let screen = get_value(&v, "screen").unwrap();
        assert_eq!(get_float(screen, "width-px"), Some(1920.0));
    }

    #[test]
    fn test_list_items_and_pairs() {
        let v = parse("(push poke dwell)");
        let names: Vec<String> = list_items(&v).into_iter().map(atom_string).collect();
        assert_eq!(names, vec!["push", "poke", "dwell"]);

        let v = parse("(:index-tip (0.0 0.1 0.2) :wrist (0 0 0))");
        let pairs = plist_pairs(&v);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "index-tip");
        assert_eq!(list_items(pairs[0].1).len(), 3);
    }

    #[test]
    fn test_is_nil() {
        assert!(is_nil(&parse("nil")));
        assert!(is_nil(&parse("()")));
        assert!(!is_nil(&parse("t")));
    }

    #[test]
    fn test_format_event() {
        let s = format_event("pointer", &[("input", ":down".to_string()), ("x", "10.0".to_string())]);
        assert_eq!(s, "(:type :event :event :pointer :input :down :x 10.0)");
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response("say \"hello\"");
        assert!(r.contains(":status :error"));
        assert!(r.contains("say \\\"hello\\\""));
    }
}
