//! Inline GraphQL literal rendering.
//!
//! The remote API is driven with operation text that has argument values
//! written inline, so every interpolation goes through this module. Strings are
//! escaped with [`sanitize`]. Identifiers, integers and booleans are written
//! as bare literals and must already be validated. Tag lists are written as
//! JSON arrays, which GraphQL accepts as list literals.

use serde_json::Value;

use crate::validate::Identifier;

/// Escape a value for embedding between double quotes in operation text.
///
/// Backslash is handled first so later substitutions are never re-escaped.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Absent values sanitize to the empty string.
pub fn sanitize_opt(value: Option<&str>) -> String {
    value.map(sanitize).unwrap_or_default()
}

/// Ordered `name: value` argument list rendered as `(a: 1, b: "x")`.
#[derive(Debug, Clone, Default)]
pub struct ArgList {
    parts: Vec<String>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, name: &str, value: &str) -> Self {
        self.parts.push(format!("{name}: \"{}\"", sanitize(value)));
        self
    }

    pub fn id(mut self, name: &str, value: Identifier) -> Self {
        self.parts.push(format!("{name}: {value}"));
        self
    }

    pub fn int(mut self, name: &str, value: u64) -> Self {
        self.parts.push(format!("{name}: {value}"));
        self
    }

    pub fn boolean(mut self, name: &str, value: bool) -> Self {
        self.parts.push(format!("{name}: {value}"));
        self
    }

    /// Enum literals are written bare; callers pass compile-time constants only.
    pub fn enum_value(mut self, name: &str, value: &'static str) -> Self {
        self.parts.push(format!("{name}: {value}"));
        self
    }

    pub fn string_list(mut self, name: &str, values: &[String]) -> Self {
        self.parts.push(format!("{name}: {}", json_string_list(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn render(&self) -> String {
        if self.parts.is_empty() {
            return String::new();
        }
        format!("({})", self.parts.join(", "))
    }
}

pub fn json_string_list(values: &[String]) -> String {
    let rendered = values
        .iter()
        .map(|value| Value::String(value.clone()).to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rendered}]")
}

/// Wrap a field selection into `query { <root> { <field><args> { <selection> } } }`.
pub fn query(root: &str, field: &str, args: &ArgList, selection: &str) -> String {
    format!(
        "query {{ {root} {{ {field}{} {{ {selection} }} }} }}",
        args.render()
    )
}

pub fn mutation(root: &str, field: &str, args: &ArgList, selection: &str) -> String {
    format!(
        "mutation {{ {root} {{ {field}{} {{ {selection} }} }} }}",
        args.render()
    )
}

#[cfg(test)]
mod tests {
    use super::{ArgList, json_string_list, mutation, query, sanitize, sanitize_opt};
    use crate::validate::Identifier;

    #[test]
    fn sanitize_leaves_safe_text_alone() {
        assert_eq!(sanitize("plain text 123"), "plain text 123");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_escapes_backslash_and_quotes() {
        assert_eq!(sanitize("a\\b"), "a\\\\b");
        assert_eq!(sanitize("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn sanitize_escapes_control_whitespace() {
        assert_eq!(sanitize("a\nb\rc\td"), "a\\nb\\rc\\td");
        assert_eq!(sanitize("\\n"), "\\\\n");
    }

    #[test]
    fn sanitize_absent_is_empty() {
        assert_eq!(sanitize_opt(None), "");
        assert_eq!(sanitize_opt(Some("x\"")), "x\\\"");
    }

    #[test]
    fn arg_list_renders_each_kind() {
        let id = Identifier::new(7).expect("id");
        let args = ArgList::new()
            .id("id", id)
            .string("title", "A \"quoted\" title")
            .boolean("isPublished", false)
            .string_list("tags", &["a".to_string(), "b\"c".to_string()])
            .enum_value("orderBy", "TITLE");
        assert_eq!(
            args.render(),
            "(id: 7, title: \"A \\\"quoted\\\" title\", isPublished: false, \
             tags: [\"a\",\"b\\\"c\"], orderBy: TITLE)"
        );
    }

    #[test]
    fn empty_arg_list_renders_nothing() {
        let args = ArgList::new();
        assert!(args.is_empty());
        assert_eq!(query("pages", "tags", &args, "id tag"), "query { pages { tags { id tag } } }");
    }

    #[test]
    fn mutation_wraps_selection() {
        let args = ArgList::new().int("id", 3);
        assert_eq!(
            mutation("pages", "delete", &args, "responseResult { succeeded }"),
            "mutation { pages { delete(id: 3) { responseResult { succeeded } } } }"
        );
        assert_eq!(json_string_list(&[]), "[]");
    }
}
