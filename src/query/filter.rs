//! Filter expression tree and its rendering into query text
//!
//! The tree is a closed sum of simple predicates and boolean groups so the
//! compiler can match exhaustively. Rendering is pure and synchronous; all
//! validation failures surface before any request is built.

use crate::error::{Error, Result};

/// Boolean connective joining the children of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    /// Uppercased keyword used in query text
    #[inline]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One node of a filter expression tree
///
/// A `Simple` node always carries exactly one argument string; range
/// operators encode both bounds inside that one string. The arity is
/// checked at render time, not at construction, so trees deserialized
/// from external models fail the same way as hand-built ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// A single `property operator argument` predicate
    Simple {
        property: String,
        operator: String,
        arguments: Vec<String>,
    },
    /// A boolean combination of child expressions
    Group {
        op: BoolOp,
        children: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    /// Build a simple predicate with one argument
    pub fn simple(
        property: impl Into<String>,
        operator: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self::Simple {
            property: property.into(),
            operator: operator.into(),
            arguments: vec![argument.into()],
        }
    }

    /// Build an AND group
    pub fn and(children: Vec<FilterExpr>) -> Self {
        Self::Group {
            op: BoolOp::And,
            children,
        }
    }

    /// Build an OR group
    pub fn or(children: Vec<FilterExpr>) -> Self {
        Self::Group {
            op: BoolOp::Or,
            children,
        }
    }

    /// Render this tree into query text, without the leading ` WHERE `
    pub(crate) fn render(&self) -> Result<String> {
        match self {
            Self::Simple {
                property,
                operator,
                arguments,
            } => render_simple(property, operator, arguments),
            Self::Group { op, children } => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    let rendered = child.render()?;
                    // Nested groups keep their own precedence explicit.
                    match child {
                        Self::Group { .. } => parts.push(format!("({rendered})")),
                        Self::Simple { .. } => parts.push(rendered),
                    }
                }
                Ok(parts.join(&format!(" {} ", op.keyword())))
            }
        }
    }
}

/// Value treatment implied by an operator's type suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Quoted,
    Raw,
}

/// Map a suffixed operator name onto a comparison symbol
///
/// Names of the form `<op>_<type>` with `<op>` in eq/ne/lt/gt/le/ge and
/// `<type>` in string/number/date/boolean map onto symbols; string and
/// date comparisons single-quote their value. Anything else is emitted as
/// a literal keyword by the caller.
fn comparison(operator: &str) -> Option<(&'static str, ValueKind)> {
    let (op, ty) = operator.split_once('_')?;
    let symbol = match op {
        "eq" => "=",
        "ne" => "!=",
        "lt" => "<",
        "gt" => ">",
        "le" => "<=",
        "ge" => ">=",
        _ => return None,
    };
    let kind = match ty {
        "string" | "date" => ValueKind::Quoted,
        "number" | "boolean" => ValueKind::Raw,
        _ => return None,
    };
    Some((symbol, kind))
}

fn render_simple(property: &str, operator: &str, arguments: &[String]) -> Result<String> {
    if property.trim().is_empty() {
        return Err(Error::config("filter property cannot be blank"));
    }
    if arguments.len() != 1 {
        return Err(Error::config(format!(
            "filter on '{}' must carry exactly one argument, got {}",
            property,
            arguments.len()
        )));
    }

    let property = property.replace('/', ".");
    let value = escape_argument(&arguments[0]);

    if let Some((symbol, kind)) = comparison(operator) {
        return Ok(match kind {
            ValueKind::Quoted => format!("{property} {symbol} '{value}'"),
            ValueKind::Raw => format!("{property} {symbol} {value}"),
        });
    }

    // Unmapped operators pass through as literal keywords.
    Ok(if operator.eq_ignore_ascii_case("LIKE") {
        format!("{property} {operator} '{value}'")
    } else if operator.eq_ignore_ascii_case("CONTAINS") {
        let items: Vec<String> = value.split(',').map(|item| format!("'{item}'")).collect();
        format!("{property} {operator} ({})", items.join(","))
    } else {
        format!("{property} {operator} {value}")
    })
}

/// Escape an argument for embedding in a form-encoded query body
///
/// Only `%` and `&` are special: `&` always becomes `%26`, and `%` becomes
/// `%25` unless it already begins one of the two canonical escape
/// sequences, which are copied verbatim. This is deliberately not general
/// percent-encoding; already-escaped input must survive a second pass
/// unchanged.
pub(crate) fn escape_argument(argument: &str) -> String {
    let bytes = argument.as_bytes();
    let mut out = String::with_capacity(argument.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let rest = &argument[i..];
                if rest.starts_with("%25") || rest.starts_with("%26") {
                    out.push_str(&rest[..3]);
                    i += 3;
                    continue;
                }
                out.push_str("%25");
                i += 1;
            }
            b'&' => {
                out.push_str("%26");
                i += 1;
            }
            _ => {
                let ch_len = utf8_len(bytes[i]);
                out.push_str(&argument[i..i + ch_len]);
                i += ch_len;
            }
        }
    }
    out
}

#[inline]
fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_leaves_canonical_sequences_alone() {
        assert_eq!(escape_argument("abc%25def"), "abc%25def");
        assert_eq!(escape_argument("abc%26def"), "abc%26def");
    }

    #[test]
    fn escape_encodes_bare_percent() {
        assert_eq!(escape_argument("abc%def"), "abc%25def");
        assert_eq!(escape_argument("%"), "%25");
        assert_eq!(escape_argument("%2"), "%252");
    }

    #[test]
    fn escape_always_encodes_ampersand() {
        assert_eq!(escape_argument("a&b"), "a%26b");
        assert_eq!(escape_argument("&&"), "%26%26");
    }

    #[test]
    fn escape_passes_unicode_through() {
        assert_eq!(escape_argument("naïve%"), "naïve%25");
    }

    #[test]
    fn suffixed_operators_map_to_symbols() {
        assert_eq!(
            FilterExpr::simple("id", "eq_number", "0").render().unwrap(),
            "id = 0"
        );
        assert_eq!(
            FilterExpr::simple("name", "ne_string", "x")
                .render()
                .unwrap(),
            "name != 'x'"
        );
        assert_eq!(
            FilterExpr::simple("when", "ge_date", "2024-01-01")
                .render()
                .unwrap(),
            "when >= '2024-01-01'"
        );
        assert_eq!(
            FilterExpr::simple("flag", "eq_boolean", "true")
                .render()
                .unwrap(),
            "flag = true"
        );
    }

    #[test]
    fn unmapped_operators_are_literal_keywords() {
        assert_eq!(
            FilterExpr::simple("name", "LIKE", "Tr%").render().unwrap(),
            "name LIKE 'Tr%25'"
        );
        assert_eq!(
            FilterExpr::simple("state", "CONTAINS", "a,b")
                .render()
                .unwrap(),
            "state CONTAINS ('a','b')"
        );
        assert_eq!(
            FilterExpr::simple("id", "IN", "(1,2,3)").render().unwrap(),
            "id IN (1,2,3)"
        );
        assert_eq!(
            FilterExpr::simple("n", "BETWEEN", "1 AND 5")
                .render()
                .unwrap(),
            "n BETWEEN 1 AND 5"
        );
        assert_eq!(
            FilterExpr::simple("x", "MYSTERY", "v").render().unwrap(),
            "x MYSTERY v"
        );
    }

    #[test]
    fn slash_properties_are_dotted() {
        assert_eq!(
            FilterExpr::simple("parent/child", "eq_number", "1")
                .render()
                .unwrap(),
            "parent.child = 1"
        );
    }

    #[test]
    fn blank_property_is_a_configuration_error() {
        let err = FilterExpr::simple("  ", "eq_number", "1").render();
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn wrong_arity_is_a_configuration_error() {
        let expr = FilterExpr::Simple {
            property: "id".into(),
            operator: "eq_number".into(),
            arguments: vec!["1".into(), "2".into()],
        };
        assert!(matches!(expr.render(), Err(Error::Configuration(_))));
    }

    #[test]
    fn groups_join_with_uppercased_operator() {
        let expr = FilterExpr::and(vec![
            FilterExpr::simple("id", "eq_number", "0"),
            FilterExpr::simple("name", "LIKE", "Tr%"),
        ]);
        assert_eq!(expr.render().unwrap(), "id = 0 AND name LIKE 'Tr%25'");
    }

    #[test]
    fn nested_groups_are_parenthesized() {
        let expr = FilterExpr::and(vec![
            FilterExpr::simple("a", "eq_number", "1"),
            FilterExpr::or(vec![
                FilterExpr::simple("b", "eq_number", "2"),
                FilterExpr::simple("c", "eq_number", "3"),
            ]),
        ]);
        assert_eq!(expr.render().unwrap(), "a = 1 AND (b = 2 OR c = 3)");
    }
}
