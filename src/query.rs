//! Canonical query-string construction.
//!
//! Subscription URLs and paginated requests embed their parameters in the
//! URL, so two logically identical requests must produce byte-identical
//! strings. The encoder guarantees that: absent values are dropped, keys are
//! sorted by code-unit order, and both keys and values are percent-encoded
//! with URI-component semantics before being joined as `key=value` pairs
//! with `&`.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// URI-component encoding: alphanumerics and `- _ . ! ~ * ' ( )` pass
/// through, everything else (including space) is percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A scalar query parameter value.
///
/// Query mappings are flat: string, number, or boolean values only, no
/// nesting. `From` impls cover the common literal types so call sites can
/// write `("page", Some(2.into()))`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// String value, encoded verbatim.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, encoded as `true` / `false`.
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(i) => write!(f, "{i}"),
            QueryValue::Float(x) => write!(f, "{x}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

/// Encode a flat parameter mapping into a canonical query string.
///
/// `None` values are dropped before encoding; the remaining keys are sorted
/// lexicographically. The empty mapping yields the empty string. Total
/// function - no input representable by [`QueryValue`] can make it fail.
///
/// ```
/// use ci_http_client::{encode_query_string, QueryValue};
///
/// let query = encode_query_string([
///     ("b", Some(QueryValue::from(1))),
///     ("a", Some(QueryValue::from("x"))),
///     ("c", None),
/// ]);
/// assert_eq!(query, "a=x&b=1");
/// ```
pub fn encode_query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<QueryValue>)>,
{
    let present: BTreeMap<&str, QueryValue> = params
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

    present
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(&value.to_string(), COMPONENT),
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_absent_and_sorts_keys() {
        let query = encode_query_string([
            ("b", Some(1.into())),
            ("a", Some("x".into())),
            ("c", None),
        ]);
        assert_eq!(query, "a=x&b=1");
    }

    #[test]
    fn empty_mapping_yields_empty_string() {
        let empty: [(&str, Option<QueryValue>); 0] = [];
        assert_eq!(encode_query_string(empty), "");
        assert_eq!(encode_query_string([("a", None)]), "");
    }

    #[test]
    fn percent_encodes_keys_and_values() {
        let query = encode_query_string([("a key", Some("a&b=c d".into()))]);
        assert_eq!(query, "a%20key=a%26b%3Dc%20d");
    }

    #[test]
    fn component_unreserved_characters_pass_through() {
        let query = encode_query_string([("k", Some("a-b_c.d!e~f*g'h(i)j".into()))]);
        assert_eq!(query, "k=a-b_c.d!e~f*g'h(i)j");
    }

    #[test]
    fn scalar_values_render_like_literals() {
        let query = encode_query_string([
            ("int", Some((-3).into())),
            ("float", Some(1.5.into())),
            ("flag", Some(true.into())),
        ]);
        assert_eq!(query, "flag=true&float=1.5&int=-3");
    }

    #[test]
    fn encoding_is_idempotent_across_calls() {
        let params = || {
            [
                ("z", Some(QueryValue::from("last"))),
                ("a", Some(QueryValue::from(0))),
            ]
        };
        assert_eq!(encode_query_string(params()), encode_query_string(params()));
    }

    #[test]
    fn non_ascii_values_are_utf8_percent_encoded() {
        let query = encode_query_string([("name", Some("héllo".into()))]);
        assert_eq!(query, "name=h%C3%A9llo");
    }
}
