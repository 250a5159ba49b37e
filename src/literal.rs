//! Literal type inference for remote claim values.
//!
//! Wikibase hands back claim values as plain strings; the local graph wants
//! them as typed RDF terms. [`infer`] decides the most specific representable
//! type through a fixed cascade of predicates, each attempted only if the
//! previous one failed:
//!
//! 1. URL shape → resource reference (a [`NamedNode`], not a literal)
//! 2. integer → `xsd:integer`
//! 3. floating point → `xsd:double`
//! 4. `HH:MM` → `xsd:time`
//! 5. calendar date / date-time → `xsd:dateTime`
//! 6. fallback → `xsd:string`
//!
//! The order is load-bearing: numbers must be tried before the temporal
//! predicates (short numeric strings are not valid times or dates, but a
//! lenient date parser may accept numeric-looking fragments), and the string
//! fallback is terminal. The raw text is kept as the lexical form of every
//! literal, so inferring an already-synchronized value reproduces the exact
//! same term.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use oxigraph::model::vocab::xsd;
use oxigraph::model::{Literal, NamedNode, Term};

use crate::uri::is_url;

/// Date-time shapes accepted by [`is_date_time`], tried in order after
/// RFC 3339. Strict parsing: trailing or unrecognized tokens reject.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Calendar date shapes accepted by [`is_date_time`].
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// The type a raw value was inferred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredKind {
    /// A resource reference, emitted as a named node.
    Resource,
    /// `xsd:integer`.
    Integer,
    /// `xsd:double`.
    Double,
    /// `xsd:time` (`HH:MM`).
    Time,
    /// `xsd:dateTime`.
    DateTime,
    /// Untyped-ish terminal fallback, `xsd:string`.
    String,
}

/// Whether the value parses as an integer.
pub fn is_integer(raw: &str) -> bool {
    raw.parse::<i64>().is_ok()
}

/// Whether the value parses as a floating-point number.
pub fn is_double(raw: &str) -> bool {
    raw.parse::<f64>().is_ok()
}

/// Whether the value has the `HH:MM` time-of-day shape.
pub fn is_time(raw: &str) -> bool {
    NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
}

/// Whether the value is a full calendar date or date-time.
pub fn is_date_time(raw: &str) -> bool {
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return true;
    }
    if DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(raw, fmt).is_ok())
    {
        return true;
    }
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(raw, fmt).is_ok())
}

/// Infer the most specific term for a raw claim value.
///
/// Pure: no graph access, no network.
pub fn infer(raw: &str) -> (Term, InferredKind) {
    if is_url(raw) {
        if let Ok(node) = NamedNode::new(raw) {
            return (Term::NamedNode(node), InferredKind::Resource);
        }
    }
    if is_integer(raw) {
        return (
            Term::Literal(Literal::new_typed_literal(raw, xsd::INTEGER)),
            InferredKind::Integer,
        );
    }
    if is_double(raw) {
        return (
            Term::Literal(Literal::new_typed_literal(raw, xsd::DOUBLE)),
            InferredKind::Double,
        );
    }
    if is_time(raw) {
        return (
            Term::Literal(Literal::new_typed_literal(raw, xsd::TIME)),
            InferredKind::Time,
        );
    }
    if is_date_time(raw) {
        return (
            Term::Literal(Literal::new_typed_literal(raw, xsd::DATE_TIME)),
            InferredKind::DateTime,
        );
    }
    (
        Term::Literal(Literal::new_typed_literal(raw, xsd::STRING)),
        InferredKind::String,
    )
}
