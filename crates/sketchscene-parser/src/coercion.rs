//! Field coercion table.
//!
//! Maps a column name to the [`CoercionRule`] used to turn its raw cell text
//! into a [`FieldValue`]. The table is static and read-only; every rule is
//! total, degrading to a documented fallback instead of failing.

use std::fmt;

use serde_json::Value;

use sketchscene_core::value::{FieldValue, Point};

/// Fields that always resolve to a number.
pub const NUMERIC_FIELDS: [&str; 11] = [
    "width",
    "height",
    "x",
    "y",
    "angle",
    "strokeWidth",
    "roughness",
    "opacity",
    "fontSize",
    "seed",
    "version",
];

/// Fields parsed as embedded structured literals.
pub const STRUCTURED_FIELDS: [&str; 5] = [
    "points",
    "boundElements",
    "startBinding",
    "endBinding",
    "groupIds",
];

/// `fontFamily` value that names the default hand-drawn font slot.
const FONT_FAMILY_SENTINEL: &str = "20";

/// Font name substituted for [`FONT_FAMILY_SENTINEL`].
const FONT_FAMILY_DEFAULT: &str = "Arial";

/// Value substituted when a structured literal cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// A single `[0, 0]` pair.
    OriginPoint,
    /// An empty sequence `[]`.
    EmptySequence,
    /// `null`.
    Null,
}

impl Fallback {
    /// The concrete fallback value.
    pub fn value(&self) -> FieldValue {
        match self {
            Fallback::OriginPoint => FieldValue::Points(vec![Point::origin()]),
            Fallback::EmptySequence => FieldValue::empty_sequence(),
            Fallback::Null => FieldValue::Null,
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::OriginPoint => write!(f, "[[0, 0]]"),
            Fallback::EmptySequence => write!(f, "[]"),
            Fallback::Null => write!(f, "null"),
        }
    }
}

/// How a column's raw text becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionRule {
    /// Decimal number; anything else becomes `0`.
    Numeric,
    /// `true` only for the exact literal `true`.
    BooleanLiteral,
    /// Structured literal with single-quote tolerance and a fallback.
    StructuredLiteral(Fallback),
    /// `fontFamily` remapping of the sentinel value.
    EnumeratedRemap,
    /// Text, re-parsed as structured data when it contains a `"`.
    Passthrough,
}

/// Why a rule substituted a fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The text is not a finite number.
    InvalidNumber,
    /// The structured literal did not parse.
    MalformedLiteral(String),
    /// The literal parsed to a shape the field cannot hold.
    UnexpectedShape,
    /// Quote characters were removed from unparsable text.
    QuotesStripped,
}

/// The outcome of applying a rule to one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    value: FieldValue,
    fallback: Option<FallbackReason>,
}

impl Coerced {
    fn exact(value: FieldValue) -> Self {
        Self {
            value,
            fallback: None,
        }
    }

    fn fallback(value: FieldValue, reason: FallbackReason) -> Self {
        Self {
            value,
            fallback: Some(reason),
        }
    }

    /// The resolved value.
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Why a fallback was used, if one was.
    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        self.fallback.as_ref()
    }

    /// Consume and return the resolved value.
    pub fn into_value(self) -> FieldValue {
        self.value
    }
}

/// Look up the coercion rule for a column.
///
/// Unknown columns use [`CoercionRule::Passthrough`].
pub fn rule_for(column: &str) -> CoercionRule {
    match column {
        "width" | "height" | "x" | "y" | "angle" | "strokeWidth" | "roughness" | "opacity"
        | "fontSize" | "seed" | "version" => CoercionRule::Numeric,
        "isDeleted" => CoercionRule::BooleanLiteral,
        "points" => CoercionRule::StructuredLiteral(Fallback::OriginPoint),
        "boundElements" | "groupIds" => CoercionRule::StructuredLiteral(Fallback::EmptySequence),
        "startBinding" | "endBinding" => CoercionRule::StructuredLiteral(Fallback::Null),
        "fontFamily" => CoercionRule::EnumeratedRemap,
        _ => CoercionRule::Passthrough,
    }
}

impl CoercionRule {
    /// Apply this rule to the raw text of a cell belonging to `column`.
    pub fn apply(&self, column: &str, raw: &str) -> Coerced {
        match self {
            CoercionRule::Numeric => coerce_number(raw),
            CoercionRule::BooleanLiteral => Coerced::exact(FieldValue::Bool(raw == "true")),
            CoercionRule::StructuredLiteral(fallback) => coerce_structured(column, raw, *fallback),
            CoercionRule::EnumeratedRemap => Coerced::exact(remap_font_family(raw)),
            CoercionRule::Passthrough => coerce_passthrough(raw),
        }
    }
}

/// Parse a structured literal, accepting `'` as an alternate quote.
pub fn parse_literal(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&raw.replace('\'', "\""))
}

fn coerce_number(raw: &str) -> Coerced {
    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Coerced::exact(FieldValue::Number(number)),
        _ => Coerced::fallback(FieldValue::Number(0.0), FallbackReason::InvalidNumber),
    }
}

fn coerce_structured(column: &str, raw: &str, fallback: Fallback) -> Coerced {
    let value = match parse_literal(raw) {
        Ok(value) => value,
        Err(err) => {
            return Coerced::fallback(
                fallback.value(),
                FallbackReason::MalformedLiteral(err.to_string()),
            );
        }
    };

    if column == "points" {
        return match points_from_json(&value) {
            Some(points) => Coerced::exact(FieldValue::Points(points)),
            None => Coerced::fallback(fallback.value(), FallbackReason::UnexpectedShape),
        };
    }

    Coerced::exact(FieldValue::from_json(value))
}

fn points_from_json(value: &Value) -> Option<Vec<Point>> {
    value.as_array()?.iter().map(Point::from_json).collect()
}

fn remap_font_family(raw: &str) -> FieldValue {
    if raw == FONT_FAMILY_SENTINEL {
        FieldValue::from(FONT_FAMILY_DEFAULT)
    } else {
        FieldValue::from(raw)
    }
}

fn coerce_passthrough(raw: &str) -> Coerced {
    if !raw.contains('"') {
        return Coerced::exact(FieldValue::from(raw));
    }

    match parse_literal(raw) {
        Ok(value) => Coerced::exact(FieldValue::from_json(value)),
        Err(_) => Coerced::fallback(
            FieldValue::Text(raw.replace('"', "")),
            FallbackReason::QuotesStripped,
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn apply(column: &str, raw: &str) -> Coerced {
        rule_for(column).apply(column, raw)
    }

    #[test]
    fn test_rule_table_covers_vocabulary() {
        for field in NUMERIC_FIELDS {
            assert_eq!(rule_for(field), CoercionRule::Numeric, "{field}");
        }
        for field in STRUCTURED_FIELDS {
            assert!(
                matches!(rule_for(field), CoercionRule::StructuredLiteral(_)),
                "{field}"
            );
        }
        assert_eq!(rule_for("isDeleted"), CoercionRule::BooleanLiteral);
        assert_eq!(rule_for("fontFamily"), CoercionRule::EnumeratedRemap);
        assert_eq!(rule_for("strokeColor"), CoercionRule::Passthrough);
        assert_eq!(rule_for("Width"), CoercionRule::Passthrough);
    }

    #[test]
    fn test_numeric() {
        assert_eq!(apply("x", "10").value(), &FieldValue::Number(10.0));
        assert_eq!(apply("opacity", "99.5").value(), &FieldValue::Number(99.5));
        assert_eq!(apply("angle", "-1e2").value(), &FieldValue::Number(-100.0));
        assert!(apply("x", "10").fallback_reason().is_none());
    }

    #[test]
    fn test_numeric_fallback() {
        for raw in ["abc", "10px", "NaN", "inf", "1,5"] {
            let coerced = apply("width", raw);
            assert_eq!(coerced.value(), &FieldValue::Number(0.0), "{raw}");
            assert_eq!(
                coerced.fallback_reason(),
                Some(&FallbackReason::InvalidNumber)
            );
        }
    }

    #[test]
    fn test_boolean_literal_is_exact() {
        assert_eq!(apply("isDeleted", "true").value(), &FieldValue::Bool(true));
        for raw in ["True", "TRUE", "1", "yes", "false", "true "] {
            assert_eq!(apply("isDeleted", raw).value(), &FieldValue::Bool(false), "{raw}");
        }
    }

    #[test]
    fn test_points_with_single_quotes_and_spacing() {
        let coerced = apply("points", "[[0, 0], [120.5, 40]]");
        assert_eq!(
            coerced.value(),
            &FieldValue::Points(vec![Point::origin(), Point::new(120.5, 40.0)])
        );
    }

    #[test]
    fn test_points_fallbacks() {
        let malformed = apply("points", "[[0,0],[1");
        assert_eq!(malformed.value(), &Fallback::OriginPoint.value());
        assert!(matches!(
            malformed.fallback_reason(),
            Some(FallbackReason::MalformedLiteral(_))
        ));

        let wrong_shape = apply("points", "[1, 2, 3]");
        assert_eq!(wrong_shape.value(), &Fallback::OriginPoint.value());
        assert_eq!(
            wrong_shape.fallback_reason(),
            Some(&FallbackReason::UnexpectedShape)
        );
    }

    #[test]
    fn test_sequence_fields() {
        assert_eq!(
            apply("groupIds", "['g1', 'g2']").value(),
            &FieldValue::Structured(json!(["g1", "g2"]))
        );
        assert_eq!(
            apply("boundElements", "[{'id': 'a1', 'type': 'arrow'}]").value(),
            &FieldValue::Structured(json!([{"id": "a1", "type": "arrow"}]))
        );
        assert_eq!(
            apply("groupIds", "not a list").value(),
            &FieldValue::empty_sequence()
        );
    }

    #[test]
    fn test_binding_fields() {
        assert_eq!(
            apply("startBinding", "{'elementId': 'r1', 'focus': 0.1, 'gap': 4}").value(),
            &FieldValue::Structured(json!({"elementId": "r1", "focus": 0.1, "gap": 4}))
        );
        assert_eq!(apply("endBinding", "null").value(), &FieldValue::Null);
        assert_eq!(apply("endBinding", "{broken").value(), &FieldValue::Null);
    }

    #[test]
    fn test_font_family_remap() {
        assert_eq!(apply("fontFamily", "20").value(), &FieldValue::from("Arial"));
        assert_eq!(apply("fontFamily", "1").value(), &FieldValue::from("1"));
        assert_eq!(
            apply("fontFamily", "Virgil").value(),
            &FieldValue::from("Virgil")
        );
    }

    #[test]
    fn test_passthrough_plain_text() {
        let coerced = apply("strokeColor", "#1e1e1e");
        assert_eq!(coerced.value(), &FieldValue::from("#1e1e1e"));
        assert!(coerced.fallback_reason().is_none());
    }

    #[test]
    fn test_passthrough_reparses_quoted_structure() {
        assert_eq!(
            apply("customData", r#"{"owner": "ann"}"#).value(),
            &FieldValue::Structured(json!({"owner": "ann"}))
        );
        assert_eq!(apply("text", r#""Hello""#).value(), &FieldValue::from("Hello"));
    }

    #[test]
    fn test_passthrough_strips_quotes_on_failure() {
        let coerced = apply("text", r#"He said "hi" twice"#);
        assert_eq!(coerced.value(), &FieldValue::from("He said hi twice"));
        assert_eq!(
            coerced.fallback_reason(),
            Some(&FallbackReason::QuotesStripped)
        );
    }

    #[test]
    fn test_fallback_display() {
        assert_eq!(Fallback::OriginPoint.to_string(), "[[0, 0]]");
        assert_eq!(Fallback::EmptySequence.to_string(), "[]");
        assert_eq!(Fallback::Null.to_string(), "null");
    }
}
