use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder that ArcGIS-style exports write into empty table cells.
const NULL_SENTINEL: &str = "<Null>";

static INTEGER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static FLOAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap()
});

/// Typed value of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Null,
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Convert the text of a value cell into a typed value.
///
/// Rules, first match wins:
/// - empty text or the `<Null>` sentinel (any case) is `Null`.
/// - a base-10 integer with an optional sign is `Integer`. Literals too large for
///   64 bits fall through to the float rule.
/// - a decimal and/or exponent literal is `Float`.
/// - anything else is returned as `Text`, unchanged.
///
/// Never fails.
pub fn coerce_value(text: &str) -> AttributeValue {
    if text.is_empty() || text.eq_ignore_ascii_case(NULL_SENTINEL) {
        return AttributeValue::Null;
    }
    if INTEGER_PATTERN.is_match(text) {
        if let Ok(value) = text.parse::<i64>() {
            return AttributeValue::Integer(value);
        }
    }
    if FLOAT_PATTERN.is_match(text) {
        if let Ok(value) = text.parse::<f64>() {
            if value.is_finite() {
                return AttributeValue::Float(value);
            }
        }
    }
    AttributeValue::Text(text.to_string())
}

/// Attributes of one placemark, in first-inserted order with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: String, value: AttributeValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Merge `other` into `self`; values from `other` win on collisions.
    pub fn extend(&mut self, other: AttributeMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (K, AttributeValue)>>(iter: T) -> Self {
        let mut map = AttributeMap::new();
        for (key, value) in iter {
            map.insert(key.into(), value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::{coerce_value, AttributeMap, AttributeValue};

    #[rstest]
    #[case("<Null>", AttributeValue::Null)]
    #[case("<NULL>", AttributeValue::Null)]
    #[case("", AttributeValue::Null)]
    #[case("42", AttributeValue::Integer(42))]
    #[case("-17", AttributeValue::Integer(-17))]
    #[case("+5", AttributeValue::Integer(5))]
    #[case("007", AttributeValue::Integer(7))]
    #[case("123.45", AttributeValue::Float(123.45))]
    #[case("-0.5", AttributeValue::Float(-0.5))]
    #[case(".5", AttributeValue::Float(0.5))]
    #[case("1e3", AttributeValue::Float(1000.0))]
    #[case("2.5E-2", AttributeValue::Float(0.025))]
    #[case("Active", AttributeValue::Text("Active".to_string()))]
    #[case("NaN", AttributeValue::Text("NaN".to_string()))]
    #[case("inf", AttributeValue::Text("inf".to_string()))]
    #[case("12abc", AttributeValue::Text("12abc".to_string()))]
    #[case("1.2.3", AttributeValue::Text("1.2.3".to_string()))]
    #[case("Null", AttributeValue::Text("Null".to_string()))]
    fn test_coerce_value(#[case] text: &str, #[case] expected: AttributeValue) {
        assert_eq!(expected, coerce_value(text));
    }

    #[test]
    fn test_coerce_integer_overflow_falls_back_to_float() {
        match coerce_value("123456789012345678901234567890") {
            AttributeValue::Float(value) => assert_abs_diff_eq!(value, 1.2345678901234568e29),
            other => panic!("Expected float, got {:?}", other),
        }
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    fn test_coerce_integer_round_trip(#[case] value: i64) {
        assert_eq!(AttributeValue::Integer(value), coerce_value(&value.to_string()));
    }

    #[rstest]
    #[case(0.1)]
    #[case(-3.75)]
    #[case(1.0)]
    #[case(6.02214076e23)]
    #[case(1e-300)]
    fn test_coerce_float_round_trip(#[case] value: f64) {
        assert_eq!(AttributeValue::Float(value), coerce_value(&format!("{:?}", value)));
    }

    #[test]
    fn test_attribute_map_keeps_first_position_on_overwrite() {
        let mut map = AttributeMap::new();
        map.insert("a".to_string(), AttributeValue::Integer(1));
        map.insert("b".to_string(), AttributeValue::Integer(2));
        map.insert("a".to_string(), AttributeValue::Integer(3));

        assert_eq!(vec!["a", "b"], map.keys().collect::<Vec<_>>());
        assert_eq!(Some(&AttributeValue::Integer(3)), map.get("a"));
        assert_eq!(2, map.len());
    }
}
