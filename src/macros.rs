/// Builds a [`TsonValue`](crate::TsonValue) with record and sequence literals.
///
/// `{ "name": value }` builds a record, `[a, b]` a sequence, `null` the null
/// value. Anything else goes through [`to_value`](crate::to_value) and turns
/// into null if it cannot be encoded.
///
/// ```rust
/// use serde_tson::{tson, to_string};
///
/// let value = tson!({ "id": 7, "tags": ["a", "b"], "parent": null });
/// assert_eq!(to_string(&value).unwrap(), "{id:7,tags:[\"a\",\"b\"],parent:()}");
/// ```
#[macro_export]
macro_rules! tson {
    (null) => {
        $crate::TsonValue::Null
    };

    (true) => {
        $crate::TsonValue::Bool(true)
    };

    (false) => {
        $crate::TsonValue::Bool(false)
    };

    ([]) => {
        $crate::TsonValue::Sequence(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::TsonValue::Sequence(vec![$($crate::tson!($elem)),*])
    };

    ({}) => {
        $crate::TsonValue::Record($crate::TsonMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut record = $crate::TsonMap::new();
        $(
            record.insert($key.to_string(), $crate::tson!($value));
        )*
        $crate::TsonValue::Record(record)
    }};

    ($other:expr) => {
        $crate::to_value(&$other).unwrap_or($crate::TsonValue::Null)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Number, TsonMap, TsonValue};

    #[test]
    fn test_tson_macro_scalars() {
        assert_eq!(tson!(null), TsonValue::Null);
        assert_eq!(tson!(true), TsonValue::Bool(true));
        assert_eq!(tson!(42), TsonValue::Number(Number::Int(42)));
        assert_eq!(tson!(3.5), TsonValue::Number(Number::Float(3.5)));
        assert_eq!(tson!('x'), TsonValue::Char('x'));
        assert_eq!(tson!("hello"), TsonValue::String("hello".to_string()));
    }

    #[test]
    fn test_tson_macro_nesting() {
        assert_eq!(tson!({}), TsonValue::Record(TsonMap::new()));

        let record = tson!({
            "name": "Alice",
            "scores": [1, 2],
            "address": { "city": "Oslo" }
        });
        assert_eq!(record.get("name").and_then(TsonValue::as_str), Some("Alice"));
        assert_eq!(record.get("scores").and_then(TsonValue::as_sequence).map(<[_]>::len), Some(2));
        assert_eq!(
            record.get("address").and_then(|a| a.get("city")).and_then(TsonValue::as_str),
            Some("Oslo")
        );
    }
}
