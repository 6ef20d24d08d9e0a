use serde_tson::{to_string, to_string_pretty, tson, value_from_str, Number, TsonMap, TsonValue};

#[test]
fn test_tson_macro_null() {
    assert_eq!(tson!(null), TsonValue::Null);
    assert_eq!(to_string(&tson!(null)).unwrap(), "()");
}

#[test]
fn test_tson_macro_booleans() {
    assert_eq!(tson!(true), TsonValue::Bool(true));
    assert_eq!(tson!(false), TsonValue::Bool(false));
}

#[test]
fn test_tson_macro_numbers() {
    assert_eq!(tson!(42), TsonValue::Number(Number::Int(42)));
    assert_eq!(tson!(3.5), TsonValue::Number(Number::Float(3.5)));
    assert_eq!(tson!(-123), TsonValue::Number(Number::Int(-123)));
    assert_eq!(tson!(u64::MAX), TsonValue::Number(Number::UInt(u64::MAX)));
}

#[test]
fn test_tson_macro_strings_and_chars() {
    assert_eq!(tson!("hello world"), TsonValue::String("hello world".to_string()));
    assert_eq!(tson!(""), TsonValue::String(String::new()));
    assert_eq!(tson!('q'), TsonValue::Char('q'));
}

#[test]
fn test_tson_macro_sequences() {
    assert_eq!(tson!([]), TsonValue::Sequence(vec![]));

    let seq = tson!([1, "two", [3], null]);
    assert_eq!(to_string(&seq).unwrap(), "[1,\"two\",[3],()]");
}

#[test]
fn test_tson_macro_records() {
    assert_eq!(tson!({}), TsonValue::Record(TsonMap::new()));

    let record = tson!({
        "name": "Alice",
        "age": 30,
        "address": {
            "city": "Oslo",
            "zip": "0150"
        },
        "tags": ["a", "b"]
    });

    let keys: Vec<&str> = record.as_record().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age", "address", "tags"]);
    assert_eq!(
        to_string(&record).unwrap(),
        "{name:\"Alice\",age:30,address:{city:\"Oslo\",zip:\"0150\"},tags:[\"a\",\"b\"]}"
    );
}

#[test]
fn test_tson_macro_expressions() {
    let count = 3;
    let names = vec!["x".to_string()];
    let record = tson!({ "count": count, "names": names, "pair": (1, 2) });

    assert_eq!(record.get("count").and_then(TsonValue::as_i64), Some(3));
    assert!(record.get("pair").unwrap().is_tuple());
    assert_eq!(
        to_string_pretty(&record).unwrap(),
        "{\n\tcount: 3,\n\tnames: [\n\t\t\"x\"\n\t],\n\tpair: (\n\t\tItem1: 1,\n\t\tItem2: 2\n\t)\n}"
    );
}

#[test]
fn test_tson_macro_quoted_member_names() {
    let record = tson!({ "x y": 1, "plain": 2 });
    let text = to_string(&record).unwrap();
    assert_eq!(text, "{\"x y\":1,plain:2}");
    assert_eq!(value_from_str(&text).unwrap(), record);
}
