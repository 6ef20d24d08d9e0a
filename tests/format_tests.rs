//! Exact canonical output for each production, compact and indented.

use serde::Serialize;
use serde_tson::{
    classify, classify_type, to_string, to_string_pretty, value_from_str, Ignored, Kind,
    MultiArray, TsonValue,
};
use std::collections::{BTreeMap, HashMap};

#[test]
fn test_dictionary() {
    let mut map = BTreeMap::new();
    map.insert(1, 2);
    map.insert(3, 4);
    assert_eq!(to_string(&map).unwrap(), "[1:2,3:4]");
}

#[test]
fn test_two_dimensional_array() {
    let grid = MultiArray::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    assert_eq!(to_string(&grid).unwrap(), "[<2,2>1,2,3,4]");
}

#[test]
fn test_pair() {
    assert_eq!(to_string(&(1, "x")).unwrap(), "(Item1:1,Item2:\"x\")");
}

#[test]
fn test_booleans() {
    assert_eq!(to_string(&true).unwrap(), "True");
    assert_eq!(to_string(&false).unwrap(), "False");
}

#[test]
fn test_escape_table() {
    assert_eq!(
        to_string(&"\"\\\n\r\t\u{8}\u{c}").unwrap(),
        "\"\\\"\\\\\\n\\r\\t\\b\\f\""
    );
    assert_eq!(to_string(&'\'').unwrap(), "'\\''");
}

#[test]
fn test_no_trailing_commas_after_filtering() {
    #[derive(Serialize)]
    struct Login {
        user: String,
        password: Ignored<String>,
    }

    let logins = vec![Login {
        user: "ann".to_string(),
        password: Ignored::new("secret".to_string()),
    }];
    assert_eq!(to_string(&logins).unwrap(), "[{user:\"ann\"}]");
    assert_eq!(to_string_pretty(&logins).unwrap(), "[\n\t{\n\t\tuser: \"ann\"\n\t}\n]");
}

#[test]
fn test_pretty_layout() {
    #[derive(Serialize)]
    struct Doc {
        title: String,
        pairs: HashMap<String, (i32, bool)>,
        empty: Vec<i32>,
        grid: MultiArray<u8>,
    }

    let mut pairs = HashMap::new();
    pairs.insert("a".to_string(), (1, true));
    let doc = Doc {
        title: "t".to_string(),
        pairs,
        empty: vec![],
        grid: MultiArray::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap(),
    };

    let expected = "{\n\
                    \ttitle: \"t\",\n\
                    \tpairs: [\n\
                    \t\t\"a\": (\n\
                    \t\t\tItem1: 1,\n\
                    \t\t\tItem2: True\n\
                    \t\t)\n\
                    \t],\n\
                    \tempty: [],\n\
                    \tgrid: [<2,2>\n\
                    \t\t1,2,\n\
                    \t\t3,4\n\
                    \t]\n\
                    }";
    assert_eq!(to_string_pretty(&doc).unwrap(), expected);
}

#[test]
fn test_classification() {
    assert_eq!(classify_type::<i32>(), Kind::Scalar);
    assert_eq!(classify_type::<String>(), Kind::String);
    assert_eq!(classify_type::<char>(), Kind::Char);
    assert_eq!(classify_type::<Vec<u8>>(), Kind::Sequence);
    assert_eq!(classify_type::<HashMap<String, i32>>(), Kind::Map);
    assert_eq!(classify_type::<(i32, String)>(), Kind::Tuple);
    assert_eq!(classify_type::<MultiArray<f32>>(), Kind::MultiArray);
    assert_eq!(classify_type::<TsonValue>(), Kind::Record);

    assert_eq!(classify(&vec![(1, 2)]).unwrap(), Kind::Sequence);
    assert_eq!(classify(&BTreeMap::<u8, u8>::new()).unwrap(), Kind::Map);
    assert_eq!(classify(&None::<String>).unwrap(), Kind::Null);
}

#[test]
fn test_compact_text_is_reproduced() {
    let samples = [
        "{name:\"Ann\",tags:[\"a\",\"b\"],nested:{deep:()}}",
        "[@{x:1}:'a',@[1,2]:'b',3:'c']",
        "(Item1:1,Item2:2,Item3:3,Item4:4,Item5:5,Item6:6,Item7:7,Rest:(Item1:8))",
        "[<2,1,2>0.5,1.5,2.5,3.5]",
        "[Red,Green,{Custom:[1,2,3]}]",
    ];
    for sample in samples {
        let value = value_from_str(sample).unwrap();
        assert_eq!(to_string(&value).unwrap(), sample);
    }
}

#[test]
fn test_empty_tuple_shares_the_null_spelling() {
    assert_eq!(to_string(&TsonValue::Tuple(vec![])).unwrap(), "()");
    assert_eq!(value_from_str("()").unwrap(), TsonValue::Null);
    assert!(serde_tson::from_str::<()>("()").is_ok());
}
