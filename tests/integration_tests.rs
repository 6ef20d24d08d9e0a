use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_tson::{
    from_str, from_str_with_renames, to_string, to_string_pretty, to_string_with_settings,
    to_value, value_from_str, Error, MultiArray, Number, Renames, TsonSettings, TsonValue,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
    note: Option<String>,
}

fn sample_order() -> Order {
    Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string()],
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
        note: None,
    }
}

#[test]
fn test_simple_struct() {
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    };

    let tson = to_string(&user).unwrap();
    println!("User TSON: {}", tson);

    let user_back: User = from_str(&tson).unwrap();
    assert_eq!(user, user_back);
}

#[test]
fn test_nested_struct_compact_and_pretty() {
    let order = sample_order();

    let compact = to_string(&order).unwrap();
    assert!(!compact.contains(char::is_whitespace));
    assert!(compact.ends_with(",total:109.97,note:()}"));
    assert_eq!(from_str::<Order>(&compact).unwrap(), order);

    let pretty = to_string_pretty(&order).unwrap();
    println!("Order TSON:\n{}", pretty);
    assert!(pretty.contains("\n\tcustomer: {\n\t\tid: 123,"));
    assert!(pretty.contains("\n\t\t\tsku: \"GADGET-002\",\n"));
    assert_eq!(from_str::<Order>(&pretty).unwrap(), order);
}

#[test]
fn test_strings_with_escapes() {
    let text = "quote \" backslash \\ newline \n tab \t cr \r bs \u{8} ff \u{c} apostrophe '";
    let tson = to_string(&text).unwrap();
    assert!(!tson.contains('\n'));
    let back: String = from_str(&tson).unwrap();
    assert_eq!(back, text);
}

#[test]
fn test_whitespace_inside_strings_is_kept() {
    let back: Vec<String> = from_str("[ \"a b\" ,\n\t\"  c  \" ]").unwrap();
    assert_eq!(back, vec!["a b", "  c  "]);
}

#[test]
fn test_chars() {
    for c in ['a', '\'', '"', '\\', '\n', 'é', ' '] {
        let tson = to_string(&c).unwrap();
        let back: char = from_str(&tson).unwrap();
        assert_eq!(back, c, "char {:?} encoded as {}", c, tson);
    }
    assert_eq!(to_string(&' ').unwrap(), "' '");
}

#[test]
fn test_numbers() {
    assert_eq!(to_string(&-7i8).unwrap(), "-7");
    assert_eq!(to_string(&u64::MAX).unwrap(), "18446744073709551615");
    assert_eq!(to_string(&1.5f64).unwrap(), "1.5");
    assert_eq!(to_string(&0.1f32).unwrap(), "0.1");

    assert_eq!(from_str::<u64>(&to_string(&u64::MAX).unwrap()).unwrap(), u64::MAX);
    assert_eq!(from_str::<i64>(&to_string(&i64::MIN).unwrap()).unwrap(), i64::MIN);
    assert_eq!(from_str::<f64>("1e300").unwrap(), 1e300);
    assert_eq!(from_str::<f64>(&to_string(&f64::INFINITY).unwrap()).unwrap(), f64::INFINITY);
}

#[test]
fn test_null_forms() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Marker;

    assert_eq!(to_string(&()).unwrap(), "()");
    assert_eq!(to_string(&Marker).unwrap(), "()");
    assert_eq!(to_string(&None::<i32>).unwrap(), "()");
    assert_eq!(from_str::<Marker>("()").unwrap(), Marker);
    assert_eq!(from_str::<Option<String>>("()").unwrap(), None);
    assert_eq!(from_str::<Option<String>>("\"\"").unwrap(), Some(String::new()));
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Shape {
    Dot,
    Circle(f64),
    Rect { w: u32, h: u32 },
    Line(i32, i32),
}

#[test]
fn test_enums() {
    let shapes = vec![
        Shape::Dot,
        Shape::Circle(1.5),
        Shape::Rect { w: 2, h: 3 },
        Shape::Line(-1, 1),
    ];
    let tson = to_string(&shapes).unwrap();
    assert_eq!(
        tson,
        "[Dot,{Circle:1.5},{Rect:{w:2,h:3}},{Line:(Item1:-1,Item2:1)}]"
    );
    assert_eq!(from_str::<Vec<Shape>>(&tson).unwrap(), shapes);

    let pretty = to_string_pretty(&shapes).unwrap();
    assert_eq!(from_str::<Vec<Shape>>(&pretty).unwrap(), shapes);
}

#[test]
fn test_unit_variant_by_ordinal() {
    assert_eq!(from_str::<Shape>("0").unwrap(), Shape::Dot);
    assert!(from_str::<Shape>("9").is_err());
}

#[test]
fn test_internally_tagged_enum() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(tag = "type")]
    enum Event {
        Login { user: String },
        Logout { user: String, forced: bool },
    }

    let event = Event::Logout {
        user: "ann".to_string(),
        forced: false,
    };
    let tson = to_string(&event).unwrap();
    assert_eq!(tson, "{type:\"Logout\",user:\"ann\",forced:False}");
    assert_eq!(from_str::<Event>(&tson).unwrap(), event);
}

#[test]
fn test_maps_with_scalar_and_complex_keys() {
    let mut by_id = BTreeMap::new();
    by_id.insert(1, 2);
    by_id.insert(3, 4);
    assert_eq!(to_string(&by_id).unwrap(), "[1:2,3:4]");

    let mut by_pair: BTreeMap<(i32, i32), String> = BTreeMap::new();
    by_pair.insert((0, 1), "a".to_string());
    by_pair.insert((2, 3), "b".to_string());
    let tson = to_string(&by_pair).unwrap();
    assert_eq!(
        tson,
        "[@(Item1:0,Item2:1):\"a\",@(Item1:2,Item2:3):\"b\"]"
    );
    assert_eq!(from_str::<BTreeMap<(i32, i32), String>>(&tson).unwrap(), by_pair);

    let mut by_list: HashMap<Vec<String>, u8> = HashMap::new();
    by_list.insert(vec!["x,y".to_string(), "]".to_string()], 1);
    let tson = to_string_pretty(&by_list).unwrap();
    assert_eq!(from_str::<HashMap<Vec<String>, u8>>(&tson).unwrap(), by_list);
}

#[test]
fn test_tuples_up_to_nine() {
    let pair = (1, "x".to_string());
    assert_eq!(to_string(&pair).unwrap(), "(Item1:1,Item2:\"x\")");

    let nine = (1u8, 'b', "c".to_string(), 4i64, 5.5f64, true, (), vec![8], Some(9));
    let tson = to_string(&nine).unwrap();
    assert!(tson.contains(",Rest:(Item1:[8],Item2:9))"));
    let back: (u8, char, String, i64, f64, bool, (), Vec<i32>, Option<i32>) = from_str(&tson).unwrap();
    assert_eq!(back, nine);
}

#[test]
fn test_fixed_arrays_are_tuples() {
    let tson = to_string(&[1, 2, 3]).unwrap();
    assert_eq!(tson, "(Item1:1,Item2:2,Item3:3)");
    assert_eq!(from_str::<[i32; 3]>(&tson).unwrap(), [1, 2, 3]);
}

#[test]
fn test_multi_arrays() {
    let grid = MultiArray::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    assert_eq!(to_string(&grid).unwrap(), "[<2,2>1,2,3,4]");

    let cube = MultiArray::from_fn(vec![2, 2, 3], |i| (i[0] * 100 + i[1] * 10 + i[2]) as f64).unwrap();
    for tson in [to_string(&cube).unwrap(), to_string_pretty(&cube).unwrap()] {
        let back: MultiArray<f64> = from_str(&tson).unwrap();
        assert_eq!(back, cube);
        assert_eq!(back.get(&[1, 1, 2]), Some(&112.0));
    }

    let empty = MultiArray::<String>::new(vec![2, 0], vec![]).unwrap();
    let tson = to_string(&empty).unwrap();
    assert_eq!(tson, "[<2,0>]");
    assert_eq!(from_str::<MultiArray<String>>(&tson).unwrap(), empty);
}

#[test]
fn test_multi_array_count_must_match() {
    let result = from_str::<MultiArray<i32>>("[<2,3>1,2,3,4,5]");
    assert!(matches!(result, Err(Error::Format { .. })));
}

#[test]
fn test_multi_array_reads_as_flat_sequence() {
    let flat: Vec<i32> = from_str("[<2,2>1,2,3,4]").unwrap();
    assert_eq!(flat, vec![1, 2, 3, 4]);
}

#[test]
fn test_datetime_members() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Meeting {
        #[serde(with = "serde_tson::datetime")]
        start: DateTime<Utc>,
        #[serde(with = "serde_tson::datetime::option", default)]
        end: Option<DateTime<Utc>>,
    }

    let meeting = Meeting {
        start: Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap(),
        end: None,
    };
    let tson = to_string(&meeting).unwrap();
    assert_eq!(tson, "{start:\"09.03.2024 08:05:01.000000000\",end:()}");
    assert_eq!(from_str::<Meeting>(&tson).unwrap(), meeting);

    let value = value_from_str(&tson).unwrap();
    assert!(value.get("start").unwrap().is_datetime());
}

#[test]
fn test_unknown_members_are_ignored() {
    let user: User =
        from_str("{id:1,extra:{deep:[1,2,(Item1:3)]},name:\"a\",active:False,tags:[]}").unwrap();
    assert_eq!(user.id, 1);
    assert!(user.tags.is_empty());
}

#[test]
fn test_renamed_members() {
    let renames: Renames = [
        ("Identifier".to_string(), "id".to_string()),
        ("Labels".to_string(), "tags".to_string()),
    ]
    .into_iter()
    .collect();
    let user: User = from_str_with_renames(
        "{Identifier:7,name:\"b\",active:True,Labels:[\"x\"]}",
        &renames,
    )
    .unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.tags, vec!["x"]);
}

#[test]
fn test_non_identifier_names_are_quoted() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Stage {
        #[serde(rename = "in progress")]
        InProgress,
        Done,
        #[serde(rename = "on hold")]
        OnHold(u8),
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Person {
        #[serde(rename = "first name")]
        first: String,
        #[serde(rename = "a:b")]
        ab: i32,
        stages: Vec<Stage>,
    }

    let person = Person {
        first: "Ann".to_string(),
        ab: 1,
        stages: vec![Stage::InProgress, Stage::Done, Stage::OnHold(2)],
    };

    let tson = to_string(&person).unwrap();
    assert_eq!(
        tson,
        "{\"first name\":\"Ann\",\"a:b\":1,stages:[\"in progress\",Done,{\"on hold\":2}]}"
    );
    assert_eq!(from_str::<Person>(&tson).unwrap(), person);

    let pretty = to_string_pretty(&person).unwrap();
    assert!(pretty.contains("\t\"first name\": \"Ann\""));
    assert_eq!(from_str::<Person>(&pretty).unwrap(), person);
}

#[test]
fn test_settings_filter_members() {
    #[derive(Serialize)]
    struct Profile {
        name: String,
        nickname: Option<String>,
        visits: u32,
        bio: String,
    }

    let profile = Profile {
        name: "Ann".to_string(),
        nickname: None,
        visits: 0,
        bio: String::new(),
    };

    assert_eq!(
        to_string(&profile).unwrap(),
        "{name:\"Ann\",nickname:(),visits:0,bio:\"\"}"
    );
    let settings = TsonSettings::new().with_ignore_null_values(true);
    assert_eq!(
        to_string_with_settings(&profile, settings).unwrap(),
        "{name:\"Ann\",visits:0,bio:\"\"}"
    );
    let settings = TsonSettings::new().with_ignore_default_values(true);
    assert_eq!(to_string_with_settings(&profile, settings).unwrap(), "{name:\"Ann\"}");
}

#[test]
fn test_format_errors() {
    for bad in ["{a:1", "[1,2", "{a:1}}", "[1,,2]", "\"open", "{a}", "{a:1,}"] {
        match from_str::<TsonValue>(bad) {
            Err(Error::Format { .. }) => {}
            other => panic!("{:?} should be a format error, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_type_mismatch_reports_path() {
    let err = from_str::<Order>(
        "{order_id:1,customer:{id:1,name:\"a\",active:True,tags:[]},items:[{sku:\"s\",price:1.0,quantity:\"two\"}],total:1.0,note:()}",
    )
    .unwrap_err();
    match &err {
        Error::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "items[0].quantity");
            assert_eq!(expected, "u32");
        }
        other => panic!("Expected type mismatch, got {:?}", other),
    }
    assert!(err.to_string().contains("items[0].quantity"));
}

#[test]
fn test_to_value_kinds() {
    let value = to_value(&sample_order()).unwrap();
    let items = value.get("items").and_then(TsonValue::as_sequence).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[1].get("quantity"),
        Some(&TsonValue::Number(Number::Int(1)))
    );
    assert!(value.get("note").unwrap().is_null());
}

#[test]
fn test_value_roundtrip_through_text() {
    let text = "{a:[@[1]:'x',2:(Item1:True)],b:[<1,2>\"p\",\"q\"],c:Green,d:-2.5}";
    let value = value_from_str(text).unwrap();
    assert_eq!(value.to_string(), text);
    assert_eq!(value_from_str(&to_string_pretty(&value).unwrap()).unwrap(), value);
}
