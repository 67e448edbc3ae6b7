//! Public-surface tests: everything here goes through the crate's exported
//! API only.

use std::rc::Rc;

use rstest::rstest;

use jsonsprint::{
    Array, Object, Replacer, Shape, Space, StringifyOptions, Value, stringify,
};

fn text(value: &Value, options: &StringifyOptions) -> String {
    stringify(value, options)
        .expect("no structural error")
        .expect("defined result")
        .text
}

#[rstest]
#[case(0.0, "0")]
#[case(-0.0, "0")]
#[case(1.0, "1")]
#[case(-3.5, "-3.5")]
#[case(0.1, "0.1")]
#[case(1e-6, "0.000001")]
#[case(1e-7, "1e-7")]
#[case(1e21, "1e+21")]
#[case(1e20, "100000000000000000000")]
#[case(9_007_199_254_740_991.0, "9007199254740991")]
#[case(5e-324, "5e-324")]
fn number_rendering(#[case] value: f64, #[case] expected: &str) {
    assert_eq!(
        text(&Value::from(value), &StringifyOptions::default()),
        expected
    );
}

#[rstest]
#[case("plain", r#""plain""#)]
#[case("quote\"inside", r#""quote\"inside""#)]
#[case("back\\slash", r#""back\\slash""#)]
#[case("line\nfeed", r#""line\nfeed""#)]
#[case("\u{0}", "\"\\u0000\"")]
#[case("\u{7f}", "\"\u{7f}\"")]
fn string_rendering(#[case] value: &str, #[case] expected: &str) {
    assert_eq!(
        text(&Value::from(value), &StringifyOptions::default()),
        expected
    );
}

#[test]
fn nested_document() {
    let address = Object::new(
        Shape::of_keys(["city", "zip"]),
        vec![Value::from("Berlin"), Value::from("10115")],
    );
    let person = Object::new(
        Shape::of_keys(["name", "age", "address", "tags"]),
        vec![
            Value::from("Ada"),
            Value::from(36.0),
            Value::Object(address),
            Value::Array(Array::new(vec![Value::from("a"), Value::from("b")])),
        ],
    );
    let out = stringify(&Value::Object(person), &StringifyOptions::default())
        .unwrap()
        .unwrap();
    assert!(!out.used_fallback);
    insta::assert_snapshot!(
        out.text,
        @r#"{"name":"Ada","age":36,"address":{"city":"Berlin","zip":"10115"},"tags":["a","b"]}"#
    );
}

#[test]
fn pretty_document() {
    let obj = Object::new(
        Shape::of_keys(["a", "list"]),
        vec![
            Value::from(1.0),
            Value::Array(Array::new(vec![Value::from(2.0), Value::Null])),
        ],
    );
    let options = StringifyOptions {
        space: Some(Space::Count(2)),
        ..Default::default()
    };
    insta::assert_snapshot!(text(&Value::Object(obj), &options), @r#"
    {
      "a": 1,
      "list": [
        2,
        null
      ]
    }
    "#);
}

#[test]
fn replacer_and_hook_compose() {
    let obj = Object::new(Shape::of_keys(["secret"]), vec![Value::from("visible")]);
    obj.set_to_json(Rc::new(|value| value.clone()));
    let options = StringifyOptions {
        replacer: Some(Replacer::Function(Rc::new(|key, value| {
            if key == "secret" {
                Value::Undefined
            } else {
                value.clone()
            }
        }))),
        ..Default::default()
    };
    assert_eq!(text(&Value::Object(obj), &options), "{}");
}

#[test]
fn fallback_flag_is_observable() {
    let plain = Object::new(Shape::of_keys(["k"]), vec![Value::Null]);
    assert!(
        !stringify(&Value::Object(plain), &StringifyOptions::default())
            .unwrap()
            .unwrap()
            .used_fallback
    );
    let hooked = Object::new(Shape::builder().build(), vec![]);
    hooked.set_to_json(Rc::new(|_| Value::Null));
    assert!(
        stringify(&Value::Object(hooked), &StringifyOptions::default())
            .unwrap()
            .unwrap()
            .used_fallback
    );
}
