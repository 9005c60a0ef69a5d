//! Property tests over generated programs.

use cfgtoml_core::{
    evaluate, lex, parse, ConvertError, ConvertOptions, Node, Value, BARE_RESULT_KEY,
};
use proptest::prelude::*;

fn eval(src: &str) -> Result<cfgtoml_core::Table, ConvertError> {
    evaluate(src, &ConvertOptions::deterministic())
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

proptest! {
    #[test]
    fn integer_literals_parse_to_their_value(n in 1i64..=i64::MAX) {
        let tokens = lex(&n.to_string()).unwrap();
        let nodes = parse(&tokens).unwrap();
        prop_assert_eq!(nodes, vec![Node::Integer(n)]);
    }

    #[test]
    fn array_order_is_preserved(items in proptest::collection::vec(1i64..100_000, 0..20)) {
        let body: Vec<String> = items.iter().map(i64::to_string).collect();
        let src = format!("<< {} >>", body.join(", "));
        let out = eval(&src).unwrap();
        let expected = Value::Array(items.into_iter().map(Value::Integer).collect());
        prop_assert_eq!(&out[BARE_RESULT_KEY], &expected);
    }

    #[test]
    fn table_key_order_is_preserved(
        keys in proptest::collection::vec(key_strategy(), 1..12)
            .prop_filter("unique keys", |ks| {
                let mut sorted = ks.clone();
                sorted.sort();
                sorted.dedup();
                sorted.len() == ks.len()
            })
    ) {
        let entries: Vec<String> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{} -> {}", k, i + 1))
            .collect();
        let src = format!("{{ section -> {{ {} }} }}", entries.join(". "));
        let out = eval(&src).unwrap();
        let section = out["section"].as_table().unwrap();
        let got: Vec<&String> = section.keys().collect();
        let want: Vec<&String> = keys.iter().collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn cycles_of_any_length_are_detected(len in 1usize..10) {
        let mut src = String::new();
        for i in 0..len {
            src.push_str(&format!("c{} := ?(c{});\n", i, (i + 1) % len));
        }
        src.push_str("{ x -> ?(c0) }");
        let err = eval(&src).unwrap_err();
        let is_cycle = matches!(err, ConvertError::CircularDependency { .. });
        prop_assert!(is_cycle);
    }

    #[test]
    fn chains_resolve_in_any_declaration_order(len in 1usize..10, reverse in any::<bool>()) {
        let mut decls: Vec<String> = (0..len)
            .map(|i| {
                if i + 1 == len {
                    format!("c{} := 42;", i)
                } else {
                    format!("c{} := ?(c{});", i, i + 1)
                }
            })
            .collect();
        if reverse {
            decls.reverse();
        }
        let src = format!("{}\n{{ x -> ?(c0) }}", decls.join("\n"));
        let out = eval(&src).unwrap();
        prop_assert_eq!(&out["x"], &Value::Integer(42));
    }

    #[test]
    fn arbitrary_input_never_panics(src in "\\PC{0,64}") {
        let _ = eval(&src);
    }
}
