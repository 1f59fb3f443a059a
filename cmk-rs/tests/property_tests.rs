use proptest::prelude::*;
use cmk::host::MemoryHost;
use cmk::script::expand::expand;
use cmk::script::stmt::parse_script;
use cmk::script::value::is_truthy;
use cmk::Interpreter;

fn interp() -> Interpreter {
    Interpreter::with_host(MemoryHost::new()).with_env(Vec::<(String, String)>::new())
}

proptest! {
    /// The reader is lenient: arbitrary input yields some statement list,
    /// never a panic.
    #[test]
    fn reader_does_not_panic(s in "\\PC*") {
        let _ = parse_script(&s);
    }

    /// Every statement needs its own `(`.
    #[test]
    fn statement_count_bounded_by_parens(s in "[a-z_( )\"#\\n]*") {
        let stmts = parse_script(&s);
        prop_assert!(stmts.len() <= s.matches('(').count());
    }
}

proptest! {
    /// Substituting a string with no `$` is the identity.
    #[test]
    fn substitution_identity_without_references(s in "[^$]*") {
        let i = interp();
        prop_assert_eq!(expand(&s, &i).unwrap(), s);
    }

    #[test]
    fn substitution_splices_value(pre in "[a-z_ ]{0,8}", value in "[a-zA-Z0-9;_ ]{0,16}", post in "[a-z_ ]{0,8}") {
        let mut i = interp();
        i.set_var("V", value.as_str());
        let out = expand(&format!("{pre}${{V}}{post}"), &i).unwrap();
        prop_assert_eq!(out, format!("{pre}{value}{post}"));
    }
}

proptest! {
    /// Boolean constants are recognised in any letter case.
    #[test]
    fn truthiness_ignores_case(
        idx in 0usize..9,
        flips in proptest::collection::vec(any::<bool>(), 8),
    ) {
        const WORDS: [&str; 9] = ["ON", "OFF", "TRUE", "FALSE", "YES", "NO", "IGNORE", "NOTFOUND", "X-NOTFOUND"];
        let word = WORDS[idx];
        let mixed: String = word
            .chars()
            .zip(flips.iter().cycle())
            .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
            .collect();
        prop_assert_eq!(is_truthy(&mixed), is_truthy(word));
    }

    /// Numbers are ordinary strings: zero is as true as any other.
    #[test]
    fn integers_are_always_true(n in -10_000i64..10_000) {
        prop_assert!(is_truthy(&n.to_string()));
    }

    /// Only the empty string, `false` and `off` are false.
    #[test]
    fn false_only_for_empty_false_off(s in "[a-zA-Z0-9_;-]{0,12}") {
        let expected = !(s.is_empty() || s.eq_ignore_ascii_case("false") || s.eq_ignore_ascii_case("off"));
        prop_assert_eq!(is_truthy(&s), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `foreach(i RANGE n)` runs `n + 1` times.
    #[test]
    fn range_iteration_count(n in 0u32..60) {
        let mut i = interp();
        i.run_str(&format!("set(C 0)\nforeach(k RANGE {n})\n  list(APPEND SEEN ${{k}})\nendforeach()\nlist(LENGTH SEEN C)")).unwrap();
        prop_assert_eq!(i.var("C"), Some((n + 1).to_string()));
    }
}
