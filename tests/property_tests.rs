//! Property-based tests for the universal engine guarantees: determinism,
//! memo/plain equivalence, position monotonicity, and full-input
//! idempotence, over randomized inputs against a fixed grammar battery.

mod common;

use common::*;
use proptest::prelude::*;
use weft::prelude::*;

/// Non-left-recursive grammars with varied backtracking shape. Children are
/// shared on purpose so memoization has something to hit.
fn battery() -> Vec<Grammar<char>> {
    let ab = choice(vec![text("ab"), text("a"), text("b")]);
    vec![
        Grammar::from_root(many(ab.clone())),
        Grammar::from_root(seq(vec![many(text("a")), many(text("b"))])),
        Grammar::from_root(seq(vec![
            repeat(ab.clone(), 0, Some(2), Greed::Lazy),
            optional(text("a")),
        ])),
        Grammar::from_root(choice(vec![
            seq(vec![ab.clone(), ab.clone()]),
            ab,
        ])),
    ]
}

proptest! {
    #[test]
    fn enumeration_is_deterministic(input in "[ab]{0,7}") {
        for grammar in battery() {
            let first = all_hits(&grammar, &input, false);
            let second = all_hits(&grammar, &input, false);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn memo_policy_is_equivalent_to_plain(input in "[ab]{0,7}") {
        for grammar in battery() {
            let plain = all_hits(&grammar, &input, false);
            let memo = all_hits_memo(&grammar, &input, false);
            prop_assert_eq!(plain, memo);
        }
    }

    #[test]
    fn end_positions_stay_inside_the_input(input in "[ab]{0,7}") {
        for grammar in battery() {
            for hit in all_hits(&grammar, &input, false) {
                prop_assert!(hit.end.offset() <= input.len());
            }
        }
    }

    #[test]
    fn full_input_parses_end_at_end_of_input(input in "[ab]{0,7}") {
        for grammar in battery() {
            for hit in all_hits(&grammar, &input, true) {
                prop_assert_eq!(hit.end.offset(), input.len());
            }
        }
    }

    #[test]
    fn single_parse_agrees_with_the_first_enumerated_parse(input in "[ab]{0,7}") {
        for grammar in battery() {
            let outcome = parse_str_partial(&grammar, &input);
            let first = all_hits(&grammar, &input, false).into_iter().next();
            match (outcome, first) {
                (Outcome::Matched { value, end }, Some(hit)) => {
                    prop_assert_eq!(value, hit.value);
                    prop_assert_eq!(end, hit.end);
                }
                (Outcome::NoMatch { .. }, None) => {}
                (outcome, first) => {
                    prop_assert!(false, "surfaces disagree: {:?} vs {:?}", outcome, first);
                }
            }
        }
    }
}
