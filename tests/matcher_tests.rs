//! Ordering contracts of the matcher catalogue: which parses come out, in
//! which order, for each variant and for their compositions.

mod common;

use common::*;
use weft::prelude::*;

// ---
// Literal
// ---

#[test]
fn literal_consumes_exactly_its_tokens() {
    let grammar = Grammar::from_root(text("ab"));
    assert_eq!(all_ends(&grammar, "ab", true), [2]);
    assert_eq!(all_ends(&grammar, "abx", false), [2]);
    assert_eq!(all_ends(&grammar, "ax", false), Vec::<usize>::new());
}

#[test]
fn empty_literal_matches_without_consuming() {
    let grammar = Grammar::from_root(lit(Vec::<char>::new()));
    let hits = all_hits(&grammar, "", true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].end.offset(), 0);
}

// ---
// Sequence
// ---

#[test]
fn sequence_is_left_to_right() {
    let grammar = Grammar::from_root(seq(vec![text("a"), text("b"), text("c")]));
    let hits = all_hits(&grammar, "abc", true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value, token_list(&["a", "b", "c"]));
}

#[test]
fn sequence_ladder_backtracks_into_earlier_children() {
    // The first alternative of the leading choice consumes too much; the
    // ladder must step back into it before the trailing literal can match.
    let grammar = Grammar::from_root(seq(vec![
        choice(vec![text("ab"), text("a")]),
        text("b"),
    ]));
    let hits = all_hits(&grammar, "ab", true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value, token_list(&["a", "b"]));
}

#[test]
fn two_greedy_repeats_split_the_input_in_ladder_order() {
    let grammar = Grammar::from_root(seq(vec![
        repeat(text("a"), 0, None, Greed::Greedy),
        repeat(text("a"), 0, None, Greed::Greedy),
    ]));
    // Splits enumerate with the left repeat giving back first: (2,0) (1,1)
    // (1,0) (0,2) (0,1) (0,0).
    assert_eq!(all_ends(&grammar, "aa", false), [2, 2, 1, 2, 1, 0]);
}

// ---
// Choice
// ---

#[test]
fn choice_enumerates_in_declared_order() {
    let grammar = Grammar::from_root(choice(vec![text("a"), text("ab")]));
    assert_eq!(all_ends(&grammar, "ab", false), [1, 2]);

    let flipped = Grammar::from_root(choice(vec![text("ab"), text("a")]));
    assert_eq!(all_ends(&flipped, "ab", false), [2, 1]);
}

#[test]
fn empty_choice_fails() {
    let grammar = Grammar::from_root(choice(Vec::<MatcherRef<char>>::new()));
    assert!(matches!(
        parse_str(&grammar, ""),
        Outcome::NoMatch { .. }
    ));
}

#[test]
fn choice_alternatives_fully_enumerate_before_moving_on() {
    // First alternative is itself ambiguous; both of its parses come out
    // before the second alternative's.
    let inner = choice(vec![text("aa"), text("a")]);
    let grammar = Grammar::from_root(choice(vec![inner, text("aaa")]));
    assert_eq!(all_ends(&grammar, "aaa", false), [2, 1, 3]);
}

// ---
// Repeat
// ---

#[test]
fn greedy_repeat_respects_min() {
    let grammar = Grammar::from_root(repeat(text("a"), 2, None, Greed::Greedy));
    assert_eq!(all_ends(&grammar, "aaa", false), [3, 2]);
    assert_eq!(all_ends(&grammar, "a", false), Vec::<usize>::new());
}

#[test]
fn lazy_repeat_enumerates_shortest_first() {
    let grammar = Grammar::from_root(repeat(text("a"), 0, Some(3), Greed::Lazy));
    assert_eq!(all_ends(&grammar, "aaaa", false), [0, 1, 2, 3]);
}

#[test]
fn lazy_repeat_starts_at_min() {
    let grammar = Grammar::from_root(repeat(text("a"), 2, Some(4), Greed::Lazy));
    assert_eq!(all_ends(&grammar, "aaaaa", false), [2, 3, 4]);
}

#[test]
fn repeat_capped_at_zero_matches_empty() {
    for greed in [Greed::Greedy, Greed::Lazy] {
        let grammar = Grammar::from_root(repeat(text("a"), 0, Some(0), greed));
        let hits = all_hits(&grammar, "aaa", false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].end.offset(), 0);
        assert_eq!(hits[0].value, token_list(&[]));
    }
}

#[test]
fn repeat_backtracks_into_ambiguous_children() {
    // The child has two parses at each position; the repeat must revisit
    // the last child's alternatives before giving the repetition up.
    let child = choice(vec![text("aa"), text("a")]);
    let grammar = Grammar::from_root(repeat(child, 0, None, Greed::Greedy));
    // On "aa": [aa], [a,a], [a], [] - child alternatives before shrinking.
    assert_eq!(all_ends(&grammar, "aa", false), [2, 2, 1, 0]);
}

#[test]
fn optional_is_a_zero_or_one_greedy_repeat() {
    let grammar = Grammar::from_root(optional(text("a")));
    assert_eq!(all_ends(&grammar, "a", false), [1, 0]);
    assert_eq!(all_ends(&grammar, "", false), [0]);
}

#[test]
fn many_and_some_shorthands() {
    let many_a = Grammar::from_root(many(text("a")));
    assert_eq!(all_ends(&many_a, "aa", false), [2, 1, 0]);

    let some_a = Grammar::from_root(some(text("a")));
    assert_eq!(all_ends(&some_a, "aa", false), [2, 1]);
    assert_eq!(all_ends(&some_a, "", false), Vec::<usize>::new());
}

// ---
// Transform
// ---

#[test]
fn transform_applies_on_every_resumption() {
    // Count the repetitions of an ambiguous repeat; each enumerated parse
    // goes through the transform again.
    let grammar = Grammar::from_root(transform(many(text("a")), |value| {
        let n = value.as_list().map(|items| items.len()).unwrap_or(0);
        Ok(ParseValue::Number(n as f64))
    }));
    let hits = all_hits(&grammar, "aaa", false);
    let counts: Vec<f64> = hits
        .iter()
        .map(|h| h.value.as_number().unwrap())
        .collect();
    assert_eq!(counts, [3.0, 2.0, 1.0, 0.0]);
}

#[test]
fn transform_forwards_child_failure() {
    // A transform does not catch its child's failure; it only rewrites
    // successes.
    let grammar = Grammar::from_root(transform(text("a"), |v| Ok(v)));
    assert!(matches!(parse_str(&grammar, "b"), Outcome::NoMatch { .. }));
}

// ---
// Reference
// ---

#[test]
fn reference_is_transparent_for_outcomes() {
    let direct = Grammar::from_root(seq(vec![text("a"), text("b")]));
    let through_ref = GrammarBuilder::new()
        .define("b", text("b"))
        .build(seq(vec![text("a"), reference("b")]));

    let direct_hits = all_hits(&direct, "ab", true);
    let ref_hits = all_hits(&through_ref, "ab", true);
    assert_eq!(direct_hits, ref_hits);
}

#[test]
fn recursive_reference_parses_nested_structure() {
    // s = "(" s ")" | "x"
    let grammar = GrammarBuilder::new()
        .define(
            "s",
            choice(vec![
                seq(vec![text("("), reference("s"), text(")")]),
                text("x"),
            ]),
        )
        .build(reference("s"));

    assert!(parse_str(&grammar, "((x))").is_match());
    assert!(parse_str(&grammar, "x").is_match());
    assert!(matches!(
        parse_str(&grammar, "((x)"),
        Outcome::NoMatch { .. }
    ));
}

#[test]
fn deep_recursion_does_not_overflow_the_host_stack() {
    let grammar = GrammarBuilder::new()
        .define(
            "s",
            choice(vec![
                seq(vec![text("("), reference("s"), text(")")]),
                text("x"),
            ]),
        )
        .build(reference("s"));

    let depth = 2_000;
    let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    assert!(parse_str(&grammar, &input).is_match());
}

// ---
// Composition
// ---

#[test]
fn nested_grammars_keep_their_result_shape() {
    // word = some "ab" ; pair = word word
    let word = some(choice(vec![text("a"), text("b")]));
    let grammar = Grammar::from_root(seq(vec![word.clone(), text("-"), word]));
    let outcome = parse_str(&grammar, "ab-ba");
    let Outcome::Matched { value, .. } = outcome else {
        panic!("expected match");
    };
    let items = value.as_list().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], token_list(&["a", "b"]));
    assert_eq!(items[1], tokens("-"));
    assert_eq!(items[2], token_list(&["b", "a"]));
}
