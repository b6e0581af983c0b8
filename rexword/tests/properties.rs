use proptest::prelude::*;
use regex::Regex;
use rexword::{ClassRange, Pattern, SizedPattern, closure, constrain_length, reverse};

const MAX: usize = 6;

fn arb_pattern() -> impl Strategy<Value = Pattern> {
    let leaf = prop_oneof![
        "[ab]{1,3}".prop_map(|text| Pattern::literal(text.chars())),
        Just(Pattern::any_char_not_nl()),
        Just(Pattern::class([ClassRange::single('b')])),
        Just(Pattern::empty_match()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Pattern::concat),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Pattern::alternate),
            inner.clone().prop_map(Pattern::star),
            inner.clone().prop_map(Pattern::plus),
            inner.prop_map(Pattern::quest),
        ]
    })
}

fn anchored(pattern: &Pattern) -> Regex {
    Regex::new(&format!("^(?:{})$", pattern)).expect("rendered pattern compiles")
}

/// Every string over `{a, b}` shorter than `MAX`.
fn words() -> Vec<String> {
    let mut words = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 1..MAX {
        frontier = frontier
            .iter()
            .flat_map(|word| ['a', 'b'].map(|ch| format!("{}{}", word, ch)))
            .collect();
        words.extend(frontier.iter().cloned());
    }
    words
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decomposition_partitions_the_language(pattern in arb_pattern()) {
        let sized = constrain_length(&pattern, 0, MAX).expect("decomposes");
        prop_assert!(sized.min() <= sized.max());
        let whole = anchored(&pattern);
        let fragments: Vec<(usize, Regex)> =
            sized.iter().map(|(len, re)| (len, anchored(re))).collect();
        for word in words() {
            let by_length = fragments
                .iter()
                .any(|(len, re)| *len == word.len() && re.is_match(&word));
            prop_assert_eq!(whole.is_match(&word), by_length, "word {:?}", word);
            for (len, re) in &fragments {
                if *len != word.len() {
                    prop_assert!(!re.is_match(&word));
                }
            }
        }
    }

    #[test]
    fn fragments_decompose_to_their_own_length(pattern in arb_pattern()) {
        let sized = constrain_length(&pattern, 0, MAX).expect("decomposes");
        for (len, fragment) in sized.iter() {
            let own = constrain_length(fragment, 0, MAX).expect("decomposes");
            prop_assert_eq!(own.lengths().collect::<Vec<_>>(), vec![len]);
        }
    }

    #[test]
    fn trim_is_idempotent(pattern in arb_pattern(), a in 0..MAX + 2, span in 0..MAX + 2) {
        let sized = constrain_length(&pattern, 0, MAX).expect("decomposes");
        let b = a + span;
        let once = sized.trim(a, b).expect("valid bounds");
        let twice = once.trim(a, b).expect("valid bounds");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn plus_starts_at_shortest_nonzero_length(pattern in arb_pattern()) {
        let sub = constrain_length(&pattern, 0, MAX).expect("decomposes");
        let plus = constrain_length(&Pattern::plus(pattern), 0, MAX).expect("decomposes");
        let first_nonzero = |s: &SizedPattern| s.lengths().find(|&len| len > 0);
        prop_assert_eq!(first_nonzero(&plus), first_nonzero(&sub));
        prop_assert_eq!(
            plus.lengths().collect::<Vec<_>>(),
            closure(&sub, MAX).lengths().collect::<Vec<_>>()
        );
    }

    #[test]
    fn reverse_is_an_involution(pattern in arb_pattern()) {
        let once = reverse(&pattern).expect("reverses");
        let twice = reverse(&once).expect("reverses");
        let (original, mirrored, restored) =
            (anchored(&pattern), anchored(&once), anchored(&twice));
        for word in words() {
            let backwards: String = word.chars().rev().collect();
            prop_assert_eq!(original.is_match(&word), mirrored.is_match(&backwards));
            prop_assert_eq!(original.is_match(&word), restored.is_match(&word));
        }
    }
}
