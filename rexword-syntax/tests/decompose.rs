//! Parsed patterns through simplification, decomposition and reversal.

use rexword::{Error, Pattern, SizedPattern, constrain_length, reverse};
use rexword_syntax::{parse, simplify};

fn decompose(pattern: &str, min: usize, max: usize) -> Result<SizedPattern, Error> {
    let tree = simplify(&parse(pattern).expect("pattern parses"));
    constrain_length(&tree, min, max)
}

fn rendered(sized: &SizedPattern) -> Vec<(usize, String)> {
    sized.iter().map(|(len, re)| (len, re.to_string())).collect()
}

#[test]
fn backref_pattern_has_lengths() {
    let sized = decompose(r"P+(..)\1.*", 0, 7).expect("decomposes");
    assert!(!sized.is_empty());
    assert_eq!(sized.lengths().collect::<Vec<_>>(), vec![5, 6]);
}

#[test]
fn backref_repeats_capture() {
    let sized = decompose(r"a(b)\1", 0, 5).expect("decomposes");
    assert_eq!(rendered(&sized), vec![(3, "abb".to_string())]);
}

#[test]
fn dot_star_every_length() {
    let sized = decompose(".*", 0, 4).expect("decomposes");
    assert_eq!(
        rendered(&sized),
        vec![
            (0, "(?:)".to_string()),
            (1, ".".to_string()),
            (2, "..".to_string()),
            (3, "...".to_string()),
        ]
    );
}

#[test]
fn counted_repetition_decomposes_after_simplify() {
    let sized = decompose("[AB]{2,3}C?", 0, 10).expect("decomposes");
    assert_eq!(sized.lengths().collect::<Vec<_>>(), vec![2, 3, 4]);

    let raw = parse("a{2}").expect("parses");
    assert_eq!(
        constrain_length(&raw, 0, 5),
        Err(Error::UnsimplifiedRepeat {
            operation: "constrain_length"
        })
    );
}

#[test]
fn crossword_clue_fits_row() {
    // A 2013 MIT Mystery Hunt clue constrained to its 7-cell row.
    let sized = decompose(r".*(IN|SE|HI)", 7, 8).expect("decomposes");
    assert_eq!(sized.lengths().collect::<Vec<_>>(), vec![7]);
    let fragment = sized.get(7).map(Pattern::to_string);
    assert_eq!(fragment.as_deref(), Some(".....(?:IN|SE|HI)"));
}

#[test]
fn reverse_of_parsed_pattern() {
    let reversed = reverse(&parse(".*PRR.*DDC.*").expect("parses")).expect("reverses");
    assert_eq!(reversed.to_string(), ".*CDD.*RRP.*");
}

#[test]
fn wide_counted_repeat_stays_shallow() {
    let worker = std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(|| {
            let tree = simplify(&parse("a{0,1000}").expect("parses"));
            let sized = constrain_length(&tree, 0, 5).expect("decomposes");
            let reversed = reverse(&tree).expect("reverses");
            (rendered(&sized), reversed.to_string(), tree.to_string())
        })
        .expect("thread starts");
    let (sized, reversed, forward) = worker.join().expect("no stack overflow");
    let expected: Vec<(usize, String)> = (0..5)
        .map(|len| match len {
            0 => (0, "(?:)".to_string()),
            _ => (len, "a".repeat(len)),
        })
        .collect();
    assert_eq!(sized, expected);
    assert_eq!(forward, "a?".repeat(1000));
    assert_eq!(reversed, forward);
}

#[test]
fn nested_counted_repeats_decompose_on_small_stack() {
    let worker = std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(|| decompose("(?:(?:a{0,1000}){0,1000}){0,1000}", 0, 5).map(|s| rendered(&s)))
        .expect("thread starts");
    let sized = worker.join().expect("no stack overflow").expect("decomposes");
    assert_eq!(sized.len(), 5);
    for (len, fragment) in &sized[1..] {
        assert_eq!(fragment, &"a".repeat(*len));
    }
}

#[test]
fn equal_fragments_are_merged() {
    let sized = decompose("a?a?a?", 0, 4).expect("decomposes");
    assert_eq!(
        rendered(&sized),
        vec![
            (0, "(?:)".to_string()),
            (1, "a".to_string()),
            (2, "aa".to_string()),
            (3, "aaa".to_string()),
        ]
    );
}

#[test]
fn closure_of_optional_capture_stays_small() {
    let sized = decompose("(a*)+", 0, 14).expect("decomposes");
    assert_eq!(sized.lengths().collect::<Vec<_>>(), (0..14).collect::<Vec<_>>());
    for (len, fragment) in rendered(&sized).into_iter().skip(1) {
        assert_eq!(fragment, "a".repeat(len));
    }
}
