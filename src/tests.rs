use pretty_assertions::assert_eq;

use crate::{is_match, ParseError, Pattern};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Asserts the text matched by `$re` in `$subject`, or that there is no
/// match when `$expected` is `None`.
macro_rules! assert_match {
    ($re:expr, $subject:expr, $expected:expr) => {{
        init();
        let pattern = Pattern::new($re).unwrap();
        let found = pattern.find($subject);
        assert_eq!(
            found.as_ref().map(|m| m.as_str()),
            $expected,
            "pattern {:?} against {:?}",
            $re,
            $subject
        );
    }};
}

#[test]
fn literals() {
    assert_match!("a", "a", Some("a"));
    assert_match!("foo", "e-food", Some("foo"));
    assert_match!("foo", "fofo", None);
    assert_match!("", "abc", Some(""));
    assert_match!("ñu", "el ñu", Some("ñu"));
}

#[test]
fn positions_agree_with_reference_engine() {
    // Expected values are what a conventional backtracking engine reports.
    let cases: &[(&str, &str, Option<usize>)] = &[
        ("a", "a", Some(0)),
        ("foo", "e-food", Some(2)),
        ("[eat]", "hfkdshgfjds", None),
        (r"\A\de", "5eat", Some(0)),
        ("^line$", "before\nline\nafter", Some(7)),
        ("a*bc*", "caaaaaaaab", Some(1)),
        ("a+bc+", "caaaaaaaabcc", Some(1)),
        ("[a-z]", "AfG", Some(1)),
        ("[A-Z].+", "my name is Samuel Giddins", Some(11)),
        ("[e-gE-G]", "cow is GREAT", Some(7)),
    ];
    init();
    for (re, subject, expected) in cases {
        let pattern = Pattern::new(re).unwrap();
        assert_eq!(pattern.position(subject), *expected, "{re:?} =~ {subject:?}");
    }
}

#[test]
fn greedy_repetition() {
    assert_match!("a*", "aaab", Some("aaa"));
    assert_match!("a+", "baaab", Some("aaa"));
    assert_match!("a?b", "aab", Some("ab"));
    assert_match!("a.*b", "axbxb", Some("axbxb"));
}

#[test]
fn lazy_repetition() {
    assert_match!("a*?b", "aaab", Some("aaab"));
    assert_match!("a*?", "aaa", Some(""));
    assert_match!("a+?", "aaa", Some("a"));
    assert_match!("a??", "a", Some(""));
    assert_match!("a.*?b", "axbxb", Some("axb"));
    assert_match!("a{2,4}?", "aaaaa", Some("aa"));
}

#[test]
fn bounded_repetition() {
    assert_match!("a{2,4}", "aaaaa", Some("aaaa"));
    assert_match!("a{2,4}", "a", None);
    assert_match!("a{3}", "aaaaa", Some("aaa"));
    assert_match!("a{2,}", "aaaaa", Some("aaaaa"));
    assert_match!("ba{,2}", "baaa", Some("baa"));
    assert_match!("xa{0}y", "xy", Some("xy"));
    assert_match!("(ab){2}", "abababx", Some("abab"));
}

#[test]
fn repetition_backtracks_into_count() {
    assert_match!("a{1,3}ab", "aaab", Some("aaab"));
    assert_match!("a*ab", "aaab", Some("aaab"));
    assert_match!(r"\d+5", "12345", Some("12345"));
}

#[test]
fn alternation() {
    assert_match!("cat|dog", "hotdog", Some("dog"));
    assert_match!("a|ab", "ab", Some("a"));
    assert_match!("ab|a", "ab", Some("ab"));
    assert_match!("x(a|b)+y", "xababy", Some("xababy"));
    assert_match!("a|", "b", Some(""));
}

#[test]
fn dot() {
    assert_match!("a.c", "abc", Some("abc"));
    assert_match!("a.c", "a\nc", None);
    assert_match!(".+", "ab\ncd", Some("ab"));
}

#[test]
fn character_classes() {
    assert_match!("[abc]+", "xxcabz", Some("cab"));
    assert_match!("[a-c0-9]+", "zz9a1d", Some("9a1"));
    assert_match!(r"[\d.]+", "v1.25", Some("1.25"));
    assert_match!("[-x]+", "a-x-b", Some("-x-"));
}

#[test]
fn negated_classes() {
    init();
    let pattern = Pattern::new("[^abc]").unwrap();
    let m = pattern.find("abcd").unwrap();
    assert_eq!(m.as_str(), "d");
    assert_eq!(m.start(), 3);

    assert_match!("[^abc]", "abc", None);
    assert_match!("[^a-z]+", "abc123def", Some("123"));
    assert_match!(r"[^\d]+", "12ab3", Some("ab"));
    assert_match!("[^a]", "a\n", Some("\n"));
    assert_match!("x[^y]", "x", None);
}

#[test]
fn anchors() {
    assert_match!("^line$", "before\nline\nafter", Some("line"));
    assert_match!("^line$", "before\nlines\nafter", None);
    assert_match!("^line$", "line", Some("line"));
    assert_match!("^b", "ab", None);
    assert_match!("a$", "ab", None);
    assert_match!("b$", "a\nb", Some("b"));

    // A trailing newline starts an empty last line.
    let pattern = Pattern::new("^$").unwrap();
    assert_eq!(pattern.position("b\n"), Some(2));
    assert_eq!(pattern.position("b"), None);
    assert_match!("\n^", "b\n", Some("\n"));
}

#[test]
fn metacharacters() {
    assert_match!(r"\d\d", "a1b23", Some("23"));
    assert_match!(r"\Aa", "aa", Some("a"));
    assert_match!(r"\Ab", "ab", None);
    assert_match!(r"a\z", "a\na", Some("a"));
    assert_match!(r"a\z", "a\n", None);
    assert_match!(r"a\Z", "a\n", Some("a"));
    assert_match!(r"a\Z", "a\nb", None);
    assert_match!(r"a\sb", "a\tb", Some("a\tb"));
    assert_match!(r"\S+", "  word  ", Some("word"));
}

#[test]
fn escaped_literals() {
    assert_match!(r"a\.b", "axb a.b", Some("a.b"));
    assert_match!(r"\(\)", "f()", Some("()"));
    assert_match!(r"\w", "w", Some("w"));
    assert_match!(r"a\\b", r"a\b", Some(r"a\b"));
}

#[test]
fn literal_braces() {
    assert_match!("a{", "a{", Some("a{"));
    assert_match!("a{x}", "a{x}", Some("a{x}"));
}

#[test]
fn captures_are_numbered_by_position() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new("(a)|(b)")?;

    let m = pattern.find("b").unwrap();
    assert_eq!(m.get(1), None);
    assert_eq!(m.get(2), Some("b"));
    assert_eq!(m.name("2"), Some("b"));
    assert_eq!(m.to_vec(), [Some("b"), None, Some("b")]);

    let m = pattern.find("a").unwrap();
    assert_eq!(m.to_vec(), [Some("a"), Some("a"), None]);

    let names: Vec<_> = pattern.captures().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["1", "2"]);
    Ok(())
}

#[test]
fn nested_captures() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new(r"((\d+)-(\d+))x")?;
    let m = pattern.find("id 12-345x").unwrap();
    assert_eq!(m.as_str(), "12-345x");
    assert_eq!(m.get(1), Some("12-345"));
    assert_eq!(m.get(2), Some("12"));
    assert_eq!(m.get(3), Some("345"));
    assert_eq!(m.pre_match(), "id ");
    assert_eq!(m.post_match(), "");
    Ok(())
}

#[test]
fn repeated_capture_keeps_last_iteration() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new("(a|b)*c")?;
    let m = pattern.find("abbac").unwrap();
    assert_eq!(m.as_str(), "abbac");
    assert_eq!(m.get(1), Some("a"));

    let m = pattern.find("c").unwrap();
    assert_eq!(m.get(1), None);
    Ok(())
}

#[test]
fn capture_from_failed_branch_is_discarded() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new("(a)b|ac")?;
    let m = pattern.find("ac").unwrap();
    assert_eq!(m.as_str(), "ac");
    assert_eq!(m.get(1), None);
    Ok(())
}

#[test]
fn find_at_and_position_at() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new("o")?;
    assert_eq!(pattern.position("foo boo"), Some(1));
    assert_eq!(pattern.position_at("foo boo", 3), Some(5));
    assert_eq!(pattern.find_at("foo boo", 6).map(|m| m.range()), Some(6..7));
    assert_eq!(pattern.position_at("foo boo", 7), None);
    assert_eq!(pattern.position_at("foo boo", 100), None);

    let anywhere = Pattern::new("x*")?;
    assert_eq!(anywhere.position_at("ab", 2), Some(2));

    // Offset 1 is inside `ñ`, so the search starts at 2.
    let pattern = Pattern::new(".")?;
    assert_eq!(pattern.position_at("ñb", 1), Some(2));
    Ok(())
}

#[test]
fn repeated_matches_are_identical() -> anyhow::Result<()> {
    init();
    let pattern = Pattern::new(r"(\d+)(x)?")?;
    let first = pattern.find("ab 123 cd");
    let second = pattern.find("ab 123 cd");
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(format!("{:?}", first.unwrap()), r#"#<Match "123" 1:"123" 2:nil>"#);
    Ok(())
}

#[test]
fn matches_outlive_pattern_and_subject() {
    init();
    let m = {
        let subject = String::from("hello world");
        let pattern = Pattern::new("w(or)").unwrap();
        pattern.find(&subject).unwrap()
    };
    assert_eq!(m.as_str(), "wor");
    assert_eq!(m.get(1), Some("or"));
    assert_eq!(m.subject(), "hello world");
    assert_eq!(m.pattern(), "w(or)");
}

#[test]
fn concurrent_matches_share_a_pattern() {
    init();
    let pattern = &Pattern::new("(a+)(b+)").unwrap();
    let subjects = ["xaabbb", "ab", "zzz", "aaab"];

    std::thread::scope(|s| {
        let handles: Vec<_> = subjects
            .iter()
            .map(|subject| s.spawn(move || pattern.find(subject).map(|m| m.as_str().to_owned())))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results,
            [
                Some("aabbb".to_owned()),
                Some("ab".to_owned()),
                None,
                Some("aaab".to_owned())
            ]
        );
    });
}

#[test]
fn rendered_pattern_matches_same_subjects() -> anyhow::Result<()> {
    init();
    let subjects = ["", "b", "aaab", "abcd", "before\nline\nafter", "x.y", "a{2}", "5eat"];
    for re in [
        "a*",
        "a*?b",
        "a{2,4}",
        "[^abc]",
        "^line$",
        r"\A\de",
        r"x\.y",
        r"a\{2\}",
        "(a|b)+c?",
        "a+{0,1}",
        "a{1}{0,1}",
        "a*??",
    ] {
        let pattern = Pattern::new(re)?;
        let reparsed = Pattern::new(&pattern.to_string())?;
        assert_eq!(pattern.ast(), reparsed.ast());
        assert_eq!(pattern, reparsed);
        for subject in subjects {
            assert_eq!(pattern.find(subject), reparsed.find(subject));
        }
    }
    Ok(())
}

#[test]
fn parse_errors() {
    assert_eq!(
        Pattern::new("abc\\").unwrap_err(),
        ParseError::UnterminatedEscape { offset: 3 }
    );
    assert!(matches!(
        Pattern::new("(a"),
        Err(ParseError::UnclosedGroup { offset: 0 })
    ));
    assert_eq!(
        Pattern::new("a)").unwrap_err().to_string(),
        "unmatched close parenthesis at offset 1"
    );
    assert!(matches!(
        Pattern::new("x(a{65536}){65536}"),
        Err(ParseError::TooLarge { .. })
    ));
    assert!(is_match("aaa", "a{4294967295}").is_err());
}

#[test]
fn free_function() -> anyhow::Result<()> {
    assert!(is_match("apple", "p+l")?);
    assert!(!is_match("apple", "^p")?);
    assert!(is_match("x", "\\").is_err());
    Ok(())
}
