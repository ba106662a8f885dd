use super::*;

use crate::text_fragment::has_fragment_directive;

#[test]
fn extract_keeps_only_the_directive_portion() {
    assert_eq!(
        extract_text_directive("#:~:text=highlight").as_deref(),
        Some("#:~:text=highlight")
    );
    assert_eq!(
        extract_text_directive("#section:~:text=foo,bar").as_deref(),
        Some("#:~:text=foo,bar")
    );
    assert_eq!(extract_text_directive("#section"), None);
    assert_eq!(extract_text_directive(""), None);
}

#[test]
fn extract_ignores_non_text_directives() {
    assert_eq!(extract_text_directive("#:~:note=abc"), None);
    assert!(has_fragment_directive("#:~:note=abc"));
    assert!(!has_fragment_directive("#plain"));
}

#[test]
fn encode_joins_whitespace_segments_with_encoded_spaces() {
    let directive = FragmentDirective {
        text: vec![TextDirectiveRange::new("hello  brave\tworld")],
    };
    assert_eq!(
        encode_fragment_directive(&directive).as_deref(),
        Some("#:~:text=hello%20brave%20world")
    );
}

#[test]
fn encode_escapes_directive_syntax() {
    let directive = FragmentDirective {
        text: vec![TextDirectiveRange::new("a-b,c&d").with_end("caf\u{e9}!")],
    };
    assert_eq!(
        encode_fragment_directive(&directive).as_deref(),
        Some("#:~:text=a%2Db%2Cc%26d,caf%C3%A9!")
    );
}

#[test]
fn encode_uses_a_single_bound_alone() {
    let end_only = FragmentDirective {
        text: vec![TextDirectiveRange {
            text_start: None,
            text_end: Some("tail".into()),
        }],
    };
    assert_eq!(
        encode_fragment_directive(&end_only).as_deref(),
        Some("#:~:text=tail")
    );
}

#[test]
fn encode_joins_ranges_and_skips_empty_ones() {
    let directive = FragmentDirective {
        text: vec![
            TextDirectiveRange::new("first"),
            TextDirectiveRange::default(),
            TextDirectiveRange::new("second").with_end("end"),
        ],
    };
    assert_eq!(
        encode_fragment_directive(&directive).as_deref(),
        Some("#:~:text=first&text=second,end")
    );
    assert_eq!(encode_fragment_directive(&FragmentDirective::default()), None);
    let blank = FragmentDirective {
        text: vec![TextDirectiveRange::new("   ")],
    };
    assert_eq!(encode_fragment_directive(&blank), None);
}
