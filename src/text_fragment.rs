//! Scroll-to-text fragment directives (`#:~:text=start[,end]`).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Marker a hash carries when it holds a text directive.
pub const TEXT_DIRECTIVE_MARKER: &str = ":~:text=";

const FRAGMENT_DIRECTIVE_DELIMITER: &str = ":~:";
const TEXT_DIRECTIVE_SEPARATOR: &str = "&text=";

// encodeURIComponent's set plus `-`, which is prefix/suffix syntax inside a
// text directive.
const TEXT_DIRECTIVE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Platform view of the directive the browser matched, with the URL copy of
/// it possibly already stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentDirective {
    pub text: Vec<TextDirectiveRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDirectiveRange {
    pub text_start: Option<String>,
    pub text_end: Option<String>,
}

impl TextDirectiveRange {
    pub fn new(text_start: impl Into<String>) -> Self {
        Self {
            text_start: Some(text_start.into()),
            text_end: None,
        }
    }

    pub fn with_end(mut self, text_end: impl Into<String>) -> Self {
        self.text_end = Some(text_end.into());
        self
    }
}

/// Returns the fragment directive carried by `hash` as `#:~:...`, dropping
/// any plain anchor in front of it.
pub fn extract_text_directive(hash: &str) -> Option<String> {
    if !hash.contains(TEXT_DIRECTIVE_MARKER) {
        return None;
    }
    let start = hash.find(FRAGMENT_DIRECTIVE_DELIMITER)?;
    Some(format!("#{}", &hash[start..]))
}

pub(crate) fn has_fragment_directive(hash: &str) -> bool {
    hash.contains(FRAGMENT_DIRECTIVE_DELIMITER)
}

/// Re-encodes matched ranges into `#:~:text=` form. Several ranges are joined
/// with `&text=`; a range with neither bound is skipped.
pub fn encode_fragment_directive(directive: &FragmentDirective) -> Option<String> {
    let ranges = directive
        .text
        .iter()
        .filter_map(encode_range)
        .collect::<Vec<_>>();
    if ranges.is_empty() {
        return None;
    }
    Some(format!(
        "#{TEXT_DIRECTIVE_MARKER}{}",
        ranges.join(TEXT_DIRECTIVE_SEPARATOR)
    ))
}

fn encode_range(range: &TextDirectiveRange) -> Option<String> {
    let start = range.text_start.as_deref().and_then(encode_text);
    let end = range.text_end.as_deref().and_then(encode_text);
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start},{end}")),
        (Some(bound), None) | (None, Some(bound)) => Some(bound),
        (None, None) => None,
    }
}

fn encode_text(text: &str) -> Option<String> {
    let segments = text
        .split_whitespace()
        .map(|segment| utf8_percent_encode(segment, TEXT_DIRECTIVE_ENCODE_SET).to_string())
        .collect::<Vec<_>>();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("%20"))
    }
}
