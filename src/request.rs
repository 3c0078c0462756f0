use std::fmt::Write as _;

/// Chain delimiter between loader/resource segments of a request.
const DELIMITER: char = '!';

/// Convert a (possibly `!`-chained) module request into a double-quoted
/// string literal suitable for embedding in generated source.
///
/// Each chain segment is resolved independently: its query suffix (from
/// the first `?`) is carried byte-for-byte, and its path portion is
/// rewritten relative to `context` when both sit on the same root
/// (POSIX `/`, same drive letter, or same UNC host and share). Relative
/// results always start with `./` or `../` so they read as file-relative
/// specifiers; bare names are left alone because they denote a
/// search-path lookup. Absolute paths with no usable context come back
/// unchanged, in their original separator style.
///
/// This function is total: every input shape has a defined fallback.
pub fn stringify_request(context: Option<&str>, request: &str) -> String {
    let resolved: Vec<String> = split_chain(request)
        .into_iter()
        .map(|segment| resolve_segment(context, segment))
        .collect();
    quote_literal(&resolved.join("!"))
}

/// Split at every unescaped delimiter, keeping empty segments (a request
/// may begin or end with the delimiter). A delimiter counts as escaped
/// only under an odd run of preceding backslashes, so `\\!` (an escaped
/// backslash before the delimiter) still splits.
fn split_chain(request: &str) -> Vec<&str> {
    let bytes = request.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut backslashes = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == DELIMITER as u8 && backslashes % 2 == 0 {
            segments.push(&request[start..i]);
            start = i + 1;
        }
        backslashes = if b == b'\\' { backslashes + 1 } else { 0 };
    }
    segments.push(&request[start..]);
    segments
}

fn resolve_segment(context: Option<&str>, segment: &str) -> String {
    let (path, query) = match segment.find('?') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };
    let mut resolved = resolve_path(context, path);
    resolved.push_str(query);
    resolved
}

/// Root family of a path, decided before any relative-path computation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathRoot<'a> {
    Posix,
    Drive(char),
    Unc { host: &'a str, share: &'a str },
    Relative,
}

fn classify(path: &str) -> PathRoot<'_> {
    if let Some(rest) = path.strip_prefix("\\\\") {
        let mut parts = rest.splitn(3, ['\\', '/']);
        let host = parts.next().unwrap_or("");
        let share = parts.next().unwrap_or("");
        return PathRoot::Unc { host, share };
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
    {
        return PathRoot::Drive(bytes[0].to_ascii_uppercase() as char);
    }
    if path.starts_with('/') {
        return PathRoot::Posix;
    }
    PathRoot::Relative
}

fn same_root(a: &PathRoot<'_>, b: &PathRoot<'_>) -> bool {
    match (a, b) {
        (PathRoot::Posix, PathRoot::Posix) => true,
        (PathRoot::Drive(x), PathRoot::Drive(y)) => x == y,
        (
            PathRoot::Unc { host: h1, share: s1 },
            PathRoot::Unc { host: h2, share: s2 },
        ) => h1.eq_ignore_ascii_case(h2) && s1.eq_ignore_ascii_case(s2),
        _ => false,
    }
}

fn resolve_path(context: Option<&str>, path: &str) -> String {
    let root = classify(path);
    if root == PathRoot::Relative {
        // Relative and bare requests only get separator normalization.
        return normalize_separators(path);
    }
    let Some(ctx) = context else {
        return path.to_string();
    };
    let ctx_root = classify(ctx);
    if !same_root(&root, &ctx_root) {
        return path.to_string();
    }
    relative_from(&components(ctx, &ctx_root), &components(path, &root))
}

/// Backslash directory separators become `/`; a backslash escaping the
/// chain delimiter is not a separator and stays put.
fn normalize_separators(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    for (i, c) in path.char_indices() {
        if c == '\\' && bytes.get(i + 1) != Some(&(DELIMITER as u8)) {
            out.push('/');
        } else {
            out.push(c);
        }
    }
    out
}

/// Path components after the root prefix; empty and `.` components are
/// dropped so doubled separators don't produce ghost segments.
fn components<'a>(path: &'a str, root: &PathRoot<'_>) -> Vec<&'a str> {
    let stripped = match root {
        PathRoot::Posix => &path[1..],
        PathRoot::Drive(_) => &path[3..],
        PathRoot::Unc { host, share } => {
            let prefix = 2 + host.len() + usize::from(!share.is_empty()) + share.len();
            path.get(prefix..).unwrap_or("")
        }
        PathRoot::Relative => path,
    };
    stripped
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Shortest `..`-style relative path between two component lists on the
/// same root, joined with `/` and marked with a `./` prefix unless it
/// already climbs out with `../`.
fn relative_from(context: &[&str], path: &[&str]) -> String {
    let common = context
        .iter()
        .zip(path)
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts = vec![".."; context.len() - common];
    parts.extend_from_slice(&path[common..]);
    if parts.is_empty() {
        return "./".to_string();
    }
    let joined = parts.join("/");
    if joined.starts_with("../") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Wrap in double quotes, escaping quotes, backslashes, and control
/// characters (JSON string grammar).
fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ========== relative and bare requests ==========

    #[test]
    fn test_relative_request_unchanged() {
        assert_eq!(stringify_request(None, "./a.js"), "\"./a.js\"");
    }

    #[test]
    fn test_backslash_separators_normalized() {
        assert_eq!(stringify_request(None, ".\\a.js"), "\"./a.js\"");
        assert_eq!(stringify_request(None, ".\\x\\y\\a.js"), "\"./x/y/a.js\"");
    }

    #[test]
    fn test_bare_name_keeps_no_dot_slash() {
        // A bare name is a search-path lookup, not a file-relative request.
        assert_eq!(
            stringify_request(Some("/ctx"), "lodash/fp.js"),
            "\"lodash/fp.js\""
        );
    }

    #[test]
    fn test_parent_relative_request_unchanged() {
        assert_eq!(stringify_request(Some("/ctx"), "../a.js"), "\"../a.js\"");
    }

    // ========== POSIX-absolute requests ==========

    #[test]
    fn test_absolute_inside_context() {
        assert_eq!(
            stringify_request(Some("/path/to"), "/path/to/module/a.js"),
            "\"./module/a.js\""
        );
    }

    #[test]
    fn test_absolute_in_sibling_directory() {
        assert_eq!(
            stringify_request(Some("/path/to/thing"), "/path/to/module/a.js"),
            "\"../module/a.js\""
        );
    }

    #[test]
    fn test_absolute_without_context_unchanged() {
        assert_eq!(stringify_request(None, "/abs/a.js"), "\"/abs/a.js\"");
    }

    #[test]
    fn test_path_equal_to_context() {
        assert_eq!(stringify_request(Some("/a/b"), "/a/b"), "\"./\"");
    }

    #[test]
    fn test_doubled_separators_collapse() {
        assert_eq!(
            stringify_request(Some("/path"), "/path//to///a.js"),
            "\"./to/a.js\""
        );
    }

    // ========== drive-letter requests ==========

    #[test]
    fn test_same_drive_relativized() {
        assert_eq!(
            stringify_request(Some("C:\\path\\to"), "C:\\path\\to\\module\\a.js"),
            "\"./module/a.js\""
        );
    }

    #[test]
    fn test_drive_letter_case_insensitive() {
        assert_eq!(
            stringify_request(Some("c:\\path"), "C:\\path\\a.js"),
            "\"./a.js\""
        );
    }

    #[test]
    fn test_different_drives_left_absolute() {
        assert_eq!(
            stringify_request(Some("D:\\path"), "C:\\path\\a.js"),
            "\"C:\\\\path\\\\a.js\""
        );
    }

    #[test]
    fn test_windows_absolute_without_context_keeps_separators() {
        assert_eq!(
            stringify_request(None, "C:\\path\\a.js"),
            "\"C:\\\\path\\\\a.js\""
        );
    }

    #[test]
    fn test_drive_only_treated_as_bare() {
        assert_eq!(stringify_request(Some("C:\\x"), "C:"), "\"C:\"");
    }

    // ========== UNC requests ==========

    #[test]
    fn test_unc_same_share_relativized() {
        assert_eq!(
            stringify_request(
                Some("\\\\server\\share\\dir"),
                "\\\\server\\share\\dir\\file.js"
            ),
            "\"./file.js\""
        );
    }

    #[test]
    fn test_unc_host_case_insensitive() {
        assert_eq!(
            stringify_request(Some("\\\\SERVER\\share"), "\\\\server\\share\\a.js"),
            "\"./a.js\""
        );
    }

    #[test]
    fn test_unc_different_host_left_absolute() {
        assert_eq!(
            stringify_request(Some("\\\\other\\share"), "\\\\server\\share\\a.js"),
            "\"\\\\\\\\server\\\\share\\\\a.js\""
        );
    }

    #[test]
    fn test_unc_context_never_matches_posix_path() {
        assert_eq!(
            stringify_request(Some("\\\\server\\share"), "/abs/a.js"),
            "\"/abs/a.js\""
        );
    }

    // ========== query suffixes ==========

    #[test]
    fn test_query_carried_verbatim() {
        assert_eq!(
            stringify_request(Some("/path/to"), "/path/to/a.js?foo=bar&path=/abs"),
            "\"./a.js?foo=bar&path=/abs\""
        );
    }

    #[test]
    fn test_query_backslashes_not_normalized() {
        assert_eq!(
            stringify_request(None, "./a.js?q=x\\y"),
            "\"./a.js?q=x\\\\y\""
        );
    }

    #[test]
    fn test_only_first_question_mark_splits() {
        assert_eq!(
            stringify_request(None, "./a.js?a=1?b=2"),
            "\"./a.js?a=1?b=2\""
        );
    }

    // ========== chains ==========

    #[test]
    fn test_chain_preserved_in_order() {
        assert_eq!(
            stringify_request(None, "a/b.js!c/d.js!e/f.js"),
            "\"a/b.js!c/d.js!e/f.js\""
        );
    }

    #[test]
    fn test_chain_segments_resolved_independently() {
        assert_eq!(
            stringify_request(Some("/ctx"), "/ctx/loader.js?opt=1!/ctx/lib/mod.js"),
            "\"./loader.js?opt=1!./lib/mod.js\""
        );
    }

    #[test]
    fn test_leading_delimiter_keeps_empty_segment() {
        assert_eq!(stringify_request(Some("/ctx"), "!/ctx/a.js"), "\"!./a.js\"");
    }

    #[test]
    fn test_trailing_delimiter_keeps_empty_segment() {
        assert_eq!(stringify_request(None, "a.js!"), "\"a.js!\"");
    }

    #[test]
    fn test_escaped_delimiter_does_not_split() {
        assert_eq!(
            stringify_request(None, "a\\!b.js"),
            "\"a\\\\!b.js\""
        );
    }

    #[test]
    fn test_escaped_backslash_before_delimiter_still_splits() {
        // `a\\!b.js`: the backslash run before `!` has even length, so the
        // delimiter is real; the leftover backslashes are plain separators.
        assert_eq!(stringify_request(None, "a\\\\!b.js"), "\"a//!b.js\"");
        assert_eq!(
            stringify_request(None, "a\\\\\\!b.js"),
            "\"a//\\\\!b.js\""
        );
    }

    // ========== literal escaping ==========

    #[test]
    fn test_embedded_quote_escaped() {
        assert_eq!(stringify_request(None, "a\"b.js"), "\"a\\\"b.js\"");
    }

    #[test]
    fn test_newline_escaped() {
        assert_eq!(stringify_request(None, "a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_control_character_escaped() {
        assert_eq!(stringify_request(None, "a\u{1}b"), "\"a\\u0001b\"");
    }

    // ========== internals ==========

    #[test]
    fn test_classify_roots() {
        assert_eq!(classify("/a/b"), PathRoot::Posix);
        assert_eq!(classify("C:\\a"), PathRoot::Drive('C'));
        assert_eq!(classify("c:/a"), PathRoot::Drive('C'));
        assert_eq!(
            classify("\\\\srv\\share\\a"),
            PathRoot::Unc {
                host: "srv",
                share: "share"
            }
        );
        assert_eq!(classify("a/b"), PathRoot::Relative);
        assert_eq!(classify("./a"), PathRoot::Relative);
        assert_eq!(classify("C:"), PathRoot::Relative);
        assert_eq!(classify("C:a"), PathRoot::Relative);
    }

    #[test]
    fn test_relative_from_needs_dot_dot_only() {
        // Context one level below the target still gets the ./ marker
        // because the joined path is ".." alone, not "../...".
        assert_eq!(relative_from(&["a", "b"], &["a"]), "./..");
    }

    // ========== properties ==========

    proptest! {
        #[test]
        fn prop_deterministic(request in "[ -~]{0,40}") {
            let a = stringify_request(Some("/ctx"), &request);
            let b = stringify_request(Some("/ctx"), &request);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_output_is_quoted(request in "\\PC{0,40}") {
            let literal = stringify_request(None, &request);
            prop_assert!(literal.len() >= 2);
            prop_assert!(literal.starts_with('"'));
            prop_assert!(literal.ends_with('"'));
            let interior = &literal[1..literal.len() - 1];
            for c in interior.chars() {
                prop_assert!((c as u32) >= 0x20, "unescaped control char in {literal}");
            }
        }

        #[test]
        fn prop_query_survives_verbatim(query in "[a-z=&/.]{0,20}") {
            let request = format!("/path/to/a.js?{query}");
            let literal = stringify_request(Some("/path/to"), &request);
            let expected = format!("\"./a.js?{query}\"");
            prop_assert_eq!(literal, expected);
        }
    }
}
