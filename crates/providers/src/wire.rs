//! Just enough JSON to work a provider response body.
//!
//! Responses are navigated with [`extract`]: a key path is walked by
//! substring search and balanced-delimiter scanning over the raw
//! text, so no document tree is ever built. The trade-off is
//! deliberate: the handful of wire shapes we talk to are flat and
//! predictable, and on anything unexpected the caller falls back to
//! [`first_content_string`] and finally to the raw body. Every
//! failure is `None`; nothing in here panics on malformed input.
//!
//! [`escape`] and [`unescape`] cover embedding message text in a JSON
//! string literal and reading it back out.

/// One step of a reply path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg {
    Key(&'static str),
    Index(usize),
}

/// Walk `path` through `json` and return the value text at the end.
///
/// Key steps search the current scope for the first `"<key>":` and
/// narrow to the value that follows. Index steps split the current
/// scope as an array and narrow to one element. A terminal string is
/// returned unescaped; a terminal object, array or bare scalar is
/// returned as its source text. Missing keys, out-of-range indices
/// and truncated documents all come back as `None`.
pub fn extract(json: &str, path: &[Seg]) -> Option<String> {
    let mut scope = json;
    for (i, seg) in path.iter().enumerate() {
        let last = i + 1 == path.len();
        match *seg {
            Seg::Key(key) => {
                let needle = format!("\"{key}\":");
                let at = scope.find(&needle)?;
                let value = scope[at + needle.len()..].trim_start();
                match value.as_bytes().first()? {
                    b'{' => scope = scan_balanced(value, b'{', b'}')?,
                    b'[' => scope = scan_balanced(value, b'[', b']')?,
                    b'"' => {
                        let inner = scan_string(value)?;
                        if last {
                            return Some(unescape(inner));
                        }
                        scope = inner;
                    }
                    _ => scope = scan_scalar(value),
                }
            }
            Seg::Index(want) => {
                let element = array_element(scope, want)?;
                if last && element.starts_with('"') {
                    return Some(unescape(scan_string(element)?));
                }
                scope = element;
            }
        }
    }
    Some(scope.to_string())
}

/// Permissive fallback: pull the first `"content":` string out of a
/// body whose overall shape we did not recognize.
pub fn first_content_string(json: &str) -> Option<String> {
    let at = json.find("\"content\":")?;
    let after = &json[at + "\"content\":".len()..];
    let quote = after.find('"')?;
    let inner = scan_string(&after[quote..])?;
    Some(unescape(inner))
}

/// Scope starts at `open`; return the slice up to and including the
/// matching `close`. Quoted strings are skipped so structural bytes
/// inside them do not count.
fn scan_balanced(scope: &str, open: u8, close: u8) -> Option<&str> {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in scope.bytes().enumerate().skip(1) {
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == b'"' {
            in_string = !in_string;
        } else if !in_string {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(&scope[..=i]);
                }
            }
        }
    }
    None
}

/// Scope starts at `"`; return the raw content between the quotes,
/// escape pairs left intact.
fn scan_string(scope: &str) -> Option<&str> {
    let mut escaped = false;
    for (i, c) in scope.bytes().enumerate().skip(1) {
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == b'"' {
            return Some(&scope[1..i]);
        }
    }
    None
}

/// Bare scalar token: everything up to the next delimiter.
fn scan_scalar(scope: &str) -> &str {
    for (i, c) in scope.bytes().enumerate() {
        if c == b',' || c == b'}' || c == b']' || c.is_ascii_whitespace() {
            return &scope[..i];
        }
    }
    scope
}

/// Scope must be array source text. Split it on commas that sit at
/// nesting depth zero outside any string, and return element `want`.
fn array_element(scope: &str, want: usize) -> Option<&str> {
    let scope = scope.trim();
    let inner = scope.strip_prefix('[')?.strip_suffix(']')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    let mut seen = 0;
    for (i, c) in inner.bytes().enumerate() {
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == b'"' {
            in_string = !in_string;
        } else if !in_string {
            match c {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.checked_sub(1)?,
                b',' if depth == 0 => {
                    if seen == want {
                        return non_empty(&inner[start..i]);
                    }
                    seen += 1;
                    start = i + 1;
                }
                _ => {}
            }
        }
    }
    if seen == want {
        return non_empty(&inner[start..]);
    }
    None
}

fn non_empty(element: &str) -> Option<&str> {
    let element = element.trim();
    (!element.is_empty()).then_some(element)
}

// ── Escaping ────────────────────────────────────────────────────────

/// Escape text for embedding in a JSON string literal. The backslash
/// pass must run first or the quote and newline passes would get
/// double-escaped.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Reverse of [`escape`], single pass so an unescaped backslash never
/// gets re-read as the start of a later sequence. Escape pairs we do
/// not recognize are kept verbatim.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use Seg::{Index, Key};

    const CHAT_PATH: &[Seg] = &[Key("choices"), Index(0), Key("message"), Key("content")];

    #[test]
    fn test_extract_chat_reply() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi \"there\"\n"},"finish_reason":"stop"}]}"#;
        assert_eq!(extract(body, CHAT_PATH), Some("Hi \"there\"\n".to_string()));
    }

    #[test]
    fn test_extract_gemini_reply() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Bonjour"}],"role":"model"}}]}"#;
        let path = &[
            Key("candidates"),
            Index(0),
            Key("content"),
            Key("parts"),
            Index(0),
            Key("text"),
        ];
        assert_eq!(extract(body, path), Some("Bonjour".to_string()));
    }

    #[test]
    fn test_extract_pretty_printed_body() {
        let body = "{\n  \"choices\": [\n    {\n      \"message\": {\n        \"content\": \"ok\"\n      }\n    }\n  ]\n}";
        assert_eq!(extract(body, CHAT_PATH), Some("ok".to_string()));
    }

    #[test]
    fn test_extract_reply_containing_braces() {
        // Structural bytes inside the content string must not end the
        // enclosing scans early.
        let body = r#"{"choices":[{"message":{"content":"use {x} and }, also ]"}}]}"#;
        assert_eq!(
            extract(body, CHAT_PATH),
            Some("use {x} and }, also ]".to_string())
        );
    }

    #[test]
    fn test_extract_second_element_with_nested_commas() {
        let body = r#"{"data":[{"id":"a,b","tags":[1,2]},{"id":"m2"}]}"#;
        assert_eq!(
            extract(body, &[Key("data"), Index(1), Key("id")]),
            Some("m2".to_string())
        );
    }

    #[test]
    fn test_extract_scalar_values() {
        let body = r#"{"created":1736112000,"done":true}"#;
        assert_eq!(
            extract(body, &[Key("created")]),
            Some("1736112000".to_string())
        );
        assert_eq!(extract(body, &[Key("done")]), Some("true".to_string()));
    }

    #[test]
    fn test_extract_terminal_array_is_source_text() {
        let body = r#"{"data":[{"id":"m1"},{"id":"m2"}]}"#;
        assert_eq!(
            extract(body, &[Key("data")]),
            Some(r#"[{"id":"m1"},{"id":"m2"}]"#.to_string())
        );
    }

    #[test]
    fn test_extract_missing_key() {
        assert_eq!(extract(r#"{"other":"x"}"#, CHAT_PATH), None);
    }

    #[test]
    fn test_extract_index_out_of_range() {
        let body = r#"{"choices":[]}"#;
        assert_eq!(extract(body, &[Key("choices"), Index(0)]), None);
        let body = r#"{"choices":[{"a":1}]}"#;
        assert_eq!(extract(body, &[Key("choices"), Index(3)]), None);
    }

    #[test]
    fn test_extract_truncated_document() {
        assert_eq!(extract(r#"{"choices":[{"message":"#, CHAT_PATH), None);
        assert_eq!(extract(r#"{"choices":[{"message":{"content":"unterminated"#, CHAT_PATH), None);
    }

    #[test]
    fn test_extract_index_on_non_array() {
        assert_eq!(extract(r#"{"a":{"b":1}}"#, &[Key("a"), Index(0)]), None);
    }

    #[test]
    fn test_first_content_string_on_unknown_shape() {
        let body = r#"{"result":{"inner":{"content":"still found\nme"}}}"#;
        assert_eq!(
            first_content_string(body),
            Some("still found\nme".to_string())
        );
    }

    #[test]
    fn test_first_content_string_absent() {
        assert_eq!(first_content_string(r#"{"text":"nope"}"#), None);
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape("a\nb"), r"a\nb");
        assert_eq!(escape(r"C:\temp"), r"C:\\temp");
        // A literal backslash-n must not collapse into a newline escape.
        assert_eq!(escape(r"a\nb"), r"a\\nb");
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape(r"line\nbreak\ttab\r"), "line\nbreak\ttab\r");
        assert_eq!(unescape(r#"\"quoted\""#), "\"quoted\"");
        assert_eq!(unescape(r"back\\slash"), r"back\slash");
    }

    #[test]
    fn test_unescape_round_trip() {
        let nasty = "quotes \" and \\ and\nnewlines, plus a literal \\n pair";
        assert_eq!(unescape(&escape(nasty)), nasty);
        let windows = r"C:\new\table";
        assert_eq!(unescape(&escape(windows)), windows);
    }

    #[test]
    fn test_unescape_unknown_pairs_kept() {
        assert_eq!(unescape(r"\u0041"), r"\u0041");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
