//! XML text helpers for values embedded in response documents.

use std::borrow::Cow;

use quick_xml::escape::partial_escape;

/// Returns true if `text` has no control characters other than tab, LF and CR, all of
/// which XML 1.0 allows.
pub fn is_xml_safe(text: &str) -> bool {
    !text.bytes().any(|b| is_control(b) && !matches!(b, b'\t' | b'\n' | b'\r'))
}

/// Escapes a revision author for use as element content.
///
/// Native clients reject documents containing control characters, but they also receive
/// the author through a second, fully escaped property. For them an unsafe name loses its
/// control characters instead of breaking the whole response. Other clients get the name
/// escaped as-is.
pub fn escape_author(author: &str, is_svn_client: bool) -> Cow<'_, str> {
    if is_svn_client && !is_xml_safe(author) {
        let stripped: String = author.chars().filter(|c| !c.is_ascii_control()).collect();
        return Cow::Owned(escape_quoted(stripped.as_str()).into_owned());
    }
    escape_quoted(author)
}

/// Escapes `text` for element content, leaving quotes alone.
pub fn quote_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

/// Escapes `<`, `>`, `&` and `"`. Apostrophes are left as they are.
fn escape_quoted(text: &str) -> Cow<'_, str> {
    let escaped = partial_escape(text);
    if escaped.contains('"') { Cow::Owned(escaped.replace('"', "&quot;")) } else { escaped }
}

fn is_control(b: u8) -> bool {
    b < 0x20 || b == 0x7f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_safety() {
        assert!(is_xml_safe("jrandom"));
        assert!(is_xml_safe("line\nbreak\tand\rreturn"));
        assert!(!is_xml_safe("bell\x07"));
        assert!(!is_xml_safe("del\x7f"));
    }

    #[test]
    fn safe_names_escape_the_same_for_every_client() {
        for name in ["jrandom", "Harry <harry@example.com>", "o'neil & \"co\"", "tab\tname"] {
            assert_eq!(escape_author(name, true), escape_author(name, false));
        }
        assert_eq!(escape_author("a<b>&", true), "a&lt;b&gt;&amp;");
    }

    #[test]
    fn apostrophes_are_kept_and_quotes_escaped() {
        assert_eq!(escape_author("o'neil", true), "o'neil");
        assert_eq!(escape_author("o'neil & \"co\"", false), "o'neil &amp; &quot;co&quot;");
        assert_eq!(escape_author("\"bob\"\x01", true), "&quot;bob&quot;");
    }

    #[test]
    fn native_client_loses_only_control_bytes() {
        assert_eq!(escape_author("ha\x01rr\x1by <x>", true), "harry &lt;x&gt;");
        // once stripping kicks in, every control byte goes, tab included
        assert_eq!(escape_author("a\tb\x02", true), "ab");
    }

    #[test]
    fn other_clients_keep_control_bytes() {
        assert_eq!(escape_author("ha\x01rry", false), "ha\x01rry");
    }

    #[test]
    fn quote_text_keeps_quotes() {
        assert_eq!(quote_text("path 'a' & \"b\" <c>"), "path 'a' &amp; \"b\" &lt;c&gt;");
    }
}
