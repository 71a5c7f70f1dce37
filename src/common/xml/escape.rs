use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build XML text escaper")
});

// Use LeftmostLongest to ensure longer entities are matched first (e.g., &amp; instead of &lt;)
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Named entities that are left alone by [`escape_stray_ampersands`].
const NAMED_ENTITIES: [&[u8]; 5] = [b"amp;", b"lt;", b"gt;", b"apos;", b"quot;"];

/// Escape XML special characters for use inside an attribute value.
///
/// # Examples
///
/// ```
/// use ebo_factory::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Escape the characters that are not allowed raw in element text.
///
/// Quotes are kept as-is so text content stays readable.
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"])
}

/// Unescape XML special characters.
///
/// Replaces the five standard XML entities with their corresponding characters.
/// Unknown or malformed entities are left unchanged.
///
/// # Examples
///
/// ```
/// use ebo_factory::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;"); // &amp; is matched first
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
#[inline]
pub fn unescape_xml(s: &str) -> String {
    XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"])
}

/// Resolve the body of an entity reference (the part between `&` and `;`).
///
/// Handles the five predefined entities and decimal/hex character references.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}

/// Escape every `&` that does not already start a recognised reference.
///
/// Recognised references are the five predefined entities and numeric
/// character references (`&#38;`, `&#x26;`). Everything else gets `&amp;`.
/// CDATA sections and comments are copied unchanged.
///
/// # Examples
///
/// ```
/// use ebo_factory::common::xml::escape_stray_ampersands;
/// assert_eq!(escape_stray_ampersands("R&D &amp; QA"), "R&amp;D &amp; QA");
/// assert_eq!(escape_stray_ampersands("&#38;&#x26;"), "&#38;&#x26;");
/// assert_eq!(escape_stray_ampersands("<![CDATA[a && b]]>&"), "<![CDATA[a && b]]>&amp;");
/// ```
pub fn escape_stray_ampersands(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if memchr::memchr(b'&', bytes).is_none() {
        return Cow::Borrowed(s);
    }

    let verbatim = verbatim_sections(bytes);
    let mut sections = verbatim.iter().peekable();
    let mut out = String::with_capacity(s.len() + 16);
    let mut last = 0;
    for pos in memchr::memchr_iter(b'&', bytes) {
        while sections.next_if(|&&(_, end)| end <= pos).is_some() {}
        if sections.peek().is_some_and(|&&(start, _)| start <= pos) {
            continue;
        }
        if is_reference_start(&bytes[pos + 1..]) {
            continue;
        }
        out.push_str(&s[last..pos]);
        out.push_str("&amp;");
        last = pos + 1;
    }
    out.push_str(&s[last..]);
    Cow::Owned(out)
}

/// Byte ranges of CDATA sections and comments, in order.
///
/// An unterminated section runs to the end of the input.
fn verbatim_sections(bytes: &[u8]) -> Vec<(usize, usize)> {
    const MARKERS: [(&[u8], &[u8]); 2] = [(b"<![CDATA[", b"]]>"), (b"<!--", b"-->")];

    let mut sections = Vec::new();
    let mut pos = 0;
    while let Some(offset) = memchr::memchr(b'<', &bytes[pos..]) {
        let start = pos + offset;
        let rest = &bytes[start..];
        let Some((open, close)) = MARKERS.iter().find(|(open, _)| rest.starts_with(open)) else {
            pos = start + 1;
            continue;
        };
        let body = start + open.len();
        let end = memchr::memmem::find(&bytes[body..], close)
            .map_or(bytes.len(), |len| body + len + close.len());
        sections.push((start, end));
        pos = end;
    }
    sections
}

fn is_reference_start(rest: &[u8]) -> bool {
    if NAMED_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
        return true;
    }
    let Some(after_hash) = rest.strip_prefix(b"#") else {
        return false;
    };
    let (digits, is_hex) = match after_hash.strip_prefix(b"x") {
        Some(hex) => (hex, true),
        None => (after_hash, false),
    };
    let len = digits
        .iter()
        .take_while(|b| if is_hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        .count();
    len > 0 && digits.get(len) == Some(&b';')
}
