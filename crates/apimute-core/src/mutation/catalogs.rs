//! Fixed mutation catalogs.
//!
//! Every catalog is a fixed, ordered list so that generated suites are
//! reproducible and diff-able across runs. Entries are additive-only to
//! preserve historical report comparability.

use crate::model::MutationKind;

/// Length of the long-string payload used in URL and header mutations.
pub const LONG_STRING_LEN: usize = 10_000;

/// Length of the long-string payload used in body field mutations.
pub const PAYLOAD_LONG_STRING_LEN: usize = 10_001;

/// Sentinel emitted in place of a circular reference.
pub const CIRCULAR_SENTINEL: &str = "[Circular]";

/// A catalog entry for query-parameter injection.
#[derive(Debug, Clone, Copy)]
pub struct ParamInjection {
    /// Short label used in mutation descriptions.
    pub label: &'static str,
    /// The raw value substituted for the parameter. `None` means the
    /// long-string payload, built at generation time.
    pub value: Option<&'static str>,
    /// The mutation kind this entry probes for.
    pub kind: MutationKind,
}

/// The 14-entry parameter injection catalog applied to each query parameter.
pub const PARAMETER_INJECTIONS: &[ParamInjection] = &[
    ParamInjection {
        label: "empty string",
        value: Some(""),
        kind: MutationKind::StringEmpty,
    },
    ParamInjection {
        label: "oversized string",
        value: None,
        kind: MutationKind::StringLong,
    },
    ParamInjection {
        label: "script tag",
        value: Some("<script>alert(1)</script>"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "SQL injection",
        value: Some("'; DROP TABLE users; --"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "path traversal",
        value: Some("../../../etc/passwd"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "null byte",
        value: Some("%00"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "template injection",
        value: Some("${7*7}"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "privilege keyword",
        value: Some("admin"),
        kind: MutationKind::StringMalicious,
    },
    ParamInjection {
        label: "huge number",
        value: Some("999999999999999999999"),
        kind: MutationKind::NumericLarge,
    },
    ParamInjection {
        label: "negative number",
        value: Some("-1"),
        kind: MutationKind::NumericNegative,
    },
    ParamInjection {
        label: "boolean true",
        value: Some("true"),
        kind: MutationKind::TypeBoolean,
    },
    ParamInjection {
        label: "boolean false",
        value: Some("false"),
        kind: MutationKind::TypeBoolean,
    },
    ParamInjection {
        label: "null literal",
        value: Some("null"),
        kind: MutationKind::TypeNull,
    },
    ParamInjection {
        label: "undefined literal",
        value: Some("undefined"),
        kind: MutationKind::TypeUndefined,
    },
];

/// Substitutions applied to each numeric path segment.
pub const NUMERIC_SEGMENT_SUBSTITUTIONS: &[&str] =
    &["0", "-1", "999999999", "abc", "null", "undefined"];

/// Path traversal payloads appended to the URL path.
pub const PATH_TRAVERSALS: &[&str] = &[
    "../",
    "..\\",
    "../../",
    "../../../etc/passwd",
    "..%2F",
    "..%5C",
    "%2e%2e%2f",
    "%2e%2e%5c",
];

/// Hidden parameters probed when the URL carries no query string.
pub const HIDDEN_PARAMETERS: &[&str] = &[
    "debug=true",
    "admin=1",
    "test=1",
    "id=1' OR '1'='1",
    "callback=alert(1)",
    "redirect=http://evil.com",
    "url=javascript:alert(1)",
    "file=../../../etc/passwd",
];

/// Suffixes appended to the raw URL string when it cannot be parsed.
pub const RAW_URL_FALLBACK_SUFFIXES: &[&str] = &[
    "?debug=true",
    "/../../../etc/passwd",
    "?id=1' OR '1'='1",
    "/%00",
    "?callback=alert(1)",
    "#<script>alert(1)</script>",
];

/// Values substituted for each existing header. `None` means the
/// long-string payload.
pub const HEADER_VALUE_INJECTIONS: &[(&str, Option<&str>)] = &[
    ("empty value", Some("")),
    ("oversized value", None),
    ("script tag", Some("<script>alert(1)</script>")),
    ("CRLF cookie injection", Some("\r\nSet-Cookie: admin=true")),
    ("LFCR redirect injection", Some("\n\rLocation: http://evil.com")),
    ("path traversal", Some("../../../etc/passwd")),
    ("template injection", Some("${7*7}")),
];

/// Malicious headers added (or overridden) on the original request.
pub const MALICIOUS_HEADERS: &[(&str, &str)] = &[
    ("X-Forwarded-For", "127.0.0.1"),
    ("X-Forwarded-Host", "evil.com"),
    ("X-Real-IP", "127.0.0.1"),
    ("X-Originating-IP", "127.0.0.1"),
    ("X-Remote-IP", "127.0.0.1"),
    ("X-Client-IP", "127.0.0.1"),
    ("X-Forwarded-Proto", "javascript"),
    ("Host", "evil.com"),
    ("Origin", "http://evil.com"),
    ("Referer", "javascript:alert(1)"),
    ("User-Agent", "<script>alert(1)</script>"),
    ("Content-Length", "-1"),
    ("Transfer-Encoding", "chunked"),
    ("X-HTTP-Method-Override", "DELETE"),
];

/// Special-character payloads substituted for each body field.
pub const SPECIAL_CHARACTERS: &[&str] = &[
    "!@#$%^&*()",
    "<>?:\"{}|",
    "';--",
    "\\\\",
    "\0",
    "\n",
    "\r\n",
    "\t",
    "%%",
    "&&",
    "||",
    "`",
    "$(whoami)",
    "{{7*7}}",
    "%s%s%s%s",
    "../",
    "\"",
];

/// Unicode payloads substituted for each body field.
pub const UNICODE_CHARACTERS: &[&str] = &[
    "\u{FEFF}",             // byte order mark
    "\u{200B}",             // zero-width space
    "\u{200D}",             // zero-width joiner
    "\u{202E}",             // right-to-left override
    "\u{2028}",             // line separator
    "\u{2029}",             // paragraph separator
    "\u{0001}\u{0002}",     // control characters
    "\u{00A0}",             // non-breaking space
    "\u{FFFD}",             // replacement character
    "\u{0430}dmin",         // cyrillic homoglyph of "admin"
    "\u{1F600}\u{1F4A9}",   // surrogate-pair emoji
    "e\u{0301}",            // combining acute accent
    "\u{4F60}\u{597D}",     // CJK
    "\u{202D}reversed",     // left-to-right override
    "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F466}", // ZWJ family sequence
];

/// Field names injected by structure mutations.
pub const INTRUSION_FIELDS: &[&str] = &[
    "extraField",
    "admin",
    "role",
    "debug",
    "__proto__",
    "constructor",
];

/// Injection sentinels looked for in mutated payloads by the detector.
pub const INJECTION_SENTINELS: &[&str] = &[
    "<script>",
    "DROP TABLE",
    "../../../etc/passwd",
    "${7*7}",
    "javascript:",
    "__proto__",
];

/// Build the long-string payload of the given length.
pub fn long_string(len: usize) -> String {
    "A".repeat(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sizes_are_fixed() {
        assert_eq!(PARAMETER_INJECTIONS.len(), 14);
        assert_eq!(NUMERIC_SEGMENT_SUBSTITUTIONS.len(), 6);
        assert_eq!(PATH_TRAVERSALS.len(), 8);
        assert_eq!(HIDDEN_PARAMETERS.len(), 8);
        assert_eq!(RAW_URL_FALLBACK_SUFFIXES.len(), 6);
        assert_eq!(HEADER_VALUE_INJECTIONS.len(), 7);
        assert_eq!(MALICIOUS_HEADERS.len(), 14);
        assert_eq!(SPECIAL_CHARACTERS.len(), 17);
        assert_eq!(UNICODE_CHARACTERS.len(), 15);
        assert_eq!(INTRUSION_FIELDS.len(), 6);
    }

    #[test]
    fn long_string_lengths() {
        assert_eq!(long_string(LONG_STRING_LEN).len(), 10_000);
        assert_eq!(long_string(PAYLOAD_LONG_STRING_LEN).len(), 10_001);
    }

    #[test]
    fn intrusion_fields_include_prototype_pollution() {
        assert!(INTRUSION_FIELDS.contains(&"__proto__"));
        assert!(INTRUSION_FIELDS.contains(&"constructor"));
    }
}
