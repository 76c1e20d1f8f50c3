//! URL mutations for GET requests: query-parameter injection and removal,
//! numeric path-segment type confusion, path traversal, hidden-parameter
//! probes, and raw-suffix fallbacks for unparseable URLs.
//!
//! Mutated URLs are built by splicing the raw string rather than through
//! `url::Url` setters, so injection payloads reach the wire verbatim instead
//! of being percent-encoded away.

use url::Url;

use super::catalogs::{
    long_string, HIDDEN_PARAMETERS, LONG_STRING_LEN, NUMERIC_SEGMENT_SUBSTITUTIONS,
    PARAMETER_INJECTIONS, PATH_TRAVERSALS, RAW_URL_FALLBACK_SUFFIXES,
};
use super::IdAllocator;
use crate::model::{Mutation, MutationKind, TargetRequest};

pub(super) fn mutate_url(request: &TargetRequest, ids: &mut IdAllocator, out: &mut Vec<Mutation>) {
    if Url::parse(&request.url).is_err() {
        mutate_raw_fallback(request, ids, out);
        return;
    }

    let (base, query) = match request.url.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (request.url.as_str(), None),
    };

    match query {
        Some(q) if !q.is_empty() => mutate_query_params(request, base, q, ids, out),
        _ => {}
    }

    mutate_numeric_segments(request, base, query, ids, out);
    mutate_path_traversal(request, base, query, ids, out);

    if query.map_or(true, str::is_empty) {
        mutate_hidden_params(request, ids, out);
    }
}

/// Per existing query parameter: one mutation per injection catalog entry,
/// plus one removal.
fn mutate_query_params(
    request: &TargetRequest,
    base: &str,
    query: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    let params: Vec<(&str, &str)> = query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();

    for (target_idx, (key, _)) in params.iter().enumerate() {
        for injection in PARAMETER_INJECTIONS {
            let value = match injection.value {
                Some(v) => v.to_string(),
                None => long_string(LONG_STRING_LEN),
            };
            let rewritten: Vec<String> = params
                .iter()
                .enumerate()
                .map(|(i, (k, v))| {
                    if i == target_idx {
                        format!("{k}={value}")
                    } else {
                        format!("{k}={v}")
                    }
                })
                .collect();
            let mut modified = request.clone();
            modified.url = format!("{base}?{}", rewritten.join("&"));
            out.push(Mutation {
                id: ids.next(injection.kind, Some(key)),
                kind: injection.kind,
                description: format!("query parameter '{key}' set to {}", injection.label),
                strategy: "url-parameter-injection".to_string(),
                original_field: Some((*key).to_string()),
                modified_request: modified,
            });
        }

        // Removal of the parameter entirely.
        let remaining: Vec<String> = params
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, (k, v))| format!("{k}={v}"))
            .collect();
        let mut modified = request.clone();
        modified.url = if remaining.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{}", remaining.join("&"))
        };
        out.push(Mutation {
            id: ids.next(MutationKind::MissingField, Some(key)),
            kind: MutationKind::MissingField,
            description: format!("query parameter '{key}' removed"),
            strategy: "url-parameter-removal".to_string(),
            original_field: Some((*key).to_string()),
            modified_request: modified,
        });
    }
}

/// Replace each all-digit path segment with type-confusing substitutes.
fn mutate_numeric_segments(
    request: &TargetRequest,
    base: &str,
    query: Option<&str>,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    let Some(path_start) = path_offset(base) else {
        return;
    };
    let (origin, path) = base.split_at(path_start);
    let segments: Vec<&str> = path.split('/').collect();

    for (idx, segment) in segments.iter().enumerate() {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        for substitute in NUMERIC_SEGMENT_SUBSTITUTIONS {
            let mut rewritten = segments.clone();
            rewritten[idx] = substitute;
            let mut modified = request.clone();
            modified.url = match query {
                Some(q) => format!("{origin}{}?{q}", rewritten.join("/")),
                None => format!("{origin}{}", rewritten.join("/")),
            };
            out.push(Mutation {
                id: ids.next(MutationKind::InvalidType, Some(segment)),
                kind: MutationKind::InvalidType,
                description: format!(
                    "numeric path segment '{segment}' replaced with '{substitute}'"
                ),
                strategy: "url-path-type-confusion".to_string(),
                original_field: Some((*segment).to_string()),
                modified_request: modified,
            });
        }
    }
}

/// Append each traversal payload to the path.
fn mutate_path_traversal(
    request: &TargetRequest,
    base: &str,
    query: Option<&str>,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    for traversal in PATH_TRAVERSALS {
        let stem = base.trim_end_matches('/');
        let mut modified = request.clone();
        modified.url = match query {
            Some(q) => format!("{stem}/{traversal}?{q}"),
            None => format!("{stem}/{traversal}"),
        };
        out.push(Mutation {
            id: ids.next(MutationKind::StringMalicious, None),
            kind: MutationKind::StringMalicious,
            description: format!("path traversal payload '{traversal}' appended to path"),
            strategy: "path-traversal".to_string(),
            original_field: None,
            modified_request: modified,
        });
    }
}

/// Probe well-known hidden parameters when the URL has no query string.
fn mutate_hidden_params(request: &TargetRequest, ids: &mut IdAllocator, out: &mut Vec<Mutation>) {
    for entry in HIDDEN_PARAMETERS {
        let name = entry.split('=').next().unwrap_or(entry);
        let mut modified = request.clone();
        modified.url = format!("{}?{entry}", request.url);
        out.push(Mutation {
            id: ids.next(MutationKind::ExtraField, Some(name)),
            kind: MutationKind::ExtraField,
            description: format!("hidden parameter probe '{entry}'"),
            strategy: "hidden-parameter-probe".to_string(),
            original_field: Some(name.to_string()),
            modified_request: modified,
        });
    }
}

/// Fallback when the URL cannot be parsed: append fixed suffixes to the raw
/// string.
fn mutate_raw_fallback(request: &TargetRequest, ids: &mut IdAllocator, out: &mut Vec<Mutation>) {
    for suffix in RAW_URL_FALLBACK_SUFFIXES {
        let mut modified = request.clone();
        modified.url = format!("{}{suffix}", request.url);
        out.push(Mutation {
            id: ids.next(MutationKind::StringMalicious, None),
            kind: MutationKind::StringMalicious,
            description: format!("raw URL suffix injection '{suffix}'"),
            strategy: "raw-url-injection".to_string(),
            original_field: None,
            modified_request: modified,
        });
    }
}

/// Byte offset of the path within `base` (which carries no query string),
/// or `None` when the URL has no path component.
fn path_offset(base: &str) -> Option<usize> {
    let authority_start = base.find("://")? + 3;
    base[authority_start..]
        .find('/')
        .map(|i| authority_start + i)
}
