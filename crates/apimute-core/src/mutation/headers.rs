//! Header mutations: value injection on existing headers and well-known
//! malicious headers added to the request.

use super::catalogs::{long_string, HEADER_VALUE_INJECTIONS, LONG_STRING_LEN, MALICIOUS_HEADERS};
use super::IdAllocator;
use crate::model::{Mutation, MutationKind, TargetRequest};

pub(super) fn mutate_headers(
    request: &TargetRequest,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    // Value injection on each existing header. BTreeMap iteration keeps the
    // order stable.
    for name in request.headers.keys() {
        for (label, value) in HEADER_VALUE_INJECTIONS {
            let injected = match value {
                Some(v) => (*v).to_string(),
                None => long_string(LONG_STRING_LEN),
            };
            let mut modified = request.clone();
            modified.headers.insert(name.clone(), injected);
            out.push(Mutation {
                id: ids.next(MutationKind::StringMalicious, Some(name)),
                kind: MutationKind::StringMalicious,
                description: format!("header '{name}' set to {label}"),
                strategy: "header-value-injection".to_string(),
                original_field: Some(name.clone()),
                modified_request: modified,
            });
        }
    }

    // Malicious headers, overriding when the name already exists.
    for (name, value) in MALICIOUS_HEADERS {
        let mut modified = request.clone();
        modified
            .headers
            .insert((*name).to_string(), (*value).to_string());
        out.push(Mutation {
            id: ids.next(MutationKind::ExtraField, Some(name)),
            kind: MutationKind::ExtraField,
            description: format!("malicious header '{name}: {value}' added"),
            strategy: "malicious-header".to_string(),
            original_field: Some((*name).to_string()),
            modified_request: modified,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use crate::mutation::{MutationGenerator, Mutator};
    use std::collections::BTreeMap;

    fn request_with_headers(headers: &[(&str, &str)]) -> TargetRequest {
        TargetRequest {
            url: "https://api.example.com/users".to_string(),
            method: HttpMethod::Delete,
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
            payload: None,
            timeout_ms: 30_000,
        }
    }

    #[test]
    fn each_existing_header_gets_value_catalog() {
        let request = request_with_headers(&[("Authorization", "Bearer t"), ("X-Token", "s")]);
        let mutations = MutationGenerator::new().generate(&request);
        let value_injections = mutations
            .iter()
            .filter(|m| m.strategy == "header-value-injection")
            .count();
        assert_eq!(value_injections, 2 * HEADER_VALUE_INJECTIONS.len());
    }

    #[test]
    fn crlf_injection_lands_in_header_value() {
        let request = request_with_headers(&[("X-Token", "s")]);
        let mutations = MutationGenerator::new().generate(&request);
        assert!(mutations.iter().any(|m| {
            m.modified_request.headers.get("X-Token").map(String::as_str)
                == Some("\r\nSet-Cookie: admin=true")
        }));
    }

    #[test]
    fn malicious_headers_are_added() {
        let request = request_with_headers(&[]);
        let mutations = MutationGenerator::new().generate(&request);
        let malicious: Vec<_> = mutations
            .iter()
            .filter(|m| m.strategy == "malicious-header")
            .collect();
        assert_eq!(malicious.len(), MALICIOUS_HEADERS.len());
        assert!(malicious.iter().any(|m| {
            m.modified_request.headers.get("X-Forwarded-For").map(String::as_str)
                == Some("127.0.0.1")
        }));
    }

    #[test]
    fn malicious_header_overrides_existing_value() {
        let request = request_with_headers(&[("Host", "api.example.com")]);
        let mutations = MutationGenerator::new().generate(&request);
        let host_override = mutations
            .iter()
            .find(|m| m.strategy == "malicious-header" && m.original_field.as_deref() == Some("Host"))
            .expect("host override mutation");
        assert_eq!(
            host_override.modified_request.headers.get("Host").map(String::as_str),
            Some("evil.com")
        );
    }

    #[test]
    fn header_mutations_only_touch_headers() {
        let request = request_with_headers(&[("X-Token", "s")]);
        for m in MutationGenerator::new().generate(&request) {
            assert_eq!(m.modified_request.url, request.url);
            assert_eq!(m.modified_request.payload, request.payload);
            assert_ne!(m.modified_request.headers, request.headers);
        }
    }
}
