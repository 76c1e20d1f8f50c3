//! Deterministic, rule-based mutation generation.
//!
//! `MutationGenerator` enumerates mutants of a validated request. The output
//! is deterministic in content and order for a given input; ids embed a
//! per-call counter and an epoch-millisecond stamp. Generation is pure: no
//! I/O, no shared state.
//!
//! Submodules:
//! - [`catalogs`]: the fixed injection catalogs.
//! - [`url`]: query/path/hidden-parameter mutations for GET requests.
//! - [`headers`]: header-value and malicious-header mutations.
//! - [`payload`]: per-field and structure mutations for JSON object bodies.

pub mod catalogs;
mod headers;
mod payload;
mod url;

use chrono::Utc;
use serde_json::Value;

use crate::model::{HttpMethod, Mutation, MutationKind, TargetRequest};

/// Seam for mutation generation, so the engine can be driven by stubs in
/// tests.
pub trait Mutator: Send + Sync {
    /// Enumerate the mutants of `request`, in deterministic order.
    fn generate(&self, request: &TargetRequest) -> Vec<Mutation>;
}

/// Allocates mutation ids within one `generate` call.
///
/// The counter restarts at zero for every call; the epoch stamp is taken
/// once at the start so all ids of one run share it.
pub(crate) struct IdAllocator {
    counter: u32,
    epoch_ms: i64,
}

impl IdAllocator {
    fn new() -> Self {
        Self {
            counter: 0,
            epoch_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Next id: `mut-<kind-kebab>[-<field>]-<counter>-<epoch-ms>`.
    pub(crate) fn next(&mut self, kind: MutationKind, field: Option<&str>) -> String {
        self.counter += 1;
        match field {
            Some(f) => format!("mut-{}-{}-{}-{}", kind.code(), f, self.counter, self.epoch_ms),
            None => format!("mut-{}-{}-{}", kind.code(), self.counter, self.epoch_ms),
        }
    }
}

/// The default rule-based mutation generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutationGenerator;

impl MutationGenerator {
    /// Create a generator.
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for MutationGenerator {
    fn generate(&self, request: &TargetRequest) -> Vec<Mutation> {
        let mut ids = IdAllocator::new();
        let mut out = Vec::new();

        match request.method {
            HttpMethod::Get => {
                url::mutate_url(request, &mut ids, &mut out);
            }
            _ => {
                if let Some(Value::Object(fields)) = &request.payload {
                    payload::mutate_fields(request, fields, &mut ids, &mut out);
                    payload::mutate_structure(request, fields, &mut ids, &mut out);
                }
            }
        }

        headers::mutate_headers(request, &mut ids, &mut out);

        tracing::debug!(
            url = %request.url,
            method = %request.method,
            mutations = out.len(),
            "mutation generation complete"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    fn get_request(url: &str) -> TargetRequest {
        TargetRequest {
            url: url.to_string(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            payload: None,
            timeout_ms: 30_000,
        }
    }

    fn post_request(payload: Value) -> TargetRequest {
        TargetRequest {
            url: "https://api.example.com/users".to_string(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            payload: Some(payload),
            timeout_ms: 30_000,
        }
    }

    #[test]
    fn ids_are_pairwise_distinct() {
        let request = post_request(serde_json::json!({"name": "a", "age": 3}));
        let mutations = MutationGenerator::new().generate(&request);
        let ids: HashSet<_> = mutations.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), mutations.len());
    }

    #[test]
    fn id_format_embeds_kind_code() {
        let request = post_request(serde_json::json!({"name": "a"}));
        let mutations = MutationGenerator::new().generate(&request);
        let first = &mutations[0];
        assert!(first.id.starts_with(&format!("mut-{}", first.kind.code())));
    }

    #[test]
    fn every_mutation_differs_from_original() {
        let mut request = post_request(serde_json::json!({"name": "a"}));
        request
            .headers
            .insert("Authorization".to_string(), "Bearer t".to_string());
        for m in MutationGenerator::new().generate(&request) {
            assert_ne!(
                m.modified_request, request,
                "mutation {} left the request unchanged",
                m.id
            );
        }
    }

    #[test]
    fn generation_is_deterministic_in_content_and_order() {
        let request = post_request(serde_json::json!({"name": "a", "age": 3}));
        let gen = MutationGenerator::new();
        let first = gen.generate(&request);
        let second = gen.generate(&request);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.description, b.description);
            assert_eq!(a.original_field, b.original_field);
            assert_eq!(a.modified_request, b.modified_request);
        }
    }

    #[test]
    fn get_without_query_or_payload_emits_url_and_header_families_only() {
        let request = get_request("https://api.example.com/users");
        let mutations = MutationGenerator::new().generate(&request);

        // Hidden-parameter probes + path traversal + malicious headers.
        let extra_field = mutations
            .iter()
            .filter(|m| m.kind == MutationKind::ExtraField)
            .count();
        let traversal = mutations
            .iter()
            .filter(|m| m.kind == MutationKind::StringMalicious)
            .count();
        assert_eq!(
            extra_field,
            catalogs::HIDDEN_PARAMETERS.len() + catalogs::MALICIOUS_HEADERS.len()
        );
        assert_eq!(traversal, catalogs::PATH_TRAVERSALS.len());
        assert_eq!(mutations.len(), extra_field + traversal);
    }

    #[test]
    fn post_with_empty_object_emits_structure_and_header_mutations_only() {
        let request = post_request(serde_json::json!({}));
        let mutations = MutationGenerator::new().generate(&request);
        // No fields: no per-field mutations, no missing-field mutations.
        // Six intrusion fields + fourteen malicious headers.
        assert_eq!(
            mutations.len(),
            catalogs::INTRUSION_FIELDS.len() + catalogs::MALICIOUS_HEADERS.len()
        );
        assert!(mutations
            .iter()
            .all(|m| m.kind == MutationKind::ExtraField));
    }

    #[test]
    fn post_with_non_object_payload_emits_header_mutations_only() {
        let request = post_request(serde_json::json!([1, 2, 3]));
        let mutations = MutationGenerator::new().generate(&request);
        assert_eq!(mutations.len(), catalogs::MALICIOUS_HEADERS.len());
    }

    #[test]
    fn kind_families_touch_the_fields_they_claim() {
        let mut request = post_request(serde_json::json!({"name": "a"}));
        request
            .headers
            .insert("X-Token".to_string(), "secret".to_string());
        for m in MutationGenerator::new().generate(&request) {
            let changed_headers = m.modified_request.headers != request.headers;
            let changed_payload = m.modified_request.payload != request.payload;
            let changed_url = m.modified_request.url != request.url;
            assert!(
                changed_headers || changed_payload || changed_url,
                "mutation {} changed nothing",
                m.id
            );
        }
    }
}
