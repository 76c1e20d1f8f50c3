//! Payload mutations for JSON object bodies: per-field value rewrites and
//! structure-level field removal/injection.

use serde_json::{json, Map, Value};

use super::catalogs::{
    long_string, CIRCULAR_SENTINEL, INTRUSION_FIELDS, PAYLOAD_LONG_STRING_LEN, SPECIAL_CHARACTERS,
    UNICODE_CHARACTERS,
};
use super::IdAllocator;
use crate::model::{Mutation, MutationKind, TargetRequest};

/// Largest integer exactly representable in an IEEE-754 double.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// One past the largest safely representable integer.
const BEYOND_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// Smallest integer exactly representable in an IEEE-754 double.
const MIN_SAFE_INTEGER: i64 = -9_007_199_254_740_991;

/// Per-field mutations: strings, type confusion, numeric extremes, special
/// characters, Unicode, and nested structures.
pub(super) fn mutate_fields(
    request: &TargetRequest,
    fields: &Map<String, Value>,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    for (key, original) in fields {
        string_mutations(request, key, ids, out);
        type_mutations(request, key, original, ids, out);
        numeric_mutations(request, key, ids, out);
        special_character_mutations(request, key, ids, out);
        unicode_mutations(request, key, ids, out);
        nested_structure_mutations(request, key, ids, out);
    }
}

/// Structure mutations: remove each field; inject well-known intrusion
/// fields.
pub(super) fn mutate_structure(
    request: &TargetRequest,
    fields: &Map<String, Value>,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    for key in fields.keys() {
        let mut modified = request.clone();
        if let Some(Value::Object(map)) = &mut modified.payload {
            map.remove(key);
        }
        out.push(Mutation {
            id: ids.next(MutationKind::MissingField, Some(key)),
            kind: MutationKind::MissingField,
            description: format!("required field '{key}' removed"),
            strategy: "structure-missing-field".to_string(),
            original_field: Some(key.clone()),
            modified_request: modified,
        });
    }

    for field in INTRUSION_FIELDS {
        let value = intrusion_value(field);
        out.push(field_mutation(
            request,
            ids,
            MutationKind::ExtraField,
            field,
            value,
            format!("unexpected field '{field}' injected"),
            "structure-extra-field",
        ));
    }
}

fn string_mutations(
    request: &TargetRequest,
    key: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    out.push(field_mutation(
        request,
        ids,
        MutationKind::StringEmpty,
        key,
        json!(""),
        format!("field '{key}' set to empty string"),
        "field-string",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::StringLong,
        key,
        Value::String(long_string(PAYLOAD_LONG_STRING_LEN)),
        format!("field '{key}' set to {PAYLOAD_LONG_STRING_LEN}-character string"),
        "field-string",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::StringMalicious,
        key,
        json!("<script>alert(1)</script>"),
        format!("field '{key}' set to script injection payload"),
        "field-string",
    ));
}

fn type_mutations(
    request: &TargetRequest,
    key: &str,
    original: &Value,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    out.push(field_mutation(
        request,
        ids,
        MutationKind::TypeBoolean,
        key,
        json!(true),
        format!("field '{key}' set to boolean true"),
        "field-type",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::TypeBoolean,
        key,
        json!(false),
        format!("field '{key}' set to boolean false"),
        "field-type",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::TypeArray,
        key,
        Value::Array(vec![original.clone()]),
        format!("field '{key}' wrapped in an array"),
        "field-type",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::TypeArray,
        key,
        json!([]),
        format!("field '{key}' set to empty array"),
        "field-type",
    ));
    out.push(field_mutation(
        request,
        ids,
        MutationKind::TypeNull,
        key,
        Value::Null,
        format!("field '{key}' set to null"),
        "field-type",
    ));

    // Undefined is encoded as field-absent at serialization.
    let mut modified = request.clone();
    if let Some(Value::Object(map)) = &mut modified.payload {
        map.remove(key);
    }
    out.push(Mutation {
        id: ids.next(MutationKind::TypeUndefined, Some(key)),
        kind: MutationKind::TypeUndefined,
        description: format!("field '{key}' set to undefined (omitted)"),
        strategy: "field-type".to_string(),
        original_field: Some(key.to_string()),
        modified_request: modified,
    });
}

fn numeric_mutations(
    request: &TargetRequest,
    key: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    let cases: [(MutationKind, Value, &str); 8] = [
        (
            MutationKind::NumericLarge,
            json!(MAX_SAFE_INTEGER),
            "max safe integer",
        ),
        (
            MutationKind::NumericLarge,
            json!(BEYOND_SAFE_INTEGER),
            "beyond max safe integer",
        ),
        (
            MutationKind::NumericLarge,
            non_finite_number(f64::INFINITY),
            "positive infinity",
        ),
        (
            MutationKind::NumericLarge,
            non_finite_number(f64::NAN),
            "NaN",
        ),
        (
            MutationKind::NumericNegative,
            json!(MIN_SAFE_INTEGER),
            "min safe integer",
        ),
        (
            MutationKind::NumericNegative,
            non_finite_number(f64::NEG_INFINITY),
            "negative infinity",
        ),
        (MutationKind::NumericNegative, json!(-1), "negative one"),
        (MutationKind::NumericZero, json!(0), "zero"),
    ];
    for (kind, value, label) in cases {
        out.push(field_mutation(
            request,
            ids,
            kind,
            key,
            value,
            format!("field '{key}' set to {label}"),
            "field-numeric",
        ));
    }
}

fn special_character_mutations(
    request: &TargetRequest,
    key: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    for payload in SPECIAL_CHARACTERS {
        out.push(field_mutation(
            request,
            ids,
            MutationKind::SpecialCharacters,
            key,
            json!(payload),
            format!("field '{key}' set to special characters {payload:?}"),
            "field-special-characters",
        ));
    }
}

fn unicode_mutations(
    request: &TargetRequest,
    key: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    for payload in UNICODE_CHARACTERS {
        out.push(field_mutation(
            request,
            ids,
            MutationKind::UnicodeCharacters,
            key,
            json!(payload),
            format!("field '{key}' set to unicode payload {payload:?}"),
            "field-unicode",
        ));
    }
}

fn nested_structure_mutations(
    request: &TargetRequest,
    key: &str,
    ids: &mut IdAllocator,
    out: &mut Vec<Mutation>,
) {
    let cases: [(Value, &str); 5] = [
        (deeply_nested(10), "10-level nested object"),
        (
            json!(CIRCULAR_SENTINEL),
            "circular reference sentinel",
        ),
        (
            Value::Array(vec![json!(1); 1000]),
            "1000-element array",
        ),
        (mixed_type_array(), "mixed-type array"),
        (prototype_pollution_object(), "prototype pollution object"),
    ];
    for (value, label) in cases {
        out.push(field_mutation(
            request,
            ids,
            MutationKind::InvalidType,
            key,
            value,
            format!("field '{key}' set to {label}"),
            "field-structure",
        ));
    }
}

/// Clone the request with one payload field replaced.
fn field_mutation(
    request: &TargetRequest,
    ids: &mut IdAllocator,
    kind: MutationKind,
    key: &str,
    value: Value,
    description: String,
    strategy: &str,
) -> Mutation {
    let mut modified = request.clone();
    if let Some(Value::Object(map)) = &mut modified.payload {
        map.insert(key.to_string(), value);
    }
    Mutation {
        id: ids.next(kind, Some(key)),
        kind,
        description,
        strategy: strategy.to_string(),
        original_field: Some(key.to_string()),
        modified_request: modified,
    }
}

/// Non-finite doubles have no JSON representation; they serialize as null
/// while the mutation description still names the intended value.
fn non_finite_number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn deeply_nested(levels: usize) -> Value {
    let mut value = json!("bottom");
    for _ in 0..levels {
        value = json!({ "nested": value });
    }
    value
}

fn mixed_type_array() -> Value {
    json!([
        1,
        "two",
        true,
        Value::Null,
        { "k": "v" },
        [1, 2],
        3.5,
        "function() {}"
    ])
}

fn prototype_pollution_object() -> Value {
    json!({
        "__proto__": { "polluted": true },
        "constructor": { "prototype": { "polluted": true } }
    })
}

fn intrusion_value(field: &str) -> Value {
    match field {
        "admin" | "debug" => json!(true),
        "role" => json!("admin"),
        "__proto__" => json!({ "polluted": true }),
        "constructor" => json!({ "prototype": { "polluted": true } }),
        _ => json!("injected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use crate::mutation::{MutationGenerator, Mutator};
    use std::collections::BTreeMap;

    fn post(payload: Value) -> TargetRequest {
        TargetRequest {
            url: "https://api.example.com/users".to_string(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            payload: Some(payload),
            timeout_ms: 30_000,
        }
    }

    /// 3 string + 6 type + 8 numeric + 17 special + 15 unicode + 5 nested.
    const PER_FIELD: usize = 54;

    #[test]
    fn per_field_mutation_count() {
        let request = post(json!({"name": "alice"}));
        let mutations = MutationGenerator::new().generate(&request);
        let field_mutations = mutations
            .iter()
            .filter(|m| m.original_field.as_deref() == Some("name"))
            .count();
        // Per-field catalog plus the structure-level removal.
        assert_eq!(field_mutations, PER_FIELD + 1);
    }

    #[test]
    fn undefined_mutation_removes_the_field() {
        let request = post(json!({"name": "alice", "age": 30}));
        let mutations = MutationGenerator::new().generate(&request);
        let undefined = mutations
            .iter()
            .find(|m| m.kind == MutationKind::TypeUndefined)
            .expect("undefined mutation");
        let Some(Value::Object(map)) = &undefined.modified_request.payload else {
            panic!("payload still an object");
        };
        assert!(!map.contains_key(undefined.original_field.as_deref().unwrap()));
    }

    #[test]
    fn array_wrap_preserves_original_value() {
        let request = post(json!({"age": 30}));
        let mutations = MutationGenerator::new().generate(&request);
        assert!(mutations.iter().any(|m| {
            m.kind == MutationKind::TypeArray
                && m.modified_request
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("age"))
                    == Some(&json!([30]))
        }));
    }

    #[test]
    fn non_finite_numerics_serialize_as_null() {
        let request = post(json!({"count": 1}));
        let mutations = MutationGenerator::new().generate(&request);
        let nan = mutations
            .iter()
            .find(|m| m.description.contains("NaN"))
            .expect("NaN mutation");
        assert_eq!(
            nan.modified_request.payload.as_ref().unwrap().get("count"),
            Some(&Value::Null)
        );
        assert_eq!(nan.kind, MutationKind::NumericLarge);
    }

    #[test]
    fn long_string_mutation_is_over_ten_thousand_chars() {
        let request = post(json!({"name": "a"}));
        let mutations = MutationGenerator::new().generate(&request);
        let long = mutations
            .iter()
            .find(|m| m.kind == MutationKind::StringLong)
            .expect("long string mutation");
        let Some(Value::String(s)) =
            long.modified_request.payload.as_ref().unwrap().get("name")
        else {
            panic!("expected string value");
        };
        assert!(s.len() >= 10_001);
    }

    #[test]
    fn missing_field_removes_each_key() {
        let request = post(json!({"a": 1, "b": 2}));
        let mutations = MutationGenerator::new().generate(&request);
        let removals: Vec<_> = mutations
            .iter()
            .filter(|m| m.kind == MutationKind::MissingField)
            .collect();
        assert_eq!(removals.len(), 2);
        for removal in removals {
            let Some(Value::Object(map)) = &removal.modified_request.payload else {
                panic!("payload still an object");
            };
            assert_eq!(map.len(), 1);
        }
    }

    #[test]
    fn intrusion_fields_are_injected() {
        let request = post(json!({"a": 1}));
        let mutations = MutationGenerator::new().generate(&request);
        let extras: Vec<_> = mutations
            .iter()
            .filter(|m| m.strategy == "structure-extra-field")
            .collect();
        assert_eq!(extras.len(), INTRUSION_FIELDS.len());

        let proto = extras
            .iter()
            .find(|m| m.original_field.as_deref() == Some("__proto__"))
            .expect("__proto__ injection");
        // Prototype pollution payloads are data: serialized as ordinary keys.
        let payload = proto.modified_request.payload.as_ref().unwrap();
        assert_eq!(payload.get("__proto__"), Some(&json!({"polluted": true})));
    }

    #[test]
    fn deeply_nested_reaches_requested_depth() {
        let mut value = &deeply_nested(10);
        let mut depth = 0;
        while let Some(inner) = value.get("nested") {
            value = inner;
            depth += 1;
        }
        assert_eq!(depth, 10);
    }

    #[test]
    fn circular_case_uses_sentinel_string() {
        let request = post(json!({"a": 1}));
        let mutations = MutationGenerator::new().generate(&request);
        assert!(mutations.iter().any(|m| {
            m.modified_request
                .payload
                .as_ref()
                .and_then(|p| p.get("a"))
                == Some(&json!(CIRCULAR_SENTINEL))
        }));
    }

    #[test]
    fn thousand_element_array_case() {
        let request = post(json!({"a": 1}));
        let mutations = MutationGenerator::new().generate(&request);
        assert!(mutations.iter().any(|m| {
            matches!(
                m.modified_request.payload.as_ref().and_then(|p| p.get("a")),
                Some(Value::Array(items)) if items.len() == 1000
            )
        }));
    }
}
