//! Mutation kinds and the mutation record produced by the generator.

use serde::{Deserialize, Serialize};

use super::request::TargetRequest;

/// The closed set of mutation kinds.
///
/// New kinds are additive-only so historical reports stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    StringEmpty,
    StringLong,
    StringMalicious,
    TypeBoolean,
    TypeArray,
    TypeNull,
    TypeUndefined,
    NumericLarge,
    NumericNegative,
    NumericZero,
    SpecialCharacters,
    UnicodeCharacters,
    MissingField,
    ExtraField,
    InvalidType,
}

impl MutationKind {
    /// Kebab-case code used in mutation ids.
    pub fn code(self) -> &'static str {
        match self {
            Self::StringEmpty => "string-empty",
            Self::StringLong => "string-long",
            Self::StringMalicious => "string-malicious",
            Self::TypeBoolean => "type-boolean",
            Self::TypeArray => "type-array",
            Self::TypeNull => "type-null",
            Self::TypeUndefined => "type-undefined",
            Self::NumericLarge => "numeric-large",
            Self::NumericNegative => "numeric-negative",
            Self::NumericZero => "numeric-zero",
            Self::SpecialCharacters => "special-characters",
            Self::UnicodeCharacters => "unicode-characters",
            Self::MissingField => "missing-field",
            Self::ExtraField => "extra-field",
            Self::InvalidType => "invalid-type",
        }
    }

    /// Kinds whose intent is to be rejected by a well-defended target.
    ///
    /// A 2xx response to one of these is treated as acceptance of input the
    /// target should have refused.
    pub fn expects_rejection(self) -> bool {
        matches!(
            self,
            Self::StringMalicious | Self::SpecialCharacters | Self::ExtraField | Self::InvalidType
        )
    }
}

/// One deterministic rewrite of the original request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Unique id within one generation run:
    /// `mut-<kind-kebab>[-<field>]-<counter>-<epoch-ms>`.
    pub id: String,
    /// The kind of defect this mutation probes for.
    #[serde(rename = "type")]
    pub kind: MutationKind,
    /// Human-readable description of the rewrite.
    pub description: String,
    /// The testing strategy this mutation belongs to.
    pub strategy: String,
    /// Name of the mutated location (field, header, or query parameter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_field: Option<String>,
    /// The rewritten request to issue against the target.
    pub modified_request: TargetRequest,
}
