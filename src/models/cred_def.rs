// src/models/cred_def.rs
//! Credential definition data model.

use serde::{Deserialize, Serialize};

use super::result::{ArtifactMetadata, ResolutionMetadata};

/// Signature type used when a credential definition does not name one.
pub const DEFAULT_SIGNATURE_TYPE: &str = "CL";

/// Tag used when a credential definition does not name one.
pub const DEFAULT_CRED_DEF_TAG: &str = "default";

fn default_signature_type() -> String {
    DEFAULT_SIGNATURE_TYPE.to_string()
}

fn default_tag() -> String {
    DEFAULT_CRED_DEF_TAG.to_string()
}

/// Issuer-specific public key material bound to a schema.
///
/// The `value` carries the primary (and optionally revocation) public keys
/// exactly as produced by the issuer; the registry never inspects it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredDef {
    /// DID of the issuer
    pub issuer_id: String,

    /// Identifier of the schema this definition is bound to
    pub schema_id: String,

    /// Signature scheme, `"CL"` unless stated otherwise
    #[serde(rename = "type", default = "default_signature_type")]
    pub signature_type: String,

    /// Distinguishes several definitions over one schema
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Public key material
    pub value: serde_json::Value,
}

impl CredDef {
    /// Signature type with the `"CL"` default applied to blank values.
    pub fn signature_type_or_default(&self) -> &str {
        if self.signature_type.is_empty() {
            DEFAULT_SIGNATURE_TYPE
        } else {
            &self.signature_type
        }
    }

    /// Tag with the `"default"` default applied to blank values.
    pub fn tag_or_default(&self) -> &str {
        if self.tag.is_empty() {
            DEFAULT_CRED_DEF_TAG
        } else {
            &self.tag
        }
    }
}

/// A credential definition resolved from the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetCredDefResult {
    pub credential_definition: CredDef,
    pub credential_definition_id: String,
    pub resolution_metadata: ResolutionMetadata,
    pub credential_definition_metadata: ArtifactMetadata,
}
