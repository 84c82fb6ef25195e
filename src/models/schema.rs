// src/models/schema.rs
//! AnonCreds schema data model.
//!
//! A schema is a named, versioned list of attribute names an issuer can put
//! in a credential. Once written to the ledger it is immutable.

use serde::{Deserialize, Serialize};

use super::result::{ArtifactMetadata, ResolutionMetadata};

/// An AnonCreds schema.
///
/// # Fields
/// - `issuer_id`: DID of the schema author
/// - `name`: Human-readable schema name (e.g. "degree")
/// - `version`: Schema version string (e.g. "1.0")
/// - `attr_names`: Attribute names credentials under this schema carry
///
/// # Identifier
/// The ledger identifier is derived from the content alone:
/// ```text
/// <issuer_id>:2:<name>:<version>
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// DID of the issuer
    /// Example: "did:example:issuer1"
    pub issuer_id: String,

    /// Schema name
    pub name: String,

    /// Schema version
    pub version: String,

    /// Attribute names
    /// Example: ["name", "degree", "date"]
    pub attr_names: Vec<String>,
}

impl Schema {
    pub fn new(
        issuer_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        attr_names: Vec<String>,
    ) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            name: name.into(),
            version: version.into(),
            attr_names,
        }
    }
}

/// A schema resolved from the ledger together with its metadata.
///
/// `schema_metadata.seq_no` is the ledger-assigned sequence number that
/// credential definitions reference in their identifiers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetSchemaResult {
    pub schema: Schema,
    pub schema_id: String,
    pub resolution_metadata: ResolutionMetadata,
    pub schema_metadata: ArtifactMetadata,
}
