// src/models/result.rs
//! Registration and resolution result types shared by every artifact kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::{CredDef, RevRegDef, RevStatusList, Schema};

/// The closed set of artifact kinds the registry handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Schema,
    CredentialDefinition,
    RevocationRegistryDefinition,
    RevocationStatusList,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "Schema"),
            Self::CredentialDefinition => write!(f, "Credential definition"),
            Self::RevocationRegistryDefinition => write!(f, "Revocation registry definition"),
            Self::RevocationStatusList => write!(f, "Revocation status list"),
        }
    }
}

/// Any artifact the registry can publish, tagged by kind.
///
/// Used where a single value must carry "one of" the artifacts, most
/// notably the existing ledger copy inside an already-exists error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "artifact", rename_all = "snake_case")]
pub enum Artifact {
    Schema(Schema),
    CredDef(CredDef),
    RevRegDef(RevRegDef),
    StatusList(RevStatusList),
}

/// State of a registration job.
///
/// `Finished` is the only state produced when this agent holds direct write
/// authority. `Wait` and `Action` belong to endorsed flows where another
/// party must co-sign and `job_id` identifies the pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Finished,
    Wait,
    Action,
    Failed,
}

/// Where an artifact was resolved from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<String>,
}

/// Ledger-assigned metadata of an artifact.
///
/// `seq_no` is the ledger transaction sequence number. Registration options
/// supplied by the caller are carried through in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(rename = "seqNo", skip_serializing_if = "Option::is_none")]
    pub seq_no: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtifactMetadata {
    pub fn with_seq_no(seq_no: u64) -> Self {
        Self {
            seq_no: Some(seq_no),
            extra: Map::new(),
        }
    }
}

/// Outcome of a registration, generic over the artifact kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult<T> {
    /// Pending transaction handle for endorsed flows; `None` when finished
    pub job_id: Option<String>,
    pub state: JobState,
    pub artifact_id: String,
    pub artifact: T,
    pub registration_metadata: Map<String, Value>,
    pub artifact_metadata: ArtifactMetadata,
}

impl<T> RegistrationResult<T> {
    /// Result of a write completed synchronously by this agent.
    pub fn finished(
        artifact_id: impl Into<String>,
        artifact: T,
        artifact_metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            job_id: None,
            state: JobState::Finished,
            artifact_id: artifact_id.into(),
            artifact,
            registration_metadata: Map::new(),
            artifact_metadata,
        }
    }
}
