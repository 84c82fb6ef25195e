// src/registry/recovery.rs
//! Corrective revocation entry construction.
//!
//! A corrective entry republishes revocation indices the wallet marked
//! revoked but the ledger never received. The pool's genesis transactions
//! identify the nodes the request is addressed to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::requests::{envelope, revoc_reg_entry_operation};
use crate::ledger::wire::{RevRegEntry, RevRegEntryValue};
use crate::ledger::LedgerError;
use crate::models::revocation::CL_ACCUM;

use super::identifiers::issuer_from_rev_reg_id;

/// Genesis transaction type of a validator node.
const NODE_TXN: &str = "0";

/// A computed, not yet submitted, corrective revocation entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveTransaction {
    pub rev_reg_id: String,
    pub author_did: String,
    /// Aliases of the pool nodes from the genesis transactions
    pub pool_nodes: Vec<String>,
    pub entry: RevRegEntry,
    /// Full `REVOC_REG_ENTRY` request, ready for signing
    pub request: Value,
}

/// Node aliases declared by newline-delimited genesis transactions.
///
/// # Errors
/// `LedgerError::Genesis` when a line is not JSON or no node transaction is present.
pub fn parse_genesis(genesis: &str) -> Result<Vec<String>, LedgerError> {
    let mut nodes = Vec::new();
    for (line_no, line) in genesis.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let txn: Value = serde_json::from_str(line)
            .map_err(|e| LedgerError::Genesis(format!("line {}: {e}", line_no + 1)))?;
        let txn = txn.get("txn").unwrap_or(&txn);
        if txn.get("type").and_then(Value::as_str) != Some(NODE_TXN) {
            continue;
        }
        let alias = txn
            .pointer("/data/data/alias")
            .and_then(Value::as_str)
            .unwrap_or("unnamed");
        nodes.push(alias.to_string());
    }

    if nodes.is_empty() {
        return Err(LedgerError::Genesis("no node transactions found".into()));
    }
    Ok(nodes)
}

/// Builds the entry republishing exactly `missed`.
///
/// `prev_accum` is the accumulator currently on the ledger, `accum` the one
/// the entry publishes. The request is authored by the registry's issuer.
pub fn build_corrective_transaction(
    genesis: &str,
    rev_reg_id: &str,
    missed: &[u32],
    prev_accum: Option<&str>,
    accum: &str,
) -> Result<CorrectiveTransaction, LedgerError> {
    let pool_nodes = parse_genesis(genesis)?;
    let author_did = issuer_from_rev_reg_id(rev_reg_id)
        .ok_or_else(|| {
            LedgerError::BadResponse(format!(
                "malformed revocation registry identifier: {rev_reg_id}"
            ))
        })?
        .to_string();

    let mut revoked = missed.to_vec();
    revoked.sort_unstable();
    revoked.dedup();

    let entry = RevRegEntry {
        ver: Some(crate::ledger::wire::OBJECT_VERSION.to_string()),
        value: RevRegEntryValue {
            prev_accum: prev_accum.map(str::to_string),
            accum: accum.to_string(),
            issued: Vec::new(),
            revoked,
        },
    };
    let request = envelope(&author_did, revoc_reg_entry_operation(rev_reg_id, CL_ACCUM, &entry));

    Ok(CorrectiveTransaction {
        rev_reg_id: rev_reg_id.to_string(),
        author_did,
        pool_nodes,
        entry,
        request,
    })
}
