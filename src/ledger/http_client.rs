// src/ledger/http_client.rs
//! HTTP ledger gateway client.
//!
//! Talks to an indy-vdr-proxy style gateway that fronts a ledger pool:
//! - `GET  /genesis`                 pool genesis transactions
//! - `GET  /schema/{id}`             GET_SCHEMA reply
//! - `GET  /cred_def/{id}`           GET_CLAIM_DEF reply
//! - `GET  /rev_reg_def/{id}`        GET_REVOC_REG_DEF reply
//! - `GET  /rev_reg_delta/{id}`      GET_REVOC_REG_DELTA reply
//! - `POST /submit`                  write request, returns the ledger reply
//!
//! Replies are the raw ledger envelopes (`op` + `result` or `reason`).
//! Requests are submitted unsigned; the gateway holds the author key.
//! Retries are NOT built in, callers own retry policy.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::error::LedgerError;
use super::requests;
use super::wire::{
    LedgerCredDef, LedgerRevRegDef, LedgerSchema, RevRegDelta, RevRegDeltaValue, RevRegEntry,
    TxnReply, OBJECT_VERSION,
};
use super::Ledger;

/// Configuration for an HTTP ledger gateway.
#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    /// Base URL of the gateway (e.g. `http://localhost:3030`)
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl HttpLedgerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }
}

/// `Ledger` implementation backed by an HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpLedger {
    /// Creates a new gateway client.
    ///
    /// # Errors
    /// Returns `LedgerError::NotAvailable` if the base URL does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: HttpLedgerConfig) -> Result<Self, LedgerError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| {
                LedgerError::NotAvailable(format!("invalid ledger URL {}: {e}", config.base_url))
            })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::NotAvailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                LedgerError::NotAvailable(format!("ledger URL {} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_request(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &Url,
    ) -> Result<reqwest::Response, LedgerError> {
        let resp = request.send().await.map_err(|source| LedgerError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{endpoint} returned HTTP {status}: {body}"
            )));
        }
        Ok(resp)
    }

    /// GETs a read reply and returns its `result` section.
    async fn read(&self, segments: &[&str]) -> Result<Value, LedgerError> {
        let url = self.endpoint(segments)?;
        let resp = self.send_request(self.client.get(url.clone()), &url).await?;
        let reply: Value = resp.json().await.map_err(|source| LedgerError::Http {
            endpoint: url.to_string(),
            source,
        })?;
        reply_result(reply)
    }

    /// Submits a write request and returns its `result` section.
    async fn submit(&self, request: Value) -> Result<TxnReply, LedgerError> {
        log::debug!("Submitting ledger request: {}", request);
        let url = self.endpoint(&["submit"])?;
        let resp = self
            .send_request(self.client.post(url.clone()).json(&request), &url)
            .await?;
        let reply: Value = resp.json().await.map_err(|source| LedgerError::Http {
            endpoint: url.to_string(),
            source,
        })?;
        let result = reply_result(reply)?;
        serde_json::from_value(result)
            .map_err(|e| LedgerError::BadResponse(format!("write reply: {e}")))
    }
}

/// Extracts `result` from a ledger reply, mapping `REJECT`/`REQNACK`.
fn reply_result(reply: Value) -> Result<Value, LedgerError> {
    match reply.get("op").and_then(Value::as_str) {
        Some("REPLY") => reply
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::BadResponse("reply without result".into())),
        Some("REJECT") | Some("REQNACK") => Err(LedgerError::TransactionRejected {
            reason: reply
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string(),
        }),
        other => Err(LedgerError::BadResponse(format!("unexpected op {other:?}"))),
    }
}

/// `result.data`, with JSON-encoded strings decoded and nulls mapped to `None`.
fn result_data(result: &Value) -> Result<Option<Value>, LedgerError> {
    match result.get("data") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| LedgerError::BadResponse(format!("result data: {e}"))),
        Some(data) => Ok(Some(data.clone())),
    }
}

/// Conflict error carrying the ledger's copy of the object.
fn already_exists<T: serde::Serialize>(kind: &str, id: &str, existing: &T) -> LedgerError {
    match serde_json::to_value(existing) {
        Ok(existing) => LedgerError::ObjectAlreadyExists {
            message: format!("{kind} {id} already exists on the ledger"),
            id: id.to_string(),
            existing,
        },
        Err(e) => LedgerError::BadResponse(e.to_string()),
    }
}

fn seq_no(result: &Value) -> Option<u64> {
    result.get("seqNo").and_then(Value::as_u64)
}

fn string_field(value: &Value, field: &str) -> Result<String, LedgerError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LedgerError::BadResponse(format!("missing field {field}")))
}

fn schema_from_result(
    schema_id: &str,
    result: &Value,
) -> Result<Option<LedgerSchema>, LedgerError> {
    let seq_no = match seq_no(result) {
        Some(seq_no) => seq_no,
        None => return Ok(None),
    };
    let data = match result_data(result)? {
        Some(data) => data,
        None => return Ok(None),
    };
    let attr_names = data
        .get("attr_names")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    Ok(Some(LedgerSchema {
        ver: OBJECT_VERSION.to_string(),
        id: schema_id.to_string(),
        name: string_field(&data, "name")?,
        version: string_field(&data, "version")?,
        attr_names,
        seq_no: Some(seq_no),
    }))
}

fn cred_def_from_result(
    cred_def_id: &str,
    result: &Value,
) -> Result<Option<LedgerCredDef>, LedgerError> {
    let data = match result_data(result)? {
        Some(data) => data,
        None => return Ok(None),
    };
    let schema_ref = match result.get("ref") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(LedgerError::BadResponse("credential definition without ref".into())),
    };

    Ok(Some(LedgerCredDef {
        ver: OBJECT_VERSION.to_string(),
        id: cred_def_id.to_string(),
        schema_id: schema_ref,
        signature_type: string_field(result, "signature_type")?,
        tag: string_field(result, "tag")?,
        value: data,
    }))
}

fn delta_from_result(result: &Value) -> Result<Option<(RevRegDelta, u64)>, LedgerError> {
    let data = match result_data(result)? {
        Some(data) => data,
        None => return Ok(None),
    };
    let value = data.get("value").cloned().unwrap_or(Value::Null);
    let accum_to = value.get("accum_to");
    let indices = |field: &str| -> Result<Vec<u32>, LedgerError> {
        let ids = match value.get(field).and_then(Value::as_array) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        ids.iter()
            .filter_map(Value::as_u64)
            .map(|id| {
                u32::try_from(id).map_err(|_| {
                    LedgerError::BadResponse(format!("{field} index {id} out of range"))
                })
            })
            .collect()
    };

    let delta = RevRegDelta {
        ver: OBJECT_VERSION.to_string(),
        value: RevRegDeltaValue {
            prev_accum: value
                .pointer("/accum_from/value/accum")
                .and_then(Value::as_str)
                .map(str::to_string),
            accum: accum_to
                .and_then(|to| to.pointer("/value/accum"))
                .and_then(Value::as_str)
                .map(str::to_string),
            issued: indices("issued")?,
            revoked: indices("revoked")?,
        },
    };
    let timestamp = accum_to
        .and_then(|to| to.get("txnTime"))
        .and_then(Value::as_u64)
        .unwrap_or_default();
    Ok(Some((delta, timestamp)))
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn get_schema(&self, schema_id: &str) -> Result<Option<LedgerSchema>, LedgerError> {
        let result = self.read(&["schema", schema_id]).await?;
        schema_from_result(schema_id, &result)
    }

    async fn get_credential_definition(
        &self,
        cred_def_id: &str,
    ) -> Result<Option<LedgerCredDef>, LedgerError> {
        let result = self.read(&["cred_def", cred_def_id]).await?;
        cred_def_from_result(cred_def_id, &result)
    }

    async fn get_revoc_reg_def(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<LedgerRevRegDef>, LedgerError> {
        let result = self.read(&["rev_reg_def", rev_reg_id]).await?;
        match result_data(&result)? {
            Some(data) => serde_json::from_value(data).map(Some).map_err(|e| {
                LedgerError::BadResponse(format!("revocation registry definition: {e}"))
            }),
            None => Ok(None),
        }
    }

    async fn get_revoc_reg_delta(
        &self,
        rev_reg_id: &str,
    ) -> Result<Option<(RevRegDelta, u64)>, LedgerError> {
        let result = self.read(&["rev_reg_delta", rev_reg_id]).await?;
        delta_from_result(&result)
    }

    async fn send_schema(
        &self,
        schema: &LedgerSchema,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        if let Some(existing) = self.get_schema(&schema.id).await? {
            return Err(already_exists("Schema", &schema.id, &existing));
        }
        self.submit(requests::envelope(author_did, requests::schema_operation(schema)))
            .await
    }

    async fn send_credential_definition(
        &self,
        cred_def: &LedgerCredDef,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        if let Some(existing) = self.get_credential_definition(&cred_def.id).await? {
            return Err(already_exists("Credential definition", &cred_def.id, &existing));
        }
        self.submit(requests::envelope(author_did, requests::cred_def_operation(cred_def)))
            .await
    }

    async fn send_revoc_reg_def(
        &self,
        rev_reg_def: &LedgerRevRegDef,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        if let Some(existing) = self.get_revoc_reg_def(&rev_reg_def.id).await? {
            return Err(already_exists(
                "Revocation registry definition",
                &rev_reg_def.id,
                &existing,
            ));
        }
        let operation = requests::revoc_reg_def_operation(rev_reg_def);
        self.submit(requests::envelope(author_did, operation)).await
    }

    async fn send_revoc_reg_entry(
        &self,
        rev_reg_id: &str,
        revoc_def_type: &str,
        entry: &RevRegEntry,
        author_did: &str,
    ) -> Result<TxnReply, LedgerError> {
        let operation = requests::revoc_reg_entry_operation(rev_reg_id, revoc_def_type, entry);
        self.submit(requests::envelope(author_did, operation)).await
    }

    async fn genesis_txns(&self) -> Result<String, LedgerError> {
        let url = self.endpoint(&["genesis"])?;
        let resp = self.send_request(self.client.get(url.clone()), &url).await?;
        resp.text().await.map_err(|source| LedgerError::Http {
            endpoint: url.to_string(),
            source,
        })
    }
}
