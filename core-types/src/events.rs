// Copyright (c) James Kassemi, SC, US. All rights reserved.

use serde::{Deserialize, Serialize};

/// One structured log record ingested from the event reader.
///
/// `time` is RFC3339 with optional fractional seconds; the `@time` alias is
/// accepted because older reader deployments emit that key instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishEvent {
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub event: String,
    #[serde(rename = "isValid", default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<String>,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub monitoring_event: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(rename = "time", alias = "@time", default)]
    pub time: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub uuid: String,
}

/// Event grouping returned by the reader, keyed by transaction id.
///
/// `start_time` is an aggregate the source computes for sorting; the order of
/// `events` within a transaction carries no guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub closed_txn: String,
    #[serde(rename = "eventcount", default)]
    pub event_count: i64,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub events: Vec<PublishEvent>,
}

/// A transaction that satisfied the completeness criterion during a tick.
/// Lives only for the duration of that tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedTransaction {
    pub transaction_id: String,
    pub uuid: String,
    pub start_time: String,
    pub end_time: String,
    pub is_valid: String,
}
