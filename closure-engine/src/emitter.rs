// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::events::CompletedTransaction;
use core_types::timefmt;
use log::{error, info};
use serde::Serialize;

const END_EVENT: &str = "PublishEnd";
const MONITORING_FLAG: &str = "true";
const FINISHED_MESSAGE: &str = "Transaction has finished";

/// Synthetic `PublishEnd` record. Field names follow the closure-record
/// contract consumed downstream; `isValid` is omitted for superseded
/// closures, where the verdict at closure time is unknowable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureRecord {
    #[serde(rename = "@time")]
    pub at_time: String,
    #[serde(rename = "logTime")]
    pub log_time: String,
    pub event: String,
    pub transaction_id: String,
    pub uuid: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    pub transaction_duration: String,
    pub monitoring_event: String,
    #[serde(rename = "isValid", skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<String>,
    pub content_type: String,
    pub msg: String,
}

impl ClosureRecord {
    /// Primary closure for a transaction that met the completeness criterion.
    pub fn finished(
        tid: &CompletedTransaction,
        duration_seconds: f64,
        content_type: &str,
    ) -> Self {
        Self {
            at_time: tid.end_time.clone(),
            log_time: timefmt::now_rfc3339_nanos(),
            event: END_EVENT.to_string(),
            transaction_id: tid.transaction_id.clone(),
            uuid: tid.uuid.clone(),
            start_time: tid.start_time.clone(),
            end_time: tid.end_time.clone(),
            transaction_duration: format_duration(duration_seconds),
            monitoring_event: MONITORING_FLAG.to_string(),
            is_valid: Some(tid.is_valid.clone()),
            content_type: content_type.to_string(),
            msg: FINISHED_MESSAGE.to_string(),
        }
    }

    /// Closure for an earlier transaction eclipsed by `superseder`. Takes the
    /// superseder's end time as its own; carries no validation verdict.
    pub fn superseded(
        transaction_id: &str,
        uuid: &str,
        start_time: &str,
        superseder: &CompletedTransaction,
        duration_seconds: f64,
        content_type: &str,
    ) -> Self {
        Self {
            at_time: superseder.end_time.clone(),
            log_time: timefmt::now_rfc3339_nanos(),
            event: END_EVENT.to_string(),
            transaction_id: transaction_id.to_string(),
            uuid: uuid.to_string(),
            start_time: start_time.to_string(),
            end_time: superseder.end_time.clone(),
            transaction_duration: format_duration(duration_seconds),
            monitoring_event: MONITORING_FLAG.to_string(),
            is_valid: None,
            content_type: content_type.to_string(),
            msg: format!(
                "Transaction has been superseded by tid={}.",
                superseder.transaction_id
            ),
        }
    }
}

fn format_duration(seconds: f64) -> String {
    format!("{seconds}")
}

/// Sink for closure records. Only the tick worker writes to it.
pub trait ClosureSink: Send + Sync {
    fn emit(&self, record: ClosureRecord);
}

/// Production sink: one JSON object per record on the info log stream.
#[derive(Debug, Clone, Default)]
pub struct LogClosureSink;

impl ClosureSink for LogClosureSink {
    fn emit(&self, record: ClosureRecord) {
        match serde_json::to_string(&record) {
            Ok(line) => info!("{line}"),
            Err(err) => error!(
                "closure record for transaction_id={} could not be serialized: {err}",
                record.transaction_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> CompletedTransaction {
        CompletedTransaction {
            transaction_id: "tid1".to_string(),
            uuid: "uuid1".to_string(),
            start_time: "2017-09-22T11:45:47.23038034Z".to_string(),
            end_time: "2017-09-22T11:45:53.23038034Z".to_string(),
            is_valid: "true".to_string(),
        }
    }

    #[test]
    fn finished_record_serializes_with_wire_names() {
        let record = ClosureRecord::finished(&completed(), 6.0, "Annotations");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).expect("serializes"))
                .expect("round trip");

        assert_eq!(json["@time"], "2017-09-22T11:45:53.23038034Z");
        assert_eq!(json["event"], "PublishEnd");
        assert_eq!(json["transaction_id"], "tid1");
        assert_eq!(json["uuid"], "uuid1");
        assert_eq!(json["startTime"], "2017-09-22T11:45:47.23038034Z");
        assert_eq!(json["endTime"], "2017-09-22T11:45:53.23038034Z");
        assert_eq!(json["transaction_duration"], "6");
        assert_eq!(json["monitoring_event"], "true");
        assert_eq!(json["isValid"], "true");
        assert_eq!(json["content_type"], "Annotations");
        assert_eq!(json["msg"], "Transaction has finished");
        assert!(json["logTime"].is_string());
    }

    #[test]
    fn superseded_record_omits_is_valid_and_names_the_superseder() {
        let record = ClosureRecord::superseded(
            "tid1_2",
            "uuid1",
            "2017-09-22T11:45:47.23038034Z",
            &CompletedTransaction {
                end_time: "2017-09-22T12:00:49.23038034Z".to_string(),
                ..completed()
            },
            902.0,
            "Annotations",
        );
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).expect("serializes"))
                .expect("round trip");

        assert_eq!(json["transaction_id"], "tid1_2");
        assert_eq!(json["startTime"], "2017-09-22T11:45:47.23038034Z");
        assert_eq!(json["endTime"], "2017-09-22T12:00:49.23038034Z");
        assert_eq!(json["@time"], "2017-09-22T12:00:49.23038034Z");
        assert_eq!(json["transaction_duration"], "902");
        assert_eq!(json["msg"], "Transaction has been superseded by tid=tid1.");
        assert!(json.get("isValid").is_none());
    }

    #[test]
    fn duration_renders_shortest_decimal_form() {
        assert_eq!(format_duration(6.0), "6");
        assert_eq!(format_duration(2.5), "2.5");
        assert_eq!(format_duration(-3.0), "-3");
    }
}
