// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::events::{CompletedTransaction, TransactionEvent};

pub(crate) const START_EVENT: &str = "PublishStart";
pub(crate) const COMPLETENESS_CRITERIA_EVENT: &str = "SaveNeo4j";
pub(crate) const INFO_LEVEL: &str = "info";

/// Folds one transaction's event series into a completed record, if the
/// series holds everything the completeness criterion asks for: an annotation
/// marker, a `PublishStart`, an end event (`SaveNeo4j` at info level or a
/// failed-validation mapper event), and a mapper verdict either way.
///
/// Events arrive in no guaranteed order; when a role occurs more than once,
/// the last occurrence in iteration order wins.
pub(crate) fn evaluate_transaction(
    tid: &TransactionEvent,
    content_type: &str,
) -> Option<CompletedTransaction> {
    let mut start_time = String::new();
    let mut end_time = String::new();
    let mut is_valid = String::new();
    let mut is_annotation = false;

    for event in &tid.events {
        if event.content_type == content_type {
            is_annotation = true;
        }

        // batches can mix content types; only start events of the monitored
        // type count
        if event.event == START_EVENT && event.content_type == content_type {
            start_time = event.time.clone();
        } else if event.event == COMPLETENESS_CRITERIA_EVENT && event.level == INFO_LEVEL {
            end_time = event.time.clone();
        }

        // a failed validation closes the transaction at the mapper event
        match event.is_valid.as_deref() {
            Some("true") => is_valid = "true".to_string(),
            Some("false") => {
                is_valid = "false".to_string();
                end_time = event.time.clone();
            }
            _ => {}
        }
    }

    if !is_annotation || start_time.is_empty() || end_time.is_empty() || is_valid.is_empty() {
        return None;
    }

    Some(CompletedTransaction {
        transaction_id: tid.transaction_id.clone(),
        uuid: tid.uuid.clone(),
        start_time,
        end_time,
        is_valid,
    })
}
