// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::events::{CompletedTransaction, TransactionEvent};

use crate::completeness::START_EVENT;

/// Decides whether `candidate` is an annotation transaction whose publish
/// started strictly before `completed`, returning the witnessing start time.
/// Timestamps compare lexically; the last qualifying start event wins, same
/// tie-break as the completeness fold.
pub(crate) fn earlier_transaction(
    candidate: &TransactionEvent,
    completed: &CompletedTransaction,
    content_type: &str,
) -> (bool, String) {
    let mut is_annotation = false;
    let mut is_earlier = false;
    let mut start_time = String::new();

    for event in &candidate.events {
        if event.content_type == content_type {
            is_annotation = true;
        }
        if event.event == START_EVENT && event.time < completed.start_time {
            is_earlier = true;
            start_time = event.time.clone();
        }
    }

    (is_annotation && is_earlier, start_time)
}
