// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Transaction-closure engine: reconstructs annotation publish transactions
//! from the event reader's recent log window and synthesizes the terminal
//! `PublishEnd` record upstream producers never emit. A transaction closes
//! when it satisfied the completeness criterion, or when a later successful
//! publish for the same uuid eclipsed it.

mod completeness;
mod emitter;
mod lookback;
pub mod scheduler;
mod supersession;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use core_types::events::CompletedTransaction;
use core_types::timefmt;
use event_reader_client::EventReader;
use log::error;

pub use emitter::{ClosureRecord, ClosureSink, LogClosureSink};

/// Engine façade owning the per-tick pipeline: lookback planning, the
/// completeness pass, and the supersession pass. Holds no state between
/// ticks; every pass re-derives everything from the event reader, so closures
/// are at-least-once and re-running over identical input re-emits the same
/// records.
pub struct MonitoringService {
    event_reader: Arc<dyn EventReader>,
    sink: Arc<dyn ClosureSink>,
    content_type: String,
    max_lookback_period: i64,
    superseded_check_period: i64,
}

impl MonitoringService {
    pub fn new(
        event_reader: Arc<dyn EventReader>,
        content_type: impl Into<String>,
        max_lookback_period: i64,
        superseded_check_period: i64,
    ) -> Self {
        Self::with_sink(
            event_reader,
            Arc::new(LogClosureSink),
            content_type,
            max_lookback_period,
            superseded_check_period,
        )
    }

    pub fn with_sink(
        event_reader: Arc<dyn EventReader>,
        sink: Arc<dyn ClosureSink>,
        content_type: impl Into<String>,
        max_lookback_period: i64,
        superseded_check_period: i64,
    ) -> Self {
        Self {
            event_reader,
            sink,
            content_type: content_type.into(),
            max_lookback_period,
            superseded_check_period,
        }
    }

    /// One full tick. Errors never escape: a failed transactions fetch aborts
    /// the tick, a failed supersession fetch aborts only that phase, and the
    /// next tick retries either way.
    pub async fn close_completed_transactions(&self) {
        let lookback = self.determine_lookback_period().await;

        let tids = match self
            .event_reader
            .get_transactions(&self.content_type.to_lowercase(), &minutes(lookback))
            .await
        {
            Ok(tids) => tids,
            Err(err) => {
                error!("Monitoring transactions has failed. {err}");
                return;
            }
        };

        let mut completed: Vec<CompletedTransaction> = tids
            .iter()
            .filter_map(|tid| completeness::evaluate_transaction(tid, &self.content_type))
            .collect();

        // the latest emitted record for a uuid must reflect the latest
        // successful publish; emit in ascending start order
        completed.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        let mut seen = HashSet::new();
        completed.retain(|tid| seen.insert(tid.transaction_id.clone()));

        let mut closed = Vec::with_capacity(completed.len());
        for tid in completed {
            match timefmt::duration_seconds(&tid.start_time, &tid.end_time) {
                Ok(duration_seconds) => {
                    self.sink.emit(ClosureRecord::finished(
                        &tid,
                        duration_seconds,
                        &self.content_type,
                    ));
                    closed.push(tid);
                }
                Err(err) => {
                    error!(
                        "Duration couldn't be determined, transaction won't be closed. transaction_id={} uuid={}: {err}",
                        tid.transaction_id, tid.uuid
                    );
                }
            }
        }

        self.close_superseded_transactions(&closed, lookback).await;
    }

    /// Adaptive window for the current tick: the age of the engine's own most
    /// recent closure plus a safety overlap, floored at ten minutes. A failed
    /// probe degrades to the configured maximum, which makes a cold start
    /// re-examine the whole window.
    pub async fn determine_lookback_period(&self) -> i64 {
        let event = match self
            .event_reader
            .get_latest_event(
                &self.content_type.to_lowercase(),
                &minutes(self.max_lookback_period),
            )
            .await
        {
            Ok(event) => event,
            Err(_) => return self.max_lookback_period,
        };

        lookback::lookback_from_latest(&event.time, Utc::now(), self.max_lookback_period)
    }

    /// Cross-transaction pass: for every uuid closed this tick, find earlier
    /// publish attempts that never reached a completeness event and close
    /// them against the completed transaction that eclipsed them. Queries a
    /// strictly wider window than the completeness pass so the eclipsed
    /// starts are actually in view.
    pub async fn close_superseded_transactions(
        &self,
        completed: &[CompletedTransaction],
        ref_interval: i64,
    ) {
        let mut uuids: Vec<String> = Vec::new();
        for tid in completed {
            if !uuids.contains(&tid.uuid) {
                uuids.push(tid.uuid.clone());
            }
        }
        if uuids.is_empty() {
            return;
        }

        let interval = minutes(ref_interval + self.superseded_check_period);
        let mut candidates = match self
            .event_reader
            .get_transactions_for_uuids(&self.content_type.to_lowercase(), &uuids, &interval)
            .await
        {
            Ok(tids) => tids,
            Err(err) => {
                error!("Checking for superseded transactions has failed. {err}");
                return;
            }
        };
        candidates.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        for ctid in completed {
            // collect processed candidates and drop them only after the scan;
            // removing mid-iteration skips the element after each hit
            let mut processed = Vec::new();

            for (index, utid) in candidates.iter().enumerate() {
                if utid.uuid != ctid.uuid {
                    continue;
                }

                // the completed transaction itself may come back when the
                // store lags behind the closure stream
                if utid.transaction_id == ctid.transaction_id {
                    processed.push(index);
                    continue;
                }

                let (is_earlier, start_time) =
                    supersession::earlier_transaction(utid, ctid, &self.content_type);
                if !is_earlier {
                    continue;
                }

                match timefmt::duration_seconds(&start_time, &ctid.end_time) {
                    Ok(duration_seconds) => {
                        self.sink.emit(ClosureRecord::superseded(
                            &utid.transaction_id,
                            &utid.uuid,
                            &start_time,
                            ctid,
                            duration_seconds,
                            &self.content_type,
                        ));
                        processed.push(index);
                    }
                    Err(err) => {
                        error!(
                            "Duration couldn't be determined, transaction won't be closed. transaction_id={} uuid={}: {err}",
                            utid.transaction_id, utid.uuid
                        );
                    }
                }
            }

            for index in processed.into_iter().rev() {
                candidates.remove(index);
            }
        }
    }
}

fn minutes(period: i64) -> String {
    format!("{period}m")
}
