// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Event-reader port and its Splunk-backed HTTP implementation.

use async_trait::async_trait;
use core_types::events::{PublishEvent, TransactionEvent};
use log::error;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

const TRANSACTIONS_PATH: &str = "transactions";
const EVENTS_PATH: &str = "events";
const UUID_PARAM: &str = "uuid";
const INTERVAL_PARAM: &str = "interval";
const LAST_EVENT_PARAM: &str = "lastEvent";

#[derive(Debug, Error)]
pub enum EventReaderError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
}

/// Source of transaction batches and latest-event probes.
///
/// Interval arguments are minute strings of the form `"1445m"`. Content types
/// are passed lower-cased by callers; the reader's paths are case sensitive.
#[async_trait]
pub trait EventReader: Send + Sync {
    async fn get_transactions(
        &self,
        content_type: &str,
        interval: &str,
    ) -> Result<Vec<TransactionEvent>, EventReaderError>;

    async fn get_transactions_for_uuids(
        &self,
        content_type: &str,
        uuids: &[String],
        interval: &str,
    ) -> Result<Vec<TransactionEvent>, EventReaderError>;

    async fn get_latest_event(
        &self,
        content_type: &str,
        interval: &str,
    ) -> Result<PublishEvent, EventReaderError>;
}

/// HTTP client for the Splunk event reader. Single-shot requests, no retries;
/// a failed call surfaces to the engine, which waits for the next tick.
#[derive(Debug, Clone)]
pub struct SplunkEventReader {
    client: Client,
    base_url: String,
}

impl SplunkEventReader {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, content_type: &str, resource: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            content_type,
            resource
        ))
    }
}

#[async_trait]
impl EventReader for SplunkEventReader {
    async fn get_transactions(
        &self,
        content_type: &str,
        interval: &str,
    ) -> Result<Vec<TransactionEvent>, EventReaderError> {
        self.get_transactions_for_uuids(content_type, &[], interval)
            .await
    }

    async fn get_transactions_for_uuids(
        &self,
        content_type: &str,
        uuids: &[String],
        interval: &str,
    ) -> Result<Vec<TransactionEvent>, EventReaderError> {
        let mut url = self.endpoint(content_type, TRANSACTIONS_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(INTERVAL_PARAM, interval);
            for uuid in uuids {
                query.append_pair(UUID_PARAM, uuid);
            }
        }

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Failed to retrieve transactions, url={url}: {err}");
                return Err(err.into());
            }
        };
        if response.status() != StatusCode::OK {
            error!(
                "Failed to retrieve transactions, url={url}, status_code={}",
                response.status()
            );
            return Err(EventReaderError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        match response.json::<Vec<TransactionEvent>>().await {
            Ok(tids) => Ok(tids),
            Err(err) => {
                error!("Error unmarshalling transaction log messages, url={url}: {err}");
                Err(err.into())
            }
        }
    }

    async fn get_latest_event(
        &self,
        content_type: &str,
        interval: &str,
    ) -> Result<PublishEvent, EventReaderError> {
        let mut url = self.endpoint(content_type, EVENTS_PATH)?;
        url.query_pairs_mut()
            .append_pair(INTERVAL_PARAM, interval)
            .append_pair(LAST_EVENT_PARAM, "true");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Failed to retrieve latest log event, url={url}: {err}");
                return Err(err.into());
            }
        };
        if response.status() != StatusCode::OK {
            error!(
                "Failed to retrieve latest log event, url={url}, status_code={}",
                response.status()
            );
            return Err(EventReaderError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        match response.json::<PublishEvent>().await {
            Ok(event) => Ok(event),
            Err(err) => {
                error!("Error unmarshalling latest publish event message, url={url}: {err}");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::{Bytes, Incoming};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    struct StubResponse {
        status: u16,
        body: &'static str,
        expected_path: &'static str,
        expected_query: &'static str,
    }

    async fn spawn_reader_stub(stub: StubResponse) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(socket);
                let status = stub.status;
                let body = stub.body;
                let expected_path = stub.expected_path;
                let expected_query = stub.expected_query;
                let service = service_fn(move |req: Request<Incoming>| async move {
                    assert_eq!(req.uri().path(), expected_path);
                    assert_eq!(req.uri().query().unwrap_or(""), expected_query);
                    Ok::<_, hyper::Error>(
                        Response::builder()
                            .status(status)
                            .body(Full::new(Bytes::from(body)))
                            .expect("stub response"),
                    )
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    eprintln!("stub connection error: {err:?}");
                }
            }
        });
        format!("http://{addr}")
    }

    fn reader(base_url: String) -> SplunkEventReader {
        SplunkEventReader::new(Client::new(), base_url)
    }

    #[tokio::test]
    async fn get_latest_event_hits_events_resource_with_last_event_flag() {
        let base = spawn_reader_stub(StubResponse {
            status: 200,
            body: r#"{"event":"PublishEnd","time":"2017-09-22T11:45:47.23038034Z"}"#,
            expected_path: "/annotations/events",
            expected_query: "interval=60m&lastEvent=true",
        })
        .await;

        let event = reader(base)
            .get_latest_event("annotations", "60m")
            .await
            .expect("latest event");
        assert_eq!(event.event, "PublishEnd");
        assert_eq!(event.time, "2017-09-22T11:45:47.23038034Z");
    }

    #[tokio::test]
    async fn get_latest_event_fails_on_server_error() {
        let base = spawn_reader_stub(StubResponse {
            status: 500,
            body: "",
            expected_path: "/annotations/events",
            expected_query: "interval=60m&lastEvent=true",
        })
        .await;

        let err = reader(base)
            .get_latest_event("annotations", "60m")
            .await
            .expect_err("500 must fail");
        assert!(matches!(
            err,
            EventReaderError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn get_latest_event_fails_on_malformed_body() {
        let base = spawn_reader_stub(StubResponse {
            status: 200,
            body: "Wrong body format",
            expected_path: "/annotations/events",
            expected_query: "interval=60m&lastEvent=true",
        })
        .await;

        let err = reader(base)
            .get_latest_event("annotations", "60m")
            .await
            .expect_err("decode must fail");
        assert!(matches!(err, EventReaderError::Request(_)));
    }

    #[tokio::test]
    async fn get_transactions_parses_reader_payload() {
        let base = spawn_reader_stub(StubResponse {
            status: 200,
            body: r#"[{"transaction_id":"tid1","uuid":"uuid1","events":[{"event":"PublishStart","time":"2017-09-22T11:45:47.23038034Z"}]}]"#,
            expected_path: "/annotations/transactions",
            expected_query: "interval=1445m",
        })
        .await;

        let tids = reader(base)
            .get_transactions("annotations", "1445m")
            .await
            .expect("transactions");
        assert_eq!(tids.len(), 1);
        assert_eq!(tids[0].transaction_id, "tid1");
        assert_eq!(tids[0].events[0].event, "PublishStart");
    }

    #[tokio::test]
    async fn get_transactions_for_uuids_repeats_uuid_parameter() {
        let base = spawn_reader_stub(StubResponse {
            status: 200,
            body: "[]",
            expected_path: "/annotations/transactions",
            expected_query: "interval=120m&uuid=uuid1&uuid=uuid2",
        })
        .await;

        let tids = reader(base)
            .get_transactions_for_uuids(
                "annotations",
                &["uuid1".to_string(), "uuid2".to_string()],
                "120m",
            )
            .await
            .expect("empty set");
        assert!(tids.is_empty());
    }

    #[tokio::test]
    async fn get_transactions_fails_on_server_error() {
        let base = spawn_reader_stub(StubResponse {
            status: 502,
            body: "",
            expected_path: "/annotations/transactions",
            expected_query: "interval=60m",
        })
        .await;

        let err = reader(base)
            .get_transactions("annotations", "60m")
            .await
            .expect_err("502 must fail");
        assert!(matches!(err, EventReaderError::Status { .. }));
    }
}
