// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Admin surface: FT-style health and good-to-go endpoints backed by an
//! event-reader reachability probe.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::warn;
use serde::Serialize;
use tokio::net::TcpListener;

use core_types::config::AppConfig;

pub const HEALTH_PATH: &str = "/__health";
pub const GTG_PATH: &str = "/__gtg";

const APP_DESCRIPTION: &str = "Service responsible for monitoring annotations publishes.";
const PANIC_GUIDE: &str = "https://dewey.ft.com/annotations-monitoring-service.html";
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AdminServer {
    app_name: String,
    app_system_code: String,
    event_reader_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct HealthReport {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    #[serde(rename = "systemCode")]
    system_code: String,
    name: String,
    description: String,
    ok: bool,
    checks: Vec<CheckResult>,
}

#[derive(Serialize)]
struct CheckResult {
    name: String,
    ok: bool,
    severity: u8,
    #[serde(rename = "businessImpact")]
    business_impact: String,
    #[serde(rename = "technicalSummary")]
    technical_summary: String,
    #[serde(rename = "panicGuide")]
    panic_guide: String,
    #[serde(rename = "checkOutput")]
    check_output: String,
}

impl AdminServer {
    pub fn new(config: &AppConfig, client: reqwest::Client) -> Self {
        Self {
            app_name: config.app_name.clone(),
            app_system_code: config.app_system_code.clone(),
            event_reader_url: config.event_reader_url.clone(),
            client,
        }
    }

    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        loop {
            let (socket, _) = listener.accept().await?;
            let io = TokioIo::new(socket);
            let server = Arc::clone(&self);
            let service = service_fn(move |req| {
                let server = Arc::clone(&server);
                async move { server.handle(req).await }
            });
            tokio::spawn(async move {
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!("admin connection error: {err:?}");
                }
            });
        }
    }

    async fn handle(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let response = match req.uri().path() {
            HEALTH_PATH => self.health_response().await,
            GTG_PATH => self.gtg_response().await,
            _ => plain_response(StatusCode::NOT_FOUND, "not found"),
        };
        Ok(response)
    }

    async fn health_response(&self) -> Response<Full<Bytes>> {
        let check = self.event_reader_check().await;
        let report = HealthReport {
            schema_version: 1,
            system_code: self.app_system_code.clone(),
            name: self.app_name.clone(),
            description: APP_DESCRIPTION.to_string(),
            ok: check.ok,
            checks: vec![check],
        };
        match serde_json::to_string(&report) {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .unwrap_or_else(|_| plain_response(StatusCode::OK, "{}")),
            Err(err) => plain_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("health report serialization failed: {err}"),
            ),
        }
    }

    async fn gtg_response(&self) -> Response<Full<Bytes>> {
        match self.probe_event_reader().await {
            Ok(()) => plain_response(StatusCode::OK, "OK"),
            Err(output) => plain_response(StatusCode::SERVICE_UNAVAILABLE, output),
        }
    }

    async fn event_reader_check(&self) -> CheckResult {
        let (ok, check_output) = match self.probe_event_reader().await {
            Ok(()) => (true, "Splunk event reader is healthy".to_string()),
            Err(output) => (false, output),
        };
        CheckResult {
            name: "Event reader availability healthcheck".to_string(),
            ok,
            severity: 1,
            business_impact:
                "Event reader is not available, the success of an annotation publish can't be determined."
                    .to_string(),
            technical_summary: "Splunk event reader is not reachable.".to_string(),
            panic_guide: PANIC_GUIDE.to_string(),
            check_output,
        }
    }

    async fn probe_event_reader(&self) -> Result<(), String> {
        let url = format!("{}{}", self.event_reader_url.trim_end_matches('/'), GTG_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|err| format!("Error executing request for url={url}: {err}"))?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(format!(
                "Connecting to {url} was not successful. Status: {}",
                response.status()
            ));
        }
        Ok(())
    }
}

fn plain_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
