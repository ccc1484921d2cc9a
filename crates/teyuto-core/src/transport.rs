//! Outbound report delivery
//!
//! [`HttpTransport`] posts reports to the analytics API with either encoding
//! profile. [`MemoryTransport`] keeps them in memory for dry runs and tests.

use crate::{
    config::{ReportEncoding, ReporterConfig},
    payload::{parse_enter_response, EnterReport, Report, UpdateReport},
    ActionToken, Error, Result,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{header::AUTHORIZATION, multipart::Form, Client, Request};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;
use url::Url;

/// Header carrying the tenant channel
pub const CHANNEL_HEADER: &str = "channel";

/// Delivery of reports to the analytics endpoint
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Send an `action_enter` report and return the assigned action token
    async fn enter(&self, report: &EnterReport) -> Result<ActionToken>;

    /// Send an `action_update` report; the response is ignored
    async fn update(&self, report: &UpdateReport) -> Result<()>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    channel: String,
    token: Option<String>,
    encoding: ReportEncoding,
}

impl HttpTransport {
    /// Build a transport from a validated configuration
    pub fn new(config: &ReporterConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url()?,
            channel: config.channel.clone(),
            token: config.token.clone(),
            encoding: config.encoding,
        })
    }

    /// Endpoint for a report function: `{base}/video/?f={function}`
    pub fn endpoint(&self, function: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("api_url is not a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("video")
            .push("");
        url.set_query(Some(&format!("f={function}")));
        Ok(url)
    }

    /// Build the HTTP request for a report without sending it
    pub fn build_request(&self, report: &Report) -> Result<Request> {
        match report {
            Report::Enter(r) => self.request(report.function(), r, r.form_fields()),
            Report::Update(r) => self.request(report.function(), r, r.form_fields()),
        }
    }

    fn request<P: Serialize>(
        &self,
        function: &str,
        payload: &P,
        fields: Vec<(&'static str, String)>,
    ) -> Result<Request> {
        let mut builder = self
            .client
            .post(self.endpoint(function)?)
            .header(CHANNEL_HEADER, &self.channel);

        builder = match self.encoding {
            ReportEncoding::Json => {
                let builder = builder.json(payload);
                match &self.token {
                    Some(token) => builder.header(AUTHORIZATION, token),
                    None => builder,
                }
            }
            ReportEncoding::Multipart => {
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                let builder = builder.multipart(form);
                match &self.token {
                    Some(token) => builder.bearer_auth(token),
                    None => builder,
                }
            }
        };

        Ok(builder.build()?)
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn enter(&self, report: &EnterReport) -> Result<ActionToken> {
        let request = self.build_request(&Report::Enter(report.clone()))?;
        let response = self.client.execute(request).await?.error_for_status()?;
        let body = response.bytes().await?;
        let token = parse_enter_response(&body)?;

        debug!(video_id = %report.id, action = %token, "Enter acknowledged");
        Ok(token)
    }

    async fn update(&self, report: &UpdateReport) -> Result<()> {
        let request = self.build_request(&Report::Update(report.clone()))?;
        self.client.execute(request).await?.error_for_status()?;
        Ok(())
    }
}

/// In-memory transport
///
/// Records every report and answers enters with increasing numeric action
/// tokens starting at 1.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    reports: Mutex<Vec<Report>>,
    next_action: AtomicU64,
    reject_enters: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer enters with an empty response until switched back
    pub fn reject_enters(&self, reject: bool) {
        self.reject_enters.store(reject, Ordering::SeqCst);
    }

    /// All reports in send order
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    pub fn enters(&self) -> Vec<EnterReport> {
        self.reports
            .lock()
            .iter()
            .filter_map(|r| match r {
                Report::Enter(e) => Some(e.clone()),
                Report::Update(_) => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<UpdateReport> {
        self.reports
            .lock()
            .iter()
            .filter_map(|r| match r {
                Report::Update(u) => Some(u.clone()),
                Report::Enter(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

#[async_trait]
impl ReportTransport for MemoryTransport {
    async fn enter(&self, report: &EnterReport) -> Result<ActionToken> {
        self.reports.lock().push(Report::Enter(report.clone()));

        if self.reject_enters.load(Ordering::SeqCst) {
            return Err(Error::InvalidResponse("empty enter response".to_string()));
        }

        let action = self.next_action.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ActionToken::new(action))
    }

    async fn update(&self, report: &UpdateReport) -> Result<()> {
        self.reports.lock().push(Report::Update(report.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VideoId;
    use reqwest::header::CONTENT_TYPE;

    fn enter_report() -> Report {
        Report::Enter(EnterReport {
            id: VideoId::new("v42"),
            time: 3.5,
            first_time: true,
        })
    }

    #[test]
    fn test_endpoint() {
        let transport = HttpTransport::new(&ReporterConfig::new("c1")).unwrap();
        assert_eq!(
            transport.endpoint("action_enter").unwrap().as_str(),
            "https://api.teyuto.tv/v1/video/?f=action_enter"
        );

        let config = ReporterConfig::new("c1").with_api_url("http://localhost:8080/v1/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint("action_update").unwrap().as_str(),
            "http://localhost:8080/v1/video/?f=action_update"
        );
    }

    #[test]
    fn test_json_request() {
        let config = ReporterConfig::new("c1").with_token("secret");
        let transport = HttpTransport::new(&config).unwrap();
        let request = transport.build_request(&enter_report()).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.headers()[CHANNEL_HEADER], "c1");
        assert_eq!(request.headers()[AUTHORIZATION], "secret");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(value, serde_json::json!({ "id": "v42", "time": 3.5, "firstTime": 1 }));
    }

    #[test]
    fn test_json_request_without_token() {
        let transport = HttpTransport::new(&ReporterConfig::new("c1")).unwrap();
        let request = transport.build_request(&enter_report()).unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.headers()[CHANNEL_HEADER], "c1");
    }

    #[test]
    fn test_multipart_request() {
        let config = ReporterConfig::new("c1")
            .with_token("secret")
            .with_encoding(ReportEncoding::Multipart);
        let transport = HttpTransport::new(&config).unwrap();
        let request = transport.build_request(&enter_report()).unwrap();

        assert_eq!(request.headers()[CHANNEL_HEADER], "c1");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer secret");
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    /// Accept one request on `listener`, answer 200 and return what was sent
    async fn capture_request(listener: tokio::net::TcpListener) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            // closing multipart boundary
            if raw.ends_with(b"--\r\n") {
                break;
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await
            .unwrap();
        String::from_utf8(raw).unwrap()
    }

    #[tokio::test]
    async fn test_multipart_update_fields() {
        std::env::set_var("NO_PROXY", "127.0.0.1");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(capture_request(listener));

        let config = ReporterConfig::new("c1")
            .with_api_url(format!("http://{addr}/v1"))
            .with_encoding(ReportEncoding::Multipart);
        let transport = HttpTransport::new(&config).unwrap();
        let report = UpdateReport {
            id: VideoId::new("v42"),
            time: 61.5,
            action: Some(ActionToken::new(7)),
            end: true,
            sp: 2.5,
        };
        transport.update(&report).await.unwrap();

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/video/?f=action_update HTTP/1.1\r\n"));
        assert!(raw.to_lowercase().contains("\r\nchannel: c1\r\n"));
        for (name, value) in [
            ("id", "v42"),
            ("time", "61.5"),
            ("action", "7"),
            ("end", "1"),
            ("sp", "2.5"),
        ] {
            let part = format!("name=\"{name}\"\r\n\r\n{value}\r\n");
            assert!(raw.contains(&part), "form field {name} missing from:\n{raw}");
        }
    }

    #[test]
    fn test_http_transport_requires_channel() {
        assert!(matches!(
            HttpTransport::new(&ReporterConfig::default()),
            Err(Error::MissingChannel)
        ));
    }

    #[tokio::test]
    async fn test_memory_transport() {
        let transport = MemoryTransport::new();
        let enter = EnterReport {
            id: VideoId::new("v1"),
            time: 0.0,
            first_time: true,
        };

        assert_eq!(transport.enter(&enter).await.unwrap(), ActionToken::new(1));
        assert_eq!(transport.enter(&enter).await.unwrap(), ActionToken::new(2));

        transport.reject_enters(true);
        assert!(transport.enter(&enter).await.is_err());
        assert_eq!(transport.enters().len(), 3);
        assert!(transport.updates().is_empty());
    }
}
