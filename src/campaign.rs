use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::report::{Table, RECEIVED_RENAMES, SENT_RENAMES};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Error al consultar la API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Error al consultar la API: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A campaign id accepted by the query form: non-blank once trimmed.
///
/// The text is kept as typed and appended to the base URL as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignId(String);

impl CampaignId {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignReport {
    pub sent: Table,
    pub received: Table,
}

impl CampaignReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.received.is_empty()
    }
}

#[derive(Debug)]
pub enum QueryOutcome {
    /// Blank campaign id; nothing was requested.
    InvalidId,
    Failed(FetchError),
    /// The API answered but had no records.
    NoData,
    Loaded(CampaignReport),
}

impl QueryOutcome {
    /// Tables to show: a failure shows as no data.
    pub fn into_report(self) -> CampaignReport {
        match self {
            QueryOutcome::Loaded(report) => report,
            _ => CampaignReport::empty(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<CampaignData>,
}

#[derive(Deserialize)]
struct CampaignData {
    #[serde(default)]
    sends: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    receiveds: Option<Vec<Map<String, Value>>>,
}

pub struct CampaignClient {
    config: ApiConfig,
    http: Client,
}

impl CampaignClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn campaign_url(&self, campaign_id: &str) -> String {
        format!("{}{}", self.config.base_url, campaign_id)
    }

    /// Requests one campaign and normalizes its `sends` and `receiveds`.
    ///
    /// Callers are expected to have validated `campaign_id` already.
    pub fn fetch_campaign(&self, campaign_id: &str) -> Result<CampaignReport, FetchError> {
        let url = self.campaign_url(campaign_id);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.pass))
            .header(CONTENT_TYPE, "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        let data = envelope.data.unwrap_or(CampaignData {
            sends: None,
            receiveds: None,
        });

        let sends = data.sends.unwrap_or_default();
        let receiveds = data.receiveds.unwrap_or_default();
        tracing::debug!(
            "campaign {}: {} sends, {} receiveds",
            campaign_id,
            sends.len(),
            receiveds.len()
        );

        Ok(CampaignReport {
            sent: Table::from_records(&sends, SENT_RENAMES),
            received: Table::from_records(&receiveds, RECEIVED_RENAMES),
        })
    }

    /// Validates the raw form input, then fetches.
    pub fn query(&self, raw_id: &str) -> QueryOutcome {
        let Some(campaign_id) = CampaignId::parse(raw_id) else {
            return QueryOutcome::InvalidId;
        };

        match self.fetch_campaign(campaign_id.as_str()) {
            Ok(report) if report.is_empty() => QueryOutcome::NoData,
            Ok(report) => QueryOutcome::Loaded(report),
            Err(e) => {
                tracing::warn!("campaign {} failed: {}", campaign_id.as_str(), e);
                QueryOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, ErrorKind, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serves one canned HTTP response and hands back the request head.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/campaigns/", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(&stream);
            let mut head = String::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            stream.write_all(response.as_bytes()).unwrap();
            head
        });

        (base_url, handle)
    }

    fn client(base_url: &str) -> CampaignClient {
        CampaignClient::new(ApiConfig {
            base_url: base_url.to_string(),
            user: "svc".to_string(),
            pass: "secret".to_string(),
        })
    }

    #[test]
    fn test_campaign_id_parse() {
        assert_eq!(CampaignId::parse(""), None);
        assert_eq!(CampaignId::parse("   \t\n"), None);
        assert_eq!(CampaignId::parse(" 42 ").unwrap().as_str(), " 42 ");
    }

    #[test]
    fn test_fetch_sent_records() {
        let body = json!({
            "data": {
                "sends": [{
                    "phone": "5551234",
                    "text": "hi",
                    "send_at": "2024-01-01T00:00:00",
                    "status": "sent",
                    "carrier": "X",
                    "credit": 1
                }],
                "receiveds": []
            }
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", &body);

        let report = client(&base_url).fetch_campaign("42").unwrap();
        let head = server.join().unwrap();

        assert!(head.starts_with("GET /campaigns/42 HTTP/1.1"));
        let header = |name: &str| {
            head.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_string())
            })
        };
        // svc:secret
        assert_eq!(header("authorization").as_deref(), Some("Basic c3ZjOnNlY3JldA=="));
        assert_eq!(header("content-type").as_deref(), Some("application/json"));

        let sent = &report.sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent.get(0, "celular"), Some(&json!("5551234")));
        assert_eq!(sent.get(0, "mensaje"), Some(&json!("hi")));
        assert_eq!(sent.get(0, "fecha_envio"), Some(&json!("2024-01-01T00:00:00")));
        assert_eq!(sent.get(0, "estado"), Some(&json!("sent")));
        assert_eq!(sent.get(0, "operadora"), Some(&json!("X")));
        assert_eq!(sent.get(0, "credito"), Some(&json!(1)));
        assert!(report.received.is_empty());
    }

    #[test]
    fn test_fetch_missing_receiveds_key() {
        let body = json!({
            "data": {"sends": [{"phone": "1", "text": "a"}, {"phone": "2", "text": "b"}]}
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", &body);

        let report = client(&base_url).fetch_campaign("7").unwrap();
        server.join().unwrap();

        assert_eq!(report.sent.len(), 2);
        assert_eq!(report.sent.get(1, "celular"), Some(&json!("2")));
        assert!(report.received.is_empty());
        assert!(report.received.columns().is_empty());
    }

    #[test]
    fn test_fetch_missing_data_key() {
        let (base_url, server) = serve_once("200 OK", "{}");
        let report = client(&base_url).fetch_campaign("7").unwrap();
        server.join().unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_fetch_non_200_status() {
        let (base_url, server) = serve_once("404 Not Found", "not found");
        let err = client(&base_url).fetch_campaign("missing").unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, FetchError::Status { code: 404, .. }));
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_fetch_malformed_body() {
        let (base_url, server) = serve_once("200 OK", "<html>oops</html>");
        let err = client(&base_url).fetch_campaign("1").unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.to_string().starts_with("Error al consultar la API:"));
    }

    #[test]
    fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}/", addr))
            .fetch_campaign("1")
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_query_blank_id_sends_nothing() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let client = client(&base_url);

        for raw in ["", "   ", "\t\n"] {
            assert!(matches!(client.query(raw), QueryOutcome::InvalidId));
        }

        let err = listener.accept().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn test_query_outcomes() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"data": {"sends": [], "receiveds": []}}"#);
        assert!(matches!(client(&base_url).query("5"), QueryOutcome::NoData));
        server.join().unwrap();

        let (base_url, server) = serve_once("500 Internal Server Error", "boom");
        let outcome = client(&base_url).query("5");
        server.join().unwrap();
        assert!(matches!(outcome, QueryOutcome::Failed(FetchError::Status { code: 500, .. })));
        assert!(outcome.into_report().is_empty());

        let body = json!({
            "data": {"receiveds": [{"phone": "9", "content": "SI", "received_at": "t"}]}
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", &body);
        let outcome = client(&base_url).query("5");
        server.join().unwrap();
        let report = match outcome {
            QueryOutcome::Loaded(report) => report,
            other => panic!("expected loaded report, got {:?}", other),
        };
        assert!(report.sent.is_empty());
        assert_eq!(report.received.get(0, "respuesta"), Some(&json!("SI")));
    }
}
