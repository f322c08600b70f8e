//! Client for the fines, analysis and export endpoints of the violations
//! backend. Bodies are passed through as JSON without interpretation; the
//! session token goes out as a bearer header whenever one exists.

use crate::errors::FetchError;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Paging and status filter for the fines listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

/// Settles one fine on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinePayment {
    pub violation_idx: u64,
    pub fine_id: Value,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "cash".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    fn path(self) -> &'static str {
        match self {
            ExportFormat::Csv => "/api/export/csv",
            ExportFormat::Json => "/api/export/json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Shared connection pool, also used by the poller.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fines_summary(&self, bearer: Option<&str>) -> Result<Value, FetchError> {
        self.send(self.http.get(self.url("/api/fines/summary")), bearer).await
    }

    pub async fn fines(&self, query: &FinesQuery, bearer: Option<&str>) -> Result<Value, FetchError> {
        let mut params = vec![
            ("page", query.page.filter(|page| *page > 0).unwrap_or(1).to_string()),
            (
                "per_page",
                query
                    .per_page
                    .filter(|size| *size > 0)
                    .unwrap_or(DEFAULT_PER_PAGE)
                    .to_string(),
            ),
        ];
        if let Some(status) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("status", status.to_string()));
        }

        let request = self.http.get(self.url("/api/fines/all")).query(&params);
        self.send(request, bearer).await
    }

    pub async fn mark_fine_paid(
        &self,
        payment: &FinePayment,
        bearer: Option<&str>,
    ) -> Result<Value, FetchError> {
        let request = self.http.post(self.url("/api/fines/mark-paid")).json(payment);
        self.send(request, bearer).await
    }

    pub async fn analysis_overview(&self, bearer: Option<&str>) -> Result<Value, FetchError> {
        self.send(self.http.get(self.url("/api/analysis/overview")), bearer).await
    }

    pub async fn violation_types(&self, bearer: Option<&str>) -> Result<Value, FetchError> {
        self.send(self.http.get(self.url("/api/analysis/violation-types")), bearer)
            .await
    }

    pub async fn export(&self, format: ExportFormat, bearer: Option<&str>) -> Result<Value, FetchError> {
        self.send(self.http.get(self.url(format.path())), bearer).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, mut request: RequestBuilder, bearer: Option<&str>) -> Result<Value, FetchError> {
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        read_json(request.send().await?).await
    }
}

/// Rejects non-2xx answers, then parses the body as JSON.
pub(crate) async fn read_json(response: Response) -> Result<Value, FetchError> {
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Bytes,
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::json;

    async fn echo(uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        Json(json!({ "uri": uri.to_string(), "auth": auth, "body": body }))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fines_listing_sends_paging_status_and_bearer() {
        let base = serve(Router::new().fallback(echo)).await;
        let backend = BackendClient::new(Client::new(), &format!("{base}/"));

        let query = FinesQuery {
            page: Some(2),
            per_page: None,
            status: Some("pending".to_string()),
        };
        let echoed = backend.fines(&query, Some("tok")).await.unwrap();
        assert_eq!(echoed["uri"], "/api/fines/all?page=2&per_page=10&status=pending");
        assert_eq!(echoed["auth"], "Bearer tok");

        let echoed = backend.fines(&FinesQuery::default(), None).await.unwrap();
        assert_eq!(echoed["uri"], "/api/fines/all?page=1&per_page=10");
        assert_eq!(echoed["auth"], Value::Null);
    }

    #[tokio::test]
    async fn summary_analysis_and_export_hit_their_paths() {
        let base = serve(Router::new().fallback(echo)).await;
        let backend = BackendClient::new(Client::new(), &base);

        let summary = backend.fines_summary(Some("tok")).await.unwrap();
        assert_eq!(summary["uri"], "/api/fines/summary");
        let overview = backend.analysis_overview(None).await.unwrap();
        assert_eq!(overview["uri"], "/api/analysis/overview");
        let types = backend.violation_types(None).await.unwrap();
        assert_eq!(types["uri"], "/api/analysis/violation-types");
        let export = backend.export(ExportFormat::Csv, None).await.unwrap();
        assert_eq!(export["uri"], "/api/export/csv");
    }

    #[tokio::test]
    async fn mark_fine_paid_posts_payment_body() {
        let base = serve(Router::new().fallback(echo)).await;
        let backend = BackendClient::new(Client::new(), &base);

        let payment: FinePayment = serde_json::from_value(json!({ "violation_idx": 3, "fine_id": "F-9" })).unwrap();
        assert_eq!(payment.payment_method, "cash");

        let echoed = backend.mark_fine_paid(&payment, Some("tok")).await.unwrap();
        assert_eq!(echoed["uri"], "/api/fines/mark-paid");
        assert_eq!(
            echoed["body"],
            json!({ "violation_idx": 3, "fine_id": "F-9", "payment_method": "cash" })
        );
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let base = serve(Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR })).await;
        let backend = BackendClient::new(Client::new(), &base);

        let err = backend.fines_summary(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }

    #[test]
    fn export_format_parses_case_insensitively() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse("xml"), None);
    }
}
