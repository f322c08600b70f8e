use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Violation {
    id: serde_json::Value,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    fine: u64,
    status: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    total_violations: u64,
    pending_count: u64,
    paid_sum: u64,
    due_sum: u64,
}

#[derive(Debug, Deserialize)]
struct Health {
    violations: usize,
}

#[derive(Debug, Deserialize)]
struct MarkPaid {
    matched: bool,
    status: Option<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("traffic_eye_http_{tag}_{}_{}.json", std::process::id(), nanos));
    path
}

fn write_feed() -> std::path::PathBuf {
    let path = unique_path("feed");
    let feed = json!({
        "data": [
            { "id": 1, "name": "Asha", "license_plate": "KA01AB1234", "violation": "over speed",
              "area": "MG Road", "timestamp": "2026-03-02 10:15:00", "fine": 1000 },
            { "id": 2, "name": "Ravi, \"RK\"", "vehicle_no": "KA05MN4321", "type": "rlv",
              "area": "Silk Board", "timestamp": "2026-03-09 18:40:00", "status": "Overdue" },
            { "id": 3, "violation": "parking", "status": "Paid", "fine": 250 }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&feed).unwrap()).unwrap();
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                if let Ok(health) = resp.json::<Health>().await {
                    if health.violations == 3 {
                        return;
                    }
                }
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_traffic_eye"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_path("storage"))
        .env("TRAFFIC_SOURCE", "file")
        .env("TRAFFIC_DATA_PATH", write_feed())
        .env("REFRESH_INTERVAL_SECS", "3600")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn login(client: &Client, base_url: &str) {
    let response = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({ "identifier": "admin@traffic.ai", "secret": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn http_protected_routes_require_session() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    client
        .post(format!("{}/api/auth/logout", server.base_url))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/api/violations", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/dashboard", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/login");

    let response = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "identifier": "admin@traffic.ai", "secret": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn http_lists_normalized_violations_with_filters() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let all: Vec<Violation> = client
        .get(format!("{}/api/violations", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].kind, "Overspeeding");
    assert_eq!(all[1].kind, "Red Light Jump");
    assert_eq!(all[2].kind, "Other");
    assert_eq!(all[2].name, "N/A");
    assert_eq!(all[1].fine, 500);

    let overdue: Vec<Violation> = client
        .get(format!("{}/api/violations?status=Overdue", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, json!(2));

    let searched: Vec<Violation> = client
        .get(format!("{}/api/violations?search=mg%20road", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].name, "Asha");
}

#[tokio::test]
async fn http_mark_paid_updates_summary() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let missing: MarkPaid = client
        .post(format!("{}/api/violations/404/paid", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!missing.matched);

    for _ in 0..2 {
        let paid: MarkPaid = client
            .post(format!("{}/api/violations/1/paid", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(paid.matched);
        assert_eq!(paid.status.as_deref(), Some("Paid"));
    }

    let summary: Summary = client
        .get(format!("{}/api/summary", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary.total_violations, 3);
    assert_eq!(summary.pending_count, 1);
    assert_eq!(summary.paid_sum, 1250);
    assert_eq!(summary.due_sum, 500);

    let record: Violation = client
        .get(format!("{}/api/violations/1", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record.status, "Paid");
}

#[tokio::test]
async fn http_csv_export_is_an_attachment_with_bom() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let response = client
        .get(format!("{}/api/export/violations.csv", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("all_violations_report.csv"));

    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..3], &[0xEF, 0xBB, 0xBF]);
    let text = std::str::from_utf8(&body[3..]).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert!(lines[0].starts_with("\"ID\",\"Violator Name\""));
    assert!(lines[2].starts_with("\"2\",\"Ravi, \"\"RK\"\"\""));

    let areas = client
        .get(format!("{}/api/export/areas.csv", server.base_url))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let areas = std::str::from_utf8(&areas[3..]).unwrap();
    assert!(areas.starts_with("\"Area\",\"Total Violations\"\r\n"));
}

#[tokio::test]
async fn http_analysis_reports_monthly_series() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    login(&client, &server.base_url).await;

    let analysis: serde_json::Value = client
        .get(format!("{}/api/analysis", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let counts = analysis["monthly"]["counts"].as_array().unwrap();
    assert_eq!(counts.len(), 12);
    assert!(counts[2].as_u64().unwrap() >= 2);
    assert_eq!(analysis["by_area"][0]["name"], "MG Road");
}
