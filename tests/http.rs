use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    success: bool,
    completed: bool,
    completed_count: usize,
    goal_count: usize,
    completion_percentage: u8,
    current_strike: u32,
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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("reading_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
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
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_reading_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("SWEEP_ENABLED", "false")
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

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json(&self, client: &Client, path: &str) -> Value {
        let response = client.get(self.url(path)).send().await.unwrap();
        assert!(response.status().is_success(), "GET {path} failed: {}", response.status());
        response.json().await.unwrap()
    }

    async fn post(&self, client: &Client, path: &str, body: Value) -> reqwest::Response {
        client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn put_books(&self, client: &Client, user_id: u64, books: Value) {
        let response = client
            .put(self.url(&format!("/api/users/{user_id}/books")))
            .json(&json!({ "books": books }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    async fn toggle(&self, client: &Client, user_id: u64, index: i64) -> reqwest::Response {
        self.post(client, &format!("/api/users/{user_id}/toggle"), json!({ "index": index }))
            .await
    }
}

#[tokio::test]
async fn http_goals_then_toggle_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    server
        .put_books(
            &client,
            101,
            json!([
                { "id": 1, "title": "Middlemarch", "total_pages": 880, "current_page": 80, "status": "active" },
                { "id": 2, "title": "Piranesi", "total_pages": 272, "status": "active" },
                { "id": 3, "title": "Shelved", "total_pages": 100, "status": "on_shelf" }
            ]),
        )
        .await;

    let today = server.get_json(&client, "/api/users/101/goals").await;
    let goals = today["goals"].as_array().unwrap();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0]["start_page"], 80);
    assert_eq!(goals[0]["end_page"], 880);
    assert_eq!(today["progress"]["today_goal_count"], 2);
    assert_eq!(today["progress"]["today_tasks"], json!([false, false]));

    let first: ToggleResponse = server.toggle(&client, 101, 0).await.json().await.unwrap();
    assert!(first.success);
    assert!(first.completed);
    assert_eq!(first.completed_count, 1);
    assert_eq!(first.goal_count, 2);
    assert_eq!(first.completion_percentage, 50);
    assert_eq!(first.current_strike, 0);

    let second: ToggleResponse = server.toggle(&client, 101, 0).await.json().await.unwrap();
    assert!(!second.completed);
    assert_eq!(second.completed_count, 0);
    assert_eq!(second.completion_percentage, 0);
}

#[tokio::test]
async fn http_toggle_errors_leave_state_alone() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let missing = server.toggle(&client, 202, 0).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["success"], false);

    server
        .put_books(
            &client,
            202,
            json!([{ "id": 5, "title": "Emma", "total_pages": 400, "status": "active" }]),
        )
        .await;
    server.get_json(&client, "/api/users/202/goals").await;

    assert_eq!(server.toggle(&client, 202, 3).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.toggle(&client, 202, -1).await.status(), StatusCode::BAD_REQUEST);

    let today = server.get_json(&client, "/api/users/202/goals").await;
    assert_eq!(today["progress"]["today_tasks"], json!([false]));
    assert_eq!(today["progress"]["today_completed_count"], 0);
}

#[tokio::test]
async fn http_sweep_is_safe_on_the_same_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    server.get_json(&client, "/api/users/303/goals").await;

    let report: Value = server
        .post(&client, "/api/sweep", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert!(report["examined"].as_u64().unwrap() >= 1);
    assert_eq!(report["evaluated"], 0);
    assert_eq!(report["failed"], 0);
}

#[tokio::test]
async fn http_completed_book_shows_in_statistics() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    server
        .put_books(
            &client,
            404,
            json!([
                { "id": 1, "title": "Beloved", "total_pages": 320, "current_page": 300, "status": "active" },
                { "id": 2, "title": "Ulysses", "total_pages": 730, "status": "on_shelf" }
            ]),
        )
        .await;

    let completed = server
        .post(&client, "/api/users/404/books/1/complete", json!({}))
        .await;
    assert!(completed.status().is_success());

    let time = server
        .post(&client, "/api/users/404/track-time", json!({ "minutes": 25 }))
        .await;
    assert!(time.status().is_success());

    let stats = server.get_json(&client, "/api/users/404/statistics").await;
    assert_eq!(stats["total_books"], 2);
    assert_eq!(stats["completed_books"], 1);
    assert_eq!(stats["active_books"], 0);
    assert_eq!(stats["incomplete_books"], 1);
    assert_eq!(stats["completion_rate"], 50.0);
    assert_eq!(stats["average_daily_reading_minutes"], 25);

    let missing = server
        .post(&client, "/api/users/404/books/99/complete", json!({}))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_leaderboard_and_rank() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let tracked = server
        .post(&client, "/api/users/505/track-time", json!({ "minutes": 600 }))
        .await;
    assert!(tracked.status().is_success());

    let board = server
        .get_json(&client, "/api/leaderboard?period=daily&user_id=505")
        .await;
    assert_eq!(board["period"], "daily");
    assert_eq!(board["entries"][0]["user_id"], 505);
    assert_eq!(board["entries"][0]["rank"], 1);
    assert_eq!(board["entries"][0]["hours"], 10);
    assert_eq!(board["entries"][0]["is_current_user"], true);
    assert_eq!(board["user_rank"], 1);

    let rank = server.get_json(&client, "/api/users/505/rank?period=daily").await;
    assert_eq!(rank["rank"], 1);
    assert_eq!(rank["total_minutes"], 600);

    let unknown = client
        .get(server.url("/api/users/9999/rank"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let bad_period = client
        .get(server.url("/api/leaderboard?period=weekly"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_period.status(), StatusCode::BAD_REQUEST);
}
