use authd::configuration::{get_configuration, DatabaseSettings};
use authd::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server =
        run(listener, connection_pool.clone(), configuration).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

async fn setup_user(app: &TestApp, email: &str) {
    sqlx::query("INSERT INTO account_types (name, is_default) VALUES ('standard', true)")
        .execute(&app.db_pool)
        .await
        .expect("Failed to seed default account type");

    let client = reqwest::Client::new();
    let response = client
        .post(&format!("{}/auth/register", &app.address))
        .json(&json!({
            "email": email,
            "password": "secret1",
            "first_name": "Test",
            "last_name": "User"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
}

async fn request_verify_token(app: &TestApp, email: &str) -> String {
    let client = reqwest::Client::new();
    let response = client
        .post(&format!("{}/auth/verify/token", &app.address))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["token"].as_str().expect("missing token").to_string()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn verify_token_request_returns_the_notification_tuple() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/verify/token", &app.address))
        .json(&json!({ "email": "test@example.com" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["first_name"], "Test");
    assert_eq!(body["last_name"], "User");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn verify_token_request_returns_404_for_unknown_email() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/verify/token", &app.address))
        .json(&json!({ "email": "unknown@example.com" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn confirm_marks_verified_and_cascades_to_sibling_tokens() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let first = request_verify_token(&app, "test@example.com").await;
    let second = request_verify_token(&app, "test@example.com").await;

    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": first }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_verified"], true);

    // Verification removed every outstanding verify token.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verify_tokens")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": second }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn confirm_succeeds_for_an_already_verified_user_with_a_fresh_token() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let token = request_verify_token(&app, "test@example.com").await;
    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // Requesting another token is refused once verified, so plant a
    // fresh one directly. Confirming it is idempotent, not an error.
    let user_id: uuid::Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind("test@example.com")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO verify_tokens (token, user_id, created_at, expires_at) \
         VALUES ($1, $2, now(), now() + interval '1 hour')",
    )
    .bind("leftover-token")
    .bind(user_id)
    .execute(&app.db_pool)
    .await
    .unwrap();

    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": "leftover-token" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_verified"], true);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn requesting_a_token_for_a_verified_user_returns_409() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let token = request_verify_token(&app, "test@example.com").await;
    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(&format!("{}/auth/verify/token", &app.address))
        .json(&json!({ "email": "test@example.com" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn confirm_with_an_unknown_token_returns_401() {
    let app = spawn_app().await;
    setup_user(&app, "test@example.com").await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/verify", &app.address))
        .json(&json!({ "token": "no-such-token" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}
