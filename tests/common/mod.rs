#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use foodgram::config::Config;
use foodgram::services::users::{self, Registration};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tempfile::TempDir;

/// 1x1 transparent PNG.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub media: TempDir,
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub cookie: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let media = TempDir::new().expect("Failed to create media dir");
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            media_root: media.path().to_path_buf(),
            public_url: url::Url::parse("http://testserver").unwrap(),
            secure_cookies: false,
        };

        let router = foodgram::build_app(pool.clone(), config)
            .await
            .expect("Failed to build app");

        Self {
            router,
            db: pool,
            media,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Register a user with `username@example.com` and the shared test
    /// password, then log them in.
    pub async fn signed_in(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let user = users::register(
            &self.db,
            Registration {
                email: Some(email.clone()),
                username: Some(username.to_string()),
                first_name: Some(capitalize(username)),
                last_name: Some("Tester".to_string()),
                password: Some(PASSWORD.to_string()),
            },
        )
        .await
        .expect("Failed to create test user");

        let cookie = self.login(&email, PASSWORD).await;
        TestUser {
            id: user.id,
            email,
            cookie,
        }
    }

    /// Log in and return the session cookie string.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .post_json(
                "/api/auth/token/login/",
                json!({"email": email, "password": password}),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        resp.headers()
            .get("set-cookie")
            .expect("Login should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, None, cookie).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), cookie).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send("PATCH", uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("DELETE", uri, None, cookie).await
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.request(builder.body(body).unwrap()).await
    }

    pub async fn seed_tag(&self, name: &str, slug: &str) -> i64 {
        let (id,): (i64,) = sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES (?, '#49B64E', ?) RETURNING id")
            .bind(name)
            .bind(slug)
            .fetch_one(&self.db)
            .await
            .expect("Failed to seed tag");
        id
    }

    pub async fn seed_ingredient(&self, name: &str, unit: &str) -> i64 {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO ingredients (name, measurement_unit, search_name) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(unit)
        .bind(name.to_lowercase())
        .fetch_one(&self.db)
        .await
        .expect("Failed to seed ingredient");
        id
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(&self, cookie: &str, payload: Value) -> i64 {
        let resp = self.post_json("/api/recipes/", payload, Some(cookie)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.db)
            .await
            .unwrap();
        count
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A valid write payload; `ingredients` are `(id, amount)` pairs.
pub fn recipe_payload(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| json!({"id": id, "amount": amount}))
        .collect();
    json!({
        "ingredients": ingredients,
        "tags": tags,
        "image": PIXEL_PNG,
        "name": name,
        "text": "Mix everything and bake.",
        "cooking_time": 30,
    })
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).expect("Response body should be JSON")
}

/// Assert a 4xx error response carrying the given reason code.
pub async fn assert_error(resp: Response, status: StatusCode, code: &str) {
    assert_eq!(resp.status(), status);
    let body = body_json(resp).await;
    assert_eq!(body["code"], code, "unexpected error body: {body}");
}
