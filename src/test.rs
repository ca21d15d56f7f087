pub use axum_test::TestServer;
pub use serde_json::{json, Value};

pub use crate::Database;

use argon2::Argon2;
use axum_test::TestServerConfig;

/// Builds a test server over `pool`, keeping the cookies it is sent
/// so that logging in carries over to the following requests.
pub fn app(pool: Database) -> TestServer {
	let app = crate::app(crate::State {
		database: pool,
		hasher: Argon2::default(),
		media: crate::media::Media::new("/media/"),
	});

	TestServer::new_with_config(
		app,
		TestServerConfig {
			save_cookies: true,
			..TestServerConfig::default()
		},
	)
	.unwrap()
}

/// Signs up `username` and logs in with it.
pub async fn login(app: &TestServer, username: &str) {
	let response = app
		.post("/signup/")
		.json(&json!({
			"username": username,
			"email": format!("{username}@example.com"),
			"password1": "hunter2hunter",
			"password2": "hunter2hunter",
		}))
		.await;

	assert_eq!(response.status_code(), 302, "{}", response.text());

	let response = app
		.post("/login/")
		.json(&json!({
			"username": username,
			"password": "hunter2hunter",
		}))
		.await;

	assert_eq!(response.status_code(), 302, "{}", response.text());
}

/// Like [`login`], but the account is promoted to staff first.
pub async fn login_staff(app: &TestServer, pool: &Database, username: &str) {
	login(app, username).await;

	sqlx::query(r#"UPDATE "user" SET is_staff = TRUE WHERE username = ?"#)
		.bind(username)
		.execute(pool)
		.await
		.unwrap();
}

/// Creates a post as the logged in user, returning its slug.
pub async fn create_post(app: &TestServer, title: &str, body: &str, tags: &[i64]) -> String {
	let response = app
		.post("/post/new/")
		.json(&json!({
			"title": title,
			"body": body,
			"tags": tags,
		}))
		.await;

	assert_eq!(response.status_code(), 302, "{}", response.text());

	let location = response.header("location");
	let location = location.to_str().unwrap();

	location
		.trim_start_matches("/post/")
		.trim_end_matches('/')
		.to_owned()
}

/// Creates a tag as the logged in user, returning its id.
pub async fn create_tag(app: &TestServer, pool: &Database, title: &str) -> i64 {
	let response = app.post("/tag/new/").json(&json!({ "title": title })).await;

	assert_eq!(response.status_code(), 302, "{}", response.text());

	sqlx::query_scalar("SELECT id FROM tag WHERE slug = ?")
		.bind(crate::slug::normalize(title))
		.fetch_one(pool)
		.await
		.unwrap()
}

/// Returns the titles on a listing page, in order.
pub fn titles(listing: &Value) -> Vec<String> {
	listing["items"]
		.as_array()
		.unwrap()
		.iter()
		.map(|post| post["title"].as_str().unwrap().to_owned())
		.collect()
}
