//! End-to-end tests over the full router: register/login, ownership-scoped
//! trip CRUD, itinerary aggregation, and the community feed.

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use globetrotter::config::Config;
use globetrotter::state::AppState;
use globetrotter::{db, routes};

struct TestServer {
    base_url: String,
    client: Client,
    _tmp: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn spawn_server() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    let pool = db::create_pool(&db_path).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.database.path = Some(db_path);
    config.storage.path = Some(tmp.path().join("uploads"));

    let state = AppState { db: pool, config };
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        client: Client::new(),
        _tmp: tmp,
    }
}

/// Register a user and return their bearer token.
async fn register(server: &TestServer, name: &str, email: &str) -> String {
    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "name": name, "email": email, "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn create_trip(server: &TestServer, token: &str, destination: &str) -> String {
    let response = server
        .client
        .post(server.url("/trips"))
        .bearer_auth(token)
        .json(&json!({
            "destination": destination,
            "startDate": "2030-01-01",
            "endDate": "2030-01-10"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_and_login_flow() {
    let server = spawn_server().await;

    // Register
    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "name": "Alice", "email": "alice@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().unwrap().len() > 0);
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password").is_none());

    // Duplicate email is a conflict and creates no second account
    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "name": "Alice2", "email": "alice@example.com", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Login with the right password
    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "hunter22" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    // Token works against an authenticated endpoint
    let response = server
        .client
        .get(server.url("/user/profile"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Wrong password and unknown email both come back as the same 401
    let wrong = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);
    let wrong_body: Value = wrong.json().await.unwrap();

    let unknown = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "ghost@example.com", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), 401);
    let unknown_body: Value = unknown.json().await.unwrap();
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn missing_registration_fields_are_rejected() {
    let server = spawn_server().await;

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "name": "NoEmail" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "x@example.com", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn trip_creation_applies_defaults() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/trips"))
        .bearer_auth(&token)
        .json(&json!({
            "destination": "Mars",
            "startDate": "2030-01-01",
            "endDate": "2030-01-10"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let trip: Value = response.json().await.unwrap();
    assert_eq!(trip["title"], "New Trip");
    assert_eq!(trip["status"], "planning");
    assert_eq!(trip["destination"], "Mars");

    // Missing destination is a validation failure
    let response = server
        .client
        .post(server.url("/trips"))
        .bearer_auth(&token)
        .json(&json!({ "startDate": "2030-01-01", "endDate": "2030-01-10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn trips_are_invisible_to_other_users() {
    let server = spawn_server().await;
    let alice = register(&server, "Alice", "alice@example.com").await;
    let bob = register(&server, "Bob", "bob@example.com").await;

    let trip_id = create_trip(&server, &alice, "Mars").await;

    // Bob sees an empty list
    let response = server
        .client
        .get(server.url("/trips"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let trips: Value = response.json().await.unwrap();
    assert_eq!(trips.as_array().unwrap().len(), 0);

    // Read, update and delete of Alice's trip all 404 for Bob
    for response in [
        server
            .client
            .get(server.url(&format!("/trips/{}", trip_id)))
            .bearer_auth(&bob)
            .send()
            .await
            .unwrap(),
        server
            .client
            .put(server.url(&format!("/trips/{}", trip_id)))
            .bearer_auth(&bob)
            .json(&json!({ "title": "Hijacked" }))
            .send()
            .await
            .unwrap(),
        server
            .client
            .delete(server.url(&format!("/trips/{}", trip_id)))
            .bearer_auth(&bob)
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(response.status(), 404);
    }

    // The trip is untouched for Alice
    let response = server
        .client
        .get(server.url(&format!("/trips/{}", trip_id)))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let trip: Value = response.json().await.unwrap();
    assert_eq!(trip["title"], "New Trip");

    // Anonymous requests get 401
    let response = server
        .client
        .get(server.url("/trips"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn trip_update_respects_whitelist_and_status_filter_works() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;
    let trip_id = create_trip(&server, &token, "Mars").await;
    create_trip(&server, &token, "Venus").await;

    let response = server
        .client
        .put(server.url(&format!("/trips/{}", trip_id)))
        .bearer_auth(&token)
        .json(&json!({ "title": "Mars or bust", "status": "completed", "budget": 3000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let trip: Value = response.json().await.unwrap();
    assert_eq!(trip["title"], "Mars or bust");
    assert_eq!(trip["status"], "completed");
    assert_eq!(trip["budget"], 3000.0);

    // Status filter only returns the completed trip
    let response = server
        .client
        .get(server.url("/trips?status=completed"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let trips: Value = response.json().await.unwrap();
    assert_eq!(trips.as_array().unwrap().len(), 1);
    assert_eq!(trips[0]["id"], trip_id.as_str());

    // Garbage status filter is a validation failure
    let response = server
        .client
        .get(server.url("/trips?status=cancelled"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unknown status value in an update is rejected too
    let response = server
        .client
        .put(server.url(&format!("/trips/{}", trip_id)))
        .bearer_auth(&token)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn legacy_budget_strings_are_normalized() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/trips"))
        .bearer_auth(&token)
        .json(&json!({
            "destination": "Mars",
            "startDate": "2030-01-01",
            "endDate": "2030-01-10",
            "budget": "$2,500"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let trip: Value = response.json().await.unwrap();
    assert_eq!(trip["budget"], 2500.0);

    let response = server
        .client
        .put(server.url(&format!("/trips/{}", trip["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .json(&json!({ "budget": "not money" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn sections_require_parent_trip_ownership() {
    let server = spawn_server().await;
    let alice = register(&server, "Alice", "alice@example.com").await;
    let bob = register(&server, "Bob", "bob@example.com").await;
    let trip_id = create_trip(&server, &alice, "Mars").await;

    // Missing title/day rejected
    let response = server
        .client
        .post(server.url(&format!("/trips/{}/sections", trip_id)))
        .bearer_auth(&alice)
        .json(&json!({ "location": "Olympus Mons" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url(&format!("/trips/{}/sections", trip_id)))
        .bearer_auth(&alice)
        .json(&json!({ "title": "Arrival", "day": 1, "notes": "Land gently" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let section: Value = response.json().await.unwrap();
    let section_id = section["id"].as_str().unwrap();
    assert_eq!(section["tripId"], trip_id.as_str());

    // Bob cannot add, update or delete under Alice's trip
    let response = server
        .client
        .post(server.url(&format!("/trips/{}/sections", trip_id)))
        .bearer_auth(&bob)
        .json(&json!({ "title": "Intrusion", "day": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = server
        .client
        .put(server.url(&format!("/trips/{}/sections/{}", trip_id, section_id)))
        .bearer_auth(&bob)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Alice updates hers
    let response = server
        .client
        .put(server.url(&format!("/trips/{}/sections/{}", trip_id, section_id)))
        .bearer_auth(&alice)
        .json(&json!({ "title": "Touchdown", "day": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let section: Value = response.json().await.unwrap();
    assert_eq!(section["title"], "Touchdown");
    assert_eq!(section["day"], 2);

    // And deletes it
    let response = server
        .client
        .delete(server.url(&format!("/trips/{}/sections/{}", trip_id, section_id)))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url(&format!("/trips/{}/sections", trip_id)))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let sections: Value = response.json().await.unwrap();
    assert_eq!(sections.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn activities_filter_by_day() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;
    let trip_id = create_trip(&server, &token, "Mars").await;

    for (day, name) in [(1, "Launch"), (1, "Orbit"), (2, "Land")] {
        let response = server
            .client
            .post(server.url(&format!("/trips/{}/activities", trip_id)))
            .bearer_auth(&token)
            .json(&json!({ "day": day, "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = server
        .client
        .get(server.url(&format!("/trips/{}/activities?day=1", trip_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let activities: Value = response.json().await.unwrap();
    assert_eq!(activities.as_array().unwrap().len(), 2);

    let response = server
        .client
        .get(server.url(&format!("/trips/{}/activities", trip_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let activities: Value = response.json().await.unwrap();
    assert_eq!(activities.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn itinerary_groups_days_and_orders_untimed_first() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;
    let trip_id = create_trip(&server, &token, "Mars").await;

    // Days [2, 1, 1] with times ["10:00", "09:00", none]
    for (day, name, time, cost) in [
        (2, "Summit", Some("10:00"), None),
        (1, "Launch", Some("09:00"), Some(5000)),
        (1, "Suit up", None, None),
    ] {
        let mut body = json!({ "day": day, "name": name });
        if let Some(time) = time {
            body["time"] = json!(time);
        }
        if let Some(cost) = cost {
            body["cost"] = json!(cost);
        }
        let response = server
            .client
            .post(server.url(&format!("/trips/{}/activities", trip_id)))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = server
        .client
        .get(server.url(&format!("/trips/{}/itinerary", trip_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let itinerary: Value = response.json().await.unwrap();

    assert_eq!(itinerary["tripId"], trip_id.as_str());
    let days = itinerary["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day"], 1);
    assert_eq!(days[1]["day"], 2);

    let day1: Vec<&str> = days[0]["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(day1, vec!["Suit up", "Launch"]);

    let launch = &days[0]["activities"][1];
    assert_eq!(launch["startTime"], "09:00");
    assert!(launch["endTime"].is_null());
    assert_eq!(launch["cost"], 5000.0);

    assert_eq!(days[0]["totalCost"], 5000.0);
    assert_eq!(itinerary["totalCost"], 5000.0);
}

#[tokio::test]
async fn empty_trip_has_empty_itinerary() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;
    let trip_id = create_trip(&server, &token, "Mars").await;

    let response = server
        .client
        .get(server.url(&format!("/trips/{}/itinerary", trip_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let itinerary: Value = response.json().await.unwrap();
    assert_eq!(itinerary["days"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deleting_a_trip_takes_sections_and_activities_with_it() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;
    let trip_id = create_trip(&server, &token, "Mars").await;

    server
        .client
        .post(server.url(&format!("/trips/{}/sections", trip_id)))
        .bearer_auth(&token)
        .json(&json!({ "title": "Arrival", "day": 1 }))
        .send()
        .await
        .unwrap();
    server
        .client
        .post(server.url(&format!("/trips/{}/activities", trip_id)))
        .bearer_auth(&token)
        .json(&json!({ "day": 1, "name": "Launch" }))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .delete(server.url(&format!("/trips/{}", trip_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Everything under the trip is gone
    for path in [
        format!("/trips/{}", trip_id),
        format!("/trips/{}/sections", trip_id),
        format!("/trips/{}/activities", trip_id),
        format!("/trips/{}/itinerary", trip_id),
    ] {
        let response = server
            .client
            .get(server.url(&path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}

#[tokio::test]
async fn feed_likes_and_comments_flow() {
    let server = spawn_server().await;
    let alice = register(&server, "Alice", "alice@example.com").await;
    let bob = register(&server, "Bob", "bob@example.com").await;

    // Caption is required
    let response = server
        .client
        .post(server.url("/community/posts"))
        .bearer_auth(&alice)
        .json(&json!({ "location": "Santorini" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/community/posts"))
        .bearer_auth(&alice)
        .json(&json!({ "caption": "Sunset views!", "location": "Santorini, Greece" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let post: Value = response.json().await.unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();

    // Anonymous feed: visible, not liked
    let response = server
        .client
        .get(server.url("/community/feed"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let feed: Value = response.json().await.unwrap();
    assert_eq!(feed[0]["caption"], "Sunset views!");
    assert_eq!(feed[0]["user"]["name"], "Alice");
    assert_eq!(feed[0]["isLiked"], false);
    assert_eq!(feed[0]["likes"], 0);

    // Toggle on
    let response = server
        .client
        .post(server.url(&format!("/community/posts/{}/like", post_id)))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isLiked"], true);
    assert_eq!(body["likes"], 1);

    // Bob's feed shows his like; Alice's does not
    let response = server
        .client
        .get(server.url("/community/feed"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let feed: Value = response.json().await.unwrap();
    assert_eq!(feed[0]["isLiked"], true);

    let response = server
        .client
        .get(server.url("/community/feed"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    let feed: Value = response.json().await.unwrap();
    assert_eq!(feed[0]["isLiked"], false);
    assert_eq!(feed[0]["likes"], 1);

    // Toggle off returns to the original state
    let response = server
        .client
        .post(server.url(&format!("/community/posts/{}/like", post_id)))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["isLiked"], false);
    assert_eq!(body["likes"], 0);

    // Liking without auth is rejected; liking a ghost post is 404
    let response = server
        .client
        .post(server.url(&format!("/community/posts/{}/like", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .post(server.url("/community/posts/no-such-post/like"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Comments: four in, preview of three out, full list on the endpoint
    for text in ["Wow!", "Stunning", "Take me", "Next year"] {
        let response = server
            .client
            .post(server.url(&format!("/community/posts/{}/comments", post_id)))
            .bearer_auth(&bob)
            .json(&json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let comment: Value = response.json().await.unwrap();
        assert_eq!(comment["user"]["name"], "Bob");
    }

    let response = server
        .client
        .get(server.url("/community/feed"))
        .send()
        .await
        .unwrap();
    let feed: Value = response.json().await.unwrap();
    assert_eq!(feed[0]["commentsCount"], 4);
    assert_eq!(feed[0]["comments"].as_array().unwrap().len(), 3);
    assert_eq!(feed[0]["comments"][0]["text"], "Wow!");

    let response = server
        .client
        .get(server.url(&format!("/community/posts/{}/comments", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let comments: Value = response.json().await.unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 4);

    // Commenting needs auth and an existing post
    let response = server
        .client
        .post(server.url(&format!("/community/posts/{}/comments", post_id)))
        .json(&json!({ "text": "anon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url("/community/posts/no-such-post/comments"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn profile_stats_reflect_trip_statuses() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;

    let t1 = create_trip(&server, &token, "France").await;
    let t2 = create_trip(&server, &token, "Japan").await;
    create_trip(&server, &token, "Peru").await;

    for (trip, status) in [(&t1, "completed"), (&t2, "upcoming")] {
        let response = server
            .client
            .put(server.url(&format!("/trips/{}", trip)))
            .bearer_auth(&token)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = server
        .client
        .get(server.url("/user/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["stats"]["tripsCompleted"], 1);
    assert_eq!(profile["stats"]["upcomingTrips"], 1);
    assert_eq!(profile["stats"]["countriesVisited"], 1);

    // Profile update round-trips
    let response = server
        .client
        .put(server.url("/user/profile"))
        .bearer_auth(&token)
        .json(&json!({ "location": "Lisbon, Portugal" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["location"], "Lisbon, Portugal");
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/user/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn avatar_upload_stores_file_and_url() {
    let server = spawn_server().await;
    let token = register(&server, "Alice", "alice@example.com").await;

    let part = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name("me.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("avatar", part);

    let response = server
        .client
        .post(server.url("/user/avatar"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let avatar_url = body["avatar"].as_str().unwrap();
    assert!(avatar_url.contains("/uploads/"));

    // The profile now carries the URL
    let response = server
        .client
        .get(server.url("/user/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["avatar"], avatar_url);

    // And the file is served back from the uploads mount
    let filename = avatar_url.rsplit('/').next().unwrap();
    let response = server
        .client
        .get(server.url(&format!("/uploads/{}", filename)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // A multipart body without an avatar field is a validation failure
    let form = reqwest::multipart::Form::new().text("something", "else");
    let response = server
        .client
        .post(server.url("/user/avatar"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn destination_catalog_endpoints() {
    let server = spawn_server().await;

    let response = server
        .client
        .get(server.url("/destinations/regional"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let regional: Value = response.json().await.unwrap();
    assert_eq!(regional.as_array().unwrap().len(), 3);

    let response = server
        .client
        .get(server.url("/search?q=tokyo"))
        .send()
        .await
        .unwrap();
    let results: Value = response.json().await.unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["name"], "Tokyo, Japan");
}
