//! HTTP route integration tests.
//!
//! Starts an axum server on an ephemeral port and exercises it with reqwest.

#![cfg(feature = "http")]

use campus_hub::{http, Course, InMemoryModelStore, ModelsExt, User};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Bind to port 0 and return the base URL plus the backing store.
async fn start_server() -> (String, InMemoryModelStore) {
    let store = InMemoryModelStore::new();
    let app = http::router(http::AppState::shared(store.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), store)
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn delete(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.delete(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn get(client: &Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

/// Create one course and one user; returns their ids.
async fn seed(client: &Client, base: &str) -> (u64, u64) {
    let (status, course) = post(
        client,
        format!("{base}/api/courses"),
        json!({ "title": "Rust", "price": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, user) = post(
        client,
        format!("{base}/api/users"),
        json!({ "name": "Ada", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        course["id"].as_u64().unwrap(),
        user["id"].as_u64().unwrap(),
    )
}

#[tokio::test]
async fn health_check() {
    let (base, _) = start_server().await;
    let (status, body) = get(&Client::new(), format!("{base}/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn enroll_repeat_unenroll() {
    let (base, store) = start_server().await;
    let client = Client::new();
    let (course_id, user_id) = seed(&client, &base).await;
    let url = format!("{base}/api/courses/enroll");
    let body = json!({ "courseId": course_id, "userId": user_id });

    let (status, course) = post(&client, url.clone(), body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["enrolledStudents"], json!([user_id]));
    assert_eq!(course["enrollmentCount"], 1);

    let (status, err) = post(&client, url.clone(), body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err, json!({ "error": "User is already enrolled in this course" }));

    let user = store.models::<User>().get(user_id).unwrap().unwrap().data;
    assert_eq!(user.enrolled_courses, vec![course_id]);

    let (status, course) = delete(&client, url.clone(), body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["enrolledStudents"], json!([]));
    assert_eq!(course["enrollmentCount"], 0);

    let (status, err) = delete(&client, url, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "User is not enrolled in this course");

    let course = store.models::<Course>().get(course_id).unwrap().unwrap().data;
    assert!(course.enrolled_students.is_empty());
    let user = store.models::<User>().get(user_id).unwrap().unwrap().data;
    assert!(user.enrolled_courses.is_empty());
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let (base, _) = start_server().await;
    let client = Client::new();

    let (status, err) = post(&client, format!("{base}/api/courses/enroll"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "courseId is required");

    let (status, err) = post(
        &client,
        format!("{base}/api/events/register"),
        json!({ "eventId": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "userId is required");

    let (status, err) = delete(
        &client,
        format!("{base}/api/groups/join"),
        json!({ "groupId": "abc", "userId": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "groupId must be an integer id");

    let resp = client
        .post(format!("{base}/api/groups/join"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "request body must be valid JSON");
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let (base, _) = start_server().await;
    let client = Client::new();

    let (status, err) = post(
        &client,
        format!("{base}/api/groups/join"),
        json!({ "groupId": 3, "userId": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "Group not found");

    let (status, err) = get(&client, format!("{base}/api/events/9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "Event not found");
}

#[tokio::test]
async fn full_event_is_rejected() {
    let (base, _) = start_server().await;
    let client = Client::new();

    let (status, event) = post(
        &client,
        format!("{base}/api/events"),
        json!({ "title": "Meetup", "maxAttendees": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_u64().unwrap();

    for name in ["a", "b"] {
        let (status, _) = post(
            &client,
            format!("{base}/api/users"),
            json!({ "name": name, "email": format!("{name}@example.com") }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let url = format!("{base}/api/events/register");
    let (status, event) = post(&client, url.clone(), json!({ "eventId": event_id, "userId": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["attendeeCount"], 1);

    let (status, err) = post(&client, url, json!({ "eventId": event_id, "userId": 2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err, json!({ "error": "Event is full" }));
}

#[tokio::test]
async fn create_allocates_sequential_ids() {
    let (base, _) = start_server().await;
    let client = Client::new();

    for expected in 1..=3 {
        let (status, group) = post(
            &client,
            format!("{base}/api/groups"),
            json!({ "name": format!("Group {expected}"), "isPrivate": expected == 2 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(group["id"], expected);
        assert_eq!(group["members"], json!([]));
        assert_eq!(group["memberCount"], 0);
    }

    let (status, groups) = get(&client, format!("{base}/api/groups")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let (status, group) = get(&client, format!("{base}/api/groups/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["isPrivate"], true);

    let (status, err) = post(&client, format!("{base}/api/users"), json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "email is required");
}

#[tokio::test]
async fn user_memberships_are_listed() {
    let (base, _) = start_server().await;
    let client = Client::new();
    let (course_id, user_id) = seed(&client, &base).await;

    let (status, _) = post(
        &client,
        format!("{base}/api/courses/enroll"),
        json!({ "courseId": course_id, "userId": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, courses) = get(&client, format!("{base}/api/users/{user_id}/courses")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(courses.as_array().unwrap().len(), 1);
    assert_eq!(courses[0]["title"], "Rust");

    let (status, events) = get(&client, format!("{base}/api/users/{user_id}/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events, json!([]));

    let (status, err) = get(&client, format!("{base}/api/users/77/groups")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "User not found");
}

#[tokio::test]
async fn reconcile_repairs_stored_drift() {
    let (base, store) = start_server().await;
    let client = Client::new();
    let (course_id, user_id) = seed(&client, &base).await;

    let courses = store.models::<Course>();
    let mut course = courses.get(course_id).unwrap().unwrap().data;
    course.enrolled_students = vec![user_id, user_id];
    course.enrollment_count = 5;
    courses.save(&course).unwrap();

    let (status, report) = post(
        &client,
        format!("{base}/api/courses/reconcile"),
        json!({ "courseId": course_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["duplicatesRemoved"], json!([user_id]));
    assert_eq!(report["countBefore"], 5);
    assert_eq!(report["countAfter"], 1);
    assert_eq!(report["usersLinked"], json!([user_id]));

    let (status, course) = get(&client, format!("{base}/api/courses/{course_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["enrolledStudents"], json!([user_id]));
    assert_eq!(course["enrollmentCount"], 1);
}
