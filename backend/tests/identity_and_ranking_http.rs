//! HTTP tests for signup validation, credential handling, preference
//! management, and preference-driven event ranking.

mod support;

use actix_web::test;
use fest_backend::outbound::persistence::MemoryStore;
use serde_json::{json, Value};
use support::{login, register_participant, seed_admin, spawn_app};

const ADMIN_EMAIL: &str = "admin@fest.example";
const ADMIN_PASSWORD: &str = "bootstrap-secret";

fn signup_payload(email: &str, participant_type: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": "participant-pass",
        "participantType": participant_type
    })
}

#[actix_web::test]
async fn iiit_signup_requires_an_institutional_email() {
    let store = MemoryStore::new();
    let app = spawn_app(&store).await;

    for (email, participant_type, expected) in [
        ("ada@students.iiit.ac.in", "IIIT", 201),
        ("staff@iiit.ac.in", "IIIT", 201),
        ("ada@gmail.com", "IIIT", 400),
        ("ada@iiit.ac.in.evil.com", "IIIT", 400),
        ("ada@gmail.com", "Non-IIIT", 201),
        ("ada@gmail.com", "External", 400),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(signup_payload(email, participant_type))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(
            res.status().as_u16(),
            expected,
            "{email} as {participant_type}"
        );
    }
}

#[actix_web::test]
async fn duplicate_email_conflicts_regardless_of_case() {
    let store = MemoryStore::new();
    let app = spawn_app(&store).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(signup_payload("ada@example.com", "Non-IIIT"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 201);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(signup_payload("Ada@Example.COM", "Non-IIIT"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 409);
}

#[actix_web::test]
async fn failed_logins_do_not_reveal_which_part_was_wrong() {
    let store = MemoryStore::new();
    let app = spawn_app(&store).await;
    register_participant(&app, "ada@example.com", "participant-pass").await;

    let mut messages = Vec::new();
    for (email, password) in [
        ("ada@example.com", "wrong-pass"),
        ("nobody@example.com", "participant-pass"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 401);
        let body: Value = test::read_body_json(res).await;
        messages.push(body["message"].as_str().expect("message").to_owned());
    }
    assert_eq!(messages[0], messages[1]);
}

#[actix_web::test]
async fn change_password_rotates_the_credential() {
    let store = MemoryStore::new();
    let app = spawn_app(&store).await;
    let cookie = register_participant(&app, "ada@example.com", "participant-pass").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/change-password")
        .cookie(cookie)
        .set_json(json!({
            "currentPassword": "participant-pass",
            "newPassword": "rotated-pass"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 204);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "participant-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 401);

    login(&app, "ada@example.com", "rotated-pass").await;
}

async fn provision_and_publish_event(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    organizer_email: &str,
    organizer_name: &str,
    event_name: &str,
    start: &str,
    tags: Value,
) -> String {
    let admin = login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/organizers")
        .cookie(admin)
        .set_json(json!({
            "organizerName": organizer_name,
            "loginEmail": organizer_email,
            "password": "organizer-pass"
        }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status().as_u16(), 201);
    let created: Value = test::read_body_json(res).await;
    let organizer_id = created["id"].as_str().expect("id").to_owned();

    let organizer = login(app, organizer_email, "organizer-pass").await;
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .cookie(organizer.clone())
        .set_json(json!({
            "name": event_name,
            "type": "normal",
            "registrationDeadline": "2030-02-20T00:00:00Z",
            "startDate": start,
            "endDate": "2030-12-30T00:00:00Z",
            "registrationLimit": 100,
            "tags": tags
        }))
        .to_request();
    let event: Value = test::read_body_json(test::call_service(app, req).await).await;
    let event_id = event["id"].as_str().expect("event id").to_owned();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/events/{event_id}/publish"))
        .cookie(organizer)
        .to_request();
    assert_eq!(test::call_service(app, req).await.status().as_u16(), 200);
    organizer_id
}

#[actix_web::test]
async fn followed_organizers_outrank_earlier_events() {
    let store = MemoryStore::new();
    seed_admin(&store, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let app = spawn_app(&store).await;

    // "Early Quiz" starts first; "Robot Rumble" belongs to the organizer the
    // participant follows.
    provision_and_publish_event(
        &app,
        "quiz@fest.example",
        "Quiz Society",
        "Early Quiz",
        "2030-03-01T09:00:00Z",
        json!(["trivia"]),
    )
    .await;
    let robotics_id = provision_and_publish_event(
        &app,
        "robotics@fest.example",
        "Robotics Club",
        "Robot Rumble",
        "2030-06-01T09:00:00Z",
        json!(["robotics"]),
    )
    .await;

    let participant = register_participant(&app, "ada@example.com", "participant-pass").await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/organizers/{robotics_id}/follow"))
        .cookie(participant.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 204);

    // Anonymous listing is chronological.
    let req = test::TestRequest::get().uri("/api/v1/events").to_request();
    let listed: Vec<Value> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(listed[0]["name"], "Early Quiz");

    // The follower sees the followed organizer's event first.
    let req = test::TestRequest::get()
        .uri("/api/v1/events")
        .cookie(participant.clone())
        .to_request();
    let listed: Vec<Value> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(listed[0]["name"], "Robot Rumble");

    // followedOnly narrows the listing to followed organizers.
    let req = test::TestRequest::get()
        .uri("/api/v1/events?followedOnly=true")
        .cookie(participant.clone())
        .to_request();
    let listed: Vec<Value> = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Robot Rumble");

    // The directory flags the follow for the signed-in viewer.
    let req = test::TestRequest::get()
        .uri("/api/v1/organizers")
        .cookie(participant)
        .to_request();
    let directory: Vec<Value> = test::read_body_json(test::call_service(&app, req).await).await;
    let robotics = directory
        .iter()
        .find(|o| o["organizerName"] == "Robotics Club")
        .expect("directory entry");
    assert_eq!(robotics["isFollowed"], true);
}
