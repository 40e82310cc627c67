mod common;

use common::Harness;
use serde_json::{Value, json};

async fn call(h: &Harness, request: Value) -> Value {
    h.coordinator.handle_json(&request.to_string()).await
}

async fn ok(h: &Harness, request: Value) -> Value {
    let reply = call(h, request.clone()).await;
    match reply.get("ok") {
        Some(body) => body.clone(),
        None => panic!("{} failed: {}", request, reply),
    }
}

#[tokio::test]
async fn test_session_flow_over_json() {
    let h = Harness::new();

    let created = ok(&h, json!({"op": "session.create", "name": "Retro"})).await;
    let session_id = created["id"].as_str().unwrap().to_string();
    let short_code = created["short_code"].as_str().unwrap().to_string();

    let joined = ok(
        &h,
        json!({"op": "session.join", "session_id": session_id, "username": "ana"}),
    )
    .await;
    assert_eq!(joined["is_new"], true);
    let user_id = joined["user"]["id"].as_str().unwrap().to_string();

    let view = ok(
        &h,
        json!({"op": "session.getByShortCode", "short_code": short_code}),
    )
    .await;
    assert_eq!(view["session"]["id"], session_id.as_str());
    assert_eq!(view["participants"][0]["username"], "ana");

    let ticket = ok(
        &h,
        json!({
            "op": "ticket.create",
            "session_id": session_id,
            "user_id": user_id,
            "description": "Talk about deploys"
        }),
    )
    .await;
    assert_eq!(ticket["space"], "PERSONAL");

    let moved = ok(
        &h,
        json!({
            "op": "ticket.move",
            "ticket_id": ticket["id"],
            "target": "DOING",
            "user_id": user_id
        }),
    )
    .await;
    assert_eq!(moved["space"], "DOING");

    let timer = ok(&h, json!({"op": "timer.start", "ticket_id": ticket["id"]})).await;
    assert_eq!(timer["running"], true);
    assert_eq!(timer["remaining_ms"], 540_000);

    let decision = ok(
        &h,
        json!({"op": "continuation.forceEnd", "ticket_id": ticket["id"]}),
    )
    .await;
    assert_eq!(decision["decision"], "archive");
}

#[tokio::test]
async fn test_errors_carry_kind_and_message() {
    let h = Harness::new();

    let reply = call(&h, json!({"op": "session.create", "name": ""})).await;
    assert_eq!(reply["error"]["kind"], "validation");

    let reply = call(
        &h,
        json!({"op": "timer.read", "ticket_id": "missing"}),
    )
    .await;
    assert_eq!(reply["error"]["kind"], "not_found");
    assert!(reply["error"]["message"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_malformed_requests_are_validation_errors() {
    let h = Harness::new();

    for line in ["not json", r#"{"op": "ticket.fly"}"#, r#"{"op": "vote.cast"}"#] {
        let reply = h.coordinator.handle_json(line).await;
        assert_eq!(reply["error"]["kind"], "validation", "for {}", line);
    }
}

#[tokio::test]
async fn test_budget_error_reports_amounts() {
    let h = Harness::new();
    let session = h.session().await;
    let ana = h.join(&session, "ana").await;
    for text in ["One", "Two"] {
        h.ticket_in(&session, &ana, text, leancup_domain::Space::Todo).await;
    }
    let round = ok(&h, json!({"op": "vote.startRound", "session_id": session})).await;
    let tickets = ok(
        &h,
        json!({"op": "ticket.listVisible", "session_id": session, "user_id": ana}),
    )
    .await;

    let reply = call(
        &h,
        json!({
            "op": "vote.cast",
            "round_id": round["id"],
            "ticket_id": tickets[0]["id"],
            "user_id": ana,
            "count": 2
        }),
    )
    .await;
    assert_eq!(reply["error"]["kind"], "budget_exceeded");
    assert!(reply["error"]["message"].as_str().unwrap().contains("costs 4"));
}
