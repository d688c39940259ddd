use crate::e2e::helpers;

use helpers::{custom_voice, submit, wait_for_terminal, TestContext};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_estimate_from_character_count_without_history(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/tts/estimate", &json!({"text": "a".repeat(100)}))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["char_count"], 100);
    assert_eq!(body["word_count"], 1);
    let seconds = body["estimated_seconds"].as_f64().unwrap();
    assert!((seconds - 10.0).abs() < 1e-9, "got {}", seconds);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_grow_with_text_length(ctx: &TestContext) {
    let mut previous = 0.0;
    for words in [1, 5, 25] {
        let text = vec!["word"; words].join(" ");
        let response = ctx
            .client
            .post("/tts/estimate", &json!({"text": text}))
            .await
            .unwrap();
        let seconds = response.body.as_ref().unwrap()["estimated_seconds"]
            .as_f64()
            .unwrap();
        assert!(seconds > previous);
        previous = seconds;
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_learn_from_finished_jobs(ctx: &TestContext) {
    let text = "Calibrate the estimate with a real run";
    let before = ctx
        .client
        .post("/tts/estimate", &json!({"text": text}))
        .await
        .unwrap()
        .body
        .unwrap()["estimated_seconds"]
        .as_f64()
        .unwrap();

    let job_id = submit(&ctx.client, &custom_voice(text)).await;
    wait_for_terminal(&ctx.client, &job_id).await;

    let after = ctx
        .client
        .post("/tts/estimate", &json!({"text": text}))
        .await
        .unwrap()
        .body
        .unwrap()["estimated_seconds"]
        .as_f64()
        .unwrap();

    // The stub answers in tens of milliseconds, far below 0.1s per character
    assert!(after < before, "expected {} < {}", after, before);

    let ready = ctx.client.get("/health/ready").await.unwrap();
    assert_eq!(ready.body.as_ref().unwrap()["queue"]["estimation_samples"], 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_blank_text(ctx: &TestContext) {
    ctx.client
        .post("/tts/estimate", &json!({"text": "  "}))
        .await
        .unwrap()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Text is required");
}
