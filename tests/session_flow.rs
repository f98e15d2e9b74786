//! End-to-end reading sessions against a mocked chat-completions API

mod common;

use common::*;
use mytarot::state::{Notice, Phase, RequestState};
use mytarot::SessionAction;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn test_full_reading() {
    let server = MockServer::start().await;
    mount_interpretation(&server, "사랑이 곧 찾아올 것입니다.", 1).await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "내 연애운은?");
    pick(&mut controller, &["card_0", "card_27", "card_10"]);
    controller.dispatch(SessionAction::CompleteSelection);

    let finished = pump_until(&mut controller, |c| {
        c.session().phase() == Phase::ResultDisplay
    })
    .await;
    assert!(finished, "reading never arrived");

    let state = controller.session().snapshot();
    assert_eq!(state.interpretation, "사랑이 곧 찾아올 것입니다.");
    assert!(state.received_at.is_some());
    assert_eq!(state.selection.ids(), vec!["card_0", "card_27", "card_10"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4");
    assert!((body["temperature"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "당신은 신비로운 타로 마스터입니다.");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("The Fool, Six of Wands, Wheel of Fortune"));
    assert!(prompt.contains("\"내 연애운은?\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_carries_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_1", "card_2", "card_3"]);
    controller.dispatch(SessionAction::CompleteSelection);

    assert!(
        pump_until(&mut controller, |c| c.session().phase() == Phase::ResultDisplay).await
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_then_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_interpretation(&server, "두 번째 시도", 1).await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_0", "card_1", "card_2"]);
    controller.dispatch(SessionAction::CompleteSelection);

    assert!(pump_until(&mut controller, |c| c.session().read().request.is_failed()).await);
    let state = controller.session().snapshot();
    assert_eq!(state.phase, Phase::CardSelection);
    match state.request {
        RequestState::Failed { recoverable, .. } => assert!(recoverable),
        other => panic!("expected Failed, got {:?}", other),
    }

    controller.dispatch(SessionAction::RetryInterpretation);
    assert!(
        pump_until(&mut controller, |c| c.session().phase() == Phase::ResultDisplay).await
    );
    assert_eq!(controller.session().interpretation(), "두 번째 시도");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_response_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_0", "card_1", "card_2"]);
    controller.dispatch(SessionAction::CompleteSelection);

    assert!(pump_until(&mut controller, |c| c.session().read().request.is_failed()).await);
    assert_eq!(controller.session().phase(), Phase::CardSelection);
    assert!(controller.session().interpretation().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_key_never_calls_api() {
    let server = MockServer::start().await;
    mount_interpretation(&server, "unused", 0).await;

    let mut config = config_for(&server);
    config.oracle.api_key = Some(String::new());
    let mut controller = controller_for(&config);
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_0", "card_1", "card_2"]);
    controller.dispatch(SessionAction::CompleteSelection);

    assert!(pump_until(&mut controller, |c| c.session().read().request.is_failed()).await);
    match controller.session().snapshot().request {
        RequestState::Failed {
            recoverable,
            message,
            ..
        } => {
            assert!(!recoverable);
            assert!(message.contains("API 키"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reset_discards_late_reading() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("늦은 해석"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_0", "card_1", "card_2"]);
    controller.dispatch(SessionAction::CompleteSelection);
    assert!(wait_for_requests(&server, 1).await);
    controller.dispatch(SessionAction::Reset);

    // The answer still comes back from the worker and is pumped, then ignored
    let mut delivered = false;
    for _ in 0..100 {
        if controller.pump() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(delivered, "late answer never reached the session");

    let state = controller.session().snapshot();
    assert_eq!(state.phase, Phase::Welcome);
    assert!(state.interpretation.is_empty());
    assert!(state.received_at.is_none());
    assert!(state.selection.is_empty());
    assert_eq!(state.request, RequestState::Idle);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_new_reading_not_held_up_by_abandoned_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("버려진 해석"))
                .set_delay(Duration::from_secs(4)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_interpretation(&server, "새 해석", 1).await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "첫 질문");
    pick(&mut controller, &["card_0", "card_1", "card_2"]);
    controller.dispatch(SessionAction::CompleteSelection);
    assert!(wait_for_requests(&server, 1).await);

    controller.dispatch(SessionAction::Reset);
    to_selection(&mut controller, "두 번째 질문");
    pick(&mut controller, &["card_3", "card_4", "card_5"]);
    controller.dispatch(SessionAction::CompleteSelection);

    let started = Instant::now();
    assert!(
        pump_until(&mut controller, |c| c.session().phase() == Phase::ResultDisplay).await
    );
    let waited = started.elapsed();
    assert!(
        waited < Duration::from_secs(2),
        "new reading waited {:?} behind the abandoned one",
        waited
    );

    let state = controller.session().snapshot();
    assert_eq!(state.interpretation, "새 해석");
    assert_eq!(state.question, "두 번째 질문");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incomplete_selection_sends_nothing() {
    let server = MockServer::start().await;
    mount_interpretation(&server, "unused", 0).await;

    let mut controller = controller_for(&config_for(&server));
    to_selection(&mut controller, "q");
    pick(&mut controller, &["card_0", "card_1"]);
    controller.dispatch(SessionAction::CompleteSelection);

    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.pump();
    assert_eq!(controller.session().read().request, RequestState::Idle);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_fourth_pick_keeps_spread() {
    let config = mytarot::TarotConfig::default();
    let mut controller = controller_for(&config);
    to_selection(&mut controller, "내 연애운은?");
    pick(&mut controller, &["card_0", "card_27", "card_10", "card_40"]);

    let state = controller.session().snapshot();
    assert_eq!(state.selection.ids(), vec!["card_0", "card_27", "card_10"]);
}

#[test]
fn test_whitespace_question_stays_put() {
    let mut controller = controller_for(&mytarot::TarotConfig::default());
    controller.dispatch(SessionAction::Start);
    controller.dispatch(SessionAction::EditQuestion(" \t\n".to_string()));
    controller.dispatch(SessionAction::SubmitQuestion);

    let state = controller.session().snapshot();
    assert_eq!(state.phase, Phase::QuestionCapture);
    assert_eq!(state.notice, Some(Notice::EmptyQuestion));
}

#[test]
fn test_voice_unavailable_keeps_typed_question() {
    let mut controller = controller_for(&mytarot::TarotConfig::default());
    controller.dispatch(SessionAction::Start);
    controller.dispatch(SessionAction::EditQuestion("타이핑한 질문".to_string()));
    controller.dispatch(SessionAction::StartVoiceCapture);

    let state = controller.session().snapshot();
    assert!(!state.listening);
    assert_eq!(state.question, "타이핑한 질문");
    assert!(matches!(state.notice, Some(Notice::Voice(_))));
}
