//! Shared test utilities and fixtures

#![allow(dead_code)]

use mytarot::config::{OracleConfig, TarotConfig};
use mytarot::processor::{SessionController, UnavailableRecognizer};
use mytarot::state::Phase;
use mytarot::SessionAction;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const TEST_KEY: &str = "test-key";

/// Chat-completions body with a single answer
pub fn chat_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Mount a successful answer, expected exactly `times` times
pub async fn mount_interpretation(server: &MockServer, content: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .expect(times)
        .mount(server)
        .await;
}

/// Config pointing at the mock server
pub fn config_for(server: &MockServer) -> TarotConfig {
    TarotConfig::default().with_oracle(
        OracleConfig::default()
            .with_endpoint(format!("{}{}", server.uri(), CHAT_PATH))
            .with_api_key(TEST_KEY)
            .with_timeout_secs(5),
    )
}

/// Controller without voice input
pub fn controller_for(config: &TarotConfig) -> SessionController {
    SessionController::new(config, Box::new(UnavailableRecognizer::new("tests"))).unwrap()
}

/// Drive the session to card selection with the given question
pub fn to_selection(controller: &mut SessionController, question: &str) {
    controller.dispatch(SessionAction::Start);
    controller.dispatch(SessionAction::EditQuestion(question.to_string()));
    controller.dispatch(SessionAction::SubmitQuestion);
    assert_eq!(controller.session().phase(), Phase::CardSelection);
}

pub fn pick(controller: &mut SessionController, ids: &[&str]) {
    for id in ids {
        controller.dispatch(SessionAction::ToggleCard(id.to_string()));
    }
}

/// Pump worker results until `done` holds or five seconds pass
pub async fn pump_until(
    controller: &mut SessionController,
    done: impl Fn(&SessionController) -> bool,
) -> bool {
    for _ in 0..100 {
        controller.pump();
        if done(controller) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Wait until the mock has seen `count` requests
pub async fn wait_for_requests(server: &MockServer, count: usize) -> bool {
    for _ in 0..100 {
        let seen = server.received_requests().await.map_or(0, |r| r.len());
        if seen >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
