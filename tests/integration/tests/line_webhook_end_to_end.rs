use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use fastpass_access::{IdentityStateFile, IdentityStore, PrivilegeGuard};
use fastpass_core::{DeliveryError, MessageSender, OutboundMessage, ReplyHandle, UserId};
use fastpass_dispatch::{
    AutoReplyFlag, CommandRouter, DispatchTexts, Dispatcher, NotificationForwarder, RouterConfig,
    CONCERT_CATALOG_KEYWORD, DISABLE_AUTO_REPLY_COMMAND, ENABLE_AUTO_REPLY_COMMAND,
};
use fastpass_line::{
    build_line_webhook_router, sign_line_body, LineMessagingClient, LineWebhookState,
    LINE_SIGNATURE_HEADER,
};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const SECRET: &str = "integration-secret";
const OPERATOR: &str = "Uboss";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Reply(String, Vec<OutboundMessage>),
    Push(UserId, Vec<OutboundMessage>),
}

#[derive(Default)]
struct RecordingSender {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingSender {
    fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().expect("delivery log").clone()
    }

    fn reply_for(&self, token: &str) -> Option<Vec<OutboundMessage>> {
        self.deliveries().into_iter().find_map(|delivery| match delivery {
            Delivery::Reply(observed, messages) if observed == token => Some(messages),
            _ => None,
        })
    }

    fn pushes_to(&self, to: &str) -> Vec<Vec<OutboundMessage>> {
        self.deliveries()
            .into_iter()
            .filter_map(|delivery| match delivery {
                Delivery::Push(observed, messages) if observed.as_str() == to => Some(messages),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn reply(
        &self,
        handle: ReplyHandle,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .expect("delivery log")
            .push(Delivery::Reply(handle.into_token(), messages));
        Ok(())
    }

    async fn push(&self, to: &UserId, messages: Vec<OutboundMessage>) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .expect("delivery log")
            .push(Delivery::Push(to.clone(), messages));
        Ok(())
    }
}

struct Harness {
    base: String,
    client: reqwest::Client,
    server: tokio::task::JoinHandle<()>,
}

impl Harness {
    async fn start(sender: Arc<dyn MessageSender>, identity: IdentityStore) -> Self {
        let router = Arc::new(CommandRouter::new(
            Arc::new(identity),
            PrivilegeGuard::new([OPERATOR]),
            Arc::new(AutoReplyFlag::default()),
            &RouterConfig::default(),
        ));
        let (forwarder, _worker) =
            NotificationForwarder::spawn(sender.clone(), UserId::new(OPERATOR), 32);
        let dispatcher = Dispatcher::new(router, sender, forwarder);
        let app = build_line_webhook_router(Arc::new(LineWebhookState::new(SECRET, dispatcher)));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        tokio::time::sleep(Duration::from_millis(25)).await;
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            server,
        }
    }

    async fn deliver(&self, events: Vec<Value>) -> reqwest::StatusCode {
        let raw = json!({"destination": "Ubot", "events": events}).to_string();
        let signature = sign_line_body(raw.as_bytes(), SECRET).expect("sign");
        self.client
            .post(format!("{}/callback", self.base))
            .header(LINE_SIGNATURE_HEADER, signature)
            .body(raw)
            .send()
            .await
            .expect("send webhook")
            .status()
    }

    async fn say(&self, user: &str, token: &str, text: &str) {
        let status = self.deliver(vec![text_event(user, token, text)]).await;
        assert_eq!(status, reqwest::StatusCode::OK);
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn text_event(user: &str, token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": {"type": "user", "userId": user},
        "message": {"type": "text", "id": format!("m-{token}"), "text": text}
    })
}

fn follow_event(user: &str) -> Value {
    json!({
        "type": "follow",
        "replyToken": format!("follow-{user}"),
        "source": {"type": "user", "userId": user}
    })
}

fn single_text(messages: &[OutboundMessage]) -> Option<&str> {
    match messages {
        [OutboundMessage::Text(text)] => Some(text.as_str()),
        _ => None,
    }
}

async fn wait_for_pushes(sender: &RecordingSender, to: &str, expected: usize) {
    for _ in 0..100 {
        if sender.pushes_to(to).len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} pushes to {to}, saw {}",
        sender.pushes_to(to).len()
    );
}

fn persistent_identity(dir: &Path) -> IdentityStore {
    IdentityStore::open(IdentityStateFile::for_state_dir(dir)).expect("open identity store")
}

#[tokio::test]
async fn integration_new_user_journey_from_prompt_to_order_form() {
    let sender = Arc::new(RecordingSender::default());
    let harness = Harness::start(sender.clone(), IdentityStore::in_memory()).await;
    let texts = DispatchTexts::default();

    harness.say("U1", "r1", "你好").await;
    let prompt = sender.reply_for("r1").expect("terms prompt");
    assert!(matches!(prompt.as_slice(), [OutboundMessage::Card(_)]));

    harness.say("U1", "r2", "我同意票速通條款v1").await;
    let ack = sender.reply_for("r2").expect("consent ack");
    assert_eq!(single_text(&ack), Some(texts.consent_acknowledgement.as_str()));

    harness.say("U1", "r3", CONCERT_CATALOG_KEYWORD).await;
    let catalog = sender.reply_for("r3").expect("catalog");
    assert!(matches!(catalog.as_slice(), [OutboundMessage::Card(_)]));

    harness.say("U1", "r4", "我要預訂：TWICE").await;
    let form = sender.reply_for("r4").expect("order form");
    assert_eq!(single_text(&form), Some(texts.order_form_template.as_str()));

    harness.say("U1", "r5", "我要預訂：TWICE").await;
    let repeat = sender.reply_for("r5").expect("already submitted");
    assert_eq!(single_text(&repeat), Some(texts.order_already_submitted.as_str()));

    harness.say("U1", "r6", "請問還有票嗎").await;
    assert!(sender.reply_for("r6").is_none(), "auto-reply is off by default");

    // keyword, two form requests and the silent fallback reach the operator
    wait_for_pushes(&sender, OPERATOR, 4).await;
    let notices = sender.pushes_to(OPERATOR);
    assert_eq!(
        single_text(&notices[3]),
        Some("📩 有人傳訊息：請問還有票嗎（自動回應 關閉）")
    );
    assert!(notices
        .iter()
        .all(|notice| !single_text(notice).unwrap_or_default().contains("我同意")));
}

#[tokio::test]
async fn integration_manager_toggles_away_reply_for_everyone() {
    let sender = Arc::new(RecordingSender::default());
    let identity = IdentityStore::in_memory();
    identity.record_consent(&UserId::new(OPERATOR));
    identity.record_consent(&UserId::new("U2"));
    let harness = Harness::start(sender.clone(), identity).await;
    let texts = DispatchTexts::default();

    harness.say("U2", "u-1", ENABLE_AUTO_REPLY_COMMAND).await;
    assert!(sender.reply_for("u-1").is_none(), "non-managers cannot toggle");

    harness.say(OPERATOR, "m-1", ENABLE_AUTO_REPLY_COMMAND).await;
    let ack = sender.reply_for("m-1").expect("enable ack");
    assert_eq!(single_text(&ack), Some(texts.auto_reply_enabled_ack.as_str()));

    harness.say("U2", "u-2", "有人在嗎").await;
    let away = sender.reply_for("u-2").expect("away reply");
    assert_eq!(single_text(&away), Some(texts.away_message.as_str()));

    harness.say(OPERATOR, "m-2", DISABLE_AUTO_REPLY_COMMAND).await;
    let ack = sender.reply_for("m-2").expect("disable ack");
    assert_eq!(single_text(&ack), Some(texts.auto_reply_disabled_ack.as_str()));

    harness.say("U2", "u-3", "有人在嗎").await;
    assert!(sender.reply_for("u-3").is_none());
}

#[tokio::test]
async fn regression_unsigned_delivery_reaches_nobody() {
    let sender = Arc::new(RecordingSender::default());
    let harness = Harness::start(sender.clone(), IdentityStore::in_memory()).await;

    let raw = json!({"events": [text_event("U1", "r1", "hello")]}).to_string();
    let response = harness
        .client
        .post(format!("{}/callback", harness.base))
        .header(LINE_SIGNATURE_HEADER, "bm90LWEtc2lnbmF0dXJl")
        .body(raw)
        .send()
        .await
        .expect("send webhook");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sender.deliveries().is_empty());
}

#[tokio::test]
async fn integration_follow_pushes_terms_prompt_to_new_users_only() {
    let sender = Arc::new(RecordingSender::default());
    let identity = IdentityStore::in_memory();
    identity.record_consent(&UserId::new("U-known"));
    let harness = Harness::start(sender.clone(), identity).await;

    let status = harness
        .deliver(vec![follow_event("U-new"), follow_event("U-known")])
        .await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let pushes = sender.pushes_to("U-new");
    assert_eq!(pushes.len(), 1);
    assert!(matches!(pushes[0].as_slice(), [OutboundMessage::Card(_)]));
    assert!(sender.pushes_to("U-known").is_empty());
}

#[tokio::test]
async fn integration_concurrent_consent_is_recorded_once_per_user() {
    let sender = Arc::new(RecordingSender::default());
    let harness = Harness::start(sender.clone(), IdentityStore::in_memory()).await;

    let events = (0..8)
        .map(|index| text_event("U-race", &format!("race-{index}"), "我同意票速通條款v1"))
        .collect();
    assert_eq!(harness.deliver(events).await, reqwest::StatusCode::OK);

    // The first phrase records consent; the rest route as ordinary messages.
    let ack = DispatchTexts::default().consent_acknowledgement;
    let replies = (0..8)
        .filter_map(|index| sender.reply_for(&format!("race-{index}")))
        .collect::<Vec<_>>();
    assert_eq!(replies.len(), 1);
    assert_eq!(single_text(&replies[0]), Some(ack.as_str()));
    wait_for_pushes(&sender, OPERATOR, 7).await;

    harness.say("U-race", "after", "hello").await;
    assert!(sender.reply_for("after").is_none(), "user is past the gate");
}

#[tokio::test]
async fn integration_consent_and_order_form_survive_restart() {
    let temp = tempfile::tempdir().expect("tempdir");
    let sender = Arc::new(RecordingSender::default());
    {
        let harness = Harness::start(sender.clone(), persistent_identity(temp.path())).await;
        harness.say("U1", "r1", "我同意票速通條款v1").await;
        harness.say("U1", "r2", "我要預訂：TWICE").await;
    }

    let sender = Arc::new(RecordingSender::default());
    let harness = Harness::start(sender.clone(), persistent_identity(temp.path())).await;
    harness.say("U1", "r3", "我要預訂：TWICE").await;
    let reply = sender.reply_for("r3").expect("reply after restart");
    assert_eq!(
        single_text(&reply),
        Some(DispatchTexts::default().order_already_submitted.as_str())
    );
}

#[tokio::test]
async fn integration_line_api_receives_rendered_reply_and_operator_push() {
    let line_api = MockServer::start();
    let reply = line_api.mock(|when, then| {
        when.method(POST)
            .path("/v2/bot/message/reply")
            .header("authorization", "Bearer line-token")
            .body_includes("\"replyToken\":\"r-catalog\"")
            .body_includes("\"type\":\"flex\"");
        then.status(200).json_body(json!({}));
    });
    let push = line_api.mock(|when, then| {
        when.method(POST)
            .path("/v2/bot/message/push")
            .body_includes("\"to\":\"Uboss\"")
            .body_includes("有人傳訊息");
        then.status(200).json_body(json!({}));
    });

    let client = LineMessagingClient::new(&line_api.base_url(), "line-token", 2_000)
        .expect("line client");
    let identity = IdentityStore::in_memory();
    identity.record_consent(&UserId::new("U1"));
    let harness = Harness::start(Arc::new(client), identity).await;

    harness.say("U1", "r-catalog", CONCERT_CATALOG_KEYWORD).await;
    reply.assert_calls(1);

    for _ in 0..100 {
        if push.calls() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    push.assert_calls(1);
}
