//! Message handler and dispatch loop tests

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use common::{MockChannel, ScriptedGenerator, handler, incoming, incoming_in};
use yomi::channels::Channel;
use yomi::commands::{CLEARED_REPLY, HELP_REPLY, NO_LOG_FILE_REPLY, start_reply};
use yomi::conversation::AUTH_FALLBACK;
use yomi::daemon::serve;
use yomi::generation::GenerationErrorKind;
use yomi::handler::SEND_FAILURE_REPLY;

fn read_log(dir: &std::path::Path) -> String {
    std::fs::read_to_string(dir.join("all_conversations.txt")).unwrap_or_default()
}

#[tokio::test]
async fn text_message_gets_reply_and_log_entry() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("heyy"));
    let handler = handler(Arc::clone(&generator), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("hey")).await;

    let sent = channel.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel_id, "42");
    assert_eq!(sent[0].content, "heyy");
    assert_eq!(channel.typing_count(), 1);

    let log = read_log(dir.path());
    assert!(log.contains("] Sam: hey\n"));
    assert!(log.contains("] Bot: heyy\n"));
}

#[tokio::test]
async fn start_greets_and_resets() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let handler = handler(Arc::clone(&generator), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("remember me")).await;
    handler.handle(&channel, incoming("/start")).await;
    handler.handle(&channel, incoming("hello again")).await;

    let texts = channel.sent_texts().await;
    assert_eq!(texts[1], start_reply("Sam"));

    let requests = generator.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[1].context.is_empty());
}

#[tokio::test]
async fn clear_mid_conversation_empties_context() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let handler = handler(Arc::clone(&generator), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("one")).await;
    handler.handle(&channel, incoming("two")).await;
    handler.handle(&channel, incoming("/clear")).await;
    handler.handle(&channel, incoming("three")).await;

    let texts = channel.sent_texts().await;
    assert_eq!(texts, vec!["ok", "ok", CLEARED_REPLY, "ok"]);

    let requests = generator.requests().await;
    assert_eq!(requests[1].context.len(), 2);
    assert!(requests[2].context.is_empty());
    assert_eq!(requests[2].input, "three");

    // Commands are not logged
    assert!(!read_log(dir.path()).contains("/clear"));
}

#[tokio::test]
async fn clear_only_touches_its_own_chat() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let handler = handler(Arc::clone(&generator), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming_in("1", "chat one")).await;
    handler.handle(&channel, incoming_in("2", "chat two")).await;
    handler.handle(&channel, incoming_in("1", "/clear@yomi_bot")).await;
    handler.handle(&channel, incoming_in("2", "still here?")).await;

    let requests = generator.requests().await;
    assert_eq!(requests[2].context.len(), 2);
    assert_eq!(requests[2].context[0].text, "chat two");
}

#[tokio::test]
async fn logs_and_stats_report_the_chat_log() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler(Arc::new(ScriptedGenerator::replying("heyy")), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("/logs")).await;
    handler.handle(&channel, incoming("hey")).await;
    handler.handle(&channel, incoming("/logs")).await;
    handler.handle(&channel, incoming("/stats")).await;

    let texts = channel.sent_texts().await;
    assert_eq!(texts[0], NO_LOG_FILE_REPLY);

    assert!(texts[2].starts_with("📋 Recent conversations:\n\n"));
    assert!(texts[2].contains("Sam: hey"));
    assert!(texts[2].contains("Bot: heyy"));

    assert!(texts[3].contains("💬 Total messages: 1"));
    assert!(texts[3].contains("📅 Today's messages: 1"));
    assert!(texts[3].contains("🔄 Active chats: 1"));
}

#[tokio::test]
async fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler(Arc::new(ScriptedGenerator::replying("ok")), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("/HELP")).await;

    assert_eq!(channel.sent_texts().await, vec![HELP_REPLY]);
}

#[tokio::test]
async fn unknown_command_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let handler = handler(Arc::clone(&generator), dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("/dance")).await;

    assert!(channel.sent().await.is_empty());
    assert_eq!(channel.typing_count(), 0);
    assert!(generator.requests().await.is_empty());
}

#[tokio::test]
async fn generation_failure_sends_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::failing(GenerationErrorKind::Auth));
    let handler = handler(generator, dir.path());
    let channel = MockChannel::new();

    handler.handle(&channel, incoming("hey")).await;

    assert_eq!(channel.sent_texts().await, vec![AUTH_FALLBACK]);
    assert!(read_log(dir.path()).contains(&format!("Bot: {AUTH_FALLBACK}")));
}

#[tokio::test]
async fn send_failure_apologises_and_logs_error() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler(Arc::new(ScriptedGenerator::replying("heyy")), dir.path());
    let channel = MockChannel::new();
    channel.fail_next_sends(1);

    handler.handle(&channel, incoming("hey")).await;

    assert_eq!(channel.sent_texts().await, vec![SEND_FAILURE_REPLY]);
    let log = read_log(dir.path());
    assert!(log.contains("] Sam: hey\n"));
    assert!(log.contains("Bot: [ERROR: "));

    // The next message is unaffected
    handler.handle(&channel, incoming("hey again")).await;
    assert_eq!(channel.sent_texts().await.last().map(String::as_str), Some("heyy"));
}

#[tokio::test]
async fn serve_handles_messages_until_the_queue_closes() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let handler = Arc::new(handler(Arc::clone(&generator), dir.path()));
    let mock = Arc::new(MockChannel::new());
    let channel: Arc<dyn Channel> = Arc::clone(&mock) as Arc<dyn Channel>;

    let (tx, rx) = mpsc::channel(8);
    tx.send(incoming_in("1", "hi")).await.unwrap();
    tx.send(incoming_in("2", "hello")).await.unwrap();
    tx.send(incoming_in("3", "/help")).await.unwrap();
    drop(tx);

    serve(handler, channel, rx, std::future::pending::<()>()).await;

    let mut chats: Vec<String> = mock
        .sent()
        .await
        .into_iter()
        .map(|m| m.channel_id)
        .collect();
    chats.sort();
    assert_eq!(chats, vec!["1", "2", "3"]);
    assert_eq!(generator.requests().await.len(), 2);
}

#[tokio::test]
async fn serve_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let handler = Arc::new(handler(Arc::new(ScriptedGenerator::replying("ok")), dir.path()));
    let channel: Arc<dyn Channel> = Arc::new(MockChannel::new());

    // The sender stays open; only the shutdown future ends the loop
    let (_tx, rx) = mpsc::channel(8);
    serve(handler, channel, rx, async {}).await;
}
