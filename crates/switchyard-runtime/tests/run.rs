//! Configuration, dispatch and ingestion together.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use switchyard_core::{
    ApiResult, Bot, BotStarted, BoxedBot, Chat, ChatMembersList, ChatType, Update, User,
};
use switchyard_framework::{Dispatcher, EventChat};
use switchyard_runtime::config::{ConfigLoader, DispatchConfig, SwitchyardConfig};
use switchyard_runtime::{ChannelSource, RunStats, Runtime};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct CountingBot {
    chats: AtomicUsize,
}

#[async_trait]
impl Bot for CountingBot {
    async fn get_chat(&self, chat_id: i64) -> ApiResult<Chat> {
        self.chats.fetch_add(1, Ordering::SeqCst);
        Ok(Chat::new(chat_id, ChatType::Dialog))
    }

    async fn get_members(&self, _chat_id: i64, _user_ids: &[i64]) -> ApiResult<ChatMembersList> {
        Ok(ChatMembersList::default())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn started(chat_id: i64) -> Update {
    Update::from(BotStarted {
        chat_id,
        user: User::new(chat_id, "Ann"),
        payload: None,
        user_locale: None,
        timestamp: 0,
    })
}

fn config(enrich: bool) -> SwitchyardConfig {
    ConfigLoader::new()
        .without_env()
        .merge(SwitchyardConfig {
            dispatch: DispatchConfig {
                enrich_update_context: enrich,
                max_concurrent_updates: 2,
                ..Default::default()
            },
            ..Default::default()
        })
        .load()
        .unwrap()
}

fn recording_dispatcher(seen: Arc<Mutex<Vec<i64>>>) -> Dispatcher {
    let dp = Dispatcher::new();
    dp.bot_started().handler(move |chat: Option<EventChat>| {
        let seen = Arc::clone(&seen);
        async move {
            if let Some(chat) = chat {
                seen.lock().push(chat.chat_id);
            }
        }
    });
    dp
}

#[tokio::test]
async fn test_enrichment_flag_from_config_reaches_resolver() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let runtime = Runtime::new(recording_dispatcher(Arc::clone(&seen)), config(true));
    let bot = Arc::new(CountingBot::default());

    let (tx, source) = ChannelSource::channel(8);
    for id in [1, 2, 3] {
        tx.send(started(id)).await.unwrap();
    }
    drop(tx);

    let stats = runtime
        .run(source, Some(bot.clone() as BoxedBot), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats, RunStats {
        received: 3,
        handled: 3,
        ..Default::default()
    });
    assert_eq!(bot.chats.load(Ordering::SeqCst), 3);
    let mut seen = seen.lock().clone();
    seen.sort_unstable();
    assert_eq!(seen, [1, 2, 3]);
}

#[tokio::test]
async fn test_no_lookups_without_enrichment() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let runtime = Runtime::new(recording_dispatcher(Arc::clone(&seen)), config(false));
    let bot = Arc::new(CountingBot::default());

    let (tx, source) = ChannelSource::channel(8);
    tx.send(started(1)).await.unwrap();
    drop(tx);

    let stats = runtime
        .run(source, Some(bot.clone() as BoxedBot), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.handled, 1);
    assert_eq!(bot.chats.load(Ordering::SeqCst), 0);
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_cancel_while_waiting_for_updates() {
    let runtime = Runtime::new(Dispatcher::new(), config(false));
    let (_tx, source) = ChannelSource::channel(8);
    let shutdown = CancellationToken::new();

    let stop = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        stop.cancel();
    });

    let stats = runtime.run(source, None, shutdown).await.unwrap();
    assert_eq!(stats, RunStats::default());
}
