//! Integration tests for [`storage::MessageRepository`].
//!
//! Covers received upserts, sent-message synthesis, recent ordering, lookups by id, filtered
//! search, stats, the `MessageStore` implementation and on-disk persistence, using in-memory
//! SQLite unless a file is the point of the test.

use gbot_core::{Message, MessageDirection, MessageStore, SenderKind, SentMessage};
use serde_json::json;
use storage::{MessageQuery, MessageRepository};

async fn memory_repo() -> MessageRepository {
    MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository")
}

fn received(id: &str, group_id: &str, user_id: &str, text: &str, created_at: i64) -> Message {
    Message::from_payload(json!({
        "id": id,
        "group_id": group_id,
        "sender_id": user_id,
        "name": format!("User {}", user_id),
        "sender_type": "user",
        "text": text,
        "created_at": created_at,
        "attachments": []
    }))
    .unwrap()
}

fn sent(text: &str, image_url: Option<&str>) -> SentMessage {
    SentMessage {
        text: text.to_string(),
        group_id: "group_1".to_string(),
        sender_id: "bot_1".to_string(),
        image_url: image_url.map(str::to_string),
    }
}

/// **Test: A received message can be looked up by id.**
///
/// **Setup:** In-memory DB; save one received message.
/// **Action:** `get_message_by_id("m1")`.
/// **Expected:** Row with the same group, user, text, direction "received"; it rebuilds into
/// the original message.
#[tokio::test]
async fn test_save_received_and_get_by_id() {
    let repo = memory_repo().await;
    let message = received("m1", "group_1", "user_1", "Hello World", 100);

    repo.save_received(&message).await.expect("Failed to save message");

    let row = repo
        .get_message_by_id("m1")
        .await
        .expect("Failed to get message")
        .expect("message missing");
    assert_eq!(row.group_id, "group_1");
    assert_eq!(row.user_id, "user_1");
    assert_eq!(row.text.as_deref(), Some("Hello World"));
    assert_eq!(row.created_at, 100);
    assert_eq!(row.direction(), Some(MessageDirection::Received));

    let rebuilt = row.to_message().unwrap();
    assert_eq!(rebuilt.id, "m1");
    assert_eq!(rebuilt.sender_name, "User user_1");
    assert_eq!(rebuilt.text.as_deref(), Some("Hello World"));
}

/// **Test: The received payload is stored verbatim and `user_id` comes from the payload.**
///
/// **Setup:** A bot-authored payload whose `user_id` (owner) differs from `sender_id`, with an
/// unrecognised `sender_type`, empty text and no attachments, avatar or system keys.
/// **Action:** `save_received`, then read the row back.
/// **Expected:** `raw_json` equals the payload; the `user_id` column is the owner id; the
/// message still rebuilds from the stored row.
#[tokio::test]
async fn test_save_received_keeps_raw_payload() {
    let repo = memory_repo().await;
    let payload = json!({
        "id": "m_raw",
        "group_id": "group_1",
        "sender_id": "bot_77",
        "user_id": "owner_5",
        "name": "Relay",
        "sender_type": "service",
        "text": ""
    });
    let message = Message::from_payload(payload.clone()).unwrap();

    repo.save_received(&message).await.unwrap();

    let row = repo.get_message_by_id("m_raw").await.unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&row.raw_json).unwrap();
    assert_eq!(stored, payload);
    assert_eq!(stored["user_id"], "owner_5");
    assert_eq!(row.user_id, "owner_5");
    assert_eq!(row.text, None);

    let rebuilt = row.to_message().unwrap();
    assert_eq!(rebuilt.sender_id, "bot_77");
    assert_eq!(rebuilt, message);
}

/// **Test: A message built in code is stored in normalized form.**
///
/// **Setup:** A `Message` with no raw payload (`raw` is null).
/// **Action:** `save_received`, then read the row back.
/// **Expected:** `user_id` column is the sender id; the row rebuilds into the same fields.
#[tokio::test]
async fn test_save_received_without_raw_payload() {
    let repo = memory_repo().await;
    let message = Message {
        id: "m_built".to_string(),
        group_id: "group_1".to_string(),
        sender_id: "user_9".to_string(),
        sender_name: "Nine".to_string(),
        sender_kind: SenderKind::User,
        text: Some("made here".to_string()),
        attachments: Vec::new(),
        created_at: 300,
        avatar_url: None,
        raw: serde_json::Value::Null,
    };

    repo.save_received(&message).await.unwrap();

    let row = repo.get_message_by_id("m_built").await.unwrap().unwrap();
    assert_eq!(row.user_id, "user_9");
    let rebuilt = row.to_message().unwrap();
    assert_eq!(rebuilt.sender_id, "user_9");
    assert_eq!(rebuilt.sender_name, "Nine");
    assert_eq!(rebuilt.text.as_deref(), Some("made here"));
    assert_eq!(rebuilt.created_at, 300);
}

/// **Test: Looking up an unknown id yields None.**
///
/// **Setup:** Empty in-memory DB.
/// **Action:** `get_message_by_id("non-existent-id")`.
/// **Expected:** `None`.
#[tokio::test]
async fn test_get_message_by_id_not_found() {
    let repo = memory_repo().await;

    let retrieved = repo
        .get_message_by_id("non-existent-id")
        .await
        .expect("Failed to query");

    assert!(retrieved.is_none());
}

/// **Test: Duplicate deliveries overwrite instead of failing.**
///
/// **Setup:** Save "m1" with text "first".
/// **Action:** Save "m1" again with text "second".
/// **Expected:** No error; one row whose text is "second".
#[tokio::test]
async fn test_save_received_upserts() {
    let repo = memory_repo().await;
    repo.save_received(&received("m1", "g", "u", "first", 1))
        .await
        .unwrap();
    repo.save_received(&received("m1", "g", "u", "second", 1))
        .await
        .expect("duplicate id must not fail");

    let stats = repo.get_stats(None).await.unwrap();
    assert_eq!(stats.total, 1);
    let row = repo.get_message_by_id("m1").await.unwrap().unwrap();
    assert_eq!(row.text.as_deref(), Some("second"));
}

/// **Test: Messages without text are stored with a NULL text column.**
///
/// **Setup:** A message whose only content is an image attachment.
/// **Action:** Save it and read it back.
/// **Expected:** `text` is None; the rebuilt message still carries the image.
#[tokio::test]
async fn test_textless_message_round_trip() {
    let repo = memory_repo().await;
    let message = Message::from_payload(json!({
        "id": "img",
        "group_id": "g",
        "sender_id": "u",
        "attachments": [{"type": "image", "url": "https://i.groupme.com/p.png"}]
    }))
    .unwrap();

    repo.save_received(&message).await.unwrap();

    let row = repo.get_message_by_id("img").await.unwrap().unwrap();
    assert!(row.text.is_none());
    assert_eq!(
        row.to_message().unwrap().image_url(),
        Some("https://i.groupme.com/p.png")
    );
}

/// **Test: Sent messages get a synthetic id and come back as bot messages.**
///
/// **Setup:** Empty DB.
/// **Action:** `save_sent` with text and an image, then `get_message_by_id`.
/// **Expected:** Id starts with "sent_"; direction "sent"; user_id is the bot id; the rebuilt
/// message is from a bot and carries the image.
#[tokio::test]
async fn test_save_sent() {
    let repo = memory_repo().await;

    let id = repo
        .save_sent(&sent("Hi there", Some("https://i.groupme.com/x.png")))
        .await
        .unwrap();
    assert!(id.starts_with("sent_"));

    let row = repo.get_message_by_id(&id).await.unwrap().unwrap();
    assert_eq!(row.direction(), Some(MessageDirection::Sent));
    assert_eq!(row.user_id, "bot_1");
    assert_eq!(row.group_id, "group_1");

    let message = row.to_message().unwrap();
    assert_eq!(message.sender_kind, SenderKind::Bot);
    assert_eq!(message.text.as_deref(), Some("Hi there"));
    assert_eq!(message.image_url(), Some("https://i.groupme.com/x.png"));
}

/// **Test: Two sends in a row get distinct ids.**
///
/// **Setup:** Empty DB.
/// **Action:** `save_sent` twice with the same text.
/// **Expected:** Different ids; two sent rows.
#[tokio::test]
async fn test_sent_ids_are_unique() {
    let repo = memory_repo().await;
    let a = repo.save_sent(&sent("same", None)).await.unwrap();
    let b = repo.save_sent(&sent("same", None)).await.unwrap();

    assert_ne!(a, b);
    assert_eq!(repo.get_stats(None).await.unwrap().sent, 2);
}

/// **Test: Recent messages are newest first, limited, and scoped to the group.**
///
/// **Setup:** 15 messages in group "g1" with increasing timestamps, 3 in "g2".
/// **Action:** `get_recent("g1", 10)`.
/// **Expected:** 10 messages, ids m14 down to m5.
#[tokio::test]
async fn test_get_recent_orders_newest_first() {
    let repo = memory_repo().await;
    for i in 0..15 {
        repo.save_received(&received(&format!("m{}", i), "g1", "u", &format!("Message {}", i), 1000 + i))
            .await
            .unwrap();
    }
    for i in 0..3 {
        repo.save_received(&received(&format!("other{}", i), "g2", "u", "elsewhere", 5000 + i))
            .await
            .unwrap();
    }

    let recent = repo.get_recent("g1", 10).await.unwrap();

    assert_eq!(recent.len(), 10);
    let ids: Vec<&str> = recent.iter().map(|m| m.id.as_str()).collect();
    let expected: Vec<String> = (5..15).rev().map(|i| format!("m{}", i)).collect();
    assert_eq!(ids, expected);
}

/// **Test: Ties on created_at are broken by insertion order, newest first.**
///
/// **Setup:** Three messages with the same timestamp, inserted a, b, c.
/// **Action:** `get_recent("g", 3)`.
/// **Expected:** c, b, a.
#[tokio::test]
async fn test_get_recent_ties_use_insertion_order() {
    let repo = memory_repo().await;
    for id in ["a", "b", "c"] {
        repo.save_received(&received(id, "g", "u", id, 42)).await.unwrap();
    }

    let ids: Vec<String> = repo
        .get_recent("g", 3)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();

    assert_eq!(ids, vec!["c", "b", "a"]);
}

/// **Test: Search filters by keyword case-insensitively and by user and direction.**
///
/// **Setup:** Mixed received and sent messages in two groups.
/// **Action:** Several `search_messages` queries.
/// **Expected:** Only matching rows, newest first.
#[tokio::test]
async fn test_search_messages() {
    let repo = memory_repo().await;
    repo.save_received(&received("m1", "group_1", "alice", "Pizza tonight?", 1)).await.unwrap();
    repo.save_received(&received("m2", "group_1", "bob", "no pizza for me", 2)).await.unwrap();
    repo.save_received(&received("m3", "group_1", "bob", "tacos", 3)).await.unwrap();
    repo.save_received(&received("m4", "group_2", "carol", "PIZZA!", 4)).await.unwrap();
    repo.save_sent(&sent("pizza ordered", None)).await.unwrap();

    let pizza_in_group = repo
        .search_messages(&MessageQuery::in_group("group_1").keyword("pizza"))
        .await
        .unwrap();
    assert_eq!(pizza_in_group.len(), 3);
    assert_eq!(pizza_in_group[0].direction(), Some(MessageDirection::Sent));

    let bob = repo
        .search_messages(&MessageQuery {
            user_id: Some("bob".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let bob_ids: Vec<&str> = bob.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(bob_ids, vec!["m3", "m2"]);

    let received_pizza = repo
        .search_messages(&MessageQuery {
            direction: Some(MessageDirection::Received),
            keyword: Some("PiZzA".to_string()),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<&str> = received_pizza.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m4", "m2"]);
}

/// **Test: LIKE wildcards in the keyword are matched literally.**
///
/// **Setup:** Messages "100% done" and "100 percent".
/// **Action:** Search for "100%".
/// **Expected:** Only "100% done".
#[tokio::test]
async fn test_search_escapes_wildcards() {
    let repo = memory_repo().await;
    repo.save_received(&received("m1", "g", "u", "100% done", 1)).await.unwrap();
    repo.save_received(&received("m2", "g", "u", "100 percent", 2)).await.unwrap();

    let found = repo
        .search_messages(&MessageQuery::default().keyword("100%"))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "m1");
}

/// **Test: Stats count directions, senders and the time range.**
///
/// **Setup:** Three received messages from two users in "g1", one in "g2", one sent in "group_1".
/// **Action:** `get_stats(Some("g1"))`, `get_stats(None)`, `get_stats(Some("empty"))`.
/// **Expected:** Group-scoped and global counts; empty group has zero totals and no range.
#[tokio::test]
async fn test_get_stats() {
    let repo = memory_repo().await;
    repo.save_received(&received("m1", "g1", "alice", "a", 100)).await.unwrap();
    repo.save_received(&received("m2", "g1", "bob", "b", 200)).await.unwrap();
    repo.save_received(&received("m3", "g1", "alice", "c", 300)).await.unwrap();
    repo.save_received(&received("m4", "g2", "carol", "d", 400)).await.unwrap();
    repo.save_sent(&sent("reply", None)).await.unwrap();

    let g1 = repo.get_stats(Some("g1")).await.unwrap();
    assert_eq!(g1.total, 3);
    assert_eq!(g1.received, 3);
    assert_eq!(g1.sent, 0);
    assert_eq!(g1.unique_senders, 2);
    assert_eq!(g1.first_at.unwrap().timestamp(), 100);
    assert_eq!(g1.last_at.unwrap().timestamp(), 300);

    let all = repo.get_stats(None).await.unwrap();
    assert_eq!(all.total, 5);
    assert_eq!(all.received, 4);
    assert_eq!(all.sent, 1);
    assert_eq!(all.unique_senders, 3);

    let empty = repo.get_stats(Some("empty")).await.unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.first_at.is_none());
    assert!(empty.last_at.is_none());
}

/// **Test: The MessageStore implementation records both directions.**
///
/// **Setup:** Repository used through `&dyn MessageStore`.
/// **Action:** `record_received`, `record_sent`, then `recent("group_1", 5)`.
/// **Expected:** Two messages, newest (the sent one) first.
#[tokio::test]
async fn test_message_store_impl() {
    let repo = memory_repo().await;
    let store: &dyn MessageStore = &repo;

    store
        .record_received(&received("m1", "group_1", "alice", "hello", 1))
        .await
        .unwrap();
    store.record_sent(&sent("hi alice", None)).await.unwrap();

    let recent = store.recent("group_1", 5).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].sender_kind, SenderKind::Bot);
    assert_eq!(recent[0].text.as_deref(), Some("hi alice"));
    assert_eq!(recent[1].id, "m1");
}

/// **Test: A file database is created when missing and keeps data across reopen.**
///
/// **Setup:** Temp dir; DB path that does not exist yet.
/// **Action:** Open, save, drop; open again and read.
/// **Expected:** File exists; the message is still there.
#[tokio::test]
async fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.db");
    let url = format!("sqlite://{}", path.display());

    {
        let repo = MessageRepository::new(&url).await.unwrap();
        repo.save_received(&received("m1", "g", "u", "kept", 1))
            .await
            .unwrap();
    }
    assert!(path.exists());

    let repo = MessageRepository::new(&url).await.unwrap();
    let row = repo.get_message_by_id("m1").await.unwrap();
    assert_eq!(row.unwrap().text.as_deref(), Some("kept"));
}
