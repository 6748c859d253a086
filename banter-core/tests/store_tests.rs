// ABOUTME: Tests for conversation/message persistence.
// ABOUTME: Verifies round-trips, ordering, corrupt-record degradation, and device flags.

use banter_core::store::{ConversationStore, Message, Sender};

#[test]
fn test_message_round_trip_preserves_order() {
    let dir = tempfile::tempdir().unwrap();

    let conversation_id = {
        let mut store = ConversationStore::open(dir.path()).unwrap();
        let conversation = store.create_conversation("sorting help").unwrap();

        store.append_message(Message::new(&conversation.id, Sender::User, "first"));
        store.append_message(Message::new(&conversation.id, Sender::System, "second"));
        store.append_message(Message::new(&conversation.id, Sender::User, "third"));
        conversation.id
    };

    let mut reopened = ConversationStore::open(dir.path()).unwrap();
    let messages = reopened.select_conversation(&conversation_id);

    let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[1].sender, Sender::System);
    assert_eq!(messages[0].conversation_id, conversation_id);
}

#[test]
fn test_conversations_are_most_recent_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConversationStore::open(dir.path()).unwrap();

    store.create_conversation("older").unwrap();
    store.create_conversation("newer").unwrap();

    let titles: Vec<_> = store
        .conversations()
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

#[test]
fn test_conversation_list_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = ConversationStore::open(dir.path()).unwrap();
        store.create_conversation("kept").unwrap();
    }

    let reopened = ConversationStore::open(dir.path()).unwrap();
    assert_eq!(reopened.conversations().len(), 1);
    assert_eq!(reopened.conversations()[0].title, "kept");
}

#[test]
fn test_blank_title_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConversationStore::open(dir.path()).unwrap();

    assert!(store.create_conversation("").is_err());
    assert!(store.create_conversation("   ").is_err());
    assert!(store.conversations().is_empty());
}

#[test]
fn test_corrupt_records_degrade_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let conversation_id = {
        let mut store = ConversationStore::open(dir.path()).unwrap();
        let conversation = store.create_conversation("doomed").unwrap();
        store.append_message(Message::new(&conversation.id, Sender::User, "hello"));
        conversation.id
    };

    // Vandalize both persisted slices behind the store's back.
    let conn = rusqlite::Connection::open(dir.path().join("banter.db")).unwrap();
    conn.execute("UPDATE kv SET value = 'not json at all'", [])
        .unwrap();
    drop(conn);

    let mut store = ConversationStore::open(dir.path()).unwrap();
    assert!(store.conversations().is_empty());
    assert!(store.select_conversation(&conversation_id).is_empty());
}

#[test]
fn test_select_unknown_conversation_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConversationStore::open(dir.path()).unwrap();
    assert!(store.select_conversation("conv_missing").is_empty());
}

#[test]
fn test_device_user_id_is_stable_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let first = {
        let store = ConversationStore::open(dir.path()).unwrap();
        store.device_user_id()
    };
    assert!(first.starts_with("user_"));

    let reopened = ConversationStore::open(dir.path()).unwrap();
    assert_eq!(reopened.device_user_id(), first);
}

#[test]
fn test_theme_defaults_to_dark_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = ConversationStore::open(dir.path()).unwrap();
        assert_eq!(store.theme(), "dark");
        store.set_theme("light");
    }

    let reopened = ConversationStore::open(dir.path()).unwrap();
    assert_eq!(reopened.theme(), "light");
}
