use tokio::sync::mpsc;
use uuid::Uuid;

use agriguru_api::error::ApiError;
use agriguru_api::infra::chat_hub::ChatHub;
use agriguru_api::usecase::chat::{
    ChatRelay, ClientEvent, DirectMessageInput, HistoryQuery, ServerEvent,
};

use crate::helpers::MockChatRepo;

fn relay(repo: &MockChatRepo) -> ChatRelay<MockChatRepo> {
    ChatRelay {
        messages: repo.clone(),
        hub: ChatHub::new(),
    }
}

fn join(room: &str, username: &str) -> ClientEvent {
    ClientEvent::Join {
        room: room.to_owned(),
        username: username.to_owned(),
    }
}

fn say(room: &str, username: &str, text: &str) -> ClientEvent {
    ClientEvent::ChatMessage {
        room: room.to_owned(),
        username: username.to_owned(),
        message: Some(text.to_owned()),
        image: None,
    }
}

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn should_announce_join_to_other_members_only() {
    let relay = relay(&MockChatRepo::empty());
    let (asha, bala) = (Uuid::now_v7(), Uuid::now_v7());
    let (asha_tx, mut asha_rx) = mpsc::channel(8);
    let (bala_tx, mut bala_rx) = mpsc::channel(8);

    relay.handle(asha, &asha_tx, join("paddy", "asha")).await.unwrap();
    relay.handle(bala, &bala_tx, join("paddy", "bala")).await.unwrap();

    assert_eq!(
        drain(&mut asha_rx),
        vec![ServerEvent::UserJoined {
            room: "paddy".into(),
            username: "bala".into()
        }]
    );
    assert!(drain(&mut bala_rx).is_empty());

    relay.handle(bala, &bala_tx, join("paddy", "bala")).await.unwrap();
    assert!(drain(&mut asha_rx).is_empty(), "rejoining is not announced again");
}

#[tokio::test]
async fn should_persist_and_fan_out_room_message() {
    let repo = MockChatRepo::empty();
    let stored = repo.messages_handle();
    let relay = relay(&repo);
    let (asha, bala) = (Uuid::now_v7(), Uuid::now_v7());
    let (asha_tx, mut asha_rx) = mpsc::channel(8);
    let (bala_tx, mut bala_rx) = mpsc::channel(8);
    relay.handle(asha, &asha_tx, join("paddy", "asha")).await.unwrap();
    relay.handle(bala, &bala_tx, join("paddy", "bala")).await.unwrap();
    drain(&mut asha_rx);

    relay
        .handle(asha, &asha_tx, say("paddy", "asha", "Rain expected tonight"))
        .await
        .unwrap();

    let stored = stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].message.as_deref(), Some("Rain expected tonight"));
    let expected = vec![ServerEvent::from(&stored[0])];
    assert_eq!(drain(&mut asha_rx), expected, "sender sees its own message");
    assert_eq!(drain(&mut bala_rx), expected);
}

#[tokio::test]
async fn should_echo_message_to_sender_outside_room() {
    let relay = relay(&MockChatRepo::empty());
    let outsider = Uuid::now_v7();
    let (tx, mut rx) = mpsc::channel(8);

    relay
        .handle(outsider, &tx, say("banana", "chitra", "Any buyers?"))
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::ChatMessage { username, .. } if username == "chitra"));
}

#[tokio::test]
async fn should_reject_empty_message_without_storing() {
    let repo = MockChatRepo::empty();
    let stored = repo.messages_handle();
    let relay = relay(&repo);
    let (tx, _rx) = mpsc::channel(8);

    let result = relay
        .handle(Uuid::now_v7(), &tx, say("paddy", "asha", "   "))
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))), "got {result:?}");
    let missing_room = relay.handle(Uuid::now_v7(), &tx, join("", "asha")).await;
    assert!(matches!(missing_room, Err(ApiError::Validation(_))));
    assert!(stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_relay_typing_and_leave() {
    let relay = relay(&MockChatRepo::empty());
    let (asha, bala) = (Uuid::now_v7(), Uuid::now_v7());
    let (asha_tx, mut asha_rx) = mpsc::channel(8);
    let (bala_tx, mut bala_rx) = mpsc::channel(8);
    relay.handle(asha, &asha_tx, join("paddy", "asha")).await.unwrap();
    relay.handle(bala, &bala_tx, join("paddy", "bala")).await.unwrap();
    drain(&mut asha_rx);

    relay
        .handle(
            bala,
            &bala_tx,
            ClientEvent::Typing {
                room: "paddy".into(),
                username: "bala".into(),
            },
        )
        .await
        .unwrap();
    assert!(drain(&mut bala_rx).is_empty(), "typing is not echoed");
    assert_eq!(
        drain(&mut asha_rx),
        vec![ServerEvent::Typing {
            room: "paddy".into(),
            username: "bala".into()
        }]
    );

    relay.disconnect(bala).await;
    assert_eq!(
        drain(&mut asha_rx),
        vec![ServerEvent::UserLeft {
            room: "paddy".into(),
            username: "bala".into()
        }]
    );
    assert!(!relay.hub.is_member("paddy", bala).await);
    assert_eq!(relay.hub.member_count("paddy").await, 1);
}

#[tokio::test]
async fn should_store_direct_message_in_shared_room() {
    let repo = MockChatRepo::empty();
    let relay = relay(&repo);
    let watcher = Uuid::now_v7();
    let (tx, mut rx) = mpsc::channel(8);
    relay.handle(watcher, &tx, join("dm:f1:f2", "f1")).await.unwrap();

    let record = relay
        .post_direct(DirectMessageInput {
            text: "Can you lend the sprayer?".into(),
            sender: "Farmer Two".into(),
            from: "f2".into(),
            to: "f1".into(),
        })
        .await
        .unwrap();

    assert_eq!(record.room, "dm:f1:f2");
    assert_eq!(drain(&mut rx), vec![ServerEvent::from(&record)]);

    let history = relay
        .history(HistoryQuery::Pair {
            from: "f1".into(),
            to: "f2".into(),
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(history, vec![record]);

    let incomplete = relay
        .post_direct(DirectMessageInput {
            text: "hello".into(),
            sender: "Farmer Two".into(),
            from: "f2".into(),
            to: " ".into(),
        })
        .await;
    assert!(matches!(incomplete, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn should_return_latest_messages_oldest_first() {
    let repo = MockChatRepo::empty();
    let relay = relay(&repo);
    let (tx, _rx) = mpsc::channel(64);
    let conn = Uuid::now_v7();
    for i in 0..5 {
        relay
            .handle(conn, &tx, say("paddy", "asha", &format!("note {i}")))
            .await
            .unwrap();
    }

    let history = relay
        .history(HistoryQuery::Room {
            room: "paddy".into(),
            limit: Some(2),
        })
        .await
        .unwrap();
    let texts: Vec<_> = history.iter().filter_map(|m| m.message.as_deref()).collect();
    assert_eq!(texts, ["note 3", "note 4"]);

    let missing = relay
        .history(HistoryQuery::Room {
            room: String::new(),
            limit: None,
        })
        .await;
    assert!(matches!(missing, Err(ApiError::Validation(_))));
}
