//! Integration tests: a real server on a loopback socket, driven by real
//! clients, covering the handshake, game setup, the visibility rules, and
//! the shutdown sequence.

use std::time::Duration;

use deckhand::prelude::*;
use deckhand_protocol::{
    NotifyGameJoined, NotifyPlayerAction, FRAME_HEADER_LEN,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random loopback port with a fixed RNG seed.
async fn start_server(max_players: usize) -> (String, ShutdownHandle) {
    let server = Server::bind(ServerConfig {
        bind_addr: "127.0.0.1:0".into(),
        max_players,
        rng_seed: Some(42),
    })
    .await
    .expect("server should bind");

    let addr = server.local_addr().expect("bound address").to_string();
    let handle = server.shutdown_handle();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, handle)
}

fn spec_abc() -> std::sync::Arc<GameSpec> {
    GameSpec::new(vec!["A".into(), "B".into(), "C".into()]).expect("valid spec")
}

/// Receives the next event with a deadline so a missing frame fails the
/// test instead of hanging it.
async fn recv(client: &mut Client) -> Notification {
    tokio::time::timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("server should answer in time")
        .expect("connection should stay open")
}

fn expect_action(event: Notification) -> NotifyPlayerAction {
    match event {
        Notification::PlayerAction(action) => action,
        other => panic!("expected PlayerAction, got {other:?}"),
    }
}

fn expect_joined(event: Notification) -> NotifyGameJoined {
    match event {
        Notification::GameJoined(joined) => joined,
        other => panic!("expected GameJoined, got {other:?}"),
    }
}

/// Creates a game as `name` and returns (client, game id, snapshot).
async fn create_game(
    addr: &str,
    name: &str,
    spec: &GameSpec,
) -> (Client, GameId, NotifyGameJoined) {
    let mut client = Client::connect(addr, name).await.expect("connect");
    client.create_game(spec).expect("send create");
    let joined = expect_joined(recv(&mut client).await);
    (client, joined.game_id, joined)
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_handshake_frames_match_the_documented_bytes() {
    let (addr, _handle) = start_server(8).await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    // HANDSHAKE: id=2, len=6, magic 0x342F, protocol 1, empty name.
    stream
        .write_all(&[0x02, 0x06, 0x00, 0x2F, 0x34, 0x01, 0x00, 0x00, 0x00])
        .await
        .unwrap();

    // HANDSHAKE_RESPONSE: id=3, len=8, assigned player id 1.
    let mut response = [0u8; 11];
    stream.read_exact(&mut response).await.unwrap();
    assert_eq!(
        response,
        [0x03, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[tokio::test]
async fn test_first_frame_other_than_handshake_closes_silently() {
    let (addr, _handle) = start_server(8).await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    // A KEEPALIVE before the handshake.
    stream.write_all(&[0x01, 0x00, 0x00]).await.unwrap();

    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("server should close promptly")
        .unwrap();
    assert_eq!(read, 0, "connection must close with no reply");
}

#[tokio::test]
async fn test_handshake_with_wrong_magic_closes_silently() {
    let (addr, _handle) = start_server(8).await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    stream
        .write_all(&[0x02, 0x06, 0x00, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00])
        .await
        .unwrap();

    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("server should close promptly")
        .unwrap();
    assert_eq!(read, 0);
}

#[tokio::test]
async fn test_handshake_rejects_whitespace_names() {
    let (addr, _handle) = start_server(8).await;
    let err = Client::connect(&addr, "two words").await.unwrap_err();
    assert!(matches!(
        err,
        DeckhandError::Rejected(ErrorId::InvalidPlayerName)
    ));
}

#[tokio::test]
async fn test_server_full_rejects_the_next_handshake() {
    let (addr, _handle) = start_server(1).await;
    let _first = Client::connect(&addr, "ana").await.expect("first fits");
    let err = Client::connect(&addr, "ben").await.unwrap_err();
    assert!(matches!(err, DeckhandError::Rejected(ErrorId::ServerFull)));
}

#[tokio::test]
async fn test_player_ids_increase_across_connections() {
    let (addr, _handle) = start_server(8).await;
    let a = Client::connect(&addr, "ana").await.unwrap();
    let b = Client::connect(&addr, "ben").await.unwrap();
    assert_eq!(a.player_id(), PlayerId(1));
    assert_eq!(b.player_id(), PlayerId(2));
}

// =========================================================================
// Game setup and draw
// =========================================================================

#[tokio::test]
async fn test_create_game_then_draw_one_face_down() {
    let (addr, _handle) = start_server(8).await;
    let spec = spec_abc();
    let (mut ana, _game_id, joined) = create_game(&addr, "ana", &spec).await;

    assert_eq!(joined.deck_size, 3);
    assert_eq!(joined.player_ids, vec![ana.player_id()]);
    assert_eq!(joined.player_names, vec!["ana".to_string()]);
    assert_eq!(joined.player_hands, vec![Vec::<CardId>::new()]);
    // The snapshot echoes the creator's envelope byte for byte.
    assert_eq!(*GameSpec::decode(&joined.spec_data).unwrap(), *spec);

    ana.draw(1, false).expect("send draw");
    let action = expect_action(recv(&mut ana).await);
    assert_eq!(action.action, CommandId::CardDraw);
    assert_eq!(action.actor, ana.player_id());
    assert_eq!(action.cards.len(), 1);
    assert!(!action.cards[0].is_sentinel(), "source view carries the real id");

    // The public copy skips the source, so the next frame the sole member
    // sees is the answer to a follow-up info request, not a redacted echo.
    ana.info_cards().unwrap();
    match recv(&mut ana).await {
        Notification::CardInfo(info) => assert_eq!(info.ids, action.cards),
        other => panic!("expected CardInfo, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_announces_minimally_and_snapshots_fully() {
    let (addr, _handle) = start_server(8).await;
    let spec = spec_abc();
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec).await;

    // Ana draws one card before Ben arrives.
    ana.draw(1, false).unwrap();
    let drawn = expect_action(recv(&mut ana).await).cards;

    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();

    // Ben gets the full snapshot: real deck size, Ana's hand length-matched
    // but redacted, his own hand empty.
    let snapshot = expect_joined(recv(&mut ben).await);
    assert_eq!(snapshot.game_id, game_id);
    assert_eq!(snapshot.deck_size, 2);
    assert_eq!(snapshot.player_ids, vec![ana.player_id(), ben.player_id()]);
    assert_eq!(snapshot.player_hands[0], vec![CardId::ANY]);
    assert!(snapshot.player_hands[1].is_empty());
    assert_eq!(*GameSpec::decode(&snapshot.spec_data).unwrap(), *spec);

    // Ana gets the minimal announce: just the new player's row.
    let announce = expect_joined(recv(&mut ana).await);
    assert_eq!(announce.game_id, game_id);
    assert!(announce.spec_data.is_empty());
    assert_eq!(announce.deck_size, 0);
    assert_eq!(announce.player_ids, vec![ben.player_id()]);
    assert_eq!(announce.player_names, vec!["ben".to_string()]);
    assert_eq!(drawn.len(), 1);
}

#[tokio::test]
async fn test_joining_a_missing_game_reports_invalid_game_id() {
    let (addr, _handle) = start_server(8).await;
    let mut ana = Client::connect(&addr, "ana").await.unwrap();
    ana.join_game(GameId(999)).unwrap();
    match recv(&mut ana).await {
        Notification::InputError(e) => {
            assert_eq!(e.offending, CommandId::GameJoin.as_u8());
            assert_eq!(e.error, ErrorId::InvalidGameId);
        }
        other => panic!("expected InputError, got {other:?}"),
    }

    // Still in the lobby: creating a game works.
    ana.create_game(&spec_abc()).unwrap();
    expect_joined(recv(&mut ana).await);
}

// =========================================================================
// Visibility
// =========================================================================

#[tokio::test]
async fn test_private_show_reveals_only_to_source_and_target() {
    let (addr, _handle) = start_server(8).await;
    let spec = GameSpec::new(vec!["A".into(), "B".into()]).unwrap();
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec).await;

    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);

    // Ana draws face-down; Ben only learns that one card moved.
    ana.draw(1, false).unwrap();
    let card = expect_action(recv(&mut ana).await).cards[0];
    assert!(!card.is_sentinel());
    let seen_by_ben = expect_action(recv(&mut ben).await);
    assert_eq!(seen_by_ben.cards, vec![CardId::ANY]);

    // Ana shows the card to Ben privately: both ends see the real id, and
    // with only two players at the table nobody gets a redacted copy.
    ana.show(
        CardSelector::Specific(card),
        PlayerSelector::Specific(ben.player_id()),
    )
    .unwrap();

    let echo = expect_action(recv(&mut ana).await);
    assert_eq!(echo.action, CommandId::CardShow);
    assert_eq!(echo.cards, vec![card]);

    let shown = expect_action(recv(&mut ben).await);
    assert_eq!(shown.cards, vec![card]);
    assert_eq!(shown.target, ben.player_id());
}

#[tokio::test]
async fn test_face_down_give_keeps_bystanders_blind() {
    let (addr, _handle) = start_server(8).await;
    let spec = spec_abc();
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec).await;

    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);
    let mut cho = Client::connect(&addr, "cho").await.unwrap();
    cho.join_game(game_id).unwrap();
    expect_joined(recv(&mut cho).await);
    expect_joined(recv(&mut ana).await);
    expect_joined(recv(&mut ben).await);

    ana.draw(1, false).unwrap();
    let card = expect_action(recv(&mut ana).await).cards[0];
    expect_action(recv(&mut ben).await);
    expect_action(recv(&mut cho).await);

    ana.give(
        CardSelector::Specific(card),
        PlayerSelector::Specific(ben.player_id()),
        false,
    )
    .unwrap();

    // Source and target always learn the real id, face-down or not.
    assert_eq!(expect_action(recv(&mut ana).await).cards, vec![card]);
    assert_eq!(expect_action(recv(&mut ben).await).cards, vec![card]);
    // The bystander sees a length-one redaction.
    assert_eq!(expect_action(recv(&mut cho).await).cards, vec![CardId::ANY]);
}

#[tokio::test]
async fn test_putback_at_depth_redacts_the_public_view() {
    let (addr, _handle) = start_server(8).await;
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;
    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);

    ana.draw(1, false).unwrap();
    let card = expect_action(recv(&mut ana).await).cards[0];
    expect_action(recv(&mut ben).await);

    ana.putback(CardSelector::Specific(card), 1).unwrap();
    let source = expect_action(recv(&mut ana).await);
    assert_eq!(source.action, CommandId::CardPutback);
    assert_eq!(source.cards, vec![card]);
    assert_eq!(expect_action(recv(&mut ben).await).cards, vec![CardId::ANY]);

    // Depth beyond the deck: INVALID_DATA, nothing changes.
    ana.draw(1, false).unwrap();
    let card = expect_action(recv(&mut ana).await).cards[0];
    expect_action(recv(&mut ben).await);
    ana.putback(CardSelector::Specific(card), 99).unwrap();
    match recv(&mut ana).await {
        Notification::InputError(e) => {
            assert_eq!(e.offending, CommandId::CardPutback.as_u8());
            assert_eq!(e.error, ErrorId::InvalidData);
        }
        other => panic!("expected InputError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_default_game_uses_the_bundled_deck() {
    let (addr, _handle) = start_server(8).await;
    let mut ana = Client::connect(&addr, "ana").await.unwrap();

    ana.create_default_game().expect("send create");
    let joined = expect_joined(recv(&mut ana).await);
    assert_eq!(joined.deck_size, 56);

    let spec = GameSpec::decode(&joined.spec_data).unwrap();
    assert_eq!(*spec, *GameSpec::standard());
    assert_eq!(spec.card_name(CardId(0)), Some("Ace Of Spades"));
    assert_eq!(spec.card_name(CardId(1)), Some("1 Of Spades"));
}

#[tokio::test]
async fn test_peek_discard_and_shuffle_views() {
    let (addr, _handle) = start_server(8).await;
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;
    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);

    // A private peek: the caller sees real ids top to bottom, the table a
    // length-matched redaction, and nothing moves.
    ana.peek(2, false).unwrap();
    let seen = expect_action(recv(&mut ana).await);
    assert_eq!(seen.action, CommandId::DeckPeek);
    assert_eq!(seen.cards.len(), 2);
    assert!(seen.cards.iter().all(|c| !c.is_sentinel()));
    assert_eq!(
        expect_action(recv(&mut ben).await).cards,
        vec![CardId::ANY, CardId::ANY]
    );

    // The top card of the peek is the next draw.
    ana.draw(1, false).unwrap();
    let drawn = expect_action(recv(&mut ana).await).cards;
    assert_eq!(drawn, vec![seen.cards[0]]);
    expect_action(recv(&mut ben).await);

    // A face-up discard shows the table the real card.
    ana.discard(CardSelector::Specific(drawn[0]), true).unwrap();
    assert_eq!(expect_action(recv(&mut ana).await).cards, drawn);
    assert_eq!(expect_action(recv(&mut ben).await).cards, drawn);

    // Shuffle reports no cards at all.
    ana.shuffle().unwrap();
    let shuffled = expect_action(recv(&mut ana).await);
    assert_eq!(shuffled.action, CommandId::DeckShuffle);
    assert!(shuffled.cards.is_empty());
    assert!(expect_action(recv(&mut ben).await).cards.is_empty());

    // The discarded card is out of play: two cards left.
    ana.info_decks().unwrap();
    match recv(&mut ana).await {
        Notification::DeckInfo(info) => assert_eq!(info.card_counts, vec![2]),
        other => panic!("expected DeckInfo, got {other:?}"),
    }
}

// =========================================================================
// Name rules
// =========================================================================

#[tokio::test]
async fn test_name_colliding_with_a_card_cannot_join() {
    let (addr, _handle) = start_server(8).await;
    let spec = GameSpec::new(vec!["Alice".into(), "B".into()]).unwrap();
    let (_bob, game_id, _) = create_game(&addr, "bob", &spec).await;

    // Case-insensitive collision with the card named "Alice".
    let mut alice = Client::connect(&addr, "alice").await.unwrap();
    alice.join_game(game_id).unwrap();
    match recv(&mut alice).await {
        Notification::InputError(e) => {
            assert_eq!(e.offending, CommandId::GameJoin.as_u8());
            assert_eq!(e.error, ErrorId::InvalidPlayerName);
        }
        other => panic!("expected InputError, got {other:?}"),
    }

    // The session stayed in the lobby: a collision-free create succeeds.
    alice.create_game(&spec_abc()).unwrap();
    expect_joined(recv(&mut alice).await);
}

#[tokio::test]
async fn test_duplicate_member_name_cannot_join() {
    let (addr, _handle) = start_server(8).await;
    let (_ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;

    let mut imposter = Client::connect(&addr, "ANA").await.unwrap();
    imposter.join_game(game_id).unwrap();
    match recv(&mut imposter).await {
        Notification::InputError(e) => {
            assert_eq!(e.error, ErrorId::InvalidPlayerName);
        }
        other => panic!("expected InputError, got {other:?}"),
    }
}

// =========================================================================
// Session state machine
// =========================================================================

#[tokio::test]
async fn test_in_game_command_from_the_lobby_closes_the_session() {
    let (addr, _handle) = start_server(8).await;
    let mut ana = Client::connect(&addr, "ana").await.unwrap();

    ana.draw(1, false).unwrap();
    match recv(&mut ana).await {
        Notification::InputError(e) => {
            assert_eq!(e.offending, CommandId::CardDraw.as_u8());
            assert_eq!(e.error, ErrorId::InvalidCmdId);
        }
        other => panic!("expected InputError, got {other:?}"),
    }
    // And then the connection closes.
    assert!(ana.next_event().await.is_err());
}

#[tokio::test]
async fn test_keepalive_is_a_noop_and_info_stays_consistent() {
    let (addr, _handle) = start_server(8).await;
    let (mut ana, _game_id, _) = create_game(&addr, "ana", &spec_abc()).await;

    ana.send(&Request::Keepalive).unwrap();
    ana.draw(2, false).unwrap();
    expect_action(recv(&mut ana).await);

    ana.info_players().unwrap();
    match recv(&mut ana).await {
        Notification::PlayerInfo(info) => {
            assert_eq!(info.ids, vec![ana.player_id()]);
            assert_eq!(info.names, vec!["ana".to_string()]);
            assert_eq!(info.hand_sizes, vec![2]);
        }
        other => panic!("expected PlayerInfo, got {other:?}"),
    }

    ana.info_decks().unwrap();
    match recv(&mut ana).await {
        Notification::DeckInfo(info) => {
            assert_eq!(info.ids, vec![DeckId(0)]);
            assert_eq!(info.card_counts, vec![1]);
        }
        other => panic!("expected DeckInfo, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leave_returns_to_lobby_and_notifies_the_table() {
    let (addr, _handle) = start_server(8).await;
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;
    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);

    ben.leave_game().unwrap();
    let departed = expect_action(recv(&mut ben).await);
    assert_eq!(departed.action, CommandId::GameLeave);
    assert_eq!(departed.actor, ben.player_id());

    let observed = expect_action(recv(&mut ana).await);
    assert_eq!(observed.action, CommandId::GameLeave);
    assert_eq!(observed.actor, ben.player_id());

    // Ben is back in the lobby and can rejoin.
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);
}

#[tokio::test]
async fn test_dropped_connection_reads_as_a_leave() {
    let (addr, _handle) = start_server(8).await;
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;
    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);
    let ben_id = ben.player_id();

    drop(ben);

    let observed = expect_action(recv(&mut ana).await);
    assert_eq!(observed.action, CommandId::GameLeave);
    assert_eq!(observed.actor, ben_id);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_notifies_every_player_then_closes() {
    let (addr, handle) = start_server(8).await;
    let (mut ana, game_id, _) = create_game(&addr, "ana", &spec_abc()).await;
    let mut ben = Client::connect(&addr, "ben").await.unwrap();
    ben.join_game(game_id).unwrap();
    expect_joined(recv(&mut ben).await);
    expect_joined(recv(&mut ana).await);

    handle.shutdown();

    assert!(matches!(recv(&mut ana).await, Notification::ServerShutdown));
    assert!(matches!(recv(&mut ben).await, Notification::ServerShutdown));
    assert!(ana.next_event().await.is_err());
    assert!(ben.next_event().await.is_err());
}

// =========================================================================
// Wire hygiene
// =========================================================================

#[tokio::test]
async fn test_oversized_claimed_length_is_fatal_before_payload() {
    let (addr, _handle) = start_server(8).await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    // Valid handshake first.
    stream
        .write_all(&[0x02, 0x06, 0x00, 0x2F, 0x34, 0x01, 0x00, 0x00, 0x00])
        .await
        .unwrap();
    let mut response = vec![0u8; FRAME_HEADER_LEN + 8];
    stream.read_exact(&mut response).await.unwrap();

    // KEEPALIVE claiming a 512-byte payload that never comes. The bounds
    // check must kill the session without waiting for the bytes.
    stream.write_all(&[0x01, 0x00, 0x02]).await.unwrap();

    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("server should close promptly")
        .unwrap();
    assert_eq!(read, 0);
}
