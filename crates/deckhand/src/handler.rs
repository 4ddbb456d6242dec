//! Per-connection handler: handshake, session dispatch, and teardown.
//!
//! Each accepted socket gets one task running [`handle_connection`] plus a
//! writer task that drains the connection's frame sink. The reader side
//! walks the session state machine:
//!
//!   1. The first frame must be a valid `HANDSHAKE`; anything else closes
//!      the connection with no reply.
//!   2. `Lobby` commands create or join games.
//!   3. `InGame` commands take the game's lock, mutate, and dispatch the
//!      visibility views before the lock drops.
//!
//! Error policy follows the wire taxonomy: protocol-level failures (bad
//! header, bad length, bad payload, transport error) kill the session
//! silently; semantic failures answer with `NOTIFY_INPUT_ERROR` and leave
//! the session where it was; a command that is illegal in the current state
//! answers `INVALID_CMD_ID` and closes.

use std::sync::Arc;

use deckhand_engine::{ActionViews, EngineError, Game, GameSpec};
use deckhand_protocol::{
    read_frame, write_frame, CardId, CardInfoResponse, CommandId, DeckId,
    DeckInfoResponse, ErrorId, FrameSink, GameId, Handshake, HandshakeResponse,
    Notification, NotifyGameJoined, NotifyInputError, PlayerId,
    PlayerInfoResponse, PlayerSelector, ProtocolError, Request,
};
use deckhand_session::{PlayerRegistry, SessionState};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

use crate::server::ServerState;

/// Whether the read loop keeps going after a command.
enum Flow {
    Continue,
    Close,
}

/// Everything the handler knows about its connection.
struct SessionCtx {
    player_id: PlayerId,
    name: String,
    state: SessionState,
    game: Option<GameId>,
    sink: FrameSink,
}

/// Runs one connection from accept to close, including teardown.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let (mut reader, mut writer) = stream.into_split();
    let (sink, mut outbox) = mpsc::unbounded_channel::<Vec<u8>>();

    // The writer task is the only code that touches the write half, so
    // notification fan-out from other sessions never blocks on this socket.
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = outbox.recv().await {
            if write_frame(&mut writer, &frame).await.is_err() {
                break;
            }
        }
    });

    if let Some(mut ctx) = authenticate(&mut reader, &state, sink).await {
        run_session(&mut reader, &mut ctx, &state, &mut shutdown).await;
        teardown(ctx, &state, &shutdown).await;
    }

    // All sink clones are gone at this point; the writer drains whatever is
    // queued (possibly a final error or shutdown frame) and closes.
    let _ = writer_task.await;
}

/// Reads and validates the handshake. A peer that opens with anything but a
/// well-formed `HANDSHAKE` carrying the right magic and protocol id is
/// disconnected without a reply.
async fn authenticate(
    reader: &mut OwnedReadHalf,
    state: &ServerState,
    sink: FrameSink,
) -> Option<SessionCtx> {
    let (cmd, payload) = match read_frame(reader).await {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "connection dropped before handshake");
            return None;
        }
    };
    if cmd != CommandId::Handshake {
        tracing::debug!(?cmd, "first frame was not a handshake");
        return None;
    }
    let handshake = match Request::decode(cmd, &payload) {
        Ok(Request::Handshake(h)) => h,
        _ => return None,
    };
    if !handshake_magic_ok(&handshake) {
        tracing::debug!(
            magic = handshake.magic,
            protocol = handshake.protocol,
            "handshake magic or protocol mismatch"
        );
        return None;
    }
    if let Err(e) = PlayerRegistry::validate_handshake_name(&handshake.name) {
        send_input_error(&sink, CommandId::Handshake.as_u8(), e.error_id());
        return None;
    }

    let player_id = {
        let mut players = state.players.lock().await;
        match players.register(&handshake.name, sink.clone()) {
            Ok(id) => id,
            Err(e) => {
                send_input_error(&sink, CommandId::Handshake.as_u8(), e.error_id());
                return None;
            }
        }
    };

    send_notification(
        &sink,
        &Notification::HandshakeResponse(HandshakeResponse { player_id }),
    );
    tracing::info!(%player_id, name = %handshake.name, "handshake complete");

    Some(SessionCtx {
        player_id,
        name: handshake.name,
        state: SessionState::Lobby,
        game: None,
        sink,
    })
}

fn handshake_magic_ok(h: &Handshake) -> bool {
    h.magic == deckhand_protocol::PROTOCOL_MAGIC
        && h.protocol == deckhand_protocol::PROTOCOL_ID
}

/// The post-handshake read loop.
async fn run_session(
    reader: &mut OwnedReadHalf,
    ctx: &mut SessionCtx,
    state: &ServerState,
    shutdown: &mut watch::Receiver<bool>,
) {
    while !ctx.state.is_terminal() {
        let frame = tokio::select! {
            _ = shutdown.changed() => break,
            frame = read_frame(reader) => frame,
        };

        let (cmd, payload) = match frame {
            Ok(frame) => frame,
            Err(ProtocolError::UnknownCommand(raw)) => {
                // The stream position is unknowable after an unknown id, so
                // report it and close.
                send_input_error(&ctx.sink, raw, ErrorId::InvalidCmdId);
                break;
            }
            Err(e) => {
                tracing::debug!(player_id = %ctx.player_id, error = %e,
                    "fatal protocol error");
                break;
            }
        };

        if !ctx.state.permits(cmd) {
            send_input_error(&ctx.sink, cmd.as_u8(), ErrorId::InvalidCmdId);
            break;
        }

        let request = match Request::decode(cmd, &payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(player_id = %ctx.player_id, ?cmd, error = %e,
                    "malformed payload");
                break;
            }
        };

        let flow = match ctx.state {
            SessionState::Lobby => handle_lobby(ctx, state, request).await,
            SessionState::InGame => handle_in_game(ctx, state, request).await,
            _ => Flow::Close,
        };
        if matches!(flow, Flow::Close) {
            ctx.state = SessionState::Closed;
        }
    }
}

/// Commands legal in the lobby.
async fn handle_lobby(
    ctx: &mut SessionCtx,
    state: &ServerState,
    request: Request,
) -> Flow {
    match request {
        Request::Keepalive => Flow::Continue,
        Request::Disconnect => Flow::Close,
        Request::GameCreate(create) => {
            if let Err(e) = create_game(ctx, state, create.spec_data).await {
                reject(ctx, CommandId::GameCreate, &e);
            }
            Flow::Continue
        }
        Request::GameJoin(join) => {
            if let Err(e) = join_game(ctx, state, join.game_id).await {
                reject(ctx, CommandId::GameJoin, &e);
            }
            Flow::Continue
        }
        other => {
            tracing::debug!(cmd = ?other.command(), "unexpected lobby request");
            Flow::Close
        }
    }
}

/// `GAME_CREATE`: decode and validate the spec, sweep stale games, create,
/// seat the creator, send the full snapshot.
async fn create_game(
    ctx: &mut SessionCtx,
    state: &ServerState,
    spec_data: Vec<u8>,
) -> Result<(), EngineError> {
    let spec = GameSpec::decode(&spec_data)?;

    // The name rules are checked against this spec before the game exists,
    // so a rejected create leaves nothing behind for the sweep.
    if ctx.name.is_empty() {
        return Err(EngineError::NameRequired);
    }
    if spec.name_collides(&ctx.name) {
        return Err(EngineError::NameCollidesWithCard(ctx.name.clone()));
    }

    let handle = {
        let mut games = state.games.lock().await;
        games.sweep_empty().await;
        let (_, handle) = games.create(spec, spec_data);
        handle
    };

    let game_id = {
        let mut game = handle.lock().await;
        game.seat_player(ctx.player_id, &ctx.name, ctx.sink.clone())?;
        send_notification(
            &ctx.sink,
            &Notification::GameJoined(snapshot_for(&game, ctx.player_id)),
        );
        game.id()
    };

    let _ = state.players.lock().await.set_game(ctx.player_id, Some(game_id));
    ctx.game = Some(game_id);
    ctx.state = SessionState::InGame;
    tracing::info!(player_id = %ctx.player_id, %game_id, "game created and joined");
    Ok(())
}

/// `GAME_JOIN`: seat the caller, announce them to the table, then send them
/// the full snapshot.
async fn join_game(
    ctx: &mut SessionCtx,
    state: &ServerState,
    game_id: GameId,
) -> Result<(), EngineError> {
    let handle = state
        .games
        .lock()
        .await
        .get(game_id)
        .ok_or(EngineError::UnknownGame(game_id))?;

    {
        let mut game = handle.lock().await;
        game.seat_player(ctx.player_id, &ctx.name, ctx.sink.clone())?;

        // Minimal announce to everyone already seated: just the new row,
        // no spec, no deck size. The new seat is the last one.
        let announce = Notification::GameJoined(NotifyGameJoined {
            game_id,
            spec_data: Vec::new(),
            player_ids: vec![ctx.player_id],
            player_names: vec![ctx.name.clone()],
            player_hands: vec![Vec::new()],
            deck_size: 0,
        });
        match announce.to_frame() {
            Ok(frame) => {
                let seats = game.seats();
                for seat in &seats[..seats.len() - 1] {
                    let _ = seat.sink.send(frame.clone());
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "join announce does not fit a frame")
            }
        }

        send_notification(
            &ctx.sink,
            &Notification::GameJoined(snapshot_for(&game, ctx.player_id)),
        );
    }

    let _ = state.players.lock().await.set_game(ctx.player_id, Some(game_id));
    ctx.game = Some(game_id);
    ctx.state = SessionState::InGame;
    tracing::info!(player_id = %ctx.player_id, %game_id, "joined game");
    Ok(())
}

/// The full `NOTIFY_GAME_JOINED` snapshot as one member is allowed to see
/// it: their own hand in full, every other hand redacted length-for-length.
fn snapshot_for(game: &Game, viewer: PlayerId) -> NotifyGameJoined {
    let mut player_ids = Vec::with_capacity(game.seats().len());
    let mut player_names = Vec::with_capacity(game.seats().len());
    let mut player_hands = Vec::with_capacity(game.seats().len());
    for seat in game.seats() {
        player_ids.push(seat.player);
        player_names.push(seat.name.clone());
        player_hands.push(if seat.player == viewer {
            seat.hand.clone()
        } else {
            vec![CardId::ANY; seat.hand.len()]
        });
    }
    NotifyGameJoined {
        game_id: game.id(),
        spec_data: game.envelope().to_vec(),
        player_ids,
        player_names,
        player_hands,
        deck_size: game.deck_size(),
    }
}

/// Commands legal in-game.
async fn handle_in_game(
    ctx: &mut SessionCtx,
    state: &ServerState,
    request: Request,
) -> Flow {
    match request {
        Request::Keepalive => Flow::Continue,
        Request::Disconnect => Flow::Close,
        Request::GameLeave => {
            leave_game(ctx, state).await;
            ctx.state = SessionState::Lobby;
            Flow::Continue
        }
        action => {
            let cmd = action.command();
            let Some(game_id) = ctx.game else {
                return Flow::Close;
            };
            let Some(handle) = state.games.lock().await.get(game_id) else {
                reject_with(ctx, cmd, ErrorId::InvalidGameId);
                return Flow::Continue;
            };

            // One critical section per command: resolve, mutate, and
            // enqueue every view before the game lock drops.
            let mut game = handle.lock().await;
            if let Err(e) = apply_action(&mut game, ctx, action) {
                reject(ctx, cmd, &e);
            }
            Flow::Continue
        }
    }
}

/// Executes one in-game action under the game lock. Every path either
/// commits and dispatches its views, or returns an error having changed
/// nothing.
fn apply_action(
    game: &mut Game,
    ctx: &SessionCtx,
    request: Request,
) -> Result<(), EngineError> {
    let actor = ctx.player_id;
    let seat = game.seat_of(actor)?;

    match request {
        Request::InfoPlayers => {
            let mut response = PlayerInfoResponse {
                ids: Vec::new(),
                names: Vec::new(),
                hand_sizes: Vec::new(),
            };
            for s in game.seats() {
                response.ids.push(s.player);
                response.names.push(s.name.clone());
                response.hand_sizes.push(s.hand.len() as u16);
            }
            send_notification(&ctx.sink, &Notification::PlayerInfo(response));
        }

        Request::InfoDecks => {
            send_notification(
                &ctx.sink,
                &Notification::DeckInfo(DeckInfoResponse {
                    ids: vec![DeckId(0)],
                    card_counts: vec![game.deck_size()],
                }),
            );
        }

        Request::InfoCards => {
            send_notification(
                &ctx.sink,
                &Notification::CardInfo(CardInfoResponse {
                    ids: game.seats()[seat].hand.clone(),
                }),
            );
        }

        Request::CardDraw(draw) => {
            let deck = game.resolve_deck(draw.deck)?;
            let drawn = game.draw(seat, draw.count);
            ActionViews::draw(actor, deck, &drawn, draw.face_up)
                .dispatch(game.seats(), &ctx.sink);
        }

        Request::CardShow(show) => match show.target {
            PlayerSelector::All => {
                let shown = game.shown_cards(seat, show.card)?;
                ActionViews::show(actor, PlayerId::ALL, &shown)
                    .dispatch(game.seats(), &ctx.sink);
            }
            PlayerSelector::None => return Err(EngineError::BadPlayerSelector),
            sel => {
                let target_seat = game.resolve_seat(sel)?;
                let target = game.seats()[target_seat].player;
                let shown = game.shown_cards(seat, show.card)?;
                ActionViews::show(actor, target, &shown)
                    .dispatch(game.seats(), &ctx.sink);
            }
        },

        Request::CardPutback(putback) => {
            let deck = game.resolve_deck(putback.deck)?;
            let card = game.putback(seat, putback.card, putback.cards_from_top)?;
            ActionViews::putback(actor, deck, card).dispatch(game.seats(), &ctx.sink);
        }

        Request::CardDiscard(discard) => {
            let card = game.discard(seat, discard.card)?;
            ActionViews::discard(actor, card, discard.face_up)
                .dispatch(game.seats(), &ctx.sink);
        }

        Request::CardGive(give) => {
            let target_seat = match give.target {
                PlayerSelector::All | PlayerSelector::None => {
                    return Err(EngineError::BadPlayerSelector)
                }
                sel => game.resolve_seat(sel)?,
            };
            let card = game.give(seat, target_seat, give.card)?;
            let target = game.seats()[target_seat].player;
            ActionViews::give(actor, target, card, give.face_up)
                .dispatch(game.seats(), &ctx.sink);
        }

        Request::DeckPeek(peek) => {
            let deck = game.resolve_deck(peek.deck)?;
            let seen = game.peek(peek.count);
            ActionViews::peek(actor, deck, &seen, peek.public)
                .dispatch(game.seats(), &ctx.sink);
        }

        Request::DeckShuffle(shuffle) => {
            let deck = game.resolve_deck(shuffle.deck)?;
            game.shuffle();
            ActionViews::shuffle(actor, deck).dispatch(game.seats(), &ctx.sink);
        }

        other => {
            tracing::debug!(cmd = ?other.command(), "unexpected in-game request");
        }
    }
    Ok(())
}

/// Removes the player from their game and tells the table. The departed
/// player gets their own targeted copy through the seat's sink.
async fn leave_game(ctx: &mut SessionCtx, state: &ServerState) {
    let Some(game_id) = ctx.game.take() else {
        return;
    };
    let handle = state.games.lock().await.get(game_id);
    if let Some(handle) = handle {
        let mut game = handle.lock().await;
        match game.unseat_player(ctx.player_id) {
            Ok(seat) => {
                ActionViews::leave(ctx.player_id).dispatch(game.seats(), &seat.sink);
            }
            Err(e) => {
                tracing::warn!(player_id = %ctx.player_id, %game_id, error = %e,
                    "leave found no seat");
            }
        }
    }
    let _ = state.players.lock().await.set_game(ctx.player_id, None);
    tracing::info!(player_id = %ctx.player_id, %game_id, "left game");
}

/// Final cleanup when the read loop ends for any reason. A mid-game drop is
/// indistinguishable from a leave for the surviving members.
async fn teardown(
    mut ctx: SessionCtx,
    state: &ServerState,
    shutdown: &watch::Receiver<bool>,
) {
    if *shutdown.borrow() {
        // The shutdown sequence owns the directory now; it notifies and
        // clears everything itself.
        return;
    }
    leave_game(&mut ctx, state).await;
    state.players.lock().await.remove(ctx.player_id);
    tracing::info!(player_id = %ctx.player_id, "session closed");
}

fn send_notification(sink: &FrameSink, notification: &Notification) {
    match notification.to_frame() {
        Ok(frame) => {
            let _ = sink.send(frame);
        }
        Err(e) => {
            tracing::error!(error = %e, "response does not fit a frame; not sent");
        }
    }
}

fn send_input_error(sink: &FrameSink, offending: u8, error: ErrorId) {
    send_notification(
        sink,
        &Notification::InputError(NotifyInputError { offending, error }),
    );
}

fn reject(ctx: &SessionCtx, cmd: CommandId, error: &EngineError) {
    tracing::debug!(player_id = %ctx.player_id, ?cmd, error = %error, "request rejected");
    send_input_error(&ctx.sink, cmd.as_u8(), error.error_id());
}

fn reject_with(ctx: &SessionCtx, cmd: CommandId, error: ErrorId) {
    tracing::debug!(player_id = %ctx.player_id, ?cmd, ?error, "request rejected");
    send_input_error(&ctx.sink, cmd.as_u8(), error);
}
