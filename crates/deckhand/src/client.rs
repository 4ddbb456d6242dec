//! A thin async client for the deckhand protocol.
//!
//! Covers exactly the wire surface: connect + handshake, typed command
//! senders, and a notification stream. Terminal I/O, argument parsing, and
//! spec-file discovery are someone else's job; the integration tests are
//! the primary consumer here.
//!
//! While idle, a client emits one `KEEPALIVE` every 10 seconds. The timer
//! lives in the writer task and resets whenever a real frame goes out.

use std::time::Duration;

use deckhand_engine::GameSpec;
use deckhand_protocol::{
    read_frame, write_frame, CardDiscard, CardDraw, CardGive, CardPutback,
    CardSelector, CardShow, CommandId, DeckId, DeckPeek, DeckSelector,
    DeckShuffle, GameCreate, GameId, GameJoin, Handshake, Notification,
    PlayerId, PlayerSelector, Request,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::DeckhandError;

/// Interval between idle keepalives.
const KEEPALIVE_PERIOD: Duration = Duration::from_secs(10);

/// A connected, handshaken client.
#[derive(Debug)]
pub struct Client {
    player_id: PlayerId,
    reader: OwnedReadHalf,
    out: mpsc::UnboundedSender<Vec<u8>>,
}

impl Client {
    /// Connects, handshakes as `name`, and starts the writer/keepalive task.
    pub async fn connect(addr: &str, name: &str) -> Result<Self, DeckhandError> {
        let stream = TcpStream::connect(addr).await?;
        let (mut reader, mut writer) = stream.into_split();

        let handshake = Request::Handshake(Handshake::new(name)).to_frame()?;
        write_frame(&mut writer, &handshake).await?;

        let (cmd, payload) = read_frame(&mut reader).await?;
        let player_id = match Notification::decode(cmd, &payload)? {
            Notification::HandshakeResponse(response) => response.player_id,
            Notification::InputError(e) => {
                return Err(DeckhandError::Rejected(e.error));
            }
            other => return Err(DeckhandError::UnexpectedFrame(other.command())),
        };

        let (out, outbox) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(writer, outbox));

        Ok(Self {
            player_id,
            reader,
            out,
        })
    }

    /// The id the server assigned at handshake.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Reads the next server frame. `Io` errors here mean the server closed
    /// the connection.
    pub async fn next_event(&mut self) -> Result<Notification, DeckhandError> {
        let (cmd, payload) = read_frame(&mut self.reader).await?;
        Ok(Notification::decode(cmd, &payload)?)
    }

    /// Queues one request for the writer task.
    pub fn send(&self, request: &Request) -> Result<(), DeckhandError> {
        let frame = request.to_frame()?;
        self.out
            .send(frame)
            .map_err(|_| DeckhandError::Io(std::io::ErrorKind::BrokenPipe.into()))
    }

    // -- Lobby ----------------------------------------------------------

    /// Creates a game from an already-encoded spec envelope.
    pub fn create_game_raw(&self, spec_data: Vec<u8>) -> Result<(), DeckhandError> {
        self.send(&Request::GameCreate(GameCreate { spec_data }))
    }

    /// Encodes `spec` and creates a game from it.
    pub fn create_game(&self, spec: &GameSpec) -> Result<(), DeckhandError> {
        self.create_game_raw(spec.encode().map_err(deckhand_engine::EngineError::from)?)
    }

    /// Creates a game from the bundled default deck, for callers with no
    /// spec of their own.
    pub fn create_default_game(&self) -> Result<(), DeckhandError> {
        self.create_game(&GameSpec::standard())
    }

    pub fn join_game(&self, game_id: GameId) -> Result<(), DeckhandError> {
        self.send(&Request::GameJoin(GameJoin { game_id }))
    }

    // -- In game --------------------------------------------------------

    pub fn draw(&self, count: u16, face_up: bool) -> Result<(), DeckhandError> {
        self.send(&Request::CardDraw(CardDraw {
            deck: DeckSelector::Specific(DeckId(0)),
            count,
            face_up,
        }))
    }

    pub fn show(
        &self,
        card: CardSelector,
        target: PlayerSelector,
    ) -> Result<(), DeckhandError> {
        self.send(&Request::CardShow(CardShow { card, target }))
    }

    pub fn putback(
        &self,
        card: CardSelector,
        cards_from_top: u16,
    ) -> Result<(), DeckhandError> {
        self.send(&Request::CardPutback(CardPutback {
            card,
            deck: DeckSelector::Specific(DeckId(0)),
            cards_from_top,
        }))
    }

    pub fn discard(&self, card: CardSelector, face_up: bool) -> Result<(), DeckhandError> {
        self.send(&Request::CardDiscard(CardDiscard { card, face_up }))
    }

    pub fn give(
        &self,
        card: CardSelector,
        target: PlayerSelector,
        face_up: bool,
    ) -> Result<(), DeckhandError> {
        self.send(&Request::CardGive(CardGive {
            card,
            target,
            face_up,
        }))
    }

    pub fn peek(&self, count: u16, public: bool) -> Result<(), DeckhandError> {
        self.send(&Request::DeckPeek(DeckPeek {
            deck: DeckSelector::Specific(DeckId(0)),
            count,
            public,
        }))
    }

    pub fn shuffle(&self) -> Result<(), DeckhandError> {
        self.send(&Request::DeckShuffle(DeckShuffle {
            deck: DeckSelector::Specific(DeckId(0)),
        }))
    }

    pub fn info_players(&self) -> Result<(), DeckhandError> {
        self.send(&Request::InfoPlayers)
    }

    pub fn info_decks(&self) -> Result<(), DeckhandError> {
        self.send(&Request::InfoDecks)
    }

    pub fn info_cards(&self) -> Result<(), DeckhandError> {
        self.send(&Request::InfoCards)
    }

    pub fn leave_game(&self) -> Result<(), DeckhandError> {
        self.send(&Request::GameLeave)
    }

    pub fn disconnect(&self) -> Result<(), DeckhandError> {
        self.send(&Request::Disconnect)
    }
}

/// Drains queued frames onto the socket, interleaving idle keepalives.
async fn writer_loop(
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let start = tokio::time::Instant::now() + KEEPALIVE_PERIOD;
    let mut keepalive = tokio::time::interval_at(start, KEEPALIVE_PERIOD);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let keepalive_frame = deckhand_protocol::empty_frame(CommandId::Keepalive);

    loop {
        tokio::select! {
            frame = outbox.recv() => {
                let Some(frame) = frame else { break };
                if write_frame(&mut writer, &frame).await.is_err() {
                    break;
                }
                keepalive.reset();
            }
            _ = keepalive.tick() => {
                if write_frame(&mut writer, &keepalive_frame).await.is_err() {
                    break;
                }
            }
        }
    }
}
