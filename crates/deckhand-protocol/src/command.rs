//! The command registry and every command payload.
//!
//! Commands are identified by a dense `u8` id starting at 1 (0 is reserved
//! "unknown"). The registry answers three questions about each id:
//!
//! 1. What payload shape does it carry? (the structs below)
//! 2. What payload lengths are legal? ([`CommandId::length_bounds`], checked
//!    against the header *before* the payload is read)
//! 3. Which way does it travel? ([`CommandId::direction`])
//!
//! Two enums gather the payloads by direction: [`Request`] for frames a
//! client sends and [`Notification`] for frames a server sends. Both decode
//! strictly: the payload walker must consume the frame exactly.

use crate::frame::{empty_frame, frame};
use crate::ids::{
    CardId, CardSelector, DeckId, DeckSelector, GameId, PlayerId, PlayerSelector,
};
use crate::wire::{WirePayload, WireReader, WireWriter};
use crate::ProtocolError;

/// First two payload bytes of every handshake. Verifies the peer is speaking
/// this protocol at all before anything else is interpreted.
pub const PROTOCOL_MAGIC: u16 = 0x342F;

/// Protocol revision. Incremented on every backwards-incompatible change;
/// both sides must match exactly.
pub const PROTOCOL_ID: u16 = 0x0001;

/// Player names are at most this many bytes of UTF-8.
pub const MAX_PLAYER_NAME_LEN: usize = 64;

/// Largest spec envelope accepted in `GAME_CREATE` (frame max minus the
/// two-byte count prefix of the byte slice).
pub const MAX_SPEC_DATA_LEN: usize = 65533 - 2;

/// Default TCP port of the service.
pub const DEFAULT_PORT: u16 = 43831;

// ---------------------------------------------------------------------------
// CommandId
// ---------------------------------------------------------------------------

/// Which way a command travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

/// Every command in the protocol, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    Keepalive = 1,
    Handshake = 2,
    HandshakeResponse = 3,
    Disconnect = 4,
    InfoPlayers = 5,
    InfoDecks = 6,
    InfoCards = 7,
    InfoPlayersResponse = 8,
    InfoDecksResponse = 9,
    InfoCardsResponse = 10,
    CardDraw = 11,
    CardShow = 12,
    CardPutback = 13,
    CardDiscard = 14,
    CardGive = 15,
    DeckPeek = 16,
    DeckShuffle = 17,
    GameCreate = 18,
    GameJoin = 19,
    GameLeave = 20,
    NotifyPlayerAction = 21,
    NotifyGameJoined = 22,
    NotifyServerShutdown = 23,
    NotifyInputError = 24,
}

impl CommandId {
    pub fn from_u8(raw: u8) -> Result<Self, ProtocolError> {
        Ok(match raw {
            1 => Self::Keepalive,
            2 => Self::Handshake,
            3 => Self::HandshakeResponse,
            4 => Self::Disconnect,
            5 => Self::InfoPlayers,
            6 => Self::InfoDecks,
            7 => Self::InfoCards,
            8 => Self::InfoPlayersResponse,
            9 => Self::InfoDecksResponse,
            10 => Self::InfoCardsResponse,
            11 => Self::CardDraw,
            12 => Self::CardShow,
            13 => Self::CardPutback,
            14 => Self::CardDiscard,
            15 => Self::CardGive,
            16 => Self::DeckPeek,
            17 => Self::DeckShuffle,
            18 => Self::GameCreate,
            19 => Self::GameJoin,
            20 => Self::GameLeave,
            21 => Self::NotifyPlayerAction,
            22 => Self::NotifyGameJoined,
            23 => Self::NotifyServerShutdown,
            24 => Self::NotifyInputError,
            other => return Err(ProtocolError::UnknownCommand(other)),
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn direction(self) -> Direction {
        use Direction::*;
        match self {
            Self::Keepalive
            | Self::Handshake
            | Self::Disconnect
            | Self::InfoPlayers
            | Self::InfoDecks
            | Self::InfoCards
            | Self::CardDraw
            | Self::CardShow
            | Self::CardPutback
            | Self::CardDiscard
            | Self::CardGive
            | Self::DeckPeek
            | Self::DeckShuffle
            | Self::GameCreate
            | Self::GameJoin
            | Self::GameLeave => ClientToServer,
            Self::HandshakeResponse
            | Self::InfoPlayersResponse
            | Self::InfoDecksResponse
            | Self::InfoCardsResponse
            | Self::NotifyPlayerAction
            | Self::NotifyGameJoined
            | Self::NotifyServerShutdown
            | Self::NotifyInputError => ServerToClient,
        }
    }

    /// Inclusive `(min, max)` payload length for this command.
    ///
    /// Fixed-layout commands have `min == max`; commands carrying slices are
    /// bounded below by their fixed fields plus empty counts, and above by
    /// the frame's 16-bit length field.
    pub fn length_bounds(self) -> (u16, u16) {
        match self {
            Self::Keepalive | Self::Disconnect => (0, 0),
            Self::Handshake => (6, 6 + MAX_PLAYER_NAME_LEN as u16),
            Self::HandshakeResponse => (8, 8),
            Self::InfoPlayers | Self::InfoDecks | Self::InfoCards => (0, 0),
            Self::InfoPlayersResponse => (6, u16::MAX),
            Self::InfoDecksResponse => (4, u16::MAX),
            Self::InfoCardsResponse => (2, u16::MAX),
            Self::CardDraw => (5, 5),
            Self::CardShow => (10, 10),
            Self::CardPutback => (6, 6),
            Self::CardDiscard => (3, 3),
            Self::CardGive => (11, 11),
            Self::DeckPeek => (5, 5),
            Self::DeckShuffle => (2, 2),
            Self::GameCreate => (2, 2 + MAX_SPEC_DATA_LEN as u16),
            Self::GameJoin => (8, 8),
            Self::GameLeave => (0, 0),
            Self::NotifyPlayerAction => (21, u16::MAX),
            Self::NotifyGameJoined => (18, u16::MAX),
            Self::NotifyServerShutdown => (0, 0),
            Self::NotifyInputError => (2, 2),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorId
// ---------------------------------------------------------------------------

/// Semantic error kinds carried by `NOTIFY_INPUT_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorId {
    /// Command illegal in the current session state, or unknown id.
    InvalidCmdId = 0,
    /// No such game.
    InvalidGameId = 1,
    /// Target player not found, or source equals target where forbidden.
    InvalidPlayerId = 2,
    /// No such deck.
    InvalidDeckId = 3,
    /// Card not in the caller's hand and not a permissible sentinel.
    InvalidCardId = 4,
    /// Name empty where required, whitespace, too long, or colliding.
    InvalidPlayerName = 5,
    /// Payload semantically out of range (bad depth, malformed spec, ...).
    InvalidData = 6,
    /// The directory refused a new player.
    ServerFull = 7,
}

impl ErrorId {
    pub fn from_u8(raw: u8) -> Result<Self, ProtocolError> {
        Ok(match raw {
            0 => Self::InvalidCmdId,
            1 => Self::InvalidGameId,
            2 => Self::InvalidPlayerId,
            3 => Self::InvalidDeckId,
            4 => Self::InvalidCardId,
            5 => Self::InvalidPlayerName,
            6 => Self::InvalidData,
            7 => Self::ServerFull,
            other => return Err(ProtocolError::UnknownErrorId(other)),
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Client command payloads
// ---------------------------------------------------------------------------

/// `HANDSHAKE`: the first frame of every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub magic: u16,
    pub protocol: u16,
    pub name: String,
}

impl Handshake {
    /// A handshake with the magic and protocol id this build speaks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            protocol: PROTOCOL_ID,
            name: name.into(),
        }
    }
}

impl WirePayload for Handshake {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.magic);
        w.put_u16(self.protocol);
        w.put_string(&self.name);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            magic: r.get_u16()?,
            protocol: r.get_u16()?,
            name: r.get_string()?,
        })
    }
}

/// `CARD_DRAW`: move cards from the top of a deck into the caller's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDraw {
    pub deck: DeckSelector,
    pub count: u16,
    pub face_up: bool,
}

impl WirePayload for CardDraw {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.deck.to_wire());
        w.put_u16(self.count);
        w.put_bool(self.face_up);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            deck: DeckSelector::from_wire(r.get_u16()?),
            count: r.get_u16()?,
            face_up: r.get_bool()?,
        })
    }
}

/// `CARD_SHOW`: reveal a held card (or the whole hand) to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardShow {
    pub card: CardSelector,
    pub target: PlayerSelector,
}

impl WirePayload for CardShow {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.card.to_wire());
        w.put_u64(self.target.to_wire());
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            card: CardSelector::from_wire(r.get_u16()?),
            target: PlayerSelector::from_wire(r.get_u64()?),
        })
    }
}

/// `CARD_PUTBACK`: return a held card into the deck at a given depth.
/// Depth 0 is the top of the deck; depth `|deck|` is the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPutback {
    pub card: CardSelector,
    pub deck: DeckSelector,
    pub cards_from_top: u16,
}

impl WirePayload for CardPutback {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.card.to_wire());
        w.put_u16(self.deck.to_wire());
        w.put_u16(self.cards_from_top);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            card: CardSelector::from_wire(r.get_u16()?),
            deck: DeckSelector::from_wire(r.get_u16()?),
            cards_from_top: r.get_u16()?,
        })
    }
}

/// `CARD_DISCARD`: remove a held card from play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardDiscard {
    pub card: CardSelector,
    pub face_up: bool,
}

impl WirePayload for CardDiscard {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.card.to_wire());
        w.put_bool(self.face_up);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            card: CardSelector::from_wire(r.get_u16()?),
            face_up: r.get_bool()?,
        })
    }
}

/// `CARD_GIVE`: move a held card into another player's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardGive {
    pub card: CardSelector,
    pub target: PlayerSelector,
    pub face_up: bool,
}

impl WirePayload for CardGive {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.card.to_wire());
        w.put_u64(self.target.to_wire());
        w.put_bool(self.face_up);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            card: CardSelector::from_wire(r.get_u16()?),
            target: PlayerSelector::from_wire(r.get_u64()?),
            face_up: r.get_bool()?,
        })
    }
}

/// `DECK_PEEK`: read the top of the deck without mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckPeek {
    pub deck: DeckSelector,
    pub count: u16,
    pub public: bool,
}

impl WirePayload for DeckPeek {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.deck.to_wire());
        w.put_u16(self.count);
        w.put_bool(self.public);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            deck: DeckSelector::from_wire(r.get_u16()?),
            count: r.get_u16()?,
            public: r.get_bool()?,
        })
    }
}

/// `DECK_SHUFFLE`: permute the deck uniformly at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckShuffle {
    pub deck: DeckSelector,
}

impl WirePayload for DeckShuffle {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.deck.to_wire());
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            deck: DeckSelector::from_wire(r.get_u16()?),
        })
    }
}

/// `GAME_CREATE`: create a game from an opaque spec envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCreate {
    pub spec_data: Vec<u8>,
}

impl WirePayload for GameCreate {
    fn encode(&self, w: &mut WireWriter) {
        w.put_bytes(&self.spec_data);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            spec_data: r.get_bytes()?,
        })
    }
}

/// `GAME_JOIN`: join an existing game by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameJoin {
    pub game_id: GameId,
}

impl WirePayload for GameJoin {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u64(self.game_id.0);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            game_id: GameId(r.get_u64()?),
        })
    }
}

// ---------------------------------------------------------------------------
// Server payloads
// ---------------------------------------------------------------------------

/// `HANDSHAKE_RESPONSE`: the server's reply to a valid handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub player_id: PlayerId,
}

impl WirePayload for HandshakeResponse {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u64(self.player_id.0);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            player_id: PlayerId(r.get_u64()?),
        })
    }
}

/// `INFO_PLAYERS_RESPONSE`: parallel arrays describing every game member.
///
/// Deserialisation rejects frames whose arrays disagree on length; the
/// engine works with an array of seats and only flattens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfoResponse {
    pub ids: Vec<PlayerId>,
    pub names: Vec<String>,
    pub hand_sizes: Vec<u16>,
}

impl WirePayload for PlayerInfoResponse {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.ids.len() as u16);
        for id in &self.ids {
            w.put_u64(id.0);
        }
        w.put_string_slice(&self.names);
        w.put_u16_slice(&self.hand_sizes);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let ids: Vec<PlayerId> = r.get_u64_slice()?.into_iter().map(PlayerId).collect();
        let names = r.get_string_slice()?;
        let hand_sizes = r.get_u16_slice()?;
        if ids.len() != names.len() || ids.len() != hand_sizes.len() {
            return Err(ProtocolError::ParallelArrayMismatch);
        }
        Ok(Self {
            ids,
            names,
            hand_sizes,
        })
    }
}

/// `INFO_DECKS_RESPONSE`: one entry per deck (a single deck, today).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckInfoResponse {
    pub ids: Vec<DeckId>,
    pub card_counts: Vec<u16>,
}

impl WirePayload for DeckInfoResponse {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.ids.len() as u16);
        for id in &self.ids {
            w.put_u16(id.0);
        }
        w.put_u16_slice(&self.card_counts);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let ids: Vec<DeckId> = r.get_u16_slice()?.into_iter().map(DeckId).collect();
        let card_counts = r.get_u16_slice()?;
        if ids.len() != card_counts.len() {
            return Err(ProtocolError::ParallelArrayMismatch);
        }
        Ok(Self { ids, card_counts })
    }
}

/// `INFO_CARDS_RESPONSE`: the caller's own hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfoResponse {
    pub ids: Vec<CardId>,
}

impl WirePayload for CardInfoResponse {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u16(self.ids.len() as u16);
        for id in &self.ids {
            w.put_u16(id.0);
        }
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            ids: r.get_u16_slice()?.into_iter().map(CardId).collect(),
        })
    }
}

/// `NOTIFY_PLAYER_ACTION`: one view of a committed action.
///
/// The same payload shape carries all three redaction levels; only the card
/// list differs between the source, target, and public copies. Sentinels are
/// legal values here: `target` is `PlayerId::NONE` for target-less actions
/// and `cards` holds `CardId::ANY` where a card has been redacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyPlayerAction {
    pub actor: PlayerId,
    pub action: CommandId,
    pub deck: DeckId,
    pub target: PlayerId,
    pub cards: Vec<CardId>,
}

impl WirePayload for NotifyPlayerAction {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u64(self.actor.0);
        w.put_u8(self.action.as_u8());
        w.put_u16(self.deck.0);
        w.put_u64(self.target.0);
        w.put_u16(self.cards.len() as u16);
        for card in &self.cards {
            w.put_u16(card.0);
        }
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            actor: PlayerId(r.get_u64()?),
            action: CommandId::from_u8(r.get_u8()?)?,
            deck: DeckId(r.get_u16()?),
            target: PlayerId(r.get_u64()?),
            cards: r.get_u16_slice()?.into_iter().map(CardId).collect(),
        })
    }
}

/// `NOTIFY_GAME_JOINED`: either the full game snapshot sent to a player who
/// just joined, or the minimal announce broadcast to everyone already seated
/// (empty spec, only the new player's row, zero deck size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyGameJoined {
    pub game_id: GameId,
    pub spec_data: Vec<u8>,
    pub player_ids: Vec<PlayerId>,
    pub player_names: Vec<String>,
    pub player_hands: Vec<Vec<CardId>>,
    pub deck_size: u16,
}

impl WirePayload for NotifyGameJoined {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u64(self.game_id.0);
        w.put_bytes(&self.spec_data);
        w.put_u16(self.player_ids.len() as u16);
        for id in &self.player_ids {
            w.put_u64(id.0);
        }
        w.put_string_slice(&self.player_names);
        w.put_u16(self.player_hands.len() as u16);
        for hand in &self.player_hands {
            w.put_u16(hand.len() as u16);
            for card in hand {
                w.put_u16(card.0);
            }
        }
        w.put_u16(self.deck_size);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        let game_id = GameId(r.get_u64()?);
        let spec_data = r.get_bytes()?;
        let player_ids: Vec<PlayerId> =
            r.get_u64_slice()?.into_iter().map(PlayerId).collect();
        let player_names = r.get_string_slice()?;
        let player_hands: Vec<Vec<CardId>> = r
            .get_u16_nested()?
            .into_iter()
            .map(|hand| hand.into_iter().map(CardId).collect())
            .collect();
        let deck_size = r.get_u16()?;
        if player_ids.len() != player_names.len()
            || player_ids.len() != player_hands.len()
        {
            return Err(ProtocolError::ParallelArrayMismatch);
        }
        Ok(Self {
            game_id,
            spec_data,
            player_ids,
            player_names,
            player_hands,
            deck_size,
        })
    }
}

/// `NOTIFY_INPUT_ERROR`: a semantic rejection. The session stays open and no
/// state was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyInputError {
    /// Raw id of the offending command; kept as `u8` because "unknown id"
    /// is one of the things this notification reports.
    pub offending: u8,
    pub error: ErrorId,
}

impl WirePayload for NotifyInputError {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u8(self.offending);
        w.put_u8(self.error.as_u8());
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            offending: r.get_u8()?,
            error: ErrorId::from_u8(r.get_u8()?)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Direction-grouped enums
// ---------------------------------------------------------------------------

/// Every frame a client may send, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Keepalive,
    Handshake(Handshake),
    Disconnect,
    InfoPlayers,
    InfoDecks,
    InfoCards,
    CardDraw(CardDraw),
    CardShow(CardShow),
    CardPutback(CardPutback),
    CardDiscard(CardDiscard),
    CardGive(CardGive),
    DeckPeek(DeckPeek),
    DeckShuffle(DeckShuffle),
    GameCreate(GameCreate),
    GameJoin(GameJoin),
    GameLeave,
}

impl Request {
    /// Decodes a client frame's payload. The payload must be consumed
    /// exactly; leftover bytes are a malformed frame.
    pub fn decode(cmd: CommandId, payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = WireReader::new(payload);
        let request = match cmd {
            CommandId::Keepalive => Self::Keepalive,
            CommandId::Handshake => Self::Handshake(Handshake::decode(&mut r)?),
            CommandId::Disconnect => Self::Disconnect,
            CommandId::InfoPlayers => Self::InfoPlayers,
            CommandId::InfoDecks => Self::InfoDecks,
            CommandId::InfoCards => Self::InfoCards,
            CommandId::CardDraw => Self::CardDraw(CardDraw::decode(&mut r)?),
            CommandId::CardShow => Self::CardShow(CardShow::decode(&mut r)?),
            CommandId::CardPutback => Self::CardPutback(CardPutback::decode(&mut r)?),
            CommandId::CardDiscard => Self::CardDiscard(CardDiscard::decode(&mut r)?),
            CommandId::CardGive => Self::CardGive(CardGive::decode(&mut r)?),
            CommandId::DeckPeek => Self::DeckPeek(DeckPeek::decode(&mut r)?),
            CommandId::DeckShuffle => Self::DeckShuffle(DeckShuffle::decode(&mut r)?),
            CommandId::GameCreate => Self::GameCreate(GameCreate::decode(&mut r)?),
            CommandId::GameJoin => Self::GameJoin(GameJoin::decode(&mut r)?),
            CommandId::GameLeave => Self::GameLeave,
            other => return Err(ProtocolError::UnknownCommand(other.as_u8())),
        };
        r.finish()?;
        Ok(request)
    }

    pub fn command(&self) -> CommandId {
        match self {
            Self::Keepalive => CommandId::Keepalive,
            Self::Handshake(_) => CommandId::Handshake,
            Self::Disconnect => CommandId::Disconnect,
            Self::InfoPlayers => CommandId::InfoPlayers,
            Self::InfoDecks => CommandId::InfoDecks,
            Self::InfoCards => CommandId::InfoCards,
            Self::CardDraw(_) => CommandId::CardDraw,
            Self::CardShow(_) => CommandId::CardShow,
            Self::CardPutback(_) => CommandId::CardPutback,
            Self::CardDiscard(_) => CommandId::CardDiscard,
            Self::CardGive(_) => CommandId::CardGive,
            Self::DeckPeek(_) => CommandId::DeckPeek,
            Self::DeckShuffle(_) => CommandId::DeckShuffle,
            Self::GameCreate(_) => CommandId::GameCreate,
            Self::GameJoin(_) => CommandId::GameJoin,
            Self::GameLeave => CommandId::GameLeave,
        }
    }

    /// Encodes this request as a complete frame (header plus payload).
    pub fn to_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Keepalive
            | Self::Disconnect
            | Self::InfoPlayers
            | Self::InfoDecks
            | Self::InfoCards
            | Self::GameLeave => Ok(empty_frame(self.command())),
            Self::Handshake(p) => frame(CommandId::Handshake, p),
            Self::CardDraw(p) => frame(CommandId::CardDraw, p),
            Self::CardShow(p) => frame(CommandId::CardShow, p),
            Self::CardPutback(p) => frame(CommandId::CardPutback, p),
            Self::CardDiscard(p) => frame(CommandId::CardDiscard, p),
            Self::CardGive(p) => frame(CommandId::CardGive, p),
            Self::DeckPeek(p) => frame(CommandId::DeckPeek, p),
            Self::DeckShuffle(p) => frame(CommandId::DeckShuffle, p),
            Self::GameCreate(p) => frame(CommandId::GameCreate, p),
            Self::GameJoin(p) => frame(CommandId::GameJoin, p),
        }
    }
}

/// Every frame a server may send, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    HandshakeResponse(HandshakeResponse),
    PlayerInfo(PlayerInfoResponse),
    DeckInfo(DeckInfoResponse),
    CardInfo(CardInfoResponse),
    PlayerAction(NotifyPlayerAction),
    GameJoined(NotifyGameJoined),
    ServerShutdown,
    InputError(NotifyInputError),
}

impl Notification {
    pub fn decode(cmd: CommandId, payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = WireReader::new(payload);
        let notification = match cmd {
            CommandId::HandshakeResponse => {
                Self::HandshakeResponse(HandshakeResponse::decode(&mut r)?)
            }
            CommandId::InfoPlayersResponse => {
                Self::PlayerInfo(PlayerInfoResponse::decode(&mut r)?)
            }
            CommandId::InfoDecksResponse => {
                Self::DeckInfo(DeckInfoResponse::decode(&mut r)?)
            }
            CommandId::InfoCardsResponse => {
                Self::CardInfo(CardInfoResponse::decode(&mut r)?)
            }
            CommandId::NotifyPlayerAction => {
                Self::PlayerAction(NotifyPlayerAction::decode(&mut r)?)
            }
            CommandId::NotifyGameJoined => {
                Self::GameJoined(NotifyGameJoined::decode(&mut r)?)
            }
            CommandId::NotifyServerShutdown => Self::ServerShutdown,
            CommandId::NotifyInputError => {
                Self::InputError(NotifyInputError::decode(&mut r)?)
            }
            other => return Err(ProtocolError::UnknownCommand(other.as_u8())),
        };
        r.finish()?;
        Ok(notification)
    }

    pub fn command(&self) -> CommandId {
        match self {
            Self::HandshakeResponse(_) => CommandId::HandshakeResponse,
            Self::PlayerInfo(_) => CommandId::InfoPlayersResponse,
            Self::DeckInfo(_) => CommandId::InfoDecksResponse,
            Self::CardInfo(_) => CommandId::InfoCardsResponse,
            Self::PlayerAction(_) => CommandId::NotifyPlayerAction,
            Self::GameJoined(_) => CommandId::NotifyGameJoined,
            Self::ServerShutdown => CommandId::NotifyServerShutdown,
            Self::InputError(_) => CommandId::NotifyInputError,
        }
    }

    pub fn to_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::ServerShutdown => Ok(empty_frame(CommandId::NotifyServerShutdown)),
            Self::HandshakeResponse(p) => frame(CommandId::HandshakeResponse, p),
            Self::PlayerInfo(p) => frame(CommandId::InfoPlayersResponse, p),
            Self::DeckInfo(p) => frame(CommandId::InfoDecksResponse, p),
            Self::CardInfo(p) => frame(CommandId::InfoCardsResponse, p),
            Self::PlayerAction(p) => frame(CommandId::NotifyPlayerAction, p),
            Self::GameJoined(p) => frame(CommandId::NotifyGameJoined, p),
            Self::InputError(p) => frame(CommandId::NotifyInputError, p),
        }
    }
}
