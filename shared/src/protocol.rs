//! Message types for the relay protocol and their text encoding

use thiserror::Error;

/// Port the relay listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 5000;

/// Separator between the fields of a command payload
pub const FIELD_SEPARATOR: char = ';';

/// Horizontal distance between neighbouring spawn points
pub const SPAWN_SPACING: f32 = 3.0;

/// Announcement broadcast once when every session is ready
pub const GAME_BEGINS: &str = "The game begins!";

const PLAYER_DATA: &str = "PlayerData";
const READY: &str = "Ready";
const POSITION: &str = "Position";
const ATTACK: &str = "Attack";
const SUCCESS_PLAYER_CONNECT: &str = "SuccessPlayerConnect";

/// Server-assigned identifier of a connected session
pub type SessionId = u32;

/// Reasons a protocol line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,

    #[error("line contains non-ASCII characters")]
    NonAscii,

    #[error("line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} fields, found {found}")]
    FieldCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{command} field {field} is not a finite number: {value:?}")]
    InvalidNumber {
        command: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{command} field {field} is not a bool literal: {value:?}")]
    InvalidBool {
        command: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{command} has an invalid sender id: {value:?}")]
    InvalidSender {
        command: &'static str,
        value: String,
    },
}

/// Broadcast kinds that pass through the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Position,
    Attack,
}

/// A validated `Position` payload
///
/// The payload text is kept exactly as received so a relay can forward it
/// byte-for-byte; the parsed fields are only used for validation and logging.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub x: f32,
    pub y: f32,
    pub is_right: bool,
    pub sprite_name: String,
    payload: String,
}

impl PositionUpdate {
    /// Builds an update from typed fields, formatting the payload the way
    /// Game Clients expect it
    pub fn new(x: f32, y: f32, is_right: bool, sprite_name: &str) -> Self {
        let payload = format!(
            "{}{sep}{}{sep}{}{sep}{}",
            x,
            y,
            bool_literal(is_right),
            sprite_name,
            sep = FIELD_SEPARATOR
        );
        Self {
            x,
            y,
            is_right,
            sprite_name: sprite_name.to_string(),
            payload,
        }
    }

    /// Spawn point for the session at `index` in registration order
    pub fn spawn(index: usize, sprite_name: &str) -> Self {
        Self::new(index as f32 * SPAWN_SPACING, 0.0, true, sprite_name)
    }

    /// Validates the text after `Position:`
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(POSITION, payload, 4)?;
        Ok(Self {
            x: parse_number(POSITION, "x", fields[0])?,
            y: parse_number(POSITION, "y", fields[1])?,
            is_right: parse_bool(POSITION, "isRight", fields[2])?,
            sprite_name: fields[3].to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// A validated `Attack` payload, kept verbatim for relaying
#[derive(Debug, Clone, PartialEq)]
pub struct AttackUpdate {
    pub x: f32,
    pub y: f32,
    pub damage: f32,
    pub is_right: bool,
    pub range: f32,
    payload: String,
}

impl AttackUpdate {
    pub fn new(x: f32, y: f32, damage: f32, is_right: bool, range: f32) -> Self {
        let payload = format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            x,
            y,
            damage,
            bool_literal(is_right),
            range,
            sep = FIELD_SEPARATOR
        );
        Self {
            x,
            y,
            damage,
            is_right,
            range,
            payload,
        }
    }

    /// Validates the text after `Attack:`
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(ATTACK, payload, 5)?;
        Ok(Self {
            x: parse_number(ATTACK, "x", fields[0])?,
            y: parse_number(ATTACK, "y", fields[1])?,
            damage: parse_number(ATTACK, "damage", fields[2])?,
            is_right: parse_bool(ATTACK, "isRight", fields[3])?,
            range: parse_number(ATTACK, "range", fields[4])?,
            payload: payload.to_string(),
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Commands a Game Client sends to the relay
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    PlayerData { name: String, character: String },
    Ready,
    Position(PositionUpdate),
    Attack(AttackUpdate),
}

impl ClientCommand {
    /// Parses one protocol line (without its terminator)
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        check_line(line)?;

        if line == READY {
            return Ok(ClientCommand::Ready);
        }

        let (command, payload) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::UnknownCommand(line.to_string()))?;

        match command {
            PLAYER_DATA => {
                let fields = split_fields(PLAYER_DATA, payload, 2)?;
                Ok(ClientCommand::PlayerData {
                    name: fields[0].to_string(),
                    character: fields[1].to_string(),
                })
            }
            POSITION => Ok(ClientCommand::Position(PositionUpdate::parse(payload)?)),
            ATTACK => Ok(ClientCommand::Attack(AttackUpdate::parse(payload)?)),
            _ => Err(ProtocolError::UnknownCommand(command.to_string())),
        }
    }

    /// Encodes the command as a terminated protocol line
    pub fn encode(&self) -> String {
        match self {
            ClientCommand::PlayerData { name, character } => {
                format!("{}:{}{}{}\n", PLAYER_DATA, name, FIELD_SEPARATOR, character)
            }
            ClientCommand::Ready => format!("{}\n", READY),
            ClientCommand::Position(update) => format!("{}:{}\n", POSITION, update.payload()),
            ClientCommand::Attack(update) => format!("{}:{}\n", ATTACK, update.payload()),
        }
    }
}

/// Messages the relay sends to Game Clients
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SuccessPlayerConnect,
    Position {
        update: PositionUpdate,
        sender: SessionId,
    },
    Attack {
        update: AttackUpdate,
        sender: SessionId,
    },
    GameBegins,
}

impl ServerMessage {
    /// Encodes the message as a terminated protocol line
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::SuccessPlayerConnect => format!("{}\n", SUCCESS_PLAYER_CONNECT),
            ServerMessage::Position { update, sender } => format!(
                "{}:{}{}{}\n",
                POSITION,
                update.payload(),
                FIELD_SEPARATOR,
                sender
            ),
            ServerMessage::Attack { update, sender } => format!(
                "{}:{}{}{}\n",
                ATTACK,
                update.payload(),
                FIELD_SEPARATOR,
                sender
            ),
            ServerMessage::GameBegins => format!("{}\n", GAME_BEGINS),
        }
    }

    /// Parses one line received from the relay
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        check_line(line)?;

        if line == SUCCESS_PLAYER_CONNECT {
            return Ok(ServerMessage::SuccessPlayerConnect);
        }
        if line == GAME_BEGINS {
            return Ok(ServerMessage::GameBegins);
        }

        let (command, payload) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::UnknownCommand(line.to_string()))?;

        match command {
            POSITION => {
                let (payload, sender) = split_sender(POSITION, payload)?;
                Ok(ServerMessage::Position {
                    update: PositionUpdate::parse(payload)?,
                    sender,
                })
            }
            ATTACK => {
                let (payload, sender) = split_sender(ATTACK, payload)?;
                Ok(ServerMessage::Attack {
                    update: AttackUpdate::parse(payload)?,
                    sender,
                })
            }
            _ => Err(ProtocolError::UnknownCommand(command.to_string())),
        }
    }
}

fn check_line(line: &str) -> Result<(), ProtocolError> {
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if !line.is_ascii() {
        return Err(ProtocolError::NonAscii);
    }
    Ok(())
}

fn split_fields<'a>(
    command: &'static str,
    payload: &'a str,
    expected: usize,
) -> Result<Vec<&'a str>, ProtocolError> {
    let fields: Vec<&str> = payload.split(FIELD_SEPARATOR).collect();
    if fields.len() != expected {
        return Err(ProtocolError::FieldCount {
            command,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn split_sender<'a>(
    command: &'static str,
    payload: &'a str,
) -> Result<(&'a str, SessionId), ProtocolError> {
    let (rest, sender) = payload
        .rsplit_once(FIELD_SEPARATOR)
        .ok_or(ProtocolError::FieldCount {
            command,
            expected: 2,
            found: 1,
        })?;
    let sender = sender.parse().map_err(|_| ProtocolError::InvalidSender {
        command,
        value: sender.to_string(),
    })?;
    Ok((rest, sender))
}

fn parse_number(
    command: &'static str,
    field: &'static str,
    value: &str,
) -> Result<f32, ProtocolError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProtocolError::InvalidNumber {
            command,
            field,
            value: value.to_string(),
        })
}

// Game Clients print booleans as `True`/`False`, so literals are matched
// without regard to case.
fn parse_bool(command: &'static str, field: &'static str, value: &str) -> Result<bool, ProtocolError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ProtocolError::InvalidBool {
            command,
            field,
            value: value.to_string(),
        })
    }
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
