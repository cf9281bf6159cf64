use serde_json::Value;

use crate::input::{direction_from_key, direction_from_swipe};
use crate::types::Direction;

#[derive(Debug)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    Key { code: u32 },
    Swipe { dx: f64, dy: f64 },
    Restart,
    Ping { t: f64 },
}

impl ParsedClientMessage {
    /// The steering request carried by this message, if any. Unmapped keys
    /// and short swipes are valid messages that steer nowhere.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Input { dir } => Some(*dir),
            Self::Key { code } => direction_from_key(*code),
            Self::Swipe { dx, dy } => direction_from_swipe(*dx, *dy),
            Self::Restart | Self::Ping { .. } => None,
        }
    }
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = parse_direction(object.get("dir")?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "key" => {
            let code = object.get("code")?.as_u64()?;
            let code = u32::try_from(code).ok()?;
            Some(ParsedClientMessage::Key { code })
        }
        "swipe" => {
            let dx = parse_finite(object.get("dx")?)?;
            let dy = parse_finite(object.get("dy")?)?;
            Some(ParsedClientMessage::Swipe { dx, dy })
        }
        "restart" => Some(ParsedClientMessage::Restart),
        "ping" => {
            let t = parse_finite(object.get("t")?)?;
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// Accepts either a name (`"up"`) or the client's numeric code (`3`).
fn parse_direction(value: &Value) -> Option<Direction> {
    if let Some(name) = value.as_str() {
        return Direction::parse_move(name);
    }
    Direction::from_code(value.as_i64()?)
}

fn parse_finite(value: &Value) -> Option<f64> {
    let number = value.as_f64()?;
    if !number.is_finite() {
        return None;
    }
    Some(number)
}
