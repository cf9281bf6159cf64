use crate::types::Direction;

/// Minimum travel on the dominant axis before a swipe counts.
pub const SWIPE_THRESHOLD: f64 = 30.0;

/// Arrow keys and WASD.
pub fn direction_from_key(code: u32) -> Option<Direction> {
    match code {
        37 | 65 => Some(Direction::Left),
        38 | 87 => Some(Direction::Up),
        39 | 68 => Some(Direction::Right),
        40 | 83 => Some(Direction::Down),
        _ => None,
    }
}

pub fn direction_from_swipe(dx: f64, dy: f64) -> Option<Direction> {
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }
    if dx.abs() > dy.abs() {
        if dx.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        return Some(if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        });
    }
    if dy.abs() <= SWIPE_THRESHOLD {
        return None;
    }
    Some(if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}
