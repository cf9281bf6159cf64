use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Tie-break order used by the pursuit policy.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Numeric codes used by the browser client: 1 down, 2 left, 3 up, 4 right.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Down),
            2 => Some(Self::Left),
            3 => Some(Self::Up),
            4 => Some(Self::Right),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Down => 1,
            Self::Left => 2,
            Self::Up => 3,
            Self::Right => 4,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// `(d_col, d_row)`, screen coordinates with y growing downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn to_pixel(self, cell_size: i32) -> PixelPos {
        PixelPos {
            x: self.col * cell_size,
            y: self.row * cell_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing the top-left corner.
    pub fn cell(self, cell_size: i32) -> CellCoord {
        CellCoord {
            row: self.y.div_euclid(cell_size),
            col: self.x.div_euclid(cell_size),
        }
    }

    pub fn is_aligned(self, cell_size: i32) -> bool {
        self.x.rem_euclid(cell_size) == 0 && self.y.rem_euclid(cell_size) == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Won,
    Lost,
}

/// Wire names are fixed by the remote listener, including the `loose` spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSignal {
    Win,
    Loose,
}

impl OutcomeSignal {
    pub fn name(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loose => "loose",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Chase,
    Patrol,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "cellSize")]
    pub cell_size: i32,
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    pub tiles: Vec<String>,
    #[serde(rename = "pelletTotal")]
    pub pellet_total: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "requestedDir")]
    pub requested_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub mode: GhostMode,
    pub target: PixelPos,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten { row: i32, col: i32 },
    LifeLost { lives: u32 },
    Outcome { signal: OutcomeSignal },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub status: SessionStatus,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "pelletTotal")]
    pub pellet_total: u32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub status: SessionStatus,
    pub outcome: Option<OutcomeSignal>,
    pub ticks: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub score: u32,
    #[serde(rename = "pelletTotal")]
    pub pellet_total: u32,
    #[serde(rename = "livesLeft")]
    pub lives_left: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
}
