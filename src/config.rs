use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{
    default_chase_ranges, default_collision_threshold, default_layout, CELL_SIZE, GHOST_SPAWNS,
    GHOST_SPEED, PATROL_ROTATE_TICKS, PLAYER_SPAWN, PLAYER_SPEED, START_LIVES, TICK_RATE,
};
use crate::error::{ConfigError, GameResult};
use crate::grid::GridMap;
use crate::types::CellCoord;

/// Tunables for one game session. Every field has a default so a config file
/// only needs to name what it overrides.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub tick_rate: u32,
    pub cell_size: i32,
    pub player_speed: i32,
    pub ghost_speed: i32,
    pub start_lives: u32,
    pub collision_threshold: Option<i32>,
    pub ghost_chase_ranges: Option<Vec<i32>>,
    pub patrol_rotate_ticks: u64,
    pub seed: u32,
    pub player_spawn: CellCoord,
    pub ghost_spawns: Vec<CellCoord>,
    pub layout: Option<Vec<Vec<u8>>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            cell_size: CELL_SIZE,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
            start_lives: START_LIVES,
            collision_threshold: None,
            ghost_chase_ranges: None,
            patrol_rotate_ticks: PATROL_ROTATE_TICKS,
            seed: 0,
            player_spawn: PLAYER_SPAWN,
            ghost_spawns: GHOST_SPAWNS.to_vec(),
            layout: None,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> GameResult<Self> {
        let raw = fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn build_grid(&self) -> GameResult<GridMap> {
        let grid = match self.layout.as_ref() {
            Some(rows) => GridMap::from_codes(rows)?,
            None => GridMap::from_codes(&default_layout())?,
        };
        Ok(grid)
    }

    pub fn collision_threshold(&self) -> i32 {
        self.collision_threshold
            .unwrap_or_else(|| default_collision_threshold(self.cell_size))
    }

    pub fn chase_ranges(&self) -> Vec<i32> {
        self.ghost_chase_ranges
            .clone()
            .unwrap_or_else(|| default_chase_ranges(self.ghost_spawns.len()))
    }

    pub fn validate(&self, grid: &GridMap) -> Result<(), ConfigError> {
        positive("tickRate", self.tick_rate as i64)?;
        positive("cellSize", self.cell_size as i64)?;
        positive("startLives", self.start_lives as i64)?;
        positive("patrolRotateTicks", self.patrol_rotate_ticks as i64)?;
        positive("collisionThreshold", self.collision_threshold() as i64)?;
        divides("playerSpeed", self.player_speed, self.cell_size)?;
        divides("ghostSpeed", self.ghost_speed, self.cell_size)?;

        spawn_walkable("player", self.player_spawn, grid)?;
        if self.ghost_spawns.is_empty() {
            return Err(ConfigError::NoGhosts);
        }
        for spawn in &self.ghost_spawns {
            spawn_walkable("ghost", *spawn, grid)?;
        }
        let ranges = self.chase_ranges();
        if ranges.len() != self.ghost_spawns.len() {
            return Err(ConfigError::ChaseRangeCount {
                expected: self.ghost_spawns.len(),
                found: ranges.len(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn divides(field: &'static str, speed: i32, cell_size: i32) -> Result<(), ConfigError> {
    positive(field, speed as i64)?;
    if speed > cell_size || cell_size % speed != 0 {
        return Err(ConfigError::SpeedNotDivisor {
            field,
            speed,
            cell_size,
        });
    }
    Ok(())
}

fn spawn_walkable(what: &'static str, cell: CellCoord, grid: &GridMap) -> Result<(), ConfigError> {
    if !grid.in_bounds(cell.row, cell.col) || grid.is_wall(cell.row, cell.col) {
        return Err(ConfigError::SpawnBlocked {
            what,
            row: cell.row,
            col: cell.col,
        });
    }
    Ok(())
}
