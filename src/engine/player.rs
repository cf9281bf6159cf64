use super::ghosts::Ghost;
use super::movement::{advance, Body, MoveOutcome};
use super::session::SessionState;
use crate::grid::GridMap;
use crate::types::{CellCoord, Direction, PixelPos, PlayerView};

#[derive(Clone, Debug)]
pub struct Player {
    body: Body,
    cell_size: i32,
}

impl Player {
    /// The player always starts heading right.
    pub fn spawn(cell: CellCoord, speed: i32, cell_size: i32) -> Self {
        Self {
            body: Body::new(cell.to_pixel(cell_size), Direction::Right, speed),
            cell_size,
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn position(&self) -> PixelPos {
        self.body.pos
    }

    pub fn direction(&self) -> Direction {
        self.body.current
    }

    pub fn requested_direction(&self) -> Direction {
        self.body.requested
    }

    pub fn request_direction(&mut self, dir: Direction) {
        self.body.requested = dir;
    }

    pub fn cell(&self) -> CellCoord {
        self.body.pos.cell(self.cell_size)
    }

    pub fn move_process(&mut self, grid: &GridMap) -> MoveOutcome {
        advance(&mut self.body, grid, self.cell_size)
    }

    /// Eats the pellet under the top-left corner, if any.
    pub fn eat(&self, grid: &mut GridMap, session: &mut SessionState) -> Option<CellCoord> {
        let cell = self.cell();
        match grid.consume_pellet_at(cell.row, cell.col) {
            Ok(true) => {
                session.record_pellet();
                Some(cell)
            }
            _ => None,
        }
    }

    pub fn check_ghost_collision(&self, ghosts: &[Ghost], threshold: i32) -> bool {
        ghosts.iter().any(|ghost| {
            let other = ghost.position();
            (other.x - self.body.pos.x).abs() < threshold
                && (other.y - self.body.pos.y).abs() < threshold
        })
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.body.pos.x,
            y: self.body.pos.y,
            dir: self.body.current,
            requested_dir: self.body.requested,
        }
    }
}
