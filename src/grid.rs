use std::collections::{HashSet, VecDeque};

use crate::error::GridError;
use crate::types::{CellCoord, Direction};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Open,
    Pellet,
}

impl Cell {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::Wall),
            2 => Some(Self::Pellet),
            _ => None,
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Wall),
            ' ' => Some(Self::Open),
            '.' => Some(Self::Pellet),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Open => ' ',
            Self::Pellet => '.',
        }
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }
}

/// Walkability lookup over a fixed cell grid.
///
/// Dimensions never change after construction; the only mutation is a pellet
/// turning into an open cell. Rows whose first and last cells are both
/// non-wall are tunnels: stepping off one side re-enters on the other.
/// Columns behave the same way vertically.
#[derive(Clone, Debug)]
pub struct GridMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    tunnel_rows: Vec<bool>,
    tunnel_cols: Vec<bool>,
}

impl GridMap {
    pub fn from_codes(rows: &[Vec<u8>]) -> Result<Self, GridError> {
        let mut cells = Vec::new();
        let width = check_shape(rows.iter().map(|row| row.len()))?;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, code) in row.iter().enumerate() {
                let cell = Cell::from_code(*code).ok_or(GridError::UnknownCode {
                    code: *code,
                    row: row_idx,
                    col: col_idx,
                })?;
                cells.push(cell);
            }
        }
        Ok(Self::from_cells(width, rows.len(), cells))
    }

    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let mut cells = Vec::new();
        let width = check_shape(rows.iter().map(|row| row.chars().count()))?;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, ch) in row.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(GridError::UnknownChar {
                    ch,
                    row: row_idx,
                    col: col_idx,
                })?;
                cells.push(cell);
            }
        }
        Ok(Self::from_cells(width, rows.len(), cells))
    }

    fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Self {
        let mut grid = Self {
            width: width as i32,
            height: height as i32,
            cells,
            tunnel_rows: vec![false; height],
            tunnel_cols: vec![false; width],
        };
        for row in 0..grid.height {
            grid.tunnel_rows[row as usize] =
                grid.open_in_bounds(row, 0) && grid.open_in_bounds(row, grid.width - 1);
        }
        for col in 0..grid.width {
            grid.tunnel_cols[col as usize] =
                grid.open_in_bounds(0, col) && grid.open_in_bounds(grid.height - 1, col);
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && row < self.height && col < self.width
    }

    pub fn cell_at(&self, row: i32, col: i32) -> Result<Cell, GridError> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Out-of-bounds cells count as walls unless a tunnel leads there.
    pub fn is_wall(&self, row: i32, col: i32) -> bool {
        !self.is_walkable(row, col)
    }

    pub fn is_walkable(&self, row: i32, col: i32) -> bool {
        match self.wrap(row, col) {
            Some((row, col)) => self.open_in_bounds(row, col),
            None => false,
        }
    }

    pub fn is_tunnel_row(&self, row: i32) -> bool {
        row >= 0 && row < self.height && self.tunnel_rows[row as usize]
    }

    pub fn is_tunnel_col(&self, col: i32) -> bool {
        col >= 0 && col < self.width && self.tunnel_cols[col as usize]
    }

    /// Returns whether a pellet was eaten. Eating the same cell twice yields `false`.
    pub fn consume_pellet_at(&mut self, row: i32, col: i32) -> Result<bool, GridError> {
        let idx = self.index(row, col)?;
        if self.cells[idx] != Cell::Pellet {
            return Ok(false);
        }
        self.cells[idx] = Cell::Open;
        Ok(true)
    }

    pub fn pellet_count(&self) -> u32 {
        self.cells.iter().filter(|cell| **cell == Cell::Pellet).count() as u32
    }

    pub fn has_pellet(&self, row: i32, col: i32) -> bool {
        matches!(self.cell_at(row, col), Ok(Cell::Pellet))
    }

    /// Adjacent walkable cell in `dir`, wrapped through tunnels.
    pub fn neighbor(&self, row: i32, col: i32, dir: Direction) -> Option<CellCoord> {
        let (dc, dr) = dir.delta();
        let (row, col) = self.wrap(row + dr, col + dc)?;
        if !self.open_in_bounds(row, col) {
            return None;
        }
        Some(CellCoord { row, col })
    }

    pub fn reachable_from(&self, start: CellCoord) -> HashSet<CellCoord> {
        let mut out = HashSet::new();
        if !self.is_walkable(start.row, start.col) || !self.in_bounds(start.row, start.col) {
            return out;
        }
        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            for dir in Direction::PRIORITY {
                if let Some(next) = self.neighbor(cell.row, cell.col, dir) {
                    if out.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        out
    }

    pub fn pellet_cells(&self) -> Vec<CellCoord> {
        let mut out = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.has_pellet(row, col) {
                    out.push(CellCoord { row, col });
                }
            }
        }
        out
    }

    pub fn tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|cell| cell.as_char()).collect())
            .collect()
    }

    fn wrap(&self, row: i32, col: i32) -> Option<(i32, i32)> {
        if self.in_bounds(row, col) {
            return Some((row, col));
        }
        let row_ok = row >= 0 && row < self.height;
        let col_ok = col >= 0 && col < self.width;
        if row_ok && self.tunnel_rows[row as usize] {
            return Some((row, col.rem_euclid(self.width)));
        }
        if col_ok && self.tunnel_cols[col as usize] {
            return Some((row.rem_euclid(self.height), col));
        }
        None
    }

    fn open_in_bounds(&self, row: i32, col: i32) -> bool {
        self.index(row, col)
            .map(|idx| !self.cells[idx].is_wall())
            .unwrap_or(false)
    }

    fn index(&self, row: i32, col: i32) -> Result<usize, GridError> {
        if !self.in_bounds(row, col) {
            return Err(GridError::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok((row * self.width + col) as usize)
    }
}

fn check_shape(mut lengths: impl Iterator<Item = usize>) -> Result<usize, GridError> {
    let Some(expected) = lengths.next() else {
        return Err(GridError::Empty);
    };
    if expected == 0 {
        return Err(GridError::Empty);
    }
    for (offset, found) in lengths.enumerate() {
        if found != expected {
            return Err(GridError::Ragged {
                row: offset + 1,
                expected,
                found,
            });
        }
    }
    Ok(expected)
}
