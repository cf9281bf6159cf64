//! Grid-constrained motion shared by the player and every ghost.

use crate::grid::GridMap;
use crate::types::{Direction, PixelPos};

/// Position and heading of anything that moves through the maze.
///
/// The coordinate orthogonal to `current` is always a multiple of the cell
/// size: turns are only committed at cell-aligned positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    pub pos: PixelPos,
    pub current: Direction,
    pub requested: Direction,
    pub speed: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub turned: bool,
    pub blocked: bool,
    pub wrapped: bool,
}

impl Body {
    pub fn new(pos: PixelPos, dir: Direction, speed: i32) -> Self {
        Self {
            pos,
            current: dir,
            requested: dir,
            speed,
        }
    }
}

/// A turn is legal only from an aligned position into a walkable neighbour.
pub fn can_turn(body: &Body, grid: &GridMap, cell_size: i32, dir: Direction) -> bool {
    if !body.pos.is_aligned(cell_size) {
        return false;
    }
    let cell = body.pos.cell(cell_size);
    let (dc, dr) = dir.delta();
    grid.is_walkable(cell.row + dr, cell.col + dc)
}

/// Advances `body` by one tick.
pub fn advance(body: &mut Body, grid: &GridMap, cell_size: i32) -> MoveOutcome {
    let mut outcome = MoveOutcome::default();

    if body.requested != body.current && can_turn(body, grid, cell_size, body.requested) {
        body.current = body.requested;
        outcome.turned = true;
    }

    let (dx, dy) = body.current.delta();
    let mut next = PixelPos::new(body.pos.x + dx * body.speed, body.pos.y + dy * body.speed);

    match body.current {
        Direction::Right => {
            let lead = (next.x + cell_size - 1).div_euclid(cell_size);
            if !span_walkable_vertically(grid, next.y, lead, cell_size) {
                next.x = (lead - 1) * cell_size;
                outcome.blocked = true;
            }
        }
        Direction::Left => {
            let lead = next.x.div_euclid(cell_size);
            if !span_walkable_vertically(grid, next.y, lead, cell_size) {
                next.x = (lead + 1) * cell_size;
                outcome.blocked = true;
            }
        }
        Direction::Down => {
            let lead = (next.y + cell_size - 1).div_euclid(cell_size);
            if !span_walkable_horizontally(grid, next.x, lead, cell_size) {
                next.y = (lead - 1) * cell_size;
                outcome.blocked = true;
            }
        }
        Direction::Up => {
            let lead = next.y.div_euclid(cell_size);
            if !span_walkable_horizontally(grid, next.x, lead, cell_size) {
                next.y = (lead + 1) * cell_size;
                outcome.blocked = true;
            }
        }
    }

    let extent_x = grid.width() * cell_size;
    let extent_y = grid.height() * cell_size;
    let wrapped = PixelPos::new(next.x.rem_euclid(extent_x), next.y.rem_euclid(extent_y));
    outcome.wrapped = wrapped != next;
    body.pos = wrapped;
    outcome
}

/// Every cell a body's square overlaps at `pos`.
pub fn covered_cells(pos: PixelPos, cell_size: i32) -> Vec<(i32, i32)> {
    let rows = span(pos.y, cell_size);
    let cols = span(pos.x, cell_size);
    let mut out = Vec::with_capacity(4);
    for row in rows.0..=rows.1 {
        for col in cols.0..=cols.1 {
            out.push((row, col));
        }
    }
    out
}

fn span(coord: i32, cell_size: i32) -> (i32, i32) {
    (
        coord.div_euclid(cell_size),
        (coord + cell_size - 1).div_euclid(cell_size),
    )
}

fn span_walkable_vertically(grid: &GridMap, y: i32, col: i32, cell_size: i32) -> bool {
    let (first, last) = span(y, cell_size);
    (first..=last).all(|row| grid.is_walkable(row, col))
}

fn span_walkable_horizontally(grid: &GridMap, x: i32, row: i32, cell_size: i32) -> bool {
    let (first, last) = span(x, cell_size);
    (first..=last).all(|col| grid.is_walkable(row, col))
}

#[cfg(test)]
mod tests {
    use super::{advance, can_turn, covered_cells, Body};
    use crate::grid::GridMap;
    use crate::types::{Direction, PixelPos};

    const CELL: i32 = 40;

    fn cross_grid() -> GridMap {
        GridMap::from_rows(&[
            "#####", //
            "## ##", //
            "#   #", //
            "## ##", //
            "#####",
        ])
        .expect("valid grid")
    }

    fn at(col: i32, row: i32) -> PixelPos {
        PixelPos::new(col * CELL, row * CELL)
    }

    #[test]
    fn moves_speed_pixels_along_current_direction() {
        let grid = cross_grid();
        let mut body = Body::new(at(1, 2), Direction::Right, 8);
        let outcome = advance(&mut body, &grid, CELL);
        assert_eq!(body.pos, PixelPos::new(48, 80));
        assert!(!outcome.blocked && !outcome.turned);
    }

    #[test]
    fn stops_flush_against_a_wall_and_keeps_heading() {
        let grid = cross_grid();
        let mut body = Body::new(at(3, 2), Direction::Right, 8);
        let outcome = advance(&mut body, &grid, CELL);
        assert!(outcome.blocked);
        assert_eq!(body.pos, at(3, 2));
        assert_eq!(body.current, Direction::Right);

        let mut body = Body::new(PixelPos::new(2 * CELL + 32, 2 * CELL), Direction::Right, 8);
        advance(&mut body, &grid, CELL);
        assert_eq!(body.pos, at(3, 2));
        advance(&mut body, &grid, CELL);
        assert_eq!(body.pos, at(3, 2));
    }

    #[test]
    fn buffered_turn_waits_for_the_intersection() {
        let grid = cross_grid();
        let mut body = Body::new(at(1, 2), Direction::Right, 8);
        body.requested = Direction::Up;

        for _ in 0..4 {
            let outcome = advance(&mut body, &grid, CELL);
            assert!(!outcome.turned);
            assert_eq!(body.current, Direction::Right);
            assert_eq!(body.requested, Direction::Up);
        }
        advance(&mut body, &grid, CELL);
        assert_eq!(body.pos, at(2, 2));
        assert_eq!(body.current, Direction::Right);

        let outcome = advance(&mut body, &grid, CELL);
        assert!(outcome.turned);
        assert_eq!(body.current, Direction::Up);
        assert_eq!(body.pos, PixelPos::new(2 * CELL, 2 * CELL - 8));
    }

    #[test]
    fn turn_into_a_wall_is_refused_even_when_aligned() {
        let grid = cross_grid();
        let body = Body::new(at(1, 2), Direction::Right, 8);
        assert!(!can_turn(&body, &grid, CELL, Direction::Up));
        assert!(!can_turn(&body, &grid, CELL, Direction::Left));
        assert!(can_turn(&body, &grid, CELL, Direction::Right));

        let mid = Body::new(PixelPos::new(48, 80), Direction::Right, 8);
        assert!(!can_turn(&mid, &grid, CELL, Direction::Left));
    }

    #[test]
    fn reversal_mid_cell_waits_for_alignment() {
        let grid = cross_grid();
        let mut body = Body::new(PixelPos::new(48, 80), Direction::Right, 8);
        body.requested = Direction::Left;
        advance(&mut body, &grid, CELL);
        assert_eq!(body.current, Direction::Right);
        assert_eq!(body.pos, PixelPos::new(56, 80));
    }

    #[test]
    fn tunnel_exit_wraps_to_the_opposite_side() {
        let grid = GridMap::from_rows(&[
            "#####", //
            "     ", //
            "#####",
        ])
        .expect("valid grid");
        let mut body = Body::new(at(0, 1), Direction::Left, 8);
        let outcome = advance(&mut body, &grid, CELL);
        assert!(outcome.wrapped);
        assert!(!outcome.blocked);
        assert_eq!(body.pos, PixelPos::new(5 * CELL - 8, CELL));

        let mut body = Body::new(at(4, 1), Direction::Right, 8);
        for _ in 0..5 {
            advance(&mut body, &grid, CELL);
        }
        assert_eq!(body.pos, at(0, 1));
    }

    #[test]
    fn no_tunnel_means_the_border_is_a_wall() {
        let grid = GridMap::from_rows(&[
            "#####", //
            "    #", //
            "#####",
        ])
        .expect("valid grid");
        let mut body = Body::new(at(0, 1), Direction::Left, 8);
        let outcome = advance(&mut body, &grid, CELL);
        assert!(outcome.blocked);
        assert_eq!(body.pos, at(0, 1));
    }

    #[test]
    fn covered_cells_reports_the_straddled_pair() {
        assert_eq!(covered_cells(at(1, 1), CELL), vec![(1, 1)]);
        assert_eq!(
            covered_cells(PixelPos::new(48, 40), CELL),
            vec![(1, 1), (1, 2)]
        );
    }

    #[test]
    fn never_penetrates_walls_under_random_requests() {
        let grid = GridMap::from_rows(&[
            "#########", //
            "#   #   #", //
            "# # # # #", //
            "#       #", //
            "## ### ##", //
            "         ", //
            "#########",
        ])
        .expect("valid grid");
        let dirs = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ];
        let mut rng = crate::rng::Rng::new(5);
        let mut body = Body::new(at(1, 1), Direction::Right, 8);
        for tick in 0..5_000 {
            if tick % 7 == 0 {
                body.requested = rng.pick(&dirs).unwrap_or(Direction::Up);
            }
            advance(&mut body, &grid, CELL);
            for (row, col) in covered_cells(body.pos, CELL) {
                assert!(
                    grid.is_walkable(row, col),
                    "tick {tick}: body at {:?} overlaps wall ({row}, {col})",
                    body.pos
                );
            }
            if body.current.is_horizontal() {
                assert_eq!(body.pos.y % CELL, 0);
            } else {
                assert_eq!(body.pos.x % CELL, 0);
            }
        }
    }
}
