use std::collections::{HashMap, VecDeque};

use super::movement::Body;
use crate::grid::GridMap;
use crate::rng::Rng;
use crate::types::{CellCoord, Direction};

/// Scripted input for headless runs: walk toward the nearest pellet.
///
/// Returns `None` between intersections, where a request could not be
/// committed anyway.
pub fn choose_direction(
    body: &Body,
    grid: &GridMap,
    cell_size: i32,
    rng: &mut Rng,
) -> Option<Direction> {
    if !body.pos.is_aligned(cell_size) {
        return None;
    }
    let start = body.pos.cell(cell_size);
    if let Some(dir) = first_step_to_nearest_pellet(grid, start) {
        return Some(dir);
    }
    let open: Vec<Direction> = Direction::PRIORITY
        .into_iter()
        .filter(|dir| grid.neighbor(start.row, start.col, *dir).is_some())
        .collect();
    rng.pick(&open)
}

fn first_step_to_nearest_pellet(grid: &GridMap, start: CellCoord) -> Option<Direction> {
    let mut first_step: HashMap<CellCoord, Direction> = HashMap::new();
    let mut queue = VecDeque::new();

    for dir in Direction::PRIORITY {
        let Some(next) = grid.neighbor(start.row, start.col, dir) else {
            continue;
        };
        if next == start || first_step.contains_key(&next) {
            continue;
        }
        first_step.insert(next, dir);
        queue.push_back(next);
    }

    while let Some(cell) = queue.pop_front() {
        let dir = first_step.get(&cell).copied()?;
        if grid.has_pellet(cell.row, cell.col) {
            return Some(dir);
        }
        for next_dir in Direction::PRIORITY {
            let Some(next) = grid.neighbor(cell.row, cell.col, next_dir) else {
                continue;
            };
            if next == start || first_step.contains_key(&next) {
                continue;
            }
            first_step.insert(next, dir);
            queue.push_back(next);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::choose_direction;
    use crate::engine::movement::Body;
    use crate::grid::GridMap;
    use crate::rng::Rng;
    use crate::types::{Direction, PixelPos};

    const CELL: i32 = 40;

    #[test]
    fn heads_for_the_nearest_pellet() {
        let grid = GridMap::from_rows(&[
            "#######", //
            "#.    #", //
            "# ### #", //
            "#    .#", //
            "#######",
        ])
        .expect("valid grid");
        let body = Body::new(PixelPos::new(3 * CELL, CELL), Direction::Right, 8);
        let mut rng = Rng::new(1);
        assert_eq!(
            choose_direction(&body, &grid, CELL, &mut rng),
            Some(Direction::Left)
        );
    }

    #[test]
    fn follows_a_tunnel_when_it_is_shorter() {
        let grid = GridMap::from_rows(&[
            "#########", //
            "  .      ", //
            "#########",
        ])
        .expect("valid grid");
        let body = Body::new(PixelPos::new(7 * CELL, CELL), Direction::Left, 8);
        let mut rng = Rng::new(1);
        assert_eq!(
            choose_direction(&body, &grid, CELL, &mut rng),
            Some(Direction::Right)
        );
    }

    #[test]
    fn wanders_when_no_pellet_is_left() {
        let grid = GridMap::from_rows(&[
            "#####", //
            "#   #", //
            "#####",
        ])
        .expect("valid grid");
        let body = Body::new(PixelPos::new(2 * CELL, CELL), Direction::Right, 8);
        let mut rng = Rng::new(9);
        let dir = choose_direction(&body, &grid, CELL, &mut rng).expect("some open direction");
        assert!(matches!(dir, Direction::Left | Direction::Right));
    }

    #[test]
    fn stays_quiet_between_intersections() {
        let grid = GridMap::from_rows(&["#####", "#. .#", "#####"]).expect("valid grid");
        let body = Body::new(PixelPos::new(44, CELL), Direction::Right, 4);
        assert_eq!(choose_direction(&body, &grid, CELL, &mut Rng::new(2)), None);
    }
}
