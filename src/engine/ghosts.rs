use super::movement::{advance, Body};
use super::player::Player;
use crate::config::GameConfig;
use crate::grid::GridMap;
use crate::rng::Rng;
use crate::types::{Direction, GhostMode, GhostView, PixelPos};

const CORNER_COUNT: usize = 4;

#[derive(Clone, Debug)]
pub struct Ghost {
    id: usize,
    body: Body,
    chase_range: i32,
    patrol_index: usize,
    mode: GhostMode,
    target: PixelPos,
}

impl Ghost {
    pub fn new(id: usize, pos: PixelPos, speed: i32, chase_range: i32, patrol_index: usize) -> Self {
        Self {
            id,
            body: Body::new(pos, Direction::Up, speed),
            chase_range,
            patrol_index: patrol_index % CORNER_COUNT,
            mode: GhostMode::Patrol,
            target: pos,
        }
    }

    pub fn id(&self) -> usize {
        self.id
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

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn target(&self) -> PixelPos {
        self.target
    }

    pub fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    /// Chase the player while it is within `chase_range` cells on both axes,
    /// otherwise head for the current patrol corner.
    fn select_target(&mut self, player: PixelPos, corners: &[PixelPos; CORNER_COUNT], cell_size: i32) {
        let reach = self.chase_range * cell_size;
        let in_range = (player.x - self.body.pos.x).abs() <= reach
            && (player.y - self.body.pos.y).abs() <= reach;
        if in_range {
            self.mode = GhostMode::Chase;
            self.target = player;
        } else {
            self.mode = GhostMode::Patrol;
            self.target = corners[self.patrol_index];
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.body.pos.x,
            y: self.body.pos.y,
            dir: self.body.current,
            mode: self.mode,
            target: self.target,
        }
    }
}

/// Greedy pursuit step: the walkable neighbour closest to `target`.
///
/// Only evaluated at aligned positions. Reversing is allowed only when it is
/// the sole way out; ties go to Up, Left, Down, Right in that order.
pub fn choose_direction(
    body: &Body,
    grid: &GridMap,
    cell_size: i32,
    target: PixelPos,
) -> Option<Direction> {
    if !body.pos.is_aligned(cell_size) {
        return None;
    }
    let cell = body.pos.cell(cell_size);
    let open: Vec<Direction> = Direction::PRIORITY
        .into_iter()
        .filter(|dir| {
            let (dc, dr) = dir.delta();
            grid.is_walkable(cell.row + dr, cell.col + dc)
        })
        .collect();
    let reverse = body.current.reverse();
    let forward: Vec<Direction> = open.iter().copied().filter(|dir| *dir != reverse).collect();
    let candidates = if forward.is_empty() { open } else { forward };

    let mut best: Option<(Direction, i64)> = None;
    for dir in candidates {
        let (dx, dy) = dir.delta();
        let next = PixelPos::new(body.pos.x + dx * cell_size, body.pos.y + dy * cell_size);
        let distance = squared_distance(next, target);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((dir, distance)),
        }
    }
    best.map(|(dir, _)| dir)
}

fn squared_distance(a: PixelPos, b: PixelPos) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Inner corners of the maze, used as patrol waypoints.
pub fn corner_targets(grid: &GridMap, cell_size: i32) -> [PixelPos; CORNER_COUNT] {
    let left = cell_size;
    let top = cell_size;
    let right = (grid.width() - 2) * cell_size;
    let bottom = (grid.height() - 2) * cell_size;
    [
        PixelPos::new(left, top),
        PixelPos::new(left, bottom),
        PixelPos::new(right, top),
        PixelPos::new(right, bottom),
    ]
}

#[derive(Clone, Debug)]
pub struct GhostPool {
    ghosts: Vec<Ghost>,
    corners: [PixelPos; CORNER_COUNT],
    cell_size: i32,
    patrol_rotate_ticks: u64,
}

impl GhostPool {
    /// Places one ghost on each configured spawn cell.
    pub fn create(config: &GameConfig, grid: &GridMap, rng: &mut Rng) -> Self {
        let ranges = config.chase_ranges();
        let ghosts = config
            .ghost_spawns
            .iter()
            .enumerate()
            .map(|(idx, spawn)| {
                Ghost::new(
                    idx,
                    spawn.to_pixel(config.cell_size),
                    config.ghost_speed,
                    ranges.get(idx).copied().unwrap_or(0),
                    rng.below(CORNER_COUNT),
                )
            })
            .collect();
        Self {
            ghosts,
            corners: corner_targets(grid, config.cell_size),
            cell_size: config.cell_size,
            patrol_rotate_ticks: config.patrol_rotate_ticks.max(1),
        }
    }

    pub fn as_slice(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn corners(&self) -> &[PixelPos; CORNER_COUNT] {
        &self.corners
    }

    /// One tick for every ghost. `tick` drives the patrol corner rotation.
    pub fn update_ghosts(&mut self, player: &Player, grid: &GridMap, tick: u64) {
        if tick > 0 && tick.is_multiple_of(self.patrol_rotate_ticks) {
            for ghost in &mut self.ghosts {
                ghost.patrol_index = (ghost.patrol_index + 1) % CORNER_COUNT;
            }
        }
        let target_player = player.position();
        for ghost in &mut self.ghosts {
            if ghost.body.pos.is_aligned(self.cell_size) {
                ghost.select_target(target_player, &self.corners, self.cell_size);
                if let Some(dir) = choose_direction(&ghost.body, grid, self.cell_size, ghost.target)
                {
                    ghost.body.requested = dir;
                }
            }
            advance(&mut ghost.body, grid, self.cell_size);
        }
    }

    pub fn views(&self) -> Vec<GhostView> {
        self.ghosts.iter().map(Ghost::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{choose_direction, corner_targets, Ghost, GhostPool};
    use crate::config::GameConfig;
    use crate::engine::movement::{covered_cells, Body};
    use crate::engine::player::Player;
    use crate::grid::GridMap;
    use crate::rng::Rng;
    use crate::types::{CellCoord, Direction, GhostMode, PixelPos};

    const CELL: i32 = 40;

    fn at(col: i32, row: i32) -> PixelPos {
        PixelPos::new(col * CELL, row * CELL)
    }

    fn open_room() -> GridMap {
        GridMap::from_rows(&[
            "#####", //
            "#   #", //
            "#   #", //
            "#   #", //
            "#####",
        ])
        .expect("valid grid")
    }

    #[test]
    fn picks_the_neighbour_closest_to_the_target() {
        let grid = open_room();
        let body = Body::new(at(2, 2), Direction::Up, 4);
        assert_eq!(
            choose_direction(&body, &grid, CELL, at(3, 2)),
            Some(Direction::Right)
        );
        assert_eq!(
            choose_direction(&body, &grid, CELL, at(2, 1)),
            Some(Direction::Up)
        );
    }

    #[test]
    fn ties_follow_up_left_down_right() {
        let grid = open_room();
        let body = Body::new(at(2, 2), Direction::Left, 4);
        // equidistant from the up and left neighbours
        assert_eq!(
            choose_direction(&body, &grid, CELL, at(1, 1)),
            Some(Direction::Up)
        );
        let body = Body::new(at(2, 2), Direction::Down, 4);
        assert_eq!(
            choose_direction(&body, &grid, CELL, at(1, 3)),
            Some(Direction::Left)
        );
    }

    #[test]
    fn never_reverses_while_another_way_is_open() {
        let grid = open_room();
        let body = Body::new(at(2, 2), Direction::Right, 4);
        let choice = choose_direction(&body, &grid, CELL, at(1, 2));
        assert_ne!(choice, Some(Direction::Left));
        assert!(choice.is_some());
    }

    #[test]
    fn dead_end_forces_a_reversal() {
        let grid = GridMap::from_rows(&[
            "#####", //
            "#   #", //
            "#####",
        ])
        .expect("valid grid");
        let mut pool = GhostPool::create(
            &GameConfig {
                ghost_spawns: vec![CellCoord::new(1, 1)],
                ghost_chase_ranges: Some(vec![10]),
                ..GameConfig::default()
            },
            &grid,
            &mut Rng::new(3),
        );
        let player = Player::spawn(CellCoord::new(1, 3), 8, CELL);
        let mut saw_right = false;
        let mut reversed = false;
        for tick in 1..=80 {
            pool.update_ghosts(&player, &grid, tick);
            let ghost = &pool.as_slice()[0];
            if ghost.direction() == Direction::Right {
                saw_right = true;
            }
            if saw_right && ghost.direction() == Direction::Left {
                reversed = true;
            }
        }
        assert!(saw_right);
        assert!(reversed, "ghost stalled at the dead end");
        assert_eq!(
            choose_direction(
                &Body::new(at(3, 1), Direction::Right, 4),
                &grid,
                CELL,
                at(3, 1)
            ),
            Some(Direction::Left)
        );
    }

    #[test]
    fn mid_cell_positions_are_not_decision_points() {
        let grid = open_room();
        let body = Body::new(PixelPos::new(84, 80), Direction::Right, 4);
        assert_eq!(choose_direction(&body, &grid, CELL, at(1, 1)), None);
    }

    #[test]
    fn chases_inside_range_and_patrols_outside() {
        let grid = GridMap::from_codes(&crate::constants::default_layout()).expect("grid");
        let corners = corner_targets(&grid, CELL);
        let mut ghost = Ghost::new(0, at(11, 10), 4, 6, 2);

        ghost.select_target(at(12, 8), &corners, CELL);
        assert_eq!(ghost.mode(), GhostMode::Chase);
        assert_eq!(ghost.target(), at(12, 8));

        ghost.select_target(at(1, 1), &corners, CELL);
        assert_eq!(ghost.mode(), GhostMode::Patrol);
        assert_eq!(ghost.target(), corners[2]);
        assert_eq!(corners[2], at(23, 1));
    }

    #[test]
    fn patrol_corner_rotates_on_schedule() {
        let config = GameConfig {
            patrol_rotate_ticks: 10,
            ..GameConfig::default()
        };
        let grid = config.build_grid().expect("grid");
        let mut pool = GhostPool::create(&config, &grid, &mut Rng::new(11));
        let before: Vec<usize> = pool.as_slice().iter().map(Ghost::patrol_index).collect();
        let player = Player::spawn(config.player_spawn, config.player_speed, CELL);
        for tick in 1..10 {
            pool.update_ghosts(&player, &grid, tick);
        }
        let unchanged: Vec<usize> = pool.as_slice().iter().map(Ghost::patrol_index).collect();
        assert_eq!(before, unchanged);
        pool.update_ghosts(&player, &grid, 10);
        for (old, ghost) in before.iter().zip(pool.as_slice()) {
            assert_eq!(ghost.patrol_index(), (old + 1) % 4);
        }
    }

    #[test]
    fn ghosts_stay_out_of_walls_on_the_default_level() {
        let config = GameConfig::default();
        let grid = config.build_grid().expect("grid");
        let mut pool = GhostPool::create(&config, &grid, &mut Rng::new(21));
        let player = Player::spawn(config.player_spawn, config.player_speed, CELL);
        for tick in 1..=3_000 {
            pool.update_ghosts(&player, &grid, tick);
            for ghost in pool.as_slice() {
                for (row, col) in covered_cells(ghost.position(), CELL) {
                    assert!(grid.is_walkable(row, col), "ghost {} in wall", ghost.id());
                }
            }
        }
    }
}
