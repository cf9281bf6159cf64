use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::GameResult;
use crate::grid::GridMap;
use crate::rng::Rng;
use crate::types::{
    Direction, GameSummary, OutcomeSignal, RuntimeEvent, SessionStatus, Snapshot, WorldInit,
};

pub mod autopilot;
pub mod ghosts;
pub mod movement;
pub mod player;
pub mod session;

use self::ghosts::GhostPool;
use self::player::Player;
use self::session::SessionState;

/// One game session driven at a fixed tick rate.
///
/// `step` is the only entry point that consumes wall-clock time; it converts
/// elapsed milliseconds into whole ticks so the simulation is identical
/// however the host schedules it.
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    initial_grid: GridMap,
    grid: GridMap,
    session: SessionState,
    player: Player,
    ghosts: GhostPool,
    rng: Rng,

    events: Vec<RuntimeEvent>,
    outcome: Option<OutcomeSignal>,
    tick_counter: u64,
    elapsed_ms: u64,
    tick_budget: u64,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> GameResult<Self> {
        let grid = config.build_grid()?;
        config.validate(&grid)?;

        let pellet_total = grid.pellet_count();
        let reachable = grid.reachable_from(config.player_spawn);
        let stranded = grid
            .pellet_cells()
            .into_iter()
            .filter(|cell| !reachable.contains(cell))
            .count();
        if stranded > 0 {
            warn!(stranded, "some pellets cannot be reached from the player spawn");
        }

        let mut rng = Rng::new(config.seed);
        let player = Player::spawn(config.player_spawn, config.player_speed, config.cell_size);
        let ghosts = GhostPool::create(&config, &grid, &mut rng);
        debug!(
            pellet_total,
            ghosts = ghosts.as_slice().len(),
            width = grid.width(),
            height = grid.height(),
            "session created"
        );

        Ok(Self {
            session: SessionState::new(config.start_lives, pellet_total),
            initial_grid: grid.clone(),
            grid,
            player,
            ghosts,
            rng,
            config,
            events: Vec::new(),
            outcome: None,
            tick_counter: 0,
            elapsed_ms: 0,
            tick_budget: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &GhostPool {
        &self.ghosts
    }

    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_ended(&self) -> bool {
        self.session.is_terminal()
    }

    /// The terminal signal, once one has been reported.
    pub fn outcome(&self) -> Option<OutcomeSignal> {
        self.outcome
    }

    pub fn request_direction(&mut self, dir: Direction) {
        self.player.request_direction(dir);
    }

    /// Advances the session by `dt_ms` of wall-clock time and returns the
    /// number of ticks that ran.
    pub fn step(&mut self, dt_ms: u64) -> u32 {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.tick_budget = self
            .tick_budget
            .saturating_add(dt_ms.saturating_mul(self.config.tick_rate as u64));
        let mut ran = 0;
        while self.tick_budget >= 1000 {
            self.tick_budget -= 1000;
            self.tick();
            ran += 1;
        }
        ran
    }

    pub fn tick(&mut self) {
        self.tick_counter += 1;
        if self.session.is_terminal() {
            return;
        }

        self.player.move_process(&self.grid);
        if let Some(cell) = self.player.eat(&mut self.grid, &mut self.session) {
            self.events.push(RuntimeEvent::PelletEaten {
                row: cell.row,
                col: cell.col,
            });
        }

        self.ghosts
            .update_ghosts(&self.player, &self.grid, self.tick_counter);

        if self
            .player
            .check_ghost_collision(self.ghosts.as_slice(), self.config.collision_threshold())
        {
            self.on_ghost_collision();
        }

        if self.session.check_win() {
            info!(
                tick = self.tick_counter,
                score = self.session.score(),
                "all pellets eaten"
            );
            self.report(OutcomeSignal::Win);
        }
    }

    fn on_ghost_collision(&mut self) {
        let lost = self.session.lose_life();
        let lives = self.session.lives();
        debug!(tick = self.tick_counter, lives, "caught by a ghost");
        self.events.push(RuntimeEvent::LifeLost { lives });
        self.reset_characters();
        if lost {
            info!(
                tick = self.tick_counter,
                score = self.session.score(),
                "out of lives"
            );
            self.report(OutcomeSignal::Loose);
        }
    }

    fn reset_characters(&mut self) {
        self.player = Player::spawn(
            self.config.player_spawn,
            self.config.player_speed,
            self.config.cell_size,
        );
        self.ghosts = GhostPool::create(&self.config, &self.grid, &mut self.rng);
    }

    fn report(&mut self, signal: OutcomeSignal) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(signal);
        self.events.push(RuntimeEvent::Outcome { signal });
    }

    /// Restores pellets, lives and score, and respawns everyone.
    pub fn restart(&mut self) {
        self.grid = self.initial_grid.clone();
        self.session = SessionState::new(self.config.start_lives, self.grid.pellet_count());
        self.reset_characters();
        self.events.clear();
        self.outcome = None;
        self.tick_counter = 0;
        self.elapsed_ms = 0;
        self.tick_budget = 0;
        info!("session restarted");
    }

    pub fn world_init(&self) -> WorldInit {
        WorldInit {
            width: self.grid.width(),
            height: self.grid.height(),
            cell_size: self.config.cell_size,
            tick_rate: self.config.tick_rate,
            tiles: self.grid.tiles(),
            pellet_total: self.session.pellet_total(),
        }
    }

    pub fn build_snapshot(&mut self, drain_events: bool) -> Snapshot {
        let events = if drain_events {
            std::mem::take(&mut self.events)
        } else {
            self.events.clone()
        };
        Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            status: self.session.status(),
            score: self.session.score(),
            lives: self.session.lives(),
            pellet_total: self.session.pellet_total(),
            player: self.player.view(),
            ghosts: self.ghosts.views(),
            events,
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            status: self.session.status(),
            outcome: self.outcome,
            ticks: self.tick_counter,
            duration_ms: self.tick_counter * 1000 / self.config.tick_rate as u64,
            score: self.session.score(),
            pellet_total: self.session.pellet_total(),
            lives_left: self.session.lives(),
            lives_lost: self.session.lives_lost(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }
}
