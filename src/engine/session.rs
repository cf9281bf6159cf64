use crate::types::SessionStatus;

/// Lives, score and the terminal state of one game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    lives: u32,
    start_lives: u32,
    score: u32,
    pellet_total: u32,
    status: SessionStatus,
}

impl SessionState {
    pub fn new(start_lives: u32, pellet_total: u32) -> Self {
        Self {
            lives: start_lives,
            start_lives,
            score: 0,
            pellet_total,
            status: SessionStatus::Playing,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn lives_lost(&self) -> u32 {
        self.start_lives - self.lives
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pellet_total(&self) -> u32 {
        self.pellet_total
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status != SessionStatus::Playing
    }

    pub fn record_pellet(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.score += 1;
    }

    /// Returns true when this collision ended the game.
    pub fn lose_life(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = SessionStatus::Lost;
            return true;
        }
        false
    }

    /// Returns true exactly once, on the tick the last pellet is eaten.
    pub fn check_win(&mut self) -> bool {
        if self.is_terminal() || self.score != self.pellet_total {
            return false;
        }
        self.status = SessionStatus::Won;
        true
    }
}
