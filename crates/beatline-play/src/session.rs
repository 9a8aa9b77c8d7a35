// Services owned by one play session

use crate::event::PlayEvent;
use crate::note_pool::NoteVisualPool;
use crate::score::{Difficulty, ScoreManager};

/// Visual pool, score state and the outbound event queue.
#[derive(Debug, Default)]
pub struct Session {
    pub pool: NoteVisualPool,
    pub score: ScoreManager,
    events: Vec<PlayEvent>,
}

impl Session {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            pool: NoteVisualPool::new(),
            score: ScoreManager::new(difficulty),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: PlayEvent) {
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[PlayEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PlayEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn teardown(&mut self) {
        self.pool.teardown();
        if !self.events.is_empty() {
            log::debug!("Dropping {} undrained play events", self.events.len());
            self.events.clear();
        }
    }
}
