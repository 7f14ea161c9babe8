//! Game engine: one long-lived context object owning the state and the event bus

use super::events::{EventBus, GameEvent, ListenerId};
use super::state::{GamePhase, GameState};
use super::tick::{TickInput, tick};
use crate::progression::RankDetails;

#[derive(Debug)]
pub struct GameEngine {
    pub state: GameState,
    bus: EventBus,
}

impl GameEngine {
    pub fn new(seed: u64) -> Self {
        Self::with_total_score(seed, 0)
    }

    pub fn with_total_score(seed: u64, total_score: u64) -> Self {
        Self {
            state: GameState::with_total_score(seed, total_score),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Run one tick, dispatch its events to listeners and return them.
    ///
    /// The grid is fully committed before any listener runs.
    pub fn step(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        tick(&mut self.state, input, dt);
        let events = self.state.drain_events();
        for event in &events {
            self.bus.emit(event);
        }
        events
    }

    pub fn is_game_over(&self) -> bool {
        self.state.phase == GamePhase::GameOver
    }

    pub fn rank_details(&self) -> RankDetails {
        self.state.rank_details()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_step_dispatches_to_listeners() {
        let mut engine = GameEngine::new(11);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let events = engine.step(&TickInput::default(), 1.0 / 60.0);

        assert_eq!(*seen.borrow(), events);
        assert!(matches!(events.first(), Some(GameEvent::GameStarted { seed: 11 })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::PieceSpawned { .. })));
        assert!(engine.state.events.is_empty());
    }

    #[test]
    fn test_runs_until_game_over() {
        let mut engine = GameEngine::new(77);
        let drop = TickInput {
            hard_drop: true,
            ..Default::default()
        };
        // Stacking pieces in one column tops out the tank quickly
        for _ in 0..500 {
            engine.step(&drop, 1.0 / 60.0);
            if engine.is_game_over() {
                break;
            }
        }
        assert!(engine.is_game_over());
    }

    #[test]
    fn test_long_step_lands_on_goop() {
        use crate::consts::{TOTAL_HEIGHT, TOTAL_WIDTH};
        use crate::sim::{Cell, GoopColor, GroupId};

        let mut engine = GameEngine::new(31);
        let shelf = 9;
        for x in 0..TOTAL_WIDTH {
            let id = 1000 + x as u32;
            let cell = Cell::new(id, GroupId(id), GoopColor::Black, shelf, 0);
            engine.state.grid.set(x, shelf, Some(cell));
        }

        let soft = TickInput {
            soft_drop: true,
            ..Default::default()
        };
        let events = engine.step(&soft, 0.6);

        assert!(events.iter().any(|e| matches!(e, GameEvent::PieceLocked { .. })));
        let below = engine
            .state
            .grid
            .iter()
            .filter(|(p, _)| p.y > shelf && p.y < TOTAL_HEIGHT)
            .count();
        assert_eq!(below, 0);
    }

    #[test]
    fn test_rank_includes_banked_score() {
        let engine = GameEngine::with_total_score(1, 5000);
        assert_eq!(engine.state.rank, engine.rank_details().rank);
        assert!(engine.state.rank >= 2);
    }
}
