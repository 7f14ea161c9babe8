//! Domain events and a synchronous listener bus
//!
//! The tick pushes events into `GameState::events`; the engine drains them after
//! each step and hands every event to the registered listeners in order.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::complications::ComplicationKind;
use super::grid::GroupId;
use super::palette::GoopColor;
use super::piece::PieceShape;

/// Player actions that can be refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectedAction {
    Rotate,
    /// Pop target is empty or still filling, or it sits above the pressure line
    Pop,
    /// Nothing of that kind to resolve
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Pressure timer ran out
    TimeUp,
    /// A new piece had nowhere to spawn
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted {
        seed: u64,
    },
    PieceSpawned {
        piece_id: u32,
        shape: PieceShape,
        color: GoopColor,
    },
    /// The tank turned under the piece
    PieceMoved {
        board_offset: i32,
        delta: i32,
    },
    PieceRotated {
        piece_id: u32,
        clockwise: bool,
    },
    /// The piece became goop; `groups` are the groups its cells ended up in
    PieceLocked {
        piece_id: u32,
        cells: Vec<IVec2>,
        groups: Vec<GroupId>,
    },
    /// Hard drop landed
    PieceDropped {
        piece_id: u32,
        rows: i32,
    },
    GoopPopped {
        group_id: GroupId,
        combo: u32,
        count: u32,
        score: u64,
    },
    LooseGoopSettled {
        count: u32,
    },
    GoalSpawned {
        goal_id: u32,
        position: IVec2,
        color: GoopColor,
    },
    GoalCaptured {
        count: u32,
    },
    ActionRejected {
        action: RejectedAction,
    },
    ComplicationSpawned {
        kind: ComplicationKind,
    },
    ComplicationResolved {
        kind: ComplicationKind,
    },
    Paused,
    Resumed,
    GameOver {
        reason: GameOverReason,
        score: u64,
    },
}

/// Handle returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Fan-out of game events to any number of listeners
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was already gone
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &GameEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
