//! Sweep event queue with soft-deleted circle events.
//!
//! `BinaryHeap` cannot drop arbitrary entries, so a circle event that stops
//! being relevant is only flagged. The flag is checked when the event is
//! popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::beach::ArcId;
use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EventId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    Site(usize),
    Circle(EventId),
}

impl EventKind {
    /// Sites win ties against circles at the same position
    fn rank(&self) -> u8 {
        match self {
            EventKind::Site(_) => 1,
            EventKind::Circle(_) => 0,
        }
    }

    fn index(&self) -> usize {
        match self {
            EventKind::Site(i) => *i,
            EventKind::Circle(id) => id.0,
        }
    }
}

/// Heap entry, popped in order of descending `y`, then ascending `x`
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueuedEvent {
    pub y: f64,
    pub x: f64,
    pub kind: EventKind,
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y
            .total_cmp(&other.y)
            .then_with(|| other.x.total_cmp(&self.x))
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
            .then_with(|| other.kind.index().cmp(&self.kind.index()))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEvent {}

#[derive(Debug, Clone)]
pub(crate) struct CircleEvent {
    /// Arc predicted to collapse
    pub arc: ArcId,
    /// Voronoi vertex emitted if the event fires
    pub center: Position,
    pub valid: bool,
}

#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    circles: Vec<CircleEvent>,
    invalidated: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_site(&mut self, site: usize, pos: &Position) {
        self.heap.push(QueuedEvent {
            y: pos.y,
            x: pos.x,
            kind: EventKind::Site(site),
        });
    }

    /// Queue a circle event firing when the sweep reaches `y`.
    pub fn schedule(&mut self, arc: ArcId, center: Position, y: f64) -> EventId {
        let id = EventId(self.circles.len());
        self.circles.push(CircleEvent {
            arc,
            center,
            valid: true,
        });
        self.heap.push(QueuedEvent {
            y,
            x: center.x,
            kind: EventKind::Circle(id),
        });
        id
    }

    /// Flag a circle event as stale. It stays in the heap until popped.
    pub fn invalidate(&mut self, id: EventId) {
        let event = &mut self.circles[id.0];
        if event.valid {
            event.valid = false;
            self.invalidated += 1;
        }
    }

    pub fn circle(&self, id: EventId) -> &CircleEvent {
        &self.circles[id.0]
    }

    pub fn pop(&mut self) -> Option<QueuedEvent> {
        self.heap.pop()
    }

    /// Circle events scheduled so far
    pub fn scheduled(&self) -> usize {
        self.circles.len()
    }

    /// Circle events flagged stale so far
    pub fn invalidated(&self) -> usize {
        self.invalidated
    }
}
