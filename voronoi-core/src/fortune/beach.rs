//! Beach line: arcs in an arena of stable slots, linked left to right.

use std::ops::{Index, IndexMut};

use super::event::EventId;
use super::TraceId;
use crate::predicates::breakpoint;
use crate::Position;

/// Handle to an arc slot. Slots are never reused, so a handle stays valid
/// (possibly pointing at a removed arc) for the whole sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ArcId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Arc {
    pub site: usize,
    pub prev: Option<ArcId>,
    pub next: Option<ArcId>,
    /// Pending circle event predicting this arc's collapse
    pub event: Option<EventId>,
    /// Trace of the breakpoint shared with `prev`
    pub left_trace: Option<TraceId>,
    /// Trace of the breakpoint shared with `next`
    pub right_trace: Option<TraceId>,
    alive: bool,
}

impl Arc {
    fn new(site: usize) -> Self {
        Self {
            site,
            prev: None,
            next: None,
            event: None,
            left_trace: None,
            right_trace: None,
            alive: true,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BeachLine {
    arcs: Vec<Arc>,
    head: Option<ArcId>,
    len: usize,
}

impl BeachLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_alive(&self, id: ArcId) -> bool {
        self.arcs[id.0].alive
    }

    fn alloc(&mut self, site: usize) -> ArcId {
        self.arcs.push(Arc::new(site));
        self.len += 1;
        ArcId(self.arcs.len() - 1)
    }

    /// Start the beach line with a single arc.
    pub fn insert_first(&mut self, site: usize) -> ArcId {
        debug_assert!(self.is_empty());
        let id = self.alloc(site);
        self.head = Some(id);
        id
    }

    /// Link a new arc for `site` directly to the right of `at`.
    pub fn insert_after(&mut self, at: ArcId, site: usize) -> ArcId {
        let id = self.alloc(site);
        let next = self[at].next;
        self[id].prev = Some(at);
        self[id].next = next;
        self[at].next = Some(id);
        if let Some(next) = next {
            self[next].prev = Some(id);
        }
        id
    }

    /// Unlink `id`, joining its neighbors.
    pub fn remove(&mut self, id: ArcId) {
        let (prev, next) = (self[id].prev, self[id].next);
        match prev {
            Some(prev) => self[prev].next = next,
            None => self.head = next,
        }
        if let Some(next) = next {
            self[next].prev = prev;
        }
        let arc = &mut self[id];
        arc.prev = None;
        arc.next = None;
        arc.alive = false;
        self.len -= 1;
    }

    /// Arc lying directly above `x` when the sweep line is at `sweep_y`.
    ///
    /// Walks breakpoints from the left end. A site sitting exactly on a
    /// breakpoint goes to the arc on its left.
    pub fn locate(&self, sites: &[Position], x: f64, sweep_y: f64) -> Option<ArcId> {
        let mut curr = self.head?;
        while let Some(next) = self[curr].next {
            let left = &sites[self[curr].site];
            let right = &sites[self[next].site];
            let bp = breakpoint(left, right, sweep_y).unwrap_or(left.x);
            if x > bp {
                curr = next;
            } else {
                break;
            }
        }
        Some(curr)
    }

    /// Arcs from left to right
    pub fn iter(&self) -> impl Iterator<Item = ArcId> + '_ {
        std::iter::successors(self.head, move |&id| self[id].next)
    }
}

impl Index<ArcId> for BeachLine {
    type Output = Arc;

    fn index(&self, id: ArcId) -> &Arc {
        &self.arcs[id.0]
    }
}

impl IndexMut<ArcId> for BeachLine {
    fn index_mut(&mut self, id: ArcId) -> &mut Arc {
        &mut self.arcs[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites_of(beach: &BeachLine) -> Vec<usize> {
        beach.iter().map(|id| beach[id].site).collect()
    }

    #[test]
    fn test_split_and_splice() {
        let mut beach = BeachLine::new();
        let a = beach.insert_first(0);
        let copy = beach.insert_after(a, 0);
        let b = beach.insert_after(a, 1);
        assert_eq!(sites_of(&beach), vec![0, 1, 0]);
        assert_eq!(beach.len(), 3);

        beach.remove(b);
        assert_eq!(sites_of(&beach), vec![0, 0]);
        assert!(!beach.is_alive(b));
        assert_eq!(beach[a].next, Some(copy));
        assert_eq!(beach[copy].prev, Some(a));

        beach.remove(a);
        assert_eq!(sites_of(&beach), vec![0]);
        assert_eq!(beach.iter().next(), Some(copy));
    }

    #[test]
    fn test_locate_walks_breakpoints() {
        let sites = vec![Position::new(0.0, 10.0), Position::new(10.0, 10.0)];
        let mut beach = BeachLine::new();
        let a = beach.insert_first(0);
        let b = beach.insert_after(a, 1);

        assert_eq!(beach.locate(&sites, 2.0, 0.0), Some(a));
        assert_eq!(beach.locate(&sites, 5.0, 0.0), Some(a));
        assert_eq!(beach.locate(&sites, 7.5, 0.0), Some(b));
        assert_eq!(BeachLine::new().locate(&sites, 0.0, 0.0), None);
    }
}
