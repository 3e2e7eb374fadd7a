//! Fortune's sweep-line construction.
//!
//! The sweep runs from high `y` to low `y`. Each breakpoint between two
//! neighboring arcs traces out part of a Voronoi edge. A breakpoint is
//! recorded as a [`Trace`] with an optional start and end vertex, and traces
//! are turned into [`RawEdge`]s when the queue runs dry.

mod beach;
mod event;

use beach::{ArcId, BeachLine};
use event::{EventId, EventKind, EventQueue};

use crate::edge::{EdgeGeometry, RawEdge};
use crate::predicates::{circumcircle, orientation, SWEEP_EPSILON};
use crate::site::{partition_duplicates, Direction};
use crate::voronoi::{Construction, ConstructionBackend};
use crate::{Position, Result};

pub(crate) type TraceId = usize;

/// Path of one breakpoint, `left` being the site whose arc lies to its left
#[derive(Debug, Clone)]
struct Trace {
    left: usize,
    right: usize,
    /// `None` when the breakpoint has existed since the sweep began
    start: Option<Position>,
    end: Option<Position>,
    /// The opposite breakpoint born from the same site event
    twin: Option<TraceId>,
}

/// What a sweep produces
#[derive(Debug, Clone, Default)]
pub struct SweepOutput {
    pub vertices: Vec<Position>,
    pub edges: Vec<RawEdge>,
    /// Sites skipped as copies of an earlier site
    pub duplicates: Vec<usize>,
    /// Circle events that went stale before firing
    pub invalidated_events: usize,
}

pub struct FortuneSweep<'a> {
    sites: &'a [Position],
    beach: BeachLine,
    queue: EventQueue,
    traces: Vec<Trace>,
    vertices: Vec<Position>,
    sweep_y: f64,
}

impl<'a> FortuneSweep<'a> {
    /// Run the sweep over `sites`. Duplicated and near-duplicate positions
    /// are ignored after their first occurrence.
    pub fn run(sites: &'a [Position]) -> SweepOutput {
        let (distinct, duplicates) = partition_duplicates(sites);

        let mut sweep = FortuneSweep {
            sites,
            beach: BeachLine::new(),
            queue: EventQueue::new(),
            traces: Vec::new(),
            vertices: Vec::new(),
            sweep_y: f64::INFINITY,
        };
        for &i in &distinct {
            sweep.queue.push_site(i, &sites[i]);
        }

        while let Some(event) = sweep.queue.pop() {
            sweep.sweep_y = event.y;
            match event.kind {
                EventKind::Site(i) => sweep.handle_site(i),
                EventKind::Circle(id) => sweep.handle_circle(id),
            }
        }

        let invalidated_events = sweep.queue.invalidated();
        log::debug!(
            "sweep over {} sites: {} vertices, {} circle events ({} stale), {} arcs left",
            distinct.len(),
            sweep.vertices.len(),
            sweep.queue.scheduled(),
            invalidated_events,
            sweep.beach.len(),
        );
        if log::log_enabled!(log::Level::Trace) {
            let remaining: Vec<usize> = sweep.beach.iter().map(|id| sweep.beach[id].site).collect();
            log::trace!("final beach line sites, left to right: {:?}", remaining);
        }

        let edges = sweep.finish_edges();
        SweepOutput {
            vertices: sweep.vertices,
            edges,
            duplicates,
            invalidated_events,
        }
    }

    fn push_trace(&mut self, left: usize, right: usize, start: Option<Position>) -> TraceId {
        self.traces.push(Trace {
            left,
            right,
            start,
            end: None,
            twin: None,
        });
        self.traces.len() - 1
    }

    fn invalidate(&mut self, arc: ArcId) {
        if let Some(id) = self.beach[arc].event.take() {
            self.queue.invalidate(id);
        }
    }

    fn handle_site(&mut self, site: usize) {
        let pos = self.sites[site];
        log::trace!("site event {} at ({}, {})", site, pos.x, pos.y);
        let Some(arc) = self.beach.locate(self.sites, pos.x, self.sweep_y) else {
            self.beach.insert_first(site);
            return;
        };
        self.invalidate(arc);

        let arc_site = self.beach[arc].site;
        if (self.sites[arc_site].y - pos.y).abs() < SWEEP_EPSILON {
            // Both sites sit on the sweep line: the new arc goes beside the
            // old one and their shared edge is a vertical line from infinity.
            let trace = self.push_trace(arc_site, site, None);
            let added = self.beach.insert_after(arc, site);
            self.beach[added].left_trace = Some(trace);
            self.beach[added].right_trace = self.beach[arc].right_trace;
            self.beach[arc].right_trace = Some(trace);
            self.check_circle(arc);
            self.check_circle(added);
            return;
        }

        // Split: arc, new, copy-of-arc
        let left = self.push_trace(arc_site, site, None);
        let right = self.push_trace(site, arc_site, None);
        self.traces[left].twin = Some(right);
        self.traces[right].twin = Some(left);

        let copy = self.beach.insert_after(arc, arc_site);
        let added = self.beach.insert_after(arc, site);

        self.beach[copy].left_trace = Some(right);
        self.beach[copy].right_trace = self.beach[arc].right_trace;
        self.beach[added].left_trace = Some(left);
        self.beach[added].right_trace = Some(right);
        self.beach[arc].right_trace = Some(left);

        self.check_circle(arc);
        self.check_circle(copy);
    }

    fn handle_circle(&mut self, id: EventId) {
        let event = self.queue.circle(id);
        if !event.valid || !self.beach.is_alive(event.arc) {
            return;
        }
        let (arc, vertex) = (event.arc, event.center);
        log::trace!("circle event at y={}: vertex ({}, {})", self.sweep_y, vertex.x, vertex.y);
        let (Some(prev), Some(next)) = (self.beach[arc].prev, self.beach[arc].next) else {
            return;
        };
        self.beach[arc].event = None;

        self.vertices.push(vertex);
        for trace in [self.beach[arc].left_trace, self.beach[arc].right_trace]
            .into_iter()
            .flatten()
        {
            self.traces[trace].end = Some(vertex);
        }

        let trace = self.push_trace(self.beach[prev].site, self.beach[next].site, Some(vertex));
        self.beach[prev].right_trace = Some(trace);
        self.beach[next].left_trace = Some(trace);
        self.beach.remove(arc);

        self.check_circle(prev);
        self.check_circle(next);
    }

    /// Schedule the collapse of `arc` if its neighbors converge on it.
    fn check_circle(&mut self, arc: ArcId) {
        self.invalidate(arc);
        let (Some(prev), Some(next)) = (self.beach[arc].prev, self.beach[arc].next) else {
            return;
        };
        let (ia, ib, ic) = (
            self.beach[prev].site,
            self.beach[arc].site,
            self.beach[next].site,
        );
        if ia == ic {
            return;
        }

        let (a, b, c) = (&self.sites[ia], &self.sites[ib], &self.sites[ic]);
        // Breakpoints only meet when the triple turns clockwise
        if orientation(a, b, c) >= 0.0 {
            return;
        }
        let Some(circle) = circumcircle(a, b, c) else {
            return;
        };
        let y = circle.lowest_y();
        if y > self.sweep_y + SWEEP_EPSILON {
            return;
        }

        let id = self.queue.schedule(arc, circle.center, y);
        self.beach[arc].event = Some(id);
    }

    /// Direction a breakpoint moves in as the sweep descends.
    fn travel(&self, trace: &Trace) -> Option<Direction> {
        let (p, q) = (&self.sites[trace.left], &self.sites[trace.right]);
        Direction::new(q.y - p.y, p.x - q.x)
    }

    fn finish_edges(&self) -> Vec<RawEdge> {
        let mut edges = Vec::with_capacity(self.traces.len());
        for (id, trace) in self.traces.iter().enumerate() {
            let Some(dir) = self.travel(trace) else {
                continue;
            };
            let geometry = match trace.twin {
                // Each pair is emitted once, from its first half
                Some(twin) if twin < id => continue,
                Some(twin) => {
                    let other = &self.traces[twin];
                    match (trace.end, other.end) {
                        (Some(a), Some(b)) => EdgeGeometry::Segment(a, b),
                        (Some(a), None) => EdgeGeometry::Ray {
                            origin: a,
                            direction: dir.reversed(),
                        },
                        (None, Some(b)) => EdgeGeometry::Ray {
                            origin: b,
                            direction: dir,
                        },
                        (None, None) => EdgeGeometry::Line {
                            through: self.sites[trace.left].midpoint(&self.sites[trace.right]),
                            direction: dir,
                        },
                    }
                }
                None => match (trace.start, trace.end) {
                    (Some(a), Some(b)) => EdgeGeometry::Segment(a, b),
                    (Some(a), None) => EdgeGeometry::Ray {
                        origin: a,
                        direction: dir,
                    },
                    (None, Some(b)) => EdgeGeometry::Ray {
                        origin: b,
                        direction: dir.reversed(),
                    },
                    (None, None) => EdgeGeometry::Line {
                        through: self.sites[trace.left].midpoint(&self.sites[trace.right]),
                        direction: dir,
                    },
                },
            };
            if let EdgeGeometry::Segment(a, b) = geometry {
                if a == b {
                    continue;
                }
            }
            edges.push(RawEdge::new(trace.left, trace.right, geometry));
        }
        edges
    }
}

/// Fortune's sweep straight to Voronoi edges
pub struct SweepBackend;

impl SweepBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SweepBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionBackend for SweepBackend {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn construct(&mut self, sites: &[Position]) -> Result<Construction> {
        let output = FortuneSweep::run(sites);
        Ok(Construction {
            triangles: Vec::new(),
            vertices: output.vertices,
            edges: output.edges,
            duplicates: output.duplicates,
            degeneracy: None,
        })
    }
}
