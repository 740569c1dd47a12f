//! Working arrays of the offset engine.
//!
//! Vertices and segments live in slotmap arenas and reference each other by
//! key, so splicing during collapse and corner repair never invalidates the
//! keys held elsewhere.

use slotmap::SlotMap;

use crate::geometry::Polyline;
use crate::math::polygon_3d::polygon_signed_area_3d;
use crate::math::{Point3, Tolerance, Vector3, TOLERANCE};

slotmap::new_key_type! {
    /// Stable key of an [`OffsetVertex`].
    pub struct VertexKey;
}

slotmap::new_key_type! {
    /// Stable key of an [`OffsetSegment`].
    pub struct SegmentKey;
}

/// Per-vertex working state.
#[derive(Debug, Clone)]
pub struct OffsetVertex {
    pub position: Point3,
    /// Unit translation direction.
    pub direction: Vector3,
    /// Distance travelled along `direction` per unit offset.
    pub speed: f64,
    pub prev: Option<SegmentKey>,
    pub next: Option<SegmentKey>,
    /// Direction and speed must be recomputed.
    pub dirty: bool,
}

impl OffsetVertex {
    /// Displacement per unit offset.
    #[must_use]
    pub fn velocity(&self) -> Vector3 {
        self.direction * self.speed
    }
}

/// Per-segment working state.
#[derive(Debug, Clone)]
pub struct OffsetSegment {
    pub start: VertexKey,
    pub end: VertexKey,
    /// Cached unit tangent. Kept while the segment is shorter than the
    /// distance tolerance, so zero-length caps keep their direction.
    pub tangent: Vector3,
    /// Unit direction the segment's line moves in per unit offset.
    pub orthogonal: Vector3,
    pub length: f64,
    /// Change of length per unit offset.
    pub rate: f64,
    /// `rate` must be recomputed.
    pub dirty: bool,
}

/// A polyline being offset to one side of its normal.
#[derive(Debug, Clone)]
pub struct OffsetChain {
    pub(super) vertices: SlotMap<VertexKey, OffsetVertex>,
    pub(super) segments: SlotMap<SegmentKey, OffsetSegment>,
    /// First vertex of an open chain (the one without an incoming segment),
    /// or any vertex of a closed one.
    pub(super) first: Option<VertexKey>,
    pub(super) closed: bool,
    pub(super) normal: Vector3,
    /// `1.0` moves along `tangent x normal`, `-1.0` against it.
    pub(super) side: f64,
    /// Offset magnitude applied so far.
    pub(super) reached: f64,
    /// Sign of the initial signed area of a closed chain.
    pub(super) area_sign: f64,
}

impl OffsetChain {
    /// Builds a chain from points lying in the plane of `normal`.
    ///
    /// Consecutive duplicate points are merged. Returns `None` when fewer
    /// than two distinct points remain (three for closed chains) or when a
    /// closed chain encloses no area.
    #[must_use]
    pub fn from_points(
        points: &[Point3],
        closed: bool,
        normal: Vector3,
        side: f64,
        reached: f64,
        tol: &Tolerance,
    ) -> Option<Self> {
        let cleaned = Polyline::new(points.to_vec(), closed).without_degenerate_segments(tol);
        let pts = cleaned.points;
        if pts.len() < 2 || (closed && pts.len() < 3) {
            return None;
        }
        let area_sign = if closed {
            let area = polygon_signed_area_3d(&pts, &normal);
            if area.abs() <= tol.distance_sq() {
                return None;
            }
            area.signum()
        } else {
            1.0
        };

        let mut chain = Self {
            vertices: SlotMap::with_key(),
            segments: SlotMap::with_key(),
            first: None,
            closed,
            normal,
            side,
            reached,
            area_sign,
        };
        let keys: Vec<VertexKey> = pts
            .iter()
            .map(|&position| {
                chain.vertices.insert(OffsetVertex {
                    position,
                    direction: Vector3::zeros(),
                    speed: 0.0,
                    prev: None,
                    next: None,
                    dirty: true,
                })
            })
            .collect();
        chain.first = keys.first().copied();

        let n = keys.len();
        let seg_count = if closed { n } else { n - 1 };
        for i in 0..seg_count {
            let (a, b) = (keys[i], keys[(i + 1) % n]);
            chain.connect(a, b, None);
        }
        Some(chain)
    }

    /// Inserts a segment from `a` to `b`. The tangent comes from the vertex
    /// positions unless `tangent` is given.
    pub(super) fn connect(&mut self, a: VertexKey, b: VertexKey, tangent: Option<Vector3>) -> SegmentKey {
        let pa = self.position(a);
        let pb = self.position(b);
        let length = (pb - pa).norm();
        let tangent = tangent
            .or_else(|| (pb - pa).try_normalize(TOLERANCE))
            .unwrap_or_else(Vector3::zeros);
        let orthogonal = self.orthogonal_of(&tangent);
        let key = self.segments.insert(OffsetSegment {
            start: a,
            end: b,
            tangent,
            orthogonal,
            length,
            rate: 0.0,
            dirty: true,
        });
        if let Some(v) = self.vertices.get_mut(a) {
            v.next = Some(key);
            v.dirty = true;
        }
        if let Some(v) = self.vertices.get_mut(b) {
            v.prev = Some(key);
            v.dirty = true;
        }
        key
    }

    /// Offset direction of a segment with the given tangent.
    pub(super) fn orthogonal_of(&self, tangent: &Vector3) -> Vector3 {
        tangent.cross(&self.normal) * self.side
    }

    pub(super) fn position(&self, key: VertexKey) -> Point3 {
        self.vertices.get(key).map_or_else(Point3::origin, |v| v.position)
    }

    /// Vertex keys in walking order.
    #[must_use]
    pub fn ordered_vertices(&self) -> Vec<VertexKey> {
        let Some(first) = self.first else {
            return Vec::new();
        };
        let mut order = vec![first];
        let mut current = first;
        while order.len() <= self.vertices.len() {
            let Some(seg) = self
                .vertices
                .get(current)
                .and_then(|v| v.next)
                .and_then(|s| self.segments.get(s))
            else {
                break;
            };
            if seg.end == first {
                break;
            }
            order.push(seg.end);
            current = seg.end;
        }
        order
    }

    /// Vertex positions in walking order.
    #[must_use]
    pub fn points(&self) -> Vec<Point3> {
        self.ordered_vertices()
            .into_iter()
            .map(|k| self.position(k))
            .collect()
    }

    /// Signed area about the chain normal (zero for open chains).
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        if self.closed {
            polygon_signed_area_3d(&self.points(), &self.normal)
        } else {
            0.0
        }
    }

    /// Returns `true` when nothing offsettable is left: an open chain without
    /// segments, or a closed chain with fewer than three vertices or whose
    /// area vanished or flipped.
    #[must_use]
    pub fn is_collapsed(&self, tol: &Tolerance) -> bool {
        if self.closed {
            self.vertices.len() < 3 || self.signed_area() * self.area_sign <= tol.distance_sq()
        } else {
            self.segments.is_empty()
        }
    }

    /// Converts the chain back into a polyline.
    #[must_use]
    pub fn to_polyline(&self, clean: bool, tol: &Tolerance) -> Polyline {
        let polyline = Polyline::new(self.points(), self.closed).without_degenerate_segments(tol);
        if clean {
            polyline.without_collinear_vertices(tol)
        } else {
            polyline
        }
    }

    /// Recomputes every dirty vertex motion, then every dirty segment rate.
    pub(super) fn recompute_dirty(&mut self) {
        let dirty: Vec<VertexKey> = self
            .vertices
            .iter()
            .filter(|(_, v)| v.dirty)
            .map(|(k, _)| k)
            .collect();
        for key in dirty {
            let (direction, speed) = self.vertex_motion(key);
            if let Some(v) = self.vertices.get_mut(key) {
                v.direction = direction;
                v.speed = speed;
                v.dirty = false;
                for s in [v.prev, v.next].into_iter().flatten() {
                    if let Some(seg) = self.segments.get_mut(s) {
                        seg.dirty = true;
                    }
                }
            }
        }

        let vertices = &self.vertices;
        for seg in self.segments.values_mut().filter(|s| s.dirty) {
            let (Some(a), Some(b)) = (vertices.get(seg.start), vertices.get(seg.end)) else {
                continue;
            };
            seg.length = (b.position - a.position).norm();
            seg.rate = (b.velocity() - a.velocity()).dot(&seg.tangent);
            seg.dirty = false;
        }
    }

    /// Miter motion of a vertex: the bisector of the adjacent orthogonals,
    /// scaled so both adjacent lines advance by one unit per unit offset.
    /// Open endpoints follow their single segment.
    fn vertex_motion(&self, key: VertexKey) -> (Vector3, f64) {
        let Some(v) = self.vertices.get(key) else {
            return (Vector3::zeros(), 0.0);
        };
        let o_in = v.prev.and_then(|s| self.segments.get(s)).map(|s| s.orthogonal);
        let o_out = v.next.and_then(|s| self.segments.get(s)).map(|s| s.orthogonal);
        match (o_in, o_out) {
            (Some(a), Some(b)) => match (a + b).try_normalize(TOLERANCE) {
                Some(dir) => {
                    let cos = dir.dot(&a);
                    if cos > TOLERANCE {
                        (dir, 1.0 / cos)
                    } else {
                        (a, 1.0)
                    }
                }
                // Anti-parallel neighbours left unrepaired follow the incoming line.
                None => (a, 1.0),
            },
            (Some(a), None) | (None, Some(a)) => (a, 1.0),
            (None, None) => (Vector3::zeros(), 0.0),
        }
    }

    /// Moves every vertex by `step` units of offset.
    pub(super) fn translate(&mut self, step: f64) {
        for v in self.vertices.values_mut() {
            v.position += v.velocity() * step;
        }
        let vertices = &self.vertices;
        for seg in self.segments.values_mut() {
            if let (Some(a), Some(b)) = (vertices.get(seg.start), vertices.get(seg.end)) {
                seg.length = (b.position - a.position).norm();
            }
        }
        self.reached += step;
    }

    /// Re-derives the geometry of the segments touching `key` after its
    /// position or connectivity changed, and flags everything downstream.
    pub(super) fn refresh_around(&mut self, key: VertexKey, tol: &Tolerance) {
        let Some(v) = self.vertices.get(key) else {
            return;
        };
        for s in [v.prev, v.next].into_iter().flatten() {
            self.refresh_segment(s, tol);
        }
    }

    fn refresh_segment(&mut self, key: SegmentKey, tol: &Tolerance) {
        let Some(seg) = self.segments.get(key) else {
            return;
        };
        let (start, end) = (seg.start, seg.end);
        let d = self.position(end) - self.position(start);
        let length = d.norm();
        let tangent = if length > tol.distance {
            d / length
        } else {
            seg.tangent
        };
        let orthogonal = self.orthogonal_of(&tangent);
        if let Some(seg) = self.segments.get_mut(key) {
            seg.length = length;
            seg.tangent = tangent;
            seg.orthogonal = orthogonal;
            seg.dirty = true;
        }
        for k in [start, end] {
            if let Some(v) = self.vertices.get_mut(k) {
                v.dirty = true;
            }
        }
    }

    /// Collapses a segment, merging its end vertex into its start vertex at
    /// their midpoint.
    pub(super) fn merge_segment(&mut self, key: SegmentKey, tol: &Tolerance) {
        let Some(seg) = self.segments.get(key) else {
            return;
        };
        let (u, v) = (seg.start, seg.end);
        if u == v {
            return;
        }
        self.segments.remove(key);
        let Some(removed) = self.vertices.remove(v) else {
            return;
        };
        let mid = nalgebra::center(&self.position(u), &removed.position);
        if let Some(next) = removed.next.and_then(|s| self.segments.get_mut(s)) {
            next.start = u;
        }
        if let Some(vertex) = self.vertices.get_mut(u) {
            vertex.position = mid;
            vertex.next = removed.next;
            vertex.dirty = true;
        }
        if self.first == Some(v) {
            self.first = Some(u);
        }
        self.refresh_around(u, tol);
    }

    /// Closes an open chain whose two ends have met.
    ///
    /// The last vertex is merged into the first; returns `true` if the chain
    /// was closed.
    pub(super) fn close_if_converged(&mut self, tol: &Tolerance) -> bool {
        if self.closed || self.vertices.len() < 4 {
            return false;
        }
        let order = self.ordered_vertices();
        let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
            return false;
        };
        if !tol.same_point(&self.position(first), &self.position(last)) {
            return false;
        }
        let Some(removed) = self.vertices.remove(last) else {
            return false;
        };
        if let Some(seg) = removed.prev.and_then(|s| self.segments.get_mut(s)) {
            seg.end = first;
        }
        if let Some(vertex) = self.vertices.get_mut(first) {
            vertex.prev = removed.prev;
            vertex.dirty = true;
        }
        self.closed = true;
        let area = self.signed_area();
        self.area_sign = if area == 0.0 { 1.0 } else { area.signum() };
        self.refresh_around(first, tol);
        true
    }

    /// Splits the chain where `vertex` has struck the non-adjacent
    /// `segment`.
    ///
    /// For a closed chain the two loops are `vertex ..= segment.start` and
    /// `vertex, segment.end .. vertex.prev`; for an open chain one closed loop
    /// is cut off and the open remainder keeps both original ends (it is
    /// returned first). Degenerate pieces are dropped.
    #[must_use]
    pub fn split_at(&self, vertex: VertexKey, segment: SegmentKey, tol: &Tolerance) -> Vec<Self> {
        let order = self.ordered_vertices();
        let Some(seg) = self.segments.get(segment) else {
            return Vec::new();
        };
        let (Some(i), Some(j)) = (
            order.iter().position(|&k| k == vertex),
            order.iter().position(|&k| k == seg.start),
        ) else {
            return Vec::new();
        };
        let pts: Vec<Point3> = order.iter().map(|&k| self.position(k)).collect();
        let n = pts.len();

        let pieces: Vec<(Vec<Point3>, bool)> = if self.closed {
            let a: Vec<Point3> = (0..n)
                .map(|s| (i + s) % n)
                .take_while(|&idx| idx != (j + 1) % n)
                .map(|idx| pts[idx])
                .collect();
            let mut b = vec![pts[i]];
            b.extend((1..n).map(|s| (j + s) % n).take_while(|&idx| idx != i).map(|idx| pts[idx]));
            vec![(a, true), (b, true)]
        } else if j > i {
            let open: Vec<Point3> = pts[..=i].iter().chain(&pts[j + 1..]).copied().collect();
            vec![(open, false), (pts[i..=j].to_vec(), true)]
        } else {
            let open: Vec<Point3> = pts[..=j].iter().chain(&pts[i..]).copied().collect();
            vec![(open, false), (pts[j + 1..=i].to_vec(), true)]
        };

        pieces
            .into_iter()
            .filter_map(|(points, closed)| {
                Self::from_points(&points, closed, self.normal, self.side, self.reached, tol)
            })
            .collect()
    }
}
