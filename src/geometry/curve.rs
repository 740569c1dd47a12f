use crate::math::{Point3, Tolerance};

use super::polyline::Polyline;
use super::segment::Segment;

/// The finite set of curve kinds the kernel operates on.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// A single straight segment.
    Line(Segment),
    /// A straight-segment polyline, open or closed.
    Polyline(Polyline),
}

impl Curve {
    /// Start point of the curve.
    #[must_use]
    pub fn start(&self) -> Option<Point3> {
        match self {
            Self::Line(seg) => Some(seg.start),
            Self::Polyline(pl) => pl.start().copied(),
        }
    }

    /// End point of the curve.
    #[must_use]
    pub fn end(&self) -> Option<Point3> {
        match self {
            Self::Line(seg) => Some(seg.end),
            Self::Polyline(pl) => pl.end().copied(),
        }
    }

    /// Curve length.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Line(seg) => seg.length(),
            Self::Polyline(pl) => pl.length(),
        }
    }

    /// Splits the curve at every point of `cuts` lying on it.
    ///
    /// Lines split into sub-lines ordered from start to end; polylines follow
    /// [`Polyline::split_at_points`]. Pieces no longer than the distance
    /// tolerance are dropped.
    #[must_use]
    pub fn split_at_points(&self, cuts: &[Point3], tol: &Tolerance) -> Vec<Curve> {
        match self {
            Self::Line(seg) => split_segment(seg, cuts, tol)
                .into_iter()
                .map(Self::Line)
                .collect(),
            Self::Polyline(pl) => pl
                .split_at_points(cuts, tol)
                .into_iter()
                .map(Self::Polyline)
                .collect(),
        }
    }

    /// Converts the curve into a polyline.
    #[must_use]
    pub fn into_polyline(self) -> Polyline {
        match self {
            Self::Line(seg) => Polyline::open(vec![seg.start, seg.end]),
            Self::Polyline(pl) => pl,
        }
    }
}

fn split_segment(seg: &Segment, cuts: &[Point3], tol: &Tolerance) -> Vec<Segment> {
    let Some(dir) = seg.direction() else {
        return Vec::new();
    };
    let len = seg.length();
    let mut params: Vec<f64> = cuts
        .iter()
        .filter(|c| seg.distance_to(c) <= tol.distance)
        .map(|c| (c - seg.start).dot(&dir))
        .filter(|&d| d > tol.distance && d < len - tol.distance)
        .collect();
    params.sort_by(f64::total_cmp);
    params.dedup_by(|a, b| (*a - *b).abs() <= tol.distance);

    let mut pieces = Vec::with_capacity(params.len() + 1);
    let mut prev = seg.start;
    for d in params {
        let p = seg.start + dir * d;
        pieces.push(Segment::new(prev, p));
        prev = p;
    }
    pieces.push(Segment::new(prev, seg.end));
    pieces
}
