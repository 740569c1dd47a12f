use crate::geometry::{Polyline, Segment};

use super::region::RegionOutput;

/// Inputs accepted by the Boolean operation structs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    /// Two open lines.
    Lines(Segment, Segment),
    /// A line against a set of lines.
    LineSet(Segment, Vec<Segment>),
    /// Two closed regions.
    Regions(Polyline, Polyline),
    /// A set of closed regions reduced pairwise. For a difference the first
    /// region is the subject and the rest are cutters.
    RegionSet(Vec<Polyline>),
}

/// Result of a Boolean operation, matching the kind of its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanOutput {
    Lines(Vec<Segment>),
    Regions(RegionOutput),
}

impl BooleanOutput {
    /// Returns the segments of a line result.
    #[must_use]
    pub fn lines(&self) -> Option<&[Segment]> {
        match self {
            Self::Lines(lines) => Some(lines),
            Self::Regions(_) => None,
        }
    }

    /// Returns the region result.
    #[must_use]
    pub fn regions(&self) -> Option<&RegionOutput> {
        match self {
            Self::Lines(_) => None,
            Self::Regions(out) => Some(out),
        }
    }
}
