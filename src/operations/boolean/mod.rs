mod difference;
mod engine;
mod intersection;
mod join;
mod line;
mod multi;
mod operands;
mod region;
mod select;
mod split;
mod union;

pub use difference::Difference;
pub use intersection::Intersection;
pub use join::join;
pub use line::{
    line_difference, line_intersection, line_union, lines_difference, lines_intersection,
    lines_union, union_all_lines,
};
pub use multi::{regions_difference, regions_intersection, regions_union};
pub use operands::{BooleanOutput, Operands};
pub use region::{region_difference, region_intersection, region_union, RegionOutput};
pub use select::{ArcSource, BooleanOp, KeepDecision};
pub use split::split;
pub use union::Union;
