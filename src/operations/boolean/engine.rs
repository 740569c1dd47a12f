use crate::error::{OperationError, Result};
use crate::geometry::Polyline;
use crate::math::Tolerance;

use super::line::{
    line_difference, line_intersection, line_union, lines_difference, lines_intersection,
    lines_union,
};
use super::multi::{regions_difference, regions_intersection, regions_union};
use super::operands::{BooleanOutput, Operands};
use super::region::{region_difference, region_intersection, region_union, RegionOutput};
use super::select::BooleanOp;

/// Executes a Boolean operation on any supported operand kind.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] when a region operand is not a
/// closed polyline.
pub fn boolean_execute(operands: &Operands, op: BooleanOp, tol: &Tolerance) -> Result<BooleanOutput> {
    let output = match operands {
        Operands::Lines(a, b) => BooleanOutput::Lines(match op {
            BooleanOp::Union => line_union(a, b, tol),
            BooleanOp::Intersection => line_intersection(a, b, tol),
            BooleanOp::Difference => line_difference(a, b, tol),
        }),
        Operands::LineSet(a, set) => BooleanOutput::Lines(match op {
            BooleanOp::Union => lines_union(a, set, tol),
            BooleanOp::Intersection => lines_intersection(a, set, tol),
            BooleanOp::Difference => lines_difference(a, set, tol),
        }),
        Operands::Regions(a, b) => {
            require_closed([a, b])?;
            BooleanOutput::Regions(match op {
                BooleanOp::Union => region_union(a, b, tol),
                BooleanOp::Intersection => region_intersection(a, b, tol),
                BooleanOp::Difference => region_difference(a, b, tol),
            })
        }
        Operands::RegionSet(set) => {
            require_closed(set)?;
            BooleanOutput::Regions(match (op, set.split_first()) {
                (_, None) => RegionOutput::combined(Vec::new()),
                (BooleanOp::Union, _) => regions_union(set, tol),
                (BooleanOp::Intersection, _) => regions_intersection(set, tol),
                (BooleanOp::Difference, Some((subject, cutters))) => {
                    regions_difference(subject, cutters, tol)
                }
            })
        }
    };
    Ok(output)
}

fn require_closed<'a>(regions: impl IntoIterator<Item = &'a Polyline>) -> Result<()> {
    if regions.into_iter().any(|r| !r.closed) {
        return Err(OperationError::InvalidInput("region operands must be closed".into()).into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::{Difference, Intersection, Union};
    use super::*;
    use crate::error::KernelError;
    use crate::geometry::Segment;
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn rect(x0: f64, x1: f64) -> Polyline {
        Polyline::closed(vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x1, 0.0, 0.0),
            Point3::new(x1, 1.0, 0.0),
            Point3::new(x0, 1.0, 0.0),
        ])
    }

    fn area(out: &BooleanOutput) -> f64 {
        out.regions()
            .unwrap()
            .regions
            .iter()
            .map(|r| r.signed_area(&Vector3::z()))
            .sum()
    }

    #[test]
    fn operation_structs_dispatch_on_operands() {
        let tol = Tolerance::default();
        let pair = Operands::Regions(rect(0.0, 1.0), rect(0.5, 1.5));
        assert_relative_eq!(area(&Union::new(pair.clone()).execute(&tol).unwrap()), 1.5, epsilon = 1e-9);
        assert_relative_eq!(
            area(&Intersection::new(pair.clone()).execute(&tol).unwrap()),
            0.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(area(&Difference::new(pair).execute(&tol).unwrap()), 0.5, epsilon = 1e-9);

        let set = Operands::RegionSet(vec![rect(0.0, 3.0), rect(1.0, 2.0)]);
        assert_relative_eq!(area(&Difference::new(set).execute(&tol).unwrap()), 2.0, epsilon = 1e-9);

        let a = Segment::new(Point3::origin(), Point3::new(2.0, 0.0, 0.0));
        let b = Segment::new(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0));
        let lines = Union::new(Operands::Lines(a, b)).execute(&tol).unwrap();
        assert_eq!(lines.lines().unwrap().len(), 1);
    }

    #[test]
    fn open_region_operand_is_rejected() {
        let open = Polyline::open(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let err = Union::new(Operands::Regions(open, rect(0.0, 1.0)))
            .execute(&Tolerance::default())
            .unwrap_err();
        assert!(matches!(err, KernelError::Operation(OperationError::InvalidInput(_))));
    }
}
