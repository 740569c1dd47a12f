use crate::math::polygon_2d::PointClassification;

/// Which operand an arc was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSource {
    A,
    B,
}

/// The type of boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
}

/// Decision about whether to keep an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    Keep,
    KeepFlipped,
    Discard,
}

/// Determines whether a boundary arc should be kept based on its
/// classification relative to the other region and the boolean operation.
///
/// | Arc    | vs other region | Union   | Difference(A-B) | Intersection |
/// |--------|-----------------|---------|-----------------|--------------|
/// | from A | OUTSIDE B       | keep    | keep            | discard      |
/// | from A | INSIDE B        | discard | discard         | keep         |
/// | from B | OUTSIDE A       | keep    | discard         | discard      |
/// | from B | INSIDE A        | discard | keep (flip)     | keep         |
///
/// Arcs on the shared boundary are taken from A only. `same_direction`
/// tells whether both regions run along the shared stretch the same way:
/// overlapping interiors keep it for union and intersection, touching
/// interiors keep it for difference.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn should_keep_arc(
    source: ArcSource,
    classification: PointClassification,
    same_direction: bool,
    op: BooleanOp,
) -> KeepDecision {
    match (source, classification, op) {
        (ArcSource::A, PointClassification::Outside, BooleanOp::Union) => KeepDecision::Keep,
        (ArcSource::A, PointClassification::Outside, BooleanOp::Difference) => KeepDecision::Keep,
        (ArcSource::A, PointClassification::Outside, BooleanOp::Intersection) => {
            KeepDecision::Discard
        }

        (ArcSource::A, PointClassification::Inside, BooleanOp::Union) => KeepDecision::Discard,
        (ArcSource::A, PointClassification::Inside, BooleanOp::Difference) => {
            KeepDecision::Discard
        }
        (ArcSource::A, PointClassification::Inside, BooleanOp::Intersection) => KeepDecision::Keep,

        (ArcSource::B, PointClassification::Outside, BooleanOp::Union) => KeepDecision::Keep,
        (ArcSource::B, PointClassification::Outside, BooleanOp::Difference) => {
            KeepDecision::Discard
        }
        (ArcSource::B, PointClassification::Outside, BooleanOp::Intersection) => {
            KeepDecision::Discard
        }

        (ArcSource::B, PointClassification::Inside, BooleanOp::Union) => KeepDecision::Discard,
        (ArcSource::B, PointClassification::Inside, BooleanOp::Difference) => {
            KeepDecision::KeepFlipped
        }
        (ArcSource::B, PointClassification::Inside, BooleanOp::Intersection) => KeepDecision::Keep,

        (ArcSource::A, PointClassification::OnBoundary, BooleanOp::Union | BooleanOp::Intersection) => {
            if same_direction {
                KeepDecision::Keep
            } else {
                KeepDecision::Discard
            }
        }
        (ArcSource::A, PointClassification::OnBoundary, BooleanOp::Difference) => {
            if same_direction {
                KeepDecision::Discard
            } else {
                KeepDecision::Keep
            }
        }
        (ArcSource::B, PointClassification::OnBoundary, _) => KeepDecision::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_outside_arcs() {
        for source in [ArcSource::A, ArcSource::B] {
            assert_eq!(
                should_keep_arc(source, PointClassification::Outside, true, BooleanOp::Union),
                KeepDecision::Keep
            );
            assert_eq!(
                should_keep_arc(source, PointClassification::Inside, true, BooleanOp::Union),
                KeepDecision::Discard
            );
        }
    }

    #[test]
    fn difference_flips_b_inside() {
        assert_eq!(
            should_keep_arc(
                ArcSource::B,
                PointClassification::Inside,
                true,
                BooleanOp::Difference
            ),
            KeepDecision::KeepFlipped
        );
        assert_eq!(
            should_keep_arc(
                ArcSource::B,
                PointClassification::Outside,
                true,
                BooleanOp::Difference
            ),
            KeepDecision::Discard
        );
    }

    #[test]
    fn intersection_keeps_inside_arcs() {
        for source in [ArcSource::A, ArcSource::B] {
            assert_eq!(
                should_keep_arc(
                    source,
                    PointClassification::Inside,
                    true,
                    BooleanOp::Intersection
                ),
                KeepDecision::Keep
            );
        }
    }

    #[test]
    fn shared_boundary_depends_on_direction() {
        let on = PointClassification::OnBoundary;
        assert_eq!(
            should_keep_arc(ArcSource::A, on, true, BooleanOp::Union),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_arc(ArcSource::A, on, false, BooleanOp::Union),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_arc(ArcSource::A, on, true, BooleanOp::Difference),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_arc(ArcSource::A, on, false, BooleanOp::Difference),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_arc(ArcSource::B, on, true, BooleanOp::Intersection),
            KeepDecision::Discard
        );
    }
}
