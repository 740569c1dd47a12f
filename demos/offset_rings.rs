//! Offset rings demo: shrinks a notched rectangle through several levels,
//! then reconstructs regions from the resulting outlines.
//!
//! Usage:
//! ```text
//! cargo run --example offset_rings
//! RUST_LOG=planar_geom=debug cargo run --example offset_rings
//! ```

use planar_geom::geometry::{Polyline, Segment};
use planar_geom::math::Point3;
use planar_geom::operations::offset::MultiOffset;
use planar_geom::operations::reconstruct::ReconstructOutlines;
use planar_geom::Result;
use tracing::info;

fn notched_rectangle() -> Polyline {
    let p = |x: f64, y: f64| Point3::new(x, y, 0.0);
    Polyline::closed(vec![
        p(0.0, 0.0),
        p(10.0, 0.0),
        p(10.0, 4.0),
        p(6.0, 4.0),
        p(5.0, 1.0),
        p(4.0, 4.0),
        p(0.0, 4.0),
    ])
}

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for the kernel.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("offset_rings=info".parse().unwrap_or_default())
        .add_directive("planar_geom=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let source = notched_rectangle();
    let output = MultiOffset::new(source.clone(), vec![0.5, -0.2, -0.4, -0.6]).execute()?;
    for level in &output.levels {
        let areas: Vec<f64> = level.polylines.iter().map(Polyline::area).collect();
        info!(offset = level.offset, loops = level.polylines.len(), ?areas, "offset level");
    }
    for warning in &output.warnings {
        info!(?warning, "offset warning");
    }

    // Outer ring and inner rings together: the ring becomes a region with holes.
    let segments: Vec<Segment> = output
        .levels
        .iter()
        .filter(|l| l.offset > 0.0 || (l.offset + 0.6).abs() < 1e-9)
        .flat_map(|l| l.polylines.iter().flat_map(Polyline::segments))
        .collect();
    let rebuilt = ReconstructOutlines::new(segments).execute()?;
    for (i, region) in rebuilt.regions.iter().enumerate() {
        info!(
            region = i,
            vertices = region.boundary.vertex_count(),
            area = region.boundary.area(),
            holes = region.holes.len(),
            "reconstructed region"
        );
    }
    Ok(())
}
