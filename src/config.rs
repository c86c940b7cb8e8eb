use crate::geom::Scalar;

/// Convergence tolerance on the path length in the Newton iteration.
pub const NEWTON_TOLERANCE: Scalar = 1e-3;
/// Guard against infinite loops in the Newton iteration.
pub const NEWTON_MAX_TRIES: usize = 100;
/// Offset between the first two Newton seeds, forces at least one step.
pub const NEWTON_SEED_OFFSET: Scalar = 0.1;
/// Floor for the radial check on cylinder masks. The Newton iteration stops on
/// the path length, so the point is only on the cylinder up to this distance.
pub const RADIAL_TOLERANCE: Scalar = 1e-4;
/// Curvatures smaller than this are treated as straight lines.
pub const CURVATURE_THRESHOLD: Scalar = 1e-15;
/// One tesla in GeV / (e mm), the field unit of the helix.
pub const TESLA: Scalar = 0.000299792458;
