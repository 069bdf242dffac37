//! Unit conversion between host measurement units and centimeters.
//!
//! The host reports indents in points and tab-stop positions in EMU. The
//! two conversions use different rounding grids: indents round to two
//! decimals, tab positions snap to the nearest 0.05 cm. Both grids are
//! kept as-is so exported data stays comparable across runs.

/// Points per centimeter when reading indents from the host.
pub const POINTS_PER_CM: f64 = 28.35;

/// Points per centimeter when writing indents back to the host.
pub const POINTS_PER_CM_WRITE: f64 = 28.346;

/// EMU per centimeter used for tab-stop positions.
pub const EMU_PER_CM: f64 = 360_680.0;

/// Centimeters per point used by the match finder.
pub const CM_PER_POINT: f64 = 0.035_277_8;

/// Round to the nearest 0.05.
pub fn round_to_grid(value: f64) -> f64 {
    (value * 20.0).round() / 20.0
}

/// Round to a fixed number of decimals.
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Convert a host indent (points) to centimeters, two decimals.
pub fn points_to_cm(points: f64) -> f64 {
    round_decimals(points / POINTS_PER_CM, 2)
}

/// Convert centimeters to host points for an indent assignment.
pub fn cm_to_points(cm: f64) -> f64 {
    cm * POINTS_PER_CM_WRITE
}

/// Convert a tab-stop position (EMU) to centimeters on the 0.05 grid.
pub fn emu_to_cm(emu: f64) -> f64 {
    round_to_grid(emu / EMU_PER_CM)
}

/// Convert points to centimeters with the finer factor, two decimals.
pub fn points_to_cm_precise(points: f64) -> f64 {
    round_decimals(points * CM_PER_POINT, 2)
}
