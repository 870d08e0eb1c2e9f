//! Half-height block smoothing.
//!
//! A slab on a sloped path sits at a fractional world height. When the
//! template leaves the cell above or below it open, the slab type is
//! re-derived from that fraction so the surface follows the slope.

use pathforge_core::BlockState;

/// Re-derive the `type` of a half-height block from its world height.
///
/// - Open above: `bottom` when the fraction is below one half, else `double`.
/// - Open only below: `top` when the fraction is at least one half, else
///   `double`.
/// - Enclosed: unchanged.
pub fn smooth_slab(
    state: &BlockState,
    world_y: f64,
    above_open: bool,
    below_open: bool,
) -> BlockState {
    if !state.is_half_height() {
        return state.clone();
    }

    let fraction = world_y - world_y.floor();
    let slab_type = if above_open {
        if fraction < 0.5 {
            "bottom"
        } else {
            "double"
        }
    } else if below_open {
        if fraction >= 0.5 {
            "top"
        } else {
            "double"
        }
    } else {
        return state.clone();
    };

    if state.property("type") == Some(slab_type) {
        state.clone()
    } else {
        state.with_property("type", slab_type)
    }
}
