//! Morton (Z-order) codes for spatial sorting.
//!
//! Leaves are laid out in Morton order so that adjacent leaf slots are
//! usually close in space; the shared-radius seeding pass depends on that
//! locality for tight initial bounds.

use crate::point::{Aabb, Point};

/// Quantisation resolution per axis, chosen so the interleaved code fits in
/// the low 63 bits of a `u64` for any dimension.
const fn bits_per_axis(dimension: usize) -> u32 {
    (63 / dimension) as u32
}

/// Computes the Morton code of `point` relative to `bounds`.
///
/// Degenerate axes (zero extent) quantise to the middle cell so coincident
/// coordinates do not perturb the ordering of the remaining axes.
pub(crate) fn morton_code<const D: usize>(point: &Point<D>, bounds: &Aabb<D>) -> u64 {
    let bits = bits_per_axis(D);
    let cells = 1u64 << bits;

    let mut code = 0u64;
    for axis in 0..D {
        let lo = f64::from(bounds.min(axis));
        let hi = f64::from(bounds.max(axis));
        let extent = hi - lo;
        let normalised = if extent > 0.0 {
            (f64::from(point.coord(axis)) - lo) / extent
        } else {
            0.5
        };
        let cell = ((normalised * cells as f64) as u64).min(cells - 1);
        for bit in 0..bits {
            code |= ((cell >> bit) & 1) << (bit as usize * D + axis);
        }
    }
    code
}
