//! Smooth 2D gradient noise
//!
//! Nearby inputs give nearby outputs, so sampling along a slowly advancing
//! time axis yields a correlated signal instead of independent draws.

/// Lattice hash in the style of an LCG step followed by a fold
#[inline]
fn lattice_hash(x: i32, y: i32) -> u64 {
    let mut h = (x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (y as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h = h.wrapping_mul(6364136223846793005);
    h = h.wrapping_add(1442695040888963407);
    h ^ (h >> 32)
}

const GRADIENTS: [(f32, f32); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    (-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
    (std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
    (-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2),
];

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn corner(ix: i32, iy: i32, dx: f32, dy: f32) -> f32 {
    let (gx, gy) = GRADIENTS[(lattice_hash(ix, iy) % GRADIENTS.len() as u64) as usize];
    gx * dx + gy * dy
}

/// Gradient noise in [0, 1]; exactly 0.5 on lattice points
pub fn perlin(x: f32, y: f32) -> f32 {
    let (x0, y0) = (x.floor(), y.floor());
    let (ix, iy) = (x0 as i32, y0 as i32);
    let (fx, fy) = (x - x0, y - y0);

    let n00 = corner(ix, iy, fx, fy);
    let n10 = corner(ix + 1, iy, fx - 1.0, fy);
    let n01 = corner(ix, iy + 1, fx, fy - 1.0);
    let n11 = corner(ix + 1, iy + 1, fx - 1.0, fy - 1.0);

    let (u, v) = (fade(fx), fade(fy));
    let raw = lerp(lerp(n00, n10, u), lerp(n01, n11, u), v);

    // Raw range is [-1/sqrt(2), 1/sqrt(2)]
    ((raw * std::f32::consts::SQRT_2 + 1.0) * 0.5).clamp(0.0, 1.0)
}
