// Per-candidate numeric engines: rating, training index, SI projection.

pub mod projection;
pub mod rating;
pub mod training;
pub mod weights;

/// Multiplicative constant of the skill-index growth axis: 2^9 * 5^4 * 7^7.
pub const ASI_ROOT_CONSTANT: f64 = weights::OUTFIELD_CAPACITY;

/// Skill index on the 7th-root growth axis.
pub fn si_root(si: f64) -> f64 {
    (si * ASI_ROOT_CONSTANT).powf(1.0 / 7.0)
}

/// Inverse of [`si_root`].
pub fn si_from_root(root: f64) -> f64 {
    root.powi(7) / ASI_ROOT_CONSTANT
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
