//! Core building blocks shared by every pipeline stage.
//!
//! - The `State` trait and the session [`Mode`]
//! - Guard predicates for segmentation triggers
//! - Immutable mode-transition history
//! - Bounded ring buffers for rolling windows
//!
//! Everything in this module is pure data and pure functions.

mod guard;
mod history;
mod ring;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use ring::BoundedRing;
pub use state::{Mode, State};

/// Clamp a value into `[0, 1]`.
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Round to `places` decimals, ties to even on the exact stored value.
///
/// This is the rounding of the persisted session format: `0.125` is an exact
/// tie and goes to `0.12`, while `0.135` is stored slightly above the tie and
/// goes to `0.14`. Non-finite values, integers and `places > 15` pass through.
pub fn round_to(x: f64, places: u32) -> f64 {
    if !x.is_finite() || places > 15 {
        return x;
    }
    let bits = x.to_bits();
    let negative = bits >> 63 == 1;
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if exponent >= 0 {
        return x;
    }

    // x * 10^places == scaled / 2^shift exactly
    let shift = exponent.unsigned_abs();
    let scaled = u128::from(mantissa) * 10u128.pow(places);
    let digits = if shift >= 128 {
        0
    } else {
        let quotient = scaled >> shift;
        let remainder = scaled & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        if remainder > half || (remainder == half && quotient & 1 == 1) {
            quotient + 1
        } else {
            quotient
        }
    };

    let magnitude = digits as f64 / 10f64.powi(places as i32);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}
