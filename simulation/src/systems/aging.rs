//! Aging System - advance age by one step and reset per-step tallies

use crate::herd::Herd;

/// Age every animal by `step_months`.
pub fn aging_system(herd: &mut Herd, step_months: f64) -> u32 {
    let mut count = 0;
    for animal in herd.animals_mut() {
        animal.reset_step();
        animal.advance_age(step_months);
        count += 1;
    }
    count
}
