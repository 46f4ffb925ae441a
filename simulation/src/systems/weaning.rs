//! Weaning System - wean sucklings that reach the natural weaning age

use crate::components::Calendar;
use crate::error::Result;
use crate::herd::Herd;

/// Returns the number of animals weaned.
pub fn weaning_system(herd: &mut Herd, cal: &Calendar) -> Result<u32> {
    let ready: Vec<_> = herd
        .iter()
        .filter(|animal| !animal.is_weaned() && animal.age() >= animal.params().weaning_age())
        .map(|animal| animal.id())
        .collect();

    let mut weaned = 0;
    for id in ready {
        if herd.wean(id, true, "Natural", cal.date)? {
            weaned += 1;
        }
    }
    Ok(weaned)
}
