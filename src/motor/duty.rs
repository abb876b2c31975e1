//! Duty Mapping
//!
//! Maps a signed duty request onto the two comparator thresholds of the
//! complementary PWM pair.
//!
//! | Request      | Channel A (`high`) | Channel B (`low`) |
//! |--------------|--------------------|-------------------|
//! | `d >= 0`     | 255                | `255 - d`         |
//! | `d < 0`      | `255 + d`          | 255               |
//!
//! Requests beyond ±255 saturate. The negative branch is the mirror image
//! of the positive one: `map_duty(-d)` equals `map_duty(d)` with the
//! channels swapped.

use crate::types::{DutyRequest, PwmChannelPair};

/// Map a signed duty request to the channel pair
///
/// Total over all inputs: out-of-range requests are clamped, never
/// reported.
#[must_use]
pub const fn map_duty(request: DutyRequest) -> PwmChannelPair {
    let d = request.clamped();
    if d < 0 {
        // -255..=-1 lands on 0..=254
        PwmChannelPair::new((255 + d) as u8, u8::MAX)
    } else {
        PwmChannelPair::new(u8::MAX, (255 - d) as u8)
    }
}
