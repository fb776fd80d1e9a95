//! Opaque record identifiers.
//!
//! An id is the base36 time component followed by a fixed-width base36 random
//! component. The time component is strictly increasing within one process, so
//! two ids minted by the same process never collide; across devices the random
//! half makes collisions negligible but not impossible.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// `u64::MAX` in base36 is 13 digits.
const RANDOM_WIDTH: usize = 13;

static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Mints a new record identifier.
pub fn new_id() -> String {
    let (_, random) = Uuid::new_v4().as_u64_pair();
    format!(
        "{}{:0>width$}",
        to_base36(next_millis()),
        to_base36(random),
        width = RANDOM_WIDTH
    )
}

fn next_millis() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut previous = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(previous + 1);
        match LAST_MILLIS.compare_exchange_weak(previous, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => previous = actual,
        }
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(RANDOM_WIDTH);
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
