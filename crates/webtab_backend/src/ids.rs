use crate::time::unix_epoch_millis_now;
use rand::{Rng as _, rngs::OsRng};
use webtab_domain::SHORTCUT_COLORS;

/// Identifier for a newly created category or shortcut: creation time in
/// milliseconds plus a random suffix, so two entities created within the same
/// millisecond still differ.
pub fn new_entity_id() -> String {
    let millis = unix_epoch_millis_now();
    let suffix: u32 = OsRng.r#gen();
    format!("{millis}-{suffix:08x}")
}

/// Background for a shortcut tile that has no icon.
pub fn random_shortcut_color() -> &'static str {
    SHORTCUT_COLORS[OsRng.gen_range(0..SHORTCUT_COLORS.len())]
}
