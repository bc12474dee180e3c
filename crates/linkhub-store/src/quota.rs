//! Quota policy — pure mapping from accumulated invites to slot limit.

/// Tiered slot limits. Evaluated eagerly whenever a user's invite count
/// changes, so status reads never recompute.
pub fn limit_for_invites(invites: u32) -> u32 {
    if invites >= 60 {
        30
    } else if invites >= 40 {
        20
    } else if invites >= 20 {
        10
    } else {
        5
    }
}
