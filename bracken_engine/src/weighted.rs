// Weighted random selection, the leaf utility behind stochastic successors.
//
// Selection is a cumulative-distribution scan: one uniform draw in [0, 1) is
// scaled by the weight total, then the entries are summed in order until the
// running total passes the scaled draw. One pass, no retry loop, so a call
// terminates no matter how the weights are distributed. Weights do not need
// to sum to 1 and are treated as relative shares.
//
// The draw is passed in as a plain f64 rather than an RNG handle so the
// function stays pure; callers decide where randomness comes from (see
// `successor.rs`, which draws from the engine's `GrowthRng`).

/// Pick one entry with probability proportional to its weight.
///
/// `rng_val` must be a uniform draw in [0, 1). Returns `None` when `entries`
/// is empty or the weights sum to zero or less; there is nothing meaningful
/// to pick. The last positively weighted entry backstops floating-point
/// rounding at the top of the scale, so a zero-weight entry is never picked
/// no matter where it sits.
pub fn sample_weighted<'a, T>(
    entries: &'a [T],
    weight_of: impl Fn(&T) -> f64,
    rng_val: f64,
) -> Option<&'a T> {
    if entries.is_empty() {
        return None;
    }
    let total: f64 = entries.iter().map(&weight_of).sum();
    if total <= 0.0 {
        return None;
    }

    let target = rng_val * total;
    let mut cumulative = 0.0;
    for entry in entries {
        cumulative += weight_of(entry);
        if cumulative > target {
            return Some(entry);
        }
    }
    // Rounding can leave the cumulative sum a hair under `total`; fall back
    // to the rearmost entry that carries weight.
    entries.iter().rev().find(|&entry| weight_of(entry) > 0.0)
}
