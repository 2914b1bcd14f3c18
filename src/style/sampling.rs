//! Chronological banding and recency-weighted sampling

/// Fraction of the list where the middle band starts
const MIDDLE_START: f64 = 0.3;

/// Fraction of the list where the recent band starts
const RECENT_START: f64 = 0.7;

/// Target share of the total to draw from the middle band
pub const MIDDLE_SHARE: f64 = 0.25;

/// Target share of the total to draw from the early band
pub const EARLY_SHARE: f64 = 0.15;

/// Three contiguous chronological slices of one list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bands<'a, T> {
    /// First 30%
    pub early: &'a [T],
    /// 30% to 70%
    pub middle: &'a [T],
    /// Final 30%
    pub recent: &'a [T],
}

/// Split `items` into early, middle and recent bands by position
#[must_use]
pub fn partition<T>(items: &[T]) -> Bands<'_, T> {
    let middle_start = band_index(items.len(), MIDDLE_START);
    let recent_start = band_index(items.len(), RECENT_START);

    Bands {
        early: &items[..middle_start],
        middle: &items[middle_start..recent_start],
        recent: &items[recent_start..],
    }
}

/// Sampling stride that draws roughly `share` of `total` from a band of `band_len`
///
/// Never returns less than 1, so tiny inputs keep every element instead of
/// dividing by a near-zero target.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn stride(band_len: usize, total: usize, share: f64) -> usize {
    let target = total as f64 * share;
    if band_len == 0 || target <= 0.0 {
        return 1;
    }
    ((band_len as f64 / target).ceil() as usize).max(1)
}

/// All of the recent band, then strided samples of the middle and early bands
#[must_use]
pub fn blend<T: Clone>(items: &[T]) -> Vec<T> {
    let total = items.len();
    let bands = partition(items);

    let middle_stride = stride(bands.middle.len(), total, MIDDLE_SHARE);
    let early_stride = stride(bands.early.len(), total, EARLY_SHARE);

    bands
        .recent
        .iter()
        .chain(bands.middle.iter().step_by(middle_stride))
        .chain(bands.early.iter().step_by(early_stride))
        .cloned()
        .collect()
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn band_index(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).floor() as usize).min(total)
}
