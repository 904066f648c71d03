/// Deepest depth the four character depth field can show, in meters
pub const MAX_DEPTH_M: f32 = 99.9;
/// Shallowest displayable depth
pub const MIN_DEPTH_M: f32 = 0.0;

/// Normalize a raw sensor depth into the displayable range
///
/// The sea level offset is subtracted first, then the result is clamped to
/// `[0.0, 99.9]`. Surface noise below zero reads as exactly `0.0` and spikes
/// beyond the range read as exactly `99.9`. A NaN reading counts as surface.
///
/// # Examples
///
/// ```
/// use bottom_timer::depth::normalize;
/// assert_eq!(normalize(-0.3, 0.0), 0.0);
/// assert_eq!(normalize(12.5, 0.5), 12.0);
/// assert_eq!(normalize(250.0, 0.0), 99.9);
/// ```
///
pub fn normalize(raw_depth: f32, sea_level_offset: f32) -> f32 {
    let depth = raw_depth - sea_level_offset;

    if depth.is_nan() {
        return MIN_DEPTH_M;
    }

    depth.clamp(MIN_DEPTH_M, MAX_DEPTH_M)
}
