//! Trailing moving average.

/// Mean of the trailing window ending at each position.
///
/// Position `i` averages `values[i + 1 - window..=i]`, or everything up to `i`
/// while fewer than `window` values exist. Each window is summed afresh in
/// order, so a non-finite value only affects the windows that contain it and
/// the result never depends on later positions.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
