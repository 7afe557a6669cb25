//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp `value` into the closed range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    if value < min {
        *min
    } else if value > max {
        *max
    } else {
        *value
    }
}

/// Produce `num` evenly spaced values over the closed interval `[start, stop]`.
///
/// A single value is just `start`, and zero values is an empty vector.
pub fn linspace<T>(start: T, stop: T, num: usize) -> Vec<T>
where
    T: Float,
{
    match num {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            // Indices are counted in `T` directly
            let mut index = T::zero();
            let mut last = T::zero();
            for _ in 1..n {
                last = last + T::one();
            }
            let step = (stop - start) / last;

            (0..n)
                .map(|i| {
                    let value = start + step * index;
                    index = index + T::one();

                    // Pin the last value so rounding never overshoots the interval
                    if i == n - 1 {
                        stop
                    } else {
                        value
                    }
                })
                .collect()
        }
    }
}
