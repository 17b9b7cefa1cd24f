//! Per-segment gain and cosine edge fades.
//!
//! A linear ramp has a slope discontinuity at the splice point which is
//! audible as a pop; the raised-cosine ramp `0.5 * (1 + cos(πt))` starts and
//! ends with zero slope.

use std::f32::consts::PI;

/// Fade-out gain at position `i` of an `n`-sample window: 1.0 down to 0.0.
fn cosine_gain(i: usize, n: usize) -> f32 {
    if n <= 1 {
        return 1.0;
    }
    let t = i as f32 / (n - 1) as f32;
    0.5 * (1.0 + (PI * t).cos())
}

/// Multiply every sample by `volume`.
pub fn apply_gain(samples: &mut [f32], volume: f32) {
    if volume == 1.0 {
        return;
    }
    for s in samples.iter_mut() {
        *s *= volume;
    }
}

/// Ramp the first `window` samples up from silence.
///
/// Buffers shorter than the window are left untouched.
pub fn fade_in(samples: &mut [f32], window: usize) {
    if window == 0 || samples.len() < window {
        return;
    }
    for (i, s) in samples[..window].iter_mut().enumerate() {
        *s *= 1.0 - cosine_gain(i, window);
    }
}

/// Ramp the last `window` samples down to silence.
///
/// Buffers shorter than the window are left untouched.
pub fn fade_out(samples: &mut [f32], window: usize) {
    if window == 0 || samples.len() < window {
        return;
    }
    let start = samples.len() - window;
    for (i, s) in samples[start..].iter_mut().enumerate() {
        *s *= cosine_gain(i, window);
    }
}

/// Gain, then fade-in, then fade-out. The sample count never changes.
pub fn shape(samples: &mut [f32], volume: f32, fade_in_window: usize, fade_out_window: usize) {
    apply_gain(samples, volume);
    fade_in(samples, fade_in_window);
    fade_out(samples, fade_out_window);
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn gain_is_linear() {
        let mut samples = vec![1.0, -0.5, 0.25];
        apply_gain(&mut samples, 0.5);
        assert_eq!(samples, vec![0.5, -0.25, 0.125]);
    }

    #[test]
    fn fade_in_runs_from_zero_to_unity() {
        let mut samples = vec![1.0; 10];
        fade_in(&mut samples, 5);
        assert!(samples[0].abs() < EPS);
        assert!((samples[2] - 0.5).abs() < EPS);
        assert!((samples[4] - 1.0).abs() < EPS);
        assert!(samples[..5].windows(2).all(|w| w[0] <= w[1]));
        assert!(samples[5..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn fade_out_runs_from_unity_to_zero() {
        let mut samples = vec![1.0; 10];
        fade_out(&mut samples, 5);
        assert!(samples[..5].iter().all(|&s| s == 1.0));
        assert!((samples[5] - 1.0).abs() < EPS);
        assert!((samples[7] - 0.5).abs() < EPS);
        assert!(samples[9].abs() < EPS);
    }

    #[test]
    fn cosine_ramp_is_flat_at_both_ends() {
        let n = 1000;
        let first_step = 1.0 - cosine_gain(1, n);
        let middle_step = cosine_gain(n / 2 - 1, n) - cosine_gain(n / 2, n);
        assert!(first_step < middle_step / 100.0);
    }

    #[test]
    fn shaping_keeps_length() {
        for len in [0, 1, 119, 120, 359, 360, 480, 24_000] {
            let mut samples = vec![0.7; len];
            shape(&mut samples, 0.8, 120, 360);
            assert_eq!(samples.len(), len);
        }
    }

    #[test]
    fn short_buffer_is_not_faded() {
        let mut samples = vec![1.0; 100];
        fade_in(&mut samples, 120);
        fade_out(&mut samples, 360);
        assert!(samples.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn buffer_between_windows_gets_only_the_fitting_fade() {
        let mut samples = vec![1.0; 200];
        shape(&mut samples, 1.0, 120, 360);
        assert!(samples[0].abs() < EPS);
        assert_eq!(samples[199], 1.0);
    }
}
