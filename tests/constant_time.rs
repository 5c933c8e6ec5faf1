//! Comparing keys must not leak where they first differ.
//!
//! Timing-based, so the tolerance is generous: an early-exit comparison of
//! 64 KiB keys is orders of magnitude off, not a few percent.

use std::hint::black_box;
use std::time::{Duration, Instant};

use guarded_keys::SecretKey;

const KEY_LEN: usize = 64 * 1024;
const BATCHES: usize = 41;
const ROUNDS: usize = 16;

fn time_comparisons(left: &SecretKey, right: &SecretKey) -> Duration {
    let start = Instant::now();
    for _ in 0..ROUNDS {
        black_box(black_box(left) == black_box(right));
    }
    start.elapsed()
}

fn median(mut samples: Vec<Duration>) -> Duration {
    samples.sort_unstable();
    samples[samples.len() / 2]
}

#[test]
fn position_of_first_difference_does_not_matter() {
    let key = SecretKey::from_slice(&vec![0x3C; KEY_LEN]).unwrap();

    let mut bytes = vec![0x3C; KEY_LEN];
    bytes[0] ^= 1;
    let differs_first = SecretKey::from_slice(&bytes).unwrap();

    let mut bytes = vec![0x3C; KEY_LEN];
    bytes[KEY_LEN - 1] ^= 1;
    let differs_last = SecretKey::from_slice(&bytes).unwrap();

    assert_ne!(key, differs_first);
    assert_ne!(key, differs_last);

    // Interleaved so that frequency scaling hits both sides alike.
    let mut first = Vec::with_capacity(BATCHES);
    let mut last = Vec::with_capacity(BATCHES);
    for _ in 0..BATCHES {
        first.push(time_comparisons(&key, &differs_first));
        last.push(time_comparisons(&key, &differs_last));
    }

    let first = median(first).as_nanos().max(1) as f64;
    let last = median(last).as_nanos().max(1) as f64;
    let ratio = first / last;

    assert!(
        (0.5..=2.0).contains(&ratio),
        "first-byte vs last-byte comparison time ratio is {ratio:.3}"
    );
}
