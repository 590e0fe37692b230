//! Demo mode: emit fabricated log lines through the logging pipeline.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

const SAMPLE_MAX_REPEAT: u32 = 12;

/// Formats demo line `i` with the sample string repeated `n` times.
pub fn demo_line(i: u64, n: u32) -> String {
    let sample = format!("this string will appear {n} times :)");
    let repeated = vec![sample.as_str(); n as usize].join(" ");
    format!("Demo log line {i}. Sample string: {repeated:?}")
}

/// Picks the repeat count: one more than the smallest of three draws,
/// which favours short lines.
fn repeat_count<R: Rng>(rng: &mut R) -> u32 {
    let draws = [0; 3].map(|_| rng.gen_range(0..SAMPLE_MAX_REPEAT));
    draws.into_iter().min().unwrap_or(0) + 1
}

fn random_pause<R: Rng>(rng: &mut R, max_interval: Duration) -> Duration {
    let max_ms = max_interval.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.gen_range(0..max_ms))
}

/// Logs `lines` demo lines (0 = until cancelled), pausing a random
/// `0..max_interval` before each.
pub async fn run(lines: u64, max_interval: Duration, cancel: CancellationToken) {
    tracing::info!(lines, sleep_ms = max_interval.as_millis() as u64, "starting demo mode");

    let mut i = 0u64;
    while lines == 0 || i < lines {
        let (pause, n) = {
            let mut rng = rand::thread_rng();
            (random_pause(&mut rng, max_interval), repeat_count(&mut rng))
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }

        tracing::info!("{}", demo_line(i, n));
        i += 1;
    }
}
