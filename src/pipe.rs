use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel as channel;
use speedgauge::{Clock, ClockConfig, Gauge};
use tracing::{info, warn};

use crate::cli::Pipe;

pub fn run_pipe(pipe: Pipe) -> Result<()> {
    let config = match pipe.resolution {
        Some(resolution) => ClockConfig { resolution },
        None => ClockConfig::from_env(),
    };
    let clock = Arc::new(config.build().context("Building clock")?);
    clock.start().context("Starting clock")?;
    let gauge = Arc::new(Mutex::new(Gauge::with_clock(clock)));
    info!(
        resolution = config.resolution,
        interval_ms = pipe.interval_ms,
        "Starting speedgauge pipe"
    );

    // Reporter thread: log the rate every interval until the copy finishes
    let (done_tx, done_rx) = channel::bounded::<()>(0);
    let gauge_for_reporter = Arc::clone(&gauge);
    let interval = Duration::from_millis(pipe.interval_ms.max(1));
    let reporter = thread::spawn(move || {
        let ticker = channel::tick(interval);
        loop {
            channel::select! {
                recv(ticker) -> _ => {
                    let rate = lock(&gauge_for_reporter).read();
                    info!(rate_bps = rate, "Throughput");
                }
                recv(done_rx) -> _ => break,
            }
        }
    });

    let copied = copy_with_gauge(io::stdin().lock(), io::stdout().lock(), &gauge, pipe.buffer);

    // Dropping the sender disconnects done_rx and stops the reporter
    drop(done_tx);
    if reporter.join().is_err() {
        warn!("Rate reporter panicked");
    }

    let total = copied.context("Copying stdin to stdout")?;
    info!(bytes = total, rate_bps = lock(&gauge).read(), "Done");
    Ok(())
}

pub(crate) fn copy_with_gauge<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    gauge: &Mutex<Gauge>,
    buffer_size: usize,
) -> io::Result<u64> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                writer.write_all(&buffer[..n])?;
                total += n as u64;
                lock(gauge).progress(n as i64);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    writer.flush()?;
    Ok(total)
}

fn lock(gauge: &Mutex<Gauge>) -> MutexGuard<'_, Gauge> {
    gauge.lock().unwrap_or_else(PoisonError::into_inner)
}
