//! Debug logging for diagnosing slow or failing block retrieval.
//!
//! Enable by setting environment variable: TXCLOCK_DEBUG_LOG=1
//! Logs are written to txclock-debug.log in the system temp directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static START_TIME: OnceLock<Instant> = OnceLock::new();
static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("txclock-debug.log")
}

/// Initialize debug logging. Call once at startup.
pub fn init() {
    if std::env::var("TXCLOCK_DEBUG_LOG").is_err() {
        return;
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path())
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open debug log file: {e}");
            return;
        }
    };

    START_TIME.get_or_init(Instant::now);
    LOG_FILE.get_or_init(|| Mutex::new(file));
    ENABLED.store(true, Ordering::SeqCst);
    log("DEBUG", "init", "Debug logging initialized");
}

/// Check if debug logging is enabled.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Log a debug message with elapsed time and thread ID.
pub fn log(category: &str, action: &str, detail: &str) {
    if !is_enabled() {
        return;
    }

    let elapsed = START_TIME
        .get()
        .map(|s| s.elapsed().as_millis())
        .unwrap_or(0);
    let thread_id = std::thread::current().id();

    let msg = format!(
        "[{:>8}ms] [{:?}] [{}] {} - {}\n",
        elapsed, thread_id, category, action, detail
    );

    if let Some(file_mutex) = LOG_FILE.get()
        && let Ok(mut file) = file_mutex.lock()
    {
        let _ = file.write_all(msg.as_bytes());
        let _ = file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_a_no_op_until_initialized() {
        // Tests never call init, so no log file is opened.
        assert!(!is_enabled());
        log("TEST", "noop", "nothing is written");
        assert!(LOG_FILE.get().is_none());
        assert!(START_TIME.get().is_none());
        assert!(log_path().ends_with("txclock-debug.log"));
    }
}
