use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use num_format::{Locale, ToFormattedString};

static WARNED_MESSAGES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

/// Print `message` to stderr unless it was already printed. Returns whether
/// it was printed.
pub fn warn_once(message: impl Into<String>) -> bool {
    let message = message.into();
    let cache = WARNED_MESSAGES.get_or_init(|| Mutex::new(HashSet::new()));

    if let Ok(mut warned) = cache.lock()
        && warned.insert(message.clone())
    {
        eprintln!("{message}");
        return true;
    }
    false
}

#[derive(Clone)]
pub struct NumberFormatOptions {
    pub use_comma: bool,
    pub use_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for NumberFormatOptions {
    fn default() -> Self {
        Self {
            use_comma: false,
            use_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

fn locale_for(code: &str) -> Locale {
    match code {
        "de" => Locale::de,
        "fr" => Locale::fr,
        "es" => Locale::es,
        "it" => Locale::it,
        "ja" => Locale::ja,
        "ko" => Locale::ko,
        "zh" => Locale::zh,
        _ => Locale::en,
    }
}

/// Format a transaction count for display.
pub fn format_number(n: impl Into<u64>, options: &NumberFormatOptions) -> String {
    let n: u64 = n.into();

    if options.use_human {
        const SUFFIXES: [(u64, &str); 4] = [
            (1_000_000_000_000, "t"),
            (1_000_000_000, "b"),
            (1_000_000, "m"),
            (1_000, "k"),
        ];
        for (scale, suffix) in SUFFIXES {
            if n >= scale {
                return format!(
                    "{:.prec$}{suffix}",
                    n as f64 / scale as f64,
                    prec = options.decimal_places
                );
            }
        }
        n.to_string()
    } else if options.use_comma {
        n.to_formatted_string(&locale_for(&options.locale))
    } else {
        n.to_string()
    }
}

/// Get the system's local timezone as an IANA timezone string (e.g., "America/Chicago")
pub fn get_local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

#[cfg(test)]
mod tests;
