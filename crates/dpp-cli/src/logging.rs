//! Tracing subscriber setup.
//!
//! Logs go to stderr so that stdout carries only command output.

use tracing_subscriber::EnvFilter;

/// Filter for a `-v` count. Without `-v`, `RUST_LOG` applies when set.
pub fn env_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => return EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

/// Install the global subscriber. `json` selects the JSON formatter.
pub fn init(verbose: u8, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(env_filter(1).to_string(), "info");
        assert_eq!(env_filter(2).to_string(), "debug");
        assert_eq!(env_filter(3).to_string(), "trace");
        assert_eq!(env_filter(9).to_string(), "trace");
    }
}
