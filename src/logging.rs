pub const LOG_ENV: &str = "GYMLOG_LOG";

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init(verbose: bool) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(LOG_ENV, default_filter(verbose)),
    )
    .target(env_logger::Target::Stderr)
    .format_timestamp_secs()
    .try_init();
}
