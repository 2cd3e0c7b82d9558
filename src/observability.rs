//! Structured diagnostics for the reshape engine.
//!
//! The `log_metric!` macro emits key-value metric lines so the dimension
//! resolution and group-by decisions can be traced when debugging a
//! misbehaving export. It is compiled out of release builds entirely.

/// Logs a structured key-value metric string to stdout, only in debug builds.
///
/// # Example
/// ```
/// use bufrq::log_metric;
/// let total_rows = 42;
/// log_metric!("event" = "resolve_dims", "total_rows" = &total_rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            println!("BUFRQ_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
