use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PARAMLINT_LOG";

static INIT: Once = Once::new();

pub fn init(verbose: bool, quiet: bool, color: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(color)
            .with_target(false)
            .without_time()
            .compact()
            .try_init();
    });
}

fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "paramlint=error"
    } else if verbose {
        "paramlint=debug"
    } else {
        "paramlint=warn"
    }
}
