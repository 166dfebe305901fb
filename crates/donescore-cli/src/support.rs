use donescore_corpus::CorpusConfig;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DONESCORE_LOG";

/// Logs go to stderr so stdout stays byte-identical across runs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn exit_error(tag: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("[{tag}] ERROR: {message}");
    std::process::exit(2);
}

pub fn load_config_or_exit(tag: &str, path: Option<&str>) -> CorpusConfig {
    match path {
        Some(path) => CorpusConfig::load_with_overrides(Path::new(path))
            .unwrap_or_else(|err| exit_error(tag, err)),
        None => CorpusConfig::default(),
    }
}

pub fn print_json_or_exit<T: Serialize>(tag: &str, payload: &T) {
    let rendered = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|err| exit_error(tag, format!("failed to render payload: {err}")));
    println!("{rendered}");
}
