use std::sync::OnceLock;

use crate::{compress::CompressionType, logging::init_log};

pub struct Config {
    pub log_config: LogConfig,
    /// Compression used when writing patch files.
    pub compression_type: CompressionType,
}

#[derive(Debug, Clone, Copy)]
pub enum LogConfig {
    /// Everything down to trace, with module paths, into `trace.log`.
    Trace,
    /// Count of `-v` flags given on the command line.
    Verbose(u8),
    NoLog,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn init_config(config: Config) {
    if CONFIG.set(config).is_err() {
        panic!("cannot init config again after init");
    }
    init_log(&get_config().log_config);
}

pub fn get_config() -> &'static Config {
    CONFIG.get().expect("cannot get config before init")
}
