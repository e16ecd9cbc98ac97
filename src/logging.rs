use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::sync::Mutex;

use crate::config::LogConfig;

const VERBOSE_LOG_FILE: &str = "resource-patch.log";
const TRACE_LOG_FILE: &str = "trace.log";

type SharedWriter = Mutex<LineWriter<File>>;

fn open_log_file(file_name: &str) -> io::Result<SharedWriter> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_name)?;
    Ok(Mutex::new(LineWriter::new(file)))
}

fn write_line(writer: &SharedWriter, record: &Record, with_module: bool) {
    let Ok(mut writer) = writer.lock() else {
        return;
    };
    let ts = Local::now().format("%H:%M:%S%.6f");
    let _ = if with_module {
        writeln!(
            writer,
            "[{:<5} {} {}] {}",
            record.level(),
            ts,
            record.module_path().unwrap_or("???"),
            record.args()
        )
    } else {
        writeln!(writer, "[{:<5} {}] {}", record.level(), ts, record.args())
    };
}

fn flush_writer(writer: &SharedWriter) {
    if let Ok(mut writer) = writer.lock() {
        let _ = writer.flush();
    }
}

/// Console logger, optionally mirrored into a log file.
struct ConsoleLogger {
    mirror: Option<SharedWriter>,
}

impl ConsoleLogger {
    fn new(mirror_to_file: bool) -> io::Result<Self> {
        let mirror = if mirror_to_file {
            Some(open_log_file(VERBOSE_LOG_FILE)?)
        } else {
            None
        };
        Ok(Self { mirror })
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(writer) = &self.mirror {
            write_line(writer, record, false);
        }
        eprintln!(
            "[{:<5} {}] {}",
            record.level(),
            Local::now().format("%H:%M:%S%.3f"),
            record.args()
        );
    }

    fn flush(&self) {
        if let Some(writer) = &self.mirror {
            flush_writer(writer);
        }
    }
}

impl Drop for ConsoleLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// File-only logger that keeps every record.
struct TraceLogger {
    writer: SharedWriter,
}

impl TraceLogger {
    fn new() -> io::Result<Self> {
        Ok(Self {
            writer: open_log_file(TRACE_LOG_FILE)?,
        })
    }
}

impl Log for TraceLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        write_line(&self.writer, record, true);
    }

    fn flush(&self) {
        flush_writer(&self.writer);
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

fn install(logger: io::Result<Box<dyn Log>>, level: LevelFilter) {
    let logger = match logger {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("cannot open log file: {}", e);
            return;
        }
    };
    // a logger may already be installed, e.g. by a test harness
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn console(mirror_to_file: bool) -> io::Result<Box<dyn Log>> {
    ConsoleLogger::new(mirror_to_file).map(|l| Box::new(l) as Box<dyn Log>)
}

fn trace() -> io::Result<Box<dyn Log>> {
    TraceLogger::new().map(|l| Box::new(l) as Box<dyn Log>)
}

pub fn init_log(config: &LogConfig) {
    match config {
        LogConfig::Trace => install(trace(), LevelFilter::Trace),
        LogConfig::Verbose(verbose) => match *verbose {
            0 => {}
            1 => install(console(false), LevelFilter::Info),
            2 => install(console(false), LevelFilter::Debug),
            3 => install(console(true), LevelFilter::Debug),
            4..=u8::MAX => install(trace(), LevelFilter::Trace),
        },
        LogConfig::NoLog => {}
    };
}
