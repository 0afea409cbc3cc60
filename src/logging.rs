use log::{LevelFilter, Log, Metadata, Record};
use systemd_journal_logger::JournalLog;

/// Passes this crate's records at Info (Debug when debug logging is on) and
/// everything else at Warn.
struct FilteredJournal {
    inner: JournalLog,
}

impl Log for FilteredJournal {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.target().starts_with("glowlist") {
            let max = if crate::debug_logging() {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= LevelFilter::Warn
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Sends logs to the systemd user journal (`journalctl --user -t <identifier> -f`).
pub fn init_journal(identifier: &str, debug: bool) -> Result<(), String> {
    crate::set_debug_logging(debug);

    let journal = JournalLog::new()
        .map_err(|e| format!("journal unavailable: {}", e))?
        .with_syslog_identifier(identifier.to_string());

    log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))
        .map_err(|e| format!("logger already installed: {}", e))?;
    // Global max must be Debug so debug records can pass once toggled on
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}
