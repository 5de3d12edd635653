use colored::{Color, Colorize};

/// Severity of a console message, mapped to a bracketed tag and a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Ok,
    Warning,
    Error,
}

impl MessageLevel {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Ok => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// Destination for everything the harness shows the person running it.
///
/// Tagged messages carry a level; raw output (queries, log file contents)
/// is passed through untouched.
pub trait MessageSink {
    fn message(&mut self, level: MessageLevel, text: &str);

    fn raw(&mut self, text: &str);

    fn info(&mut self, text: &str) {
        self.message(MessageLevel::Info, text)
    }

    fn ok(&mut self, text: &str) {
        self.message(MessageLevel::Ok, text)
    }

    fn warning(&mut self, text: &str) {
        self.message(MessageLevel::Warning, text)
    }

    fn error(&mut self, text: &str) {
        self.message(MessageLevel::Error, text)
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn message(&mut self, level: MessageLevel, text: &str) {
        (**self).message(level, text)
    }

    fn raw(&mut self, text: &str) {
        (**self).raw(text)
    }
}

/// Prints to stdout, bold and colored unless colors are disabled.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    disable_colors: bool,
}

impl ConsoleSink {
    pub fn new(disable_colors: bool) -> Self {
        Self { disable_colors }
    }
}

impl MessageSink for ConsoleSink {
    fn message(&mut self, level: MessageLevel, text: &str) {
        let line = format!("[{}] {}", level.tag(), text);
        if self.disable_colors {
            println!("{}", line);
        } else {
            println!("{}", line.as_str().bold().color(level.color()));
        }
    }

    fn raw(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Keeps every message in memory, for tests and for callers that want to
/// post-process the output.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Vec<(Option<MessageLevel>, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in emission order; raw output has no level
    pub fn entries(&self) -> &[(Option<MessageLevel>, String)] {
        &self.entries
    }

    /// Texts emitted at `level`
    pub fn messages(&self, level: MessageLevel) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(l, _)| *l == Some(level))
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn contains(&self, level: MessageLevel, needle: &str) -> bool {
        self.messages(level).iter().any(|text| text.contains(needle))
    }

    pub fn raw_output(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(l, _)| l.is_none())
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl MessageSink for MemorySink {
    fn message(&mut self, level: MessageLevel, text: &str) {
        self.entries.push((Some(level), text.to_owned()));
    }

    fn raw(&mut self, text: &str) {
        self.entries.push((None, text.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order_and_levels() {
        let mut sink = MemorySink::new();
        sink.info("010: Testing create table");
        sink.raw("SELECT 1;");
        sink.error("Error running create table");

        assert_eq!(sink.entries().len(), 3);
        assert_eq!(sink.messages(MessageLevel::Info), vec!["010: Testing create table"]);
        assert_eq!(sink.raw_output(), vec!["SELECT 1;"]);
        assert!(sink.contains(MessageLevel::Error, "create table"));
        assert!(!sink.contains(MessageLevel::Warning, "create table"));
    }

    #[test]
    fn test_sink_through_mutable_reference() {
        fn emit(mut sink: impl MessageSink) {
            sink.warning("careful");
        }

        let mut sink = MemorySink::new();
        emit(&mut sink);
        assert_eq!(sink.messages(MessageLevel::Warning), vec!["careful"]);
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(MessageLevel::Error.tag(), "ERROR");
        assert_eq!(MessageLevel::Ok.tag(), "OK");
    }
}
