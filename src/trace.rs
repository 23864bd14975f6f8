//! Diagnostics on stderr. `warn!` always prints, `trace!` and
//! `time_guard!` only when tracing is enabled, either via the
//! `HTMLTEMPLATE_TRACE` env var or `set_trace_enabled`.
//!
//! Every line has the form
//! `htmltemplate <level> <thread>: <message> (<file>:<line>)`.

use std::{fmt::{self, Write as _},
          io::Write,
          sync::atomic::{AtomicBool, Ordering},
          thread,
          time::Instant};

use kstring::KString;
use lazy_static::lazy_static;

use crate::config::env_flag;

lazy_static!{
    static ref TRACE: AtomicBool = AtomicBool::new(
        env_flag("HTMLTEMPLATE_TRACE").unwrap_or_else(|e| {
            crate::warn!("{e}, leaving tracing off");
            None
        }).unwrap_or(false));
}

pub fn trace_enabled() -> bool {
    TRACE.load(Ordering::Relaxed)
}

pub fn set_trace_enabled(on: bool) {
    TRACE.store(on, Ordering::Relaxed)
}

/// Where a diagnostic line was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

#[macro_export]
macro_rules! location {
    () => {
        $crate::trace::Location { file: file!(), line: line!() }
    }
}

pub fn format_line(level: &str, args: fmt::Arguments, location: Location) -> String {
    let mut s = String::new();
    let thread = thread::current();
    let _ = match thread.name() {
        Some(name) => write!(s, "htmltemplate {level} {name}: "),
        None => write!(s, "htmltemplate {level} {:?}: ", thread.id()),
    };
    let _ = s.write_fmt(args);
    let _ = write!(s, " ({}:{})", location.file, location.line);
    s
}

/// Writes one diagnostic line to stderr; used by the macros.
pub fn emit(level: &str, args: fmt::Arguments, location: Location) {
    let line = format_line(level, args, location);
    let mut err = std::io::stderr().lock();
    let _ = writeln!(err, "{line}");
}

#[macro_export]
macro_rules! warn {
    ($formatstr:expr $(,$arg:expr)*) => {
        $crate::trace::emit("warn", format_args!($formatstr $(,$arg)*), $crate::location!())
    }
}

#[macro_export]
macro_rules! trace {
    ($formatstr:expr $(,$arg:expr)*) => {
        if $crate::trace::trace_enabled() {
            $crate::trace::emit("trace", format_args!($formatstr $(,$arg)*),
                                $crate::location!())
        }
    }
}


/// Reports how long a scope took when dropped, if tracing was enabled
/// when it was created.
#[derive(Debug)]
pub struct TimeGuard {
    started: Option<(KString, Instant, Location)>,
}

impl TimeGuard {
    pub fn new(name: impl Into<KString>, location: Location) -> Self {
        TimeGuard {
            started: trace_enabled().then(|| (name.into(), Instant::now(), location))
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.started.is_some()
    }
}

impl Drop for TimeGuard {
    fn drop(&mut self) {
        if let Some((name, start, location)) = self.started.take() {
            emit("trace",
                 format_args!("{} took {:?}", name.as_str(), start.elapsed()),
                 location);
        }
    }
}

/// Reports the time until the end of the enclosing scope, if tracing
/// is enabled.
#[macro_export]
macro_rules! time_guard {
    ($name:expr) => {
        let _guard = $crate::trace::TimeGuard::new($name, $crate::location!());
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_macros_expand() {
        // Only checks that the macros are usable from inside the crate.
        let was = trace_enabled();
        set_trace_enabled(false);
        time_guard!("t_macros_expand");
        trace!("not printed {}", 1);
        set_trace_enabled(was);
        assert_eq!(trace_enabled(), was);
    }

    #[test]
    fn t_line_format() {
        let location = Location { file: "src/cache.rs", line: 12 };
        let name = KString::from_string("app::views::LoginView".to_string());
        let line = thread::Builder::new().name("worker".into()).spawn(move || {
            format_line("trace", format_args!("{} took {}", name.as_str(), "1ms"), location)
        }).expect("spawns").join().expect("no panic");
        assert_eq!(line,
                   "htmltemplate trace worker: app::views::LoginView took 1ms (src/cache.rs:12)");
        let here = location!();
        assert_eq!(here.file, file!());
    }

    #[test]
    fn t_time_guard_off() {
        // The switch is process-wide; only look at a guard made while off.
        if !trace_enabled() {
            let guard = TimeGuard::new(KString::from_ref("x"), location!());
            assert!(!guard.is_enabled());
        }
    }
}
