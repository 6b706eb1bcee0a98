// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-tracing.
//
// gelf-tracing is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-tracing is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-tracing.  If
// not, see <http://www.gnu.org/licenses/>.

//! Severities in, syslog levels out.
//!
//! GELF borrows its `level` field from syslog: an integer in `0..=7`, lower being more severe.
//! [`Level`] replicates the names used in `<syslog.h>`. [`Severity`] models the levels of the
//! logging framework on the other side of the formatter, and [`Severity::to_syslog`] is the
//! fixed mapping between the two.

type StdResult<T, E> = std::result::Result<T, E>;

/// The eight syslog severity levels. The enumeration values duplicate the constants documented in
/// the `syslog()` manual [page] & defined in `<syslog.h>`, and are what goes into the GELF `level`
/// field.
///
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl Level {
    /// The human-readable name Graylog users expect in `_level_name`
    pub const fn name(self) -> &'static str {
        match self {
            Level::LOG_EMERG => "EMERGENCY",
            Level::LOG_ALERT => "ALERT",
            Level::LOG_CRIT => "CRITICAL",
            Level::LOG_ERR => "ERROR",
            Level::LOG_WARNING => "WARNING",
            Level::LOG_NOTICE => "NOTICE",
            Level::LOG_INFO => "INFORMATIONAL",
            Level::LOG_DEBUG => "DEBUGGING",
        }
    }
}

impl std::default::Default for Level {
    /// The default level is `LOG_INFO`.
    fn default() -> Self {
        Level::LOG_INFO
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::LOG_EMERG => "LOG_EMERG",
                Level::LOG_ALERT => "LOG_ALERT",
                Level::LOG_CRIT => "LOG_CRIT",
                Level::LOG_ERR => "LOG_ERR",
                Level::LOG_WARNING => "LOG_WARNING",
                Level::LOG_NOTICE => "LOG_NOTICE",
                Level::LOG_INFO => "LOG_INFO",
                Level::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

/// The severity of a log [`Entry`] as the producing framework sees it.
///
/// The framework's scale runs from [`Severity::PANIC`] (most severe) to [`Severity::DEBUG`]. The
/// type is a thin wrapper around `u8` rather than an enum because frameworks routinely have levels
/// beyond the six we know how to map ([`Severity::TRACE`], for instance); those are still valid
/// input and are assigned the formatter's default [`Level`].
///
/// [`Entry`]: crate::entry::Entry
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Severity(pub u8);

impl Severity {
    pub const PANIC: Severity = Severity(0);
    pub const FATAL: Severity = Severity(1);
    pub const ERROR: Severity = Severity(2);
    pub const WARN: Severity = Severity(3);
    pub const INFO: Severity = Severity(4);
    pub const DEBUG: Severity = Severity(5);
    /// Finer than [`Severity::DEBUG`]; has no syslog counterpart
    pub const TRACE: Severity = Severity(6);

    /// Map this severity to a syslog [`Level`], or `None` if it is outside the fixed table.
    pub const fn to_syslog(self) -> Option<Level> {
        match self.0 {
            0 => Some(Level::LOG_EMERG),
            1 => Some(Level::LOG_CRIT),
            2 => Some(Level::LOG_ERR),
            3 => Some(Level::LOG_WARNING),
            4 => Some(Level::LOG_INFO),
            5 => Some(Level::LOG_DEBUG),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        match *self {
            Severity::PANIC => write!(f, "panic"),
            Severity::FATAL => write!(f, "fatal"),
            Severity::ERROR => write!(f, "error"),
            Severity::WARN => write!(f, "warning"),
            Severity::INFO => write!(f, "info"),
            Severity::DEBUG => write!(f, "debug"),
            Severity::TRACE => write!(f, "trace"),
            Severity(n) => write!(f, "severity({})", n),
        }
    }
}

impl std::convert::From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match level {
            &tracing::Level::ERROR => Severity::ERROR,
            &tracing::Level::WARN => Severity::WARN,
            &tracing::Level::INFO => Severity::INFO,
            &tracing::Level::DEBUG => Severity::DEBUG,
            &tracing::Level::TRACE => Severity::TRACE,
        }
    }
}
