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

//! Best-effort discovery of the source location that produced a log record.
//!
//! Frameworks that track their call sites (such as [`tracing`]) hand the location to the
//! formatter directly on the [`Entry`](crate::entry::Entry). For everyone else, a
//! [`GelfFormatter`](crate::formatter::GelfFormatter) consults a [`CallerLocator`]. The stock
//! [`BacktraceLocator`] walks the stack; whether that yields anything depends on the platform,
//! the optimization level & the presence of debug info, so a `None` is always a legitimate answer
//! and results in the `_file` & `_line` fields simply being left out.

use crate::entry::Caller;

use backtrace::Backtrace;

/// Anything that can (try to) say where the current log record came from.
pub trait CallerLocator: Send + Sync {
    fn locate(&self) -> Option<Caller>;
}

/// A [`CallerLocator`] that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCaller;

impl CallerLocator for NoCaller {
    fn locate(&self) -> Option<Caller> {
        None
    }
}

/// The number of frames between [`GelfFormatter::format`] and the code that actually logged,
/// for a framework that routes a record through four layers of its own before formatting.
///
/// [`GelfFormatter::format`]: crate::formatter::GelfFormatter::format
pub const DEFAULT_CALLER_DEPTH: usize = 5;

// Demangled names of the frames we count from, under both legacy & v0 mangling.
const ANCHORS: [&str; 4] = [
    "GelfFormatter::format",
    "GelfFormatter>::format",
    "GelfFormatter::format_into",
    "GelfFormatter>::format_into",
];

/// A [`CallerLocator`] that captures a [`Backtrace`], finds the [`GelfFormatter::format`] (or
/// `format_into`) frame in it, and reports the file & line of the frame `depth` calls above that.
///
/// Inlined functions are counted as frames in their own right.
///
/// [`GelfFormatter::format`]: crate::formatter::GelfFormatter::format
#[derive(Clone, Copy, Debug)]
pub struct BacktraceLocator {
    depth: usize,
}

impl BacktraceLocator {
    pub fn new(depth: usize) -> BacktraceLocator {
        BacktraceLocator { depth }
    }
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl std::default::Default for BacktraceLocator {
    fn default() -> Self {
        BacktraceLocator::new(DEFAULT_CALLER_DEPTH)
    }
}

impl CallerLocator for BacktraceLocator {
    fn locate(&self) -> Option<Caller> {
        let back = Backtrace::new();
        let symbols: Vec<_> = back
            .frames()
            .iter()
            .flat_map(|frame| frame.symbols().iter())
            .collect();
        let anchor = symbols.iter().position(|sym| {
            sym.name()
                .map(|name| {
                    let name = format!("{:#}", name);
                    ANCHORS.iter().any(|anchor| name.ends_with(anchor))
                })
                .unwrap_or(false)
        })?;
        let sym = symbols.get(anchor + self.depth)?;
        Some(Caller {
            file: sym.filename()?.display().to_string(),
            line: sym.lineno()?,
        })
    }
}
