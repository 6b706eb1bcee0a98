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

//! GELF [1.1]-compliant message formatting
//!
//! [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! [`GelfFormatter`] turns an [`Entry`] into a single line of JSON:
//!
//! ```text
//! {"_foo":"bar","_level_name":"INFORMATIONAL","host":"testhost","level":6,"short_message":"great test message","timestamp":1700000000.1234567,"version":"1.1"}
//! ```
//!
//! GELF reserves a handful of top-level names ([`PROTECTED_FIELDS`]); every other field must carry
//! a leading underscore. Fields on the [`Entry`] that use one of the reserved names are copied
//! through verbatim (so a caller can deliberately override, say, `host`), all others are prefixed.

use crate::{
    caller::{BacktraceLocator, CallerLocator, NoCaller},
    entry::{Caller, Entry},
    error::{Error, Result},
    level::Level,
};

use bytes::buf::BufMut;
use chrono::prelude::*;
use serde_json::{Map, Value};

/// The GELF version we speak
pub const GELF_VERSION: &str = "1.1";

/// Top-level names reserved by GELF; entry fields with these names are not prefixed
pub const PROTECTED_FIELDS: [&str; 6] = [
    "version",
    "host",
    "short_message",
    "full_message",
    "timestamp",
    "level",
];

pub fn is_protected(name: &str) -> bool {
    PROTECTED_FIELDS.contains(&name)
}

/// Seconds since the epoch, as GELF wants them.
///
/// The whole & fractional parts are converted separately; converting the instant as a whole in
/// one go would drop nanoseconds at today's epoch offsets before the addition gets a chance to
/// round.
pub fn to_timestamp(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 / 1e9
}

/// Attempt to figure-out a hostname for the `host` field.
///
/// Tries [gethostname()] first, then the IP address of the primary local interface; failing both
/// it settles for "localhost".
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
fn discover_hostname() -> String {
    hostname::get()
        .ok()
        .map(|hn| hn.to_string_lossy().into_owned())
        .filter(|hn| !hn.is_empty())
        .or_else(|| local_ip_address::local_ip().ok().map(|ip| ip.to_string()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// A formatter that produces GELF 1.1 documents.
///
/// Configuration is fixed at construction; [`GelfFormatter::format`] takes `&self` & keeps all of
/// its working state on the stack, so a single instance may be shared freely between threads.
pub struct GelfFormatter {
    hostname: String,
    default_level: Level,
    locator: Box<dyn CallerLocator>,
}

impl std::default::Default for GelfFormatter {
    fn default() -> Self {
        GelfFormatter {
            hostname: discover_hostname(),
            default_level: Level::default(),
            locator: Box::new(BacktraceLocator::default()),
        }
    }
}

impl std::fmt::Debug for GelfFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GelfFormatter")
            .field("hostname", &self.hostname)
            .field("default_level", &self.default_level)
            .finish_non_exhaustive()
    }
}

pub struct GelfFormatterBuilder {
    imp: GelfFormatter,
}

impl GelfFormatterBuilder {
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.imp.hostname = hostname.into();
        self
    }
    /// The [`Level`] used for severities outside the fixed mapping
    pub fn default_level(mut self, level: Level) -> Self {
        self.imp.default_level = level;
        self
    }
    pub fn caller_locator<L: CallerLocator + 'static>(mut self, locator: L) -> Self {
        self.imp.locator = Box::new(locator);
        self
    }
    /// Never look for `_file` & `_line` beyond what the [`Entry`] itself carries
    pub fn without_caller(self) -> Self {
        self.caller_locator(NoCaller)
    }
    pub fn build(self) -> GelfFormatter {
        self.imp
    }
}

impl GelfFormatter {
    /// A formatter that reports `hostname` (which is taken as-is, even if empty) in the `host`
    /// field
    pub fn new<S: Into<String>>(hostname: S) -> GelfFormatter {
        GelfFormatter {
            hostname: hostname.into(),
            default_level: Level::default(),
            locator: Box::new(BacktraceLocator::default()),
        }
    }
    pub fn builder() -> GelfFormatterBuilder {
        GelfFormatterBuilder {
            imp: GelfFormatter::default(),
        }
    }
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
    pub fn default_level(&self) -> Level {
        self.default_level
    }
    /// The syslog [`Level`] `entry` will be reported at
    pub fn level_for(&self, entry: &Entry) -> Level {
        entry.severity.to_syslog().unwrap_or(self.default_level)
    }

    /// Format `entry` as a newline-terminated GELF document.
    #[inline(never)]
    pub fn format(&self, entry: &Entry) -> Result<Vec<u8>> {
        let caller = self.caller_of(entry);
        let mut buf = Vec::with_capacity(256);
        self.write_document(entry, caller, &mut buf)?;
        Ok(buf)
    }

    /// Format `entry` as a newline-terminated GELF document, appending it to `buf`.
    ///
    /// On error `buf` is left as it was found.
    #[inline(never)]
    pub fn format_into(&self, entry: &Entry, buf: &mut Vec<u8>) -> Result<()> {
        let caller = self.caller_of(entry);
        self.write_document(entry, caller, buf)
    }

    /// Assemble the GELF document for `entry` without serializing it.
    ///
    /// The formatter's own fields go in first & the entry's fields are then merged in ascending
    /// key order, so when a (prefixed) entry field lands on one of ours, e.g. a `level_name` field
    /// on `_level_name`, the entry's value is the one that survives.
    pub fn document(&self, entry: &Entry, caller: Option<Caller>) -> Map<String, Value> {
        let level = self.level_for(entry);
        let mut doc = Map::new();
        doc.insert("version".to_string(), Value::from(GELF_VERSION));
        doc.insert("host".to_string(), Value::from(self.hostname.as_str()));
        doc.insert(
            "short_message".to_string(),
            Value::from(entry.message.as_str()),
        );
        doc.insert("level".to_string(), Value::from(level as u8));
        doc.insert(
            "timestamp".to_string(),
            Value::from(to_timestamp(&entry.timestamp)),
        );
        doc.insert("_level_name".to_string(), Value::from(level.name()));
        if let Some(Caller { file, line }) = caller {
            doc.insert("_file".to_string(), Value::from(file));
            doc.insert("_line".to_string(), Value::from(line));
        }
        for (key, value) in &entry.fields {
            let key = if is_protected(key) {
                key.clone()
            } else {
                format!("_{}", key)
            };
            doc.insert(key, value.clone());
        }
        doc
    }

    fn caller_of(&self, entry: &Entry) -> Option<Caller> {
        entry.caller.clone().or_else(|| self.locator.locate())
    }

    fn write_document(
        &self,
        entry: &Entry,
        caller: Option<Caller>,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        let mark = buf.len();
        serde_json::to_writer(&mut *buf, &self.document(entry, caller)).map_err(|err| {
            buf.truncate(mark);
            Error::serialize(err)
        })?;
        buf.put_u8(b'\n');
        Ok(())
    }
}
