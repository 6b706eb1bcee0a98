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

//! Format structured log records as [GELF] documents, and a [`tracing-subscriber`] [`Layer`] that
//! does so for [`tracing`] [`Event`]s.
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//!
//! # Introduction
//!
//! The Graylog Extended Log Format is a JSON schema for log messages: a handful of reserved
//! top-level fields (`version`, `host`, `short_message`, `timestamp`, `level`...) plus any number
//! of "additional" fields, which must be named with a leading underscore. The `level` field is a
//! syslog severity, from `0` (emergency) to `7` (debug).
//!
//! Producing such a document from a log record comes down to three things:
//!
//! 1. mapping the logging framework's notion of severity onto syslog's
//!
//! 2. merging the record's key/value pairs into the document without trampling the reserved names
//!
//! 3. serializing the lot as a single line of JSON
//!
//! [`GelfFormatter`](formatter::GelfFormatter) does all three for an
//! [`Entry`](entry::Entry). It performs no I/O; getting the bytes to a Graylog input is the job of
//! whatever consumes them.
//!
//! # Usage
//!
//! Stand-alone:
//!
//! ```rust
//! use gelf_tracing::{entry::Entry, formatter::GelfFormatter, level::Severity};
//!
//! let f = GelfFormatter::new("testhost");
//! let entry = Entry::new(Severity::INFO, "great test message")
//!     .with_value("foo", "bar".into());
//! let buf = f.format(&entry).unwrap();
//! assert_eq!(buf.last(), Some(&b'\n'));
//! ```
//!
//! will produce something like:
//!
//! ```text
//! {"_file":"...","_foo":"bar","_level_name":"INFORMATIONAL","_line":7,"host":"testhost","level":6,"short_message":"great test message","timestamp":1700000000.1234567,"version":"1.1"}
//! ```
//!
//! With [`tracing`], [`Layer`](layer::Layer) comes with sane defaults: it discovers the local
//! hostname & writes to `stdout`:
//!
//! ```rust
//! use tracing::info;
//! use gelf_tracing::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let subscriber = Registry::default().with(Layer::default().with_target(true));
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!(foo = "bar", "Hello, world!");
//! ```

pub mod caller;
pub mod entry;
pub mod error;
pub mod formatter;
pub mod layer;
pub mod level;
