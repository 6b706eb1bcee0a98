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

//! [gelf-tracing](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] turns each [`tracing`] [`Event`] into an [`Entry`], formats it with a
//! [`GelfFormatter`] and writes the resulting line to a [`MakeWriter`]. Getting those lines to
//! Graylog (a sidecar tailing a file, a pipe into `nc -u`, ...) is left to the application.
//!
//! [`MakeWriter`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/trait.MakeWriter.html

use crate::{
    entry::{Caller, Entry},
    error::{Error, Result},
    formatter::GelfFormatter,
    level::Severity,
};

use serde_json::{Map, Value};
use tracing::{field::Field, Event, Metadata};
use tracing_subscriber::{fmt::MakeWriter, layer::Context};

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

/// Our own diagnostics are emitted on this target, and ignored when they come back around.
const SELF_TARGET: &str = module_path!();

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        field collection                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Gathers an [`Event`]'s fields: "message" is pulled out for `short_message`, everything else is
/// kept as JSON, as typed as [`tracing`] lets us see it.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        // `log` records bridged by tracing-log carry their metadata as `log.*` fields; it's
        // already been folded into the normalized metadata.
        #[cfg(feature = "tracing-log")]
        if field.name().starts_with("log.") {
            return;
        }
        self.fields.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros "pre-format" the `message` field, so that `value` refers to a
        // `std::fmt::Arguments` instance whose debug format has no enclosing double-quotes.
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, Value::from(format!("{:?}", value)));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that writes one GELF document per
/// [`Event`].
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
pub struct Layer<W = fn() -> std::io::Stdout> {
    formatter: GelfFormatter,
    make_writer: W,
    with_target: bool,
    with_module: bool,
}

/// A [`Layer`] that writes to `stdout`, reporting the local hostname.
///
/// The formatter does not walk the stack: [`tracing`] already knows every event's call site.
impl std::default::Default for Layer {
    fn default() -> Self {
        Layer::new(
            GelfFormatter::builder().without_caller().build(),
            std::io::stdout as fn() -> std::io::Stdout,
        )
    }
}

impl<W> Layer<W>
where
    W: for<'a> MakeWriter<'a>,
{
    /// construct Layer with custom inners
    pub fn new(formatter: GelfFormatter, make_writer: W) -> Self {
        Layer {
            formatter,
            make_writer,
            with_target: false,
            with_module: false,
        }
    }
    /// Construct a Layer with the default formatter that will write to `make_writer`
    pub fn with_writer(make_writer: W) -> Self {
        Layer::new(
            GelfFormatter::builder().without_caller().build(),
            make_writer,
        )
    }
    /// Report each event's target in a `_target` field
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
    /// Report each event's module path in a `_module` field
    pub fn with_module(mut self, with_module: bool) -> Self {
        self.with_module = with_module;
        self
    }
    pub fn formatter(&self) -> &GelfFormatter {
        &self.formatter
    }

    fn entry_for(&self, event: &Event<'_>, meta: &Metadata<'_>) -> Entry {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut entry = Entry::new(
            Severity::from(meta.level()),
            visitor.message.unwrap_or_default(),
        );
        entry.fields = visitor.fields;
        // Fields on the event itself take precedence.
        if self.with_target {
            entry
                .fields
                .entry("target")
                .or_insert_with(|| Value::from(meta.target()));
        }
        if let (true, Some(module)) = (self.with_module, meta.module_path()) {
            entry
                .fields
                .entry("module")
                .or_insert_with(|| Value::from(module));
        }
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            entry.caller = Some(Caller {
                file: file.to_string(),
                line,
            });
        }
        entry
    }

    fn emit(&self, entry: &Entry, meta: &Metadata<'_>) -> Result<()> {
        use std::io::Write;
        let buf = self.formatter.format(entry)?;
        self.make_writer
            .make_writer_for(meta)
            .write_all(&buf)
            .map_err(Error::write)
    }
}

/// The [`Layer`] implementation proper.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, W> tracing_subscriber::layer::Layer<S> for Layer<W>
where
    S: tracing::Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // When the tracing-log feature is enabled, use normalized_metadata() to get
        // file/line info for events that originated from the `log` crate.
        // For native tracing events, normalized_metadata() returns None and we use
        // the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        if meta.target() == SELF_TARGET {
            return;
        }

        let entry = self.entry_for(event, meta);
        self.emit(&entry, meta).unwrap_or_else(|err| {
            ::tracing::error!(target: SELF_TARGET, "gelf-tracing failed: {}", err);
        })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::level::Level;

    use std::sync::{Arc, Mutex};

    use tracing::Callsite;
    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    /// A [`MakeWriter`] collecting everything written through it
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = CaptureWriter;
        fn make_writer(&'a self) -> Self::Writer {
            CaptureWriter(self.0.clone())
        }
    }

    impl Capture {
        fn documents(&self) -> Vec<Map<String, Value>> {
            let buf = self.0.lock().unwrap();
            assert_eq!(buf.last(), Some(&b'\n'));
            buf.split(|b| *b == b'\n')
                .filter(|line| !line.is_empty())
                .map(|line| serde_json::from_slice(line).unwrap())
                .collect()
        }
    }

    /// A writer that always fails
    struct Broken;

    impl std::io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn formatter() -> GelfFormatter {
        GelfFormatter::builder()
            .hostname("testhost")
            .without_caller()
            .build()
    }

    #[test]
    fn test_events() {
        let capture = Capture::default();
        let subscriber =
            Registry::default().with(Layer::new(formatter(), capture.clone()).with_target(true));

        let line = tracing::subscriber::with_default(subscriber, || {
            let line = line!() + 1;
            tracing::info!(foo = "bar", count = 3, ratio = 0.25, ok = true, "great test message");
            tracing::trace!(target: "elsewhere", "too fine for syslog");
            tracing::error!(error = ?std::io::ErrorKind::NotFound, "something broke");
            line
        });

        let docs = capture.documents();
        assert_eq!(docs.len(), 3);

        let doc = &docs[0];
        assert_eq!(doc["version"], "1.1");
        assert_eq!(doc["host"], "testhost");
        assert_eq!(doc["short_message"], "great test message");
        assert_eq!(doc["level"], 6);
        assert_eq!(doc["_level_name"], "INFORMATIONAL");
        assert_eq!(doc["_foo"], "bar");
        assert_eq!(doc["_count"], 3);
        assert_eq!(doc["_ratio"], 0.25);
        assert_eq!(doc["_ok"], true);
        assert_eq!(doc["_target"], module_path!());
        assert_eq!(doc["_line"], line);
        assert!(doc["_file"].as_str().unwrap().ends_with("layer.rs"));
        assert!(!doc.contains_key("message"));
        assert!(!doc.contains_key("_message"));

        // TRACE has no syslog counterpart; it lands on the default level.
        let doc = &docs[1];
        assert_eq!(doc["short_message"], "too fine for syslog");
        assert_eq!(doc["level"], 6);
        assert_eq!(doc["_target"], "elsewhere");

        let doc = &docs[2];
        assert_eq!(doc["level"], 3);
        assert_eq!(doc["_level_name"], "ERROR");
        assert_eq!(doc["_error"], "NotFound");
    }

    #[test]
    fn test_default_level_and_module() {
        let capture = Capture::default();
        let f = GelfFormatter::builder()
            .hostname("testhost")
            .default_level(Level::LOG_DEBUG)
            .without_caller()
            .build();
        let subscriber = Registry::default().with(Layer::new(f, capture.clone()).with_module(true));

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!(module = "mine", "trace");
            tracing::warn!(host = "override", "warn");
        });

        let docs = capture.documents();
        assert_eq!(docs[0]["level"], 7);
        assert_eq!(docs[0]["_level_name"], "DEBUGGING");
        // The event's own field wins over the metadata.
        assert_eq!(docs[0]["_module"], "mine");
        assert_eq!(docs[1]["level"], 4);
        assert_eq!(docs[1]["_module"], module_path!());
        assert!(!docs[1].contains_key("_target"));
        // A reserved name is passed through, not prefixed.
        assert_eq!(docs[1]["host"], "override");
        assert!(!docs[1].contains_key("_host"));
    }

    #[test]
    fn test_write_failure_is_contained() {
        let layer = Layer::with_writer(|| Broken);
        assert!(!layer.formatter().hostname().is_empty());
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("into the void");
        });
    }

    // `tracing` internals are explicitly unstable, so this does just enough to hand-build an
    // Event with known metadata.

    struct TestCallsite {
        metadata: &'static tracing::Metadata<'static>,
    }
    impl tracing_core::callsite::Callsite for TestCallsite {
        fn set_interest(&self, _interest: tracing_core::subscriber::Interest) {}
        fn metadata(&self) -> &tracing::Metadata<'static> {
            self.metadata
        }
    }
    // Identifier needs a reference with 'static duration.
    impl TestCallsite {
        pub const fn new(metadata: &'static tracing::Metadata<'static>) -> TestCallsite {
            TestCallsite { metadata }
        }
    }

    #[test]
    #[allow(clippy::redundant_closure_call)]
    fn test_entry_for() {
        static CALLSITE: TestCallsite = {
            static METADATA: tracing::Metadata = tracing::Metadata::new(
                "test event metadata",
                "test-target",
                tracing::Level::WARN,
                Some("src/somewhere.rs"),
                Some(1234),
                Some("test_module"),
                tracing::field::FieldSet::new(
                    &["message"],
                    tracing_core::callsite::Identifier(&CALLSITE),
                ),
                tracing_core::metadata::Kind::EVENT,
            );
            TestCallsite::new(&METADATA)
        };

        let layer = Layer::new(formatter(), Capture::default())
            .with_target(true)
            .with_module(true);

        (|value_set: ::tracing::field::ValueSet| {
            let event = Event::new(CALLSITE.metadata(), &value_set);
            let entry = layer.entry_for(&event, CALLSITE.metadata());
            assert_eq!(entry.severity, Severity::WARN);
            assert_eq!(entry.message, "Hello, 世界!");
            assert_eq!(
                entry.caller,
                Some(Caller {
                    file: "src/somewhere.rs".to_string(),
                    line: 1234
                })
            );
            assert_eq!(entry.fields["target"], "test-target");
            assert_eq!(entry.fields["module"], "test_module");

            let rsp = layer.formatter().format(&entry).unwrap();
            let doc: Map<String, Value> = serde_json::from_slice(&rsp).unwrap();
            assert_eq!(doc["host"], "testhost");
            assert_eq!(doc["_target"], "test-target");
            assert_eq!(doc["_file"], "src/somewhere.rs");
            assert_eq!(doc["_line"], 1234);
            assert_eq!(doc["level"], 4);
        })(tracing::valueset!(
            CALLSITE.metadata().fields(),
            "{}",
            "Hello, 世界!"
        ));
    }
}
