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

//! The log record handed to [`GelfFormatter::format`](crate::formatter::GelfFormatter::format).

use crate::{
    error::{Error, Result},
    level::Severity,
};

use chrono::prelude::*;
use serde_json::{Map, Value};

/// Where in the source a log record was produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

/// A single structured log record: timestamp, severity, free-text message & an open-ended set of
/// named values.
///
/// Field values are held as [`serde_json::Value`]s; callers with richer types should go through
/// [`Entry::with_field`], which converts anything [`serde::Serialize`] up-front.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub fields: Map<String, Value>,
    /// Set by frameworks that know their call site (as [`tracing`] does); when `None` the
    /// formatter falls back to its [`CallerLocator`](crate::caller::CallerLocator).
    pub caller: Option<Caller>,
}

impl Entry {
    /// A new entry stamped with the current time, with no fields
    pub fn new<M: Into<String>>(severity: Severity, message: M) -> Entry {
        Entry {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            fields: Map::new(),
            caller: None,
        }
    }
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
    /// Insert a field whose value is already JSON; replaces any previous value under `key`
    pub fn with_value<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
    /// Insert an arbitrary serializable value under `key`.
    ///
    /// Fails with [`Error::Serialize`] if `value` has no JSON representation (a map keyed by
    /// something other than strings, say, or a `Serialize` implementation that errors out).
    pub fn with_field<K: Into<String>, T: serde::Serialize + ?Sized>(
        mut self,
        key: K,
        value: &T,
    ) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(Error::serialize)?;
        self.fields.insert(key.into(), value);
        Ok(self)
    }
}
