//! UniFFI bindings for markdown-lists mobile apps
//!
//! Lets a Kotlin/Swift text widget forward its text-change callbacks to the
//! Rust list watcher. Positions crossing the boundary are UTF-16 code units,
//! which is what platform text widgets report.

use markdown_lists_engine::lists::{ListEditWatcher, ListPatterns};
use std::sync::Mutex;

uniffi::setup_scaffolding!();

// ============ Errors ============

/// Errors that can cross the FFI boundary
/// Note: Field is named `reason` not `message` to avoid conflict with Throwable.message in Kotlin
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("Invalid list pattern: {reason}")]
    InvalidPattern { reason: String },
}

// ============ Logging ============

/// Route engine logging to logcat on Android, stderr elsewhere.
///
/// Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("MarkdownLists"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .try_init();
    }
}

// ============ Watcher Handle ============

/// A list watcher attached to one text widget.
///
/// Call the three methods from the widget's before/on/after text-changed
/// callbacks, in that order, for every edit.
#[derive(uniffi::Object)]
pub struct ListWatcherHandle {
    inner: Mutex<ListEditWatcher>,
}

#[uniffi::export]
impl ListWatcherHandle {
    /// Create a watcher using the standard markdown list markers.
    #[uniffi::constructor]
    pub fn new(reorder_enabled: bool) -> Self {
        Self {
            inner: Mutex::new(ListEditWatcher::new(reorder_enabled)),
        }
    }

    /// Create a watcher with custom marker patterns (regex syntax).
    #[uniffi::constructor]
    pub fn with_patterns(
        reorder_enabled: bool,
        unordered_pattern: String,
        ordered_pattern: String,
    ) -> Result<Self, FfiError> {
        let patterns = ListPatterns::from_sources(&unordered_pattern, &ordered_pattern)
            .map_err(|e| FfiError::InvalidPattern {
                reason: e.to_string(),
            })?;

        Ok(Self {
            inner: Mutex::new(ListEditWatcher::new(reorder_enabled).with_patterns(patterns)),
        })
    }

    /// `count` UTF-16 units at `start` of `text` are about to be replaced.
    pub fn before_text_changed(&self, text: String, start: u32, count: u32) {
        let (start, count) = utf16_span_to_bytes(&text, start, count);
        // Recover from poisoned mutex (another thread panicked while holding lock)
        let mut watcher = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        watcher.before_change(&text, start, count);
    }

    /// `count` UTF-16 units of new text now sit at `start` of `text`.
    pub fn on_text_changed(&self, text: String, start: u32, count: u32) {
        let (start, count) = utf16_span_to_bytes(&text, start, count);
        let mut watcher = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        watcher.on_change(&text, start, count);
    }

    /// The edit is committed; returns the text the widget should now show.
    pub fn after_text_changed(&self, text: String) -> AfterChangeDto {
        let mut buffer = text.clone();
        let mut watcher = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let outcome = watcher.after_change(&mut buffer);

        let renumbered_from = outcome
            .renumbered_from
            .map(|offset| byte_to_utf16(&buffer, offset) as u32);

        AfterChangeDto {
            changed: buffer != text,
            text: buffer,
            renumbered_from,
        }
    }
}

// ============ DTOs ============

/// Result of the after-change phase.
#[derive(uniffi::Record, Debug, PartialEq)]
pub struct AfterChangeDto {
    /// Full text after list cleanup
    pub text: String,
    /// Whether `text` differs from what the widget passed in
    pub changed: bool,
    /// UTF-16 position renumbering started from, if it ran
    pub renumbered_from: Option<u32>,
}

// ============ Offset conversion ============

/// Byte offset of the UTF-16 position `offset` in `text`, rounded up to the
/// next char boundary and clamped to the text length.
fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= offset {
            return byte;
        }
        units += ch.len_utf16();
    }
    text.len()
}

fn byte_to_utf16(text: &str, offset: usize) -> usize {
    text.char_indices()
        .take_while(|(byte, _)| *byte < offset)
        .map(|(_, ch)| ch.len_utf16())
        .sum()
}

fn utf16_span_to_bytes(text: &str, start: u32, count: u32) -> (usize, usize) {
    let start_byte = utf16_to_byte(text, start as usize);
    let end_byte = utf16_to_byte(text, start as usize + count as usize);
    (start_byte, end_byte - start_byte)
}
