use std::borrow::Cow;
use std::ops::Range;

use xi_rope::delta::{Builder, Transformer};
use xi_rope::{Delta, RopeInfo};

use crate::editing::buffer::{TextBuffer, clamp_range, line_start, next_non_whitespace};
use crate::lists::patterns::{ListPatterns, PreviousLine};
use crate::lists::renumber::{OrderedListRenumberer, Renumberer};

/// What the after-change phase did to the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Ranges removed, in the order applied. Each range is expressed in the
    /// buffer as it was after the preceding deletions.
    pub deleted: Vec<Range<usize>>,
    /// Position handed to the renumberer, if it ran
    pub renumbered_from: Option<usize>,
    /// Splices made by the renumberer, in the order applied
    pub rewritten: Vec<Rewrite>,
}

/// One splice made while renumbering: `range` of the buffer as it was just
/// before the splice now holds `len` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub range: Range<usize>,
    pub len: usize,
}

impl ChangeOutcome {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.renumbered_from.is_none() && self.rewritten.is_empty()
    }
}

/// Per-batch state, rebuilt by every `before_change`.
#[derive(Debug, Default)]
struct Batch {
    contains_newline: bool,
    reorder_position: usize,
    pending_deletions: Vec<Range<usize>>,
}

/// Watches edits to a markdown buffer and tidies up list items.
///
/// The host calls the three phases in order for every edit batch:
///
/// 1. [`before_change`](Self::before_change) with the range about to be replaced
/// 2. [`on_change`](Self::on_change) with the range of the new text, once spliced in
/// 3. [`after_change`](Self::after_change) once the edit is committed
///
/// Pressing enter on an empty item (`"- "`, `"1. "`) marks that line for
/// deletion in the on-change phase; the after-change phase removes it. When a
/// newline was inserted or removed and reordering is enabled, the after-change
/// phase also asks the [`Renumberer`] to fix ordered-list numbering.
pub struct ListEditWatcher {
    reorder_enabled: bool,
    patterns: ListPatterns,
    renumberer: Box<dyn Renumberer + Send>,
    batch: Batch,
}

impl ListEditWatcher {
    pub fn new(reorder_enabled: bool) -> Self {
        Self {
            reorder_enabled,
            patterns: ListPatterns::default(),
            renumberer: Box::new(OrderedListRenumberer),
            batch: Batch::default(),
        }
    }

    pub fn with_patterns(mut self, patterns: ListPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_renumberer<R>(mut self, renumberer: R) -> Self
    where
        R: Renumberer + Send + 'static,
    {
        self.renumberer = Box::new(renumberer);
        self
    }

    pub fn reorder_enabled(&self) -> bool {
        self.reorder_enabled
    }

    /// Ranges currently marked for deletion in this batch
    pub fn pending_deletions(&self) -> &[Range<usize>] {
        &self.batch.pending_deletions
    }

    /// Position the renumberer would start from in this batch
    pub fn reorder_position(&self) -> usize {
        self.batch.reorder_position
    }

    pub fn newline_in_batch(&self) -> bool {
        self.batch.contains_newline
    }

    /// `count` bytes starting at `start` are about to be replaced.
    pub fn before_change(&mut self, buffer: &dyn TextBuffer, start: usize, count: usize) {
        self.batch = Batch {
            contains_newline: contains_newline(buffer, start, count),
            reorder_position: start,
            pending_deletions: Vec::new(),
        };
    }

    /// `count` bytes of new text now sit at `start`.
    pub fn on_change(&mut self, buffer: &dyn TextBuffer, start: usize, count: usize) {
        self.batch.contains_newline |= contains_newline(buffer, start, count);

        if count == 0 || start >= buffer.len() || buffer.char_at(start) != Some('\n') {
            return;
        }

        let line = line_start(buffer, start);
        let content = next_non_whitespace(buffer, line, start);
        let previous_line = buffer.slice(content..start);

        match self.patterns.classify(&previous_line) {
            PreviousLine::EmptyItem => {
                log::debug!("empty list item before {start}, marking {line}..{}", start + 1);
                self.batch.pending_deletions.push(line..start + 1);
            }
            PreviousLine::OrderedItem => {
                self.batch.reorder_position = start;
            }
            PreviousLine::Other => {}
        }
    }

    /// The edit batch is committed; apply pending deletions and renumber.
    pub fn after_change(&mut self, buffer: &mut dyn TextBuffer) -> ChangeOutcome {
        let mut outcome = ChangeOutcome::default();

        let mut pending = std::mem::take(&mut self.batch.pending_deletions);
        pending.sort_by_key(|range| (range.start, range.end));

        while !pending.is_empty() {
            let range = pending.remove(0);
            if range.start >= range.end || range.end > buffer.len() {
                continue;
            }

            let delta = deletion_delta(buffer.len(), range.clone());
            buffer.delete(range.clone());
            shift_ranges(&mut pending, &delta);
            outcome.deleted.push(range);
        }

        let position = self.batch.reorder_position;
        if self.reorder_enabled
            && self.batch.contains_newline
            && position > 0
            && position < buffer.len()
        {
            log::debug!("renumbering ordered list from {position}");
            let mut recorder = RecordingBuffer {
                inner: buffer,
                rewrites: Vec::new(),
            };
            self.renumberer.renumber(&mut recorder, position);
            outcome.renumbered_from = Some(position);
            outcome.rewritten = recorder.rewrites;
        }

        outcome
    }
}

impl Default for ListEditWatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for ListEditWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEditWatcher")
            .field("reorder_enabled", &self.reorder_enabled)
            .field("patterns", &self.patterns)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

/// Passes edits through to the host buffer, noting each splice
struct RecordingBuffer<'a> {
    inner: &'a mut dyn TextBuffer,
    rewrites: Vec<Rewrite>,
}

impl TextBuffer for RecordingBuffer<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.inner.char_at(offset)
    }

    fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        self.inner.slice(range)
    }

    fn splice(&mut self, range: Range<usize>, text: &str) {
        let range = clamp_range(range, self.inner.len());
        self.inner.splice(range.clone(), text);
        self.rewrites.push(Rewrite {
            range,
            len: text.len(),
        });
    }
}

fn contains_newline(buffer: &dyn TextBuffer, start: usize, count: usize) -> bool {
    let end = start.saturating_add(count).min(buffer.len());
    (start..end).any(|i| buffer.char_at(i) == Some('\n'))
}

fn deletion_delta(base_len: usize, range: Range<usize>) -> Delta<RopeInfo> {
    let mut builder = Builder::new(base_len);
    builder.delete(range);
    builder.build()
}

/// Move ranges through a deletion, dropping any that collapse
fn shift_ranges(ranges: &mut Vec<Range<usize>>, delta: &Delta<RopeInfo>) {
    let mut transformer = Transformer::new(delta);
    for range in ranges.iter_mut() {
        let start = transformer.transform(range.start, true);
        let end = transformer.transform(range.end, false);
        *range = start..end.max(start);
    }
    ranges.retain(|range| range.start < range.end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Drive one batch the way a text widget would for a replacement
    fn edit(
        watcher: &mut ListEditWatcher,
        buffer: &mut String,
        range: Range<usize>,
        text: &str,
    ) -> ChangeOutcome {
        watcher.before_change(buffer, range.start, range.len());
        buffer.replace_range(range.clone(), text);
        watcher.on_change(buffer, range.start, text.len());
        watcher.after_change(buffer)
    }

    fn recording_watcher(reorder_enabled: bool) -> (ListEditWatcher, Arc<Mutex<Vec<usize>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let watcher = ListEditWatcher::new(reorder_enabled).with_renumberer(
            move |_: &mut dyn TextBuffer, from: usize| {
                recorded.lock().unwrap().push(from);
            },
        );
        (watcher, calls)
    }

    #[test]
    fn test_enter_on_empty_bullet_removes_marker() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("- ");

        let outcome = edit(&mut watcher, &mut buffer, 2..2, "\n");

        assert_eq!(buffer, "");
        assert_eq!(outcome.deleted, vec![0..3]);
    }

    #[test]
    fn test_enter_on_empty_ordered_item_removes_marker() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("1. first\n2. ");

        let outcome = edit(&mut watcher, &mut buffer, 12..12, "\n");

        assert_eq!(buffer, "1. first\n");
        assert_eq!(outcome.deleted, vec![9..13]);
    }

    #[test]
    fn test_indented_empty_item_removes_whole_line() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("- a\n    - \n- b");

        edit(&mut watcher, &mut buffer, 10..10, "\n");

        assert_eq!(buffer, "- a\n\n- b");
    }

    #[test]
    fn test_enter_after_bullet_with_content_keeps_text() {
        let mut watcher = ListEditWatcher::new(true);
        let mut buffer = String::from("- item text");

        let outcome = edit(&mut watcher, &mut buffer, 11..11, "\n");

        assert_eq!(buffer, "- item text\n");
        assert!(outcome.deleted.is_empty());
    }

    #[test]
    fn test_enter_after_ordered_item_records_reorder_position() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("1. foo\n");

        watcher.before_change(&buffer, 6, 0);
        buffer.insert(6, '\n');
        watcher.on_change(&buffer, 6, 1);

        assert!(watcher.pending_deletions().is_empty());
        assert_eq!(watcher.reorder_position(), 6);
        assert!(watcher.newline_in_batch());

        let outcome = watcher.after_change(&mut buffer);
        assert_eq!(outcome.renumbered_from, Some(6));
        assert_eq!(*calls.lock().unwrap(), vec![6]);
    }

    #[test]
    fn test_reorder_disabled_never_renumbers() {
        let (mut watcher, calls) = recording_watcher(false);
        let mut buffer = String::from("1. foo\n");

        let outcome = edit(&mut watcher, &mut buffer, 6..6, "\n");

        assert_eq!(outcome.renumbered_from, None);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_batch_without_newline_is_a_noop() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("1. foo\n2. bar");

        let outcome = edit(&mut watcher, &mut buffer, 6..6, "d");

        assert!(outcome.is_noop());
        assert!(!watcher.newline_in_batch());
        assert_eq!(buffer, "1. food\n2. bar");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_count_change_produces_nothing() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("- \n");

        watcher.before_change(&buffer, 2, 0);
        watcher.on_change(&buffer, 2, 0);
        assert!(watcher.pending_deletions().is_empty());

        let outcome = watcher.after_change(&mut buffer);
        assert!(outcome.is_noop());
        assert_eq!(buffer, "- \n");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_start_at_buffer_end_is_ignored() {
        let mut watcher = ListEditWatcher::new(true);
        let buffer = String::from("- ");

        watcher.before_change(&buffer, 2, 0);
        watcher.on_change(&buffer, 2, 1);

        assert!(watcher.pending_deletions().is_empty());
    }

    #[test]
    fn test_deleting_a_newline_triggers_renumber() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("1. a\n2. b\n3. c");

        // Join the first two lines
        let outcome = edit(&mut watcher, &mut buffer, 4..5, "");

        assert_eq!(buffer, "1. a2. b\n3. c");
        assert_eq!(outcome.renumbered_from, Some(4));
        assert_eq!(*calls.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_renumber_splices_are_reported() {
        let mut watcher = ListEditWatcher::new(true);
        let mut buffer = String::from("1. a\n99. b\n100. c");

        let outcome = edit(&mut watcher, &mut buffer, 4..4, "\n2. ");

        assert_eq!(buffer, "1. a\n2. \n3. b\n4. c");
        assert_eq!(
            outcome.rewritten,
            vec![
                Rewrite {
                    range: 9..11,
                    len: 1
                },
                Rewrite {
                    range: 14..17,
                    len: 1
                },
            ]
        );
    }

    #[test]
    fn test_reorder_position_at_new_end_is_skipped() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("1. a\n");

        let outcome = edit(&mut watcher, &mut buffer, 4..5, "");

        assert_eq!(buffer, "1. a");
        assert_eq!(outcome.renumbered_from, None);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_newline_inside_paste_is_noticed_but_not_checked() {
        let (mut watcher, calls) = recording_watcher(true);
        let mut buffer = String::from("- \nend");

        // The newline lands after `start`, so no empty-item detection happens
        let outcome = edit(&mut watcher, &mut buffer, 2..2, "x\ny");

        assert!(outcome.deleted.is_empty());
        assert_eq!(buffer, "- x\ny\nend");
        assert_eq!(*calls.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_state_is_reset_between_batches() {
        let mut watcher = ListEditWatcher::new(true);
        let buffer = String::from("- \n");

        watcher.before_change(&buffer, 2, 0);
        watcher.on_change(&buffer, 2, 1);
        assert_eq!(watcher.pending_deletions(), &[0..3]);

        watcher.before_change(&buffer, 0, 0);
        assert!(watcher.pending_deletions().is_empty());
        assert!(!watcher.newline_in_batch());
    }

    #[test]
    fn test_multiple_marks_shift_through_earlier_deletions() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("- \n- \nkeep");
        watcher.before_change(&buffer, 0, 0);

        watcher.batch.pending_deletions = vec![3..6, 0..3];
        let outcome = watcher.after_change(&mut buffer);

        assert_eq!(buffer, "keep");
        assert_eq!(outcome.deleted, vec![0..3, 0..3]);
    }

    #[test]
    fn test_overlapping_marks_delete_each_byte_once() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("abcdefgh");
        watcher.before_change(&buffer, 0, 0);

        watcher.batch.pending_deletions = vec![1..4, 2..6];
        let outcome = watcher.after_change(&mut buffer);

        assert_eq!(buffer, "agh");
        assert_eq!(outcome.deleted, vec![1..4, 1..3]);
    }

    #[test]
    fn test_stale_mark_past_end_is_dropped() {
        let mut watcher = ListEditWatcher::new(false);
        let mut buffer = String::from("ab");
        watcher.before_change(&buffer, 0, 0);

        watcher.batch.pending_deletions = vec![1..10];
        let outcome = watcher.after_change(&mut buffer);

        assert_eq!(buffer, "ab");
        assert!(outcome.deleted.is_empty());
    }

    #[test]
    fn test_shift_ranges_drops_swallowed_range() {
        let delta = deletion_delta(10, 2..8);
        let mut ranges = vec![3..5, 8..10, 0..1];
        shift_ranges(&mut ranges, &delta);
        assert_eq!(ranges, vec![2..4, 0..1]);
    }
}
