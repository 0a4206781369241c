//! Recurring series: per-period materialization, forward timelines, and occurrence edits.

pub mod editor;
pub mod materializer;
pub mod timeline;

pub use editor::{OccurrenceEditor, OccurrencePatch, OccurrenceResolution};
pub use materializer::{month_view, occurrences_in_period, MonthEntry, Occurrence, RecurringSeries};
pub use timeline::{occurrence_timeline, OccurrenceTimeline};
