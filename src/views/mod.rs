//! Derived views over loaded tables
//!
//! Every function here is pure: it takes loaded tables and returns plain
//! serialisable values for a presentation layer. Nothing touches the store.

mod correlation;
mod frequency;
mod summary;
mod timeline;

pub use correlation::{correlate, pearson, Alignment, CorrelationPair, CorrelationView, JoinedRow};
pub use frequency::{top_n, value_counts, ValueCount};
pub use summary::{summarize, ColumnStats, ColumnSummary, NumericSummary, StreamSummary};
pub use timeline::{daily_counts, time_series, DailyCount, TimePoint, TimeSeries};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::reader::{parse_stream, LoadPolicy};
    use crate::table::Table;
    use crate::types::StreamKind;

    /// Build a table from stream file text
    pub fn table(stream: StreamKind, content: &str) -> Table {
        parse_stream(stream, content, LoadPolicy::Strict)
            .unwrap()
            .table
    }
}
