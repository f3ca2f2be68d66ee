use crate::schema::DateRange;
use std::collections::BTreeMap;
use tracing::warn;

/// Slider marks keyed by position
pub type Marks = BTreeMap<i64, String>;

/// Upper limit on marks rendered for a single range control
pub const DEFAULT_MAX_RANGE_MARKS: usize = 10_000;

/// Label every integer in the inclusive `bound`. No bound means no marks.
pub fn build_marks(bound: Option<DateRange>) -> Marks {
    build_marks_capped(bound, usize::MAX)
}

/// Like [`build_marks`], but a range spanning more than `max_marks` integers
/// renders no marks at all.
pub fn build_marks_capped(bound: Option<DateRange>, max_marks: usize) -> Marks {
    let Some(range) = bound else {
        return Marks::new();
    };
    if range.is_inverted() {
        warn!("Ignoring inverted date range {range}");
        return Marks::new();
    }

    let span = i128::from(range.high()) - i128::from(range.low()) + 1;
    if !usize::try_from(span).is_ok_and(|span| span <= max_marks) {
        warn!("Date range {range} spans {span} values, over the {max_marks} mark limit");
        return Marks::new();
    }

    (range.low()..=range.high())
        .map(|value| (value, value.to_string()))
        .collect()
}
