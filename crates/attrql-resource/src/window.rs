//! Composing slice bounds into a virtual `[low, high)` window.
//!
//! Bounds of a new slice are relative to the current window:
//!
//! ```text
//! high' = min(high, low + stop)
//! low'  = min(high', low + start)
//! ```
//!
//! so `c[a..b][c..d]` selects exactly what slicing the full result list
//! twice would.

use crate::error::{CollectionError, CollectionResult};
use attrql_reader::Paging;
use std::ops::{Bound, RangeBounds};

/// `(start, stop)` of a range; `None` where the range is open.
pub fn bounds(range: &impl RangeBounds<usize>) -> (Option<usize>, Option<usize>) {
    let start = match range.start_bound() {
        Bound::Included(&s) => Some(s),
        Bound::Excluded(&s) => Some(s.saturating_add(1)),
        Bound::Unbounded => None,
    };
    let stop = match range.end_bound() {
        Bound::Included(&e) => Some(e.saturating_add(1)),
        Bound::Excluded(&e) => Some(e),
        Bound::Unbounded => None,
    };
    (start, stop)
}

/// Narrow `paging` by a slice relative to it.
pub fn narrow(paging: Paging, start: Option<usize>, stop: Option<usize>) -> CollectionResult<Paging> {
    let (low, high) = match paging {
        Paging::Unbounded => (0, None),
        Paging::Window { low, high } => (low, high),
        Paging::LimitOffset { .. } => return Err(CollectionError::IncompatiblePaging),
    };

    let high = match stop {
        Some(stop) => {
            let candidate = low.saturating_add(stop);
            Some(high.map_or(candidate, |high| high.min(candidate)))
        }
        None => high,
    };
    let low = match start {
        Some(start) => {
            let candidate = low.saturating_add(start);
            high.map_or(candidate, |high| high.min(candidate))
        }
        None => low,
    };
    Ok(Paging::Window { low, high })
}

/// Clamp `(start, stop)` to a list of `len` items.
pub fn clamp(len: usize, start: Option<usize>, stop: Option<usize>) -> std::ops::Range<usize> {
    let stop = stop.map_or(len, |stop| stop.min(len));
    let start = start.unwrap_or(0).min(stop);
    start..stop
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_relative_to_the_current_window() {
        let once = narrow(Paging::Unbounded, Some(2), Some(10)).unwrap();
        assert_eq!(
            once,
            Paging::Window {
                low: 2,
                high: Some(10)
            }
        );
        let twice = narrow(once, Some(1), Some(4)).unwrap();
        assert_eq!(
            twice,
            Paging::Window {
                low: 3,
                high: Some(6)
            }
        );
    }

    #[test]
    fn start_past_the_window_collapses_it() {
        let window = Paging::Window {
            low: 2,
            high: Some(5),
        };
        assert_eq!(
            narrow(window, Some(7), None).unwrap(),
            Paging::Window {
                low: 5,
                high: Some(5)
            }
        );
    }

    #[test]
    fn open_windows_stay_open() {
        assert_eq!(
            narrow(Paging::Unbounded, Some(3), None).unwrap(),
            Paging::Window { low: 3, high: None }
        );
    }

    #[test]
    fn refuses_limit_offset() {
        let paging = Paging::LimitOffset {
            limit: Some(3),
            offset: None,
        };
        assert!(matches!(
            narrow(paging, Some(0), Some(1)),
            Err(CollectionError::IncompatiblePaging)
        ));
    }

    #[test]
    fn range_bounds_translate() {
        assert_eq!(bounds(&(2..5)), (Some(2), Some(5)));
        assert_eq!(bounds(&(2..=5)), (Some(2), Some(6)));
        assert_eq!(bounds(&(..)), (None, None));
        assert_eq!(clamp(4, Some(3), Some(9)), 3..4);
        assert_eq!(clamp(4, Some(6), None), 4..4);
    }
}
