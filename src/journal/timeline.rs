// Pure projections over saved posts: the history view grouped by day
// and the month grid for the calendar view. No I/O here; the routes
// fetch rows and hand them in.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::journal::model::{CalendarDay, Post, PostsByDate};

/// Groups posts by diary day, newest day first. Within a day the input
/// order is kept, so callers that fetch `date DESC, author ASC` get
/// father before mother. Days without posts simply do not appear.
pub fn group_by_date(posts: Vec<Post>) -> Vec<PostsByDate> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Post>> = BTreeMap::new();
    for post in posts {
        grouped.entry(post.date).or_default().push(post);
    }
    grouped
        .into_iter()
        .rev()
        .map(|(date, posts)| PostsByDate { date, posts })
        .collect()
}

/// Builds the cell list for one month: blank leading cells up to the
/// weekday of the first (Sunday-started weeks), then one cell per day
/// carrying that day's posts. Posts outside the month are ignored.
/// An impossible year/month yields an empty grid.
pub fn month_grid(year: i32, month: u32, posts: &[Post]) -> Vec<CalendarDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let mut days = Vec::new();
    for _ in 0..first.weekday().num_days_from_sunday() {
        days.push(CalendarDay { date: None, posts: Vec::new() });
    }

    let mut current = first;
    loop {
        days.push(CalendarDay {
            date: Some(current),
            posts: posts.iter().filter(|p| p.date == current).cloned().collect(),
        });
        match current.succ_opt() {
            Some(next) if next.month() == month => current = next,
            _ => break,
        }
    }
    days
}

/// First and last day of a month, for range queries behind the grid.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = next_month(year, month);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

/// Month navigation with year rollover, December to January and back.
pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
