//! Listing metadata derived from content records: read time, sort order, categories.

use crate::frontmatter::split_frontmatter;
use crate::models::{ContentRecord, ReadTime};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;

pub const CJK_CHARS_PER_MINUTE: u64 = 300;
pub const WORDS_PER_MINUTE: u64 = 200;

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Estimated minutes to read a body.
///
/// CJK ideographs and space-separated words are counted separately and
/// read at their own rates; the summed minutes round up and never drop
/// below one.
pub fn read_time_minutes(body: &str) -> ReadTime {
    let (_, body) = split_frontmatter(body);

    let mut cjk: u64 = 0;
    let mut words: u64 = 0;
    let mut in_word = false;
    for c in body.chars() {
        if is_cjk_ideograph(c) {
            cjk += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            words += 1;
            in_word = true;
        }
    }

    // cjk/300 + words/200 over a common denominator of 600
    let weighted = cjk * (600 / CJK_CHARS_PER_MINUTE) + words * (600 / WORDS_PER_MINUTE);
    let minutes = weighted.div_ceil(600).max(1);
    ReadTime(u32::try_from(minutes).unwrap_or(u32::MAX))
}

/// Read time formatted for display, e.g. "3 min read"
pub fn derive_read_time(body: &str) -> String {
    read_time_minutes(body).to_string()
}

/// Parse a front matter date; anything unrecognised is the epoch
pub fn parse_date(date: &str) -> DateTime<Utc> {
    let date = date.trim();
    if date.is_empty() {
        return DateTime::<Utc>::UNIX_EPOCH;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return dt.with_timezone(&Utc);
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, fmt) {
            return dt.and_utc();
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date, fmt) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return dt.and_utc();
            }
        }
    }

    tracing::debug!("Unparsable date {:?}, sorting as oldest", date);
    DateTime::<Utc>::UNIX_EPOCH
}

/// Sort key for a record: its publication timestamp
pub fn sort_key(record: &ContentRecord) -> DateTime<Utc> {
    parse_date(&record.date)
}

/// Stable newest-first ordering by a date accessor
pub fn sort_newest_first<T, F>(items: &mut [T], date_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| std::cmp::Reverse(parse_date(date_of(item))));
}

/// Distinct categories in first-seen order
pub fn collect_categories<'a, I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str, category: &str) -> ContentRecord {
        ContentRecord {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            category: category.into(),
            date: date.into(),
            raw_body: String::new(),
        }
    }

    #[test]
    fn test_read_time_is_at_least_one() {
        assert_eq!(read_time_minutes("").minutes(), 1);
        assert_eq!(read_time_minutes("   \n\n").minutes(), 1);
        assert_eq!(read_time_minutes("one word").minutes(), 1);
    }

    #[test]
    fn test_read_time_latin_words() {
        let body = "word ".repeat(200);
        assert_eq!(read_time_minutes(&body).minutes(), 1);
        let body = "word ".repeat(201);
        assert_eq!(read_time_minutes(&body).minutes(), 2);
    }

    #[test]
    fn test_read_time_cjk_chars() {
        let body = "字".repeat(300);
        assert_eq!(read_time_minutes(&body).minutes(), 1);
        let body = "字".repeat(600);
        assert_eq!(read_time_minutes(&body).minutes(), 2);
    }

    #[test]
    fn test_read_time_mixed_sums_rates() {
        // 150 chars = 0.5 min, 100 words = 0.5 min
        let body = format!("{} {}", "字".repeat(150), "word ".repeat(100));
        assert_eq!(read_time_minutes(&body).minutes(), 1);
        // one extra word tips it over
        let body = format!("{} {}", "字".repeat(150), "word ".repeat(101));
        assert_eq!(read_time_minutes(&body).minutes(), 2);
    }

    #[test]
    fn test_cjk_splits_words() {
        // "abc字def" is two latin words around one ideograph
        let body = "abc字def ".repeat(200);
        // 200 chars (0.67) + 400 words (2.0) = 2.67
        assert_eq!(read_time_minutes(&body).minutes(), 3);
    }

    #[test]
    fn test_read_time_ignores_frontmatter() {
        let body = format!("---\ntitle: {}\n---\nhello", "word ".repeat(500));
        assert_eq!(derive_read_time(&body), "1 min read");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-06-01").to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(parse_date("2024/06/01").to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(
            parse_date("2024-06-01 08:30").to_rfc3339(),
            "2024-06-01T08:30:00+00:00"
        );
        assert_eq!(
            parse_date("2024-06-01T08:30:00+02:00").to_rfc3339(),
            "2024-06-01T06:30:00+00:00"
        );
        assert_eq!(parse_date(""), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_date("someday"), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_sort_newest_first_empty_date_last() {
        let mut records = vec![
            record("old", "2023-01-01", "a"),
            record("undated", "", "a"),
            record("new", "2024-06-01", "a"),
        ];
        sort_newest_first(&mut records, |r| r.date.as_str());

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert!(sort_key(&records[0]) > sort_key(&records[2]));
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let mut records = vec![record("x", "", "a"), record("y", "nope", "a"), record("z", "", "a")];
        sort_newest_first(&mut records, |r| r.date.as_str());
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_collect_categories() {
        let records = vec![
            record("a", "", "技术"),
            record("b", "", "生活"),
            record("c", "", "技术"),
        ];
        let categories = collect_categories(records.iter().map(|r| r.category.as_str()));
        assert_eq!(categories, vec!["技术", "生活"]);
    }
}
