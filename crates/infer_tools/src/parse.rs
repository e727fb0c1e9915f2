//! Line-oriented extraction of resource counts from place-and-route logs.
//!
//! Utilization summaries printed by place-and-route tools look like
//!
//! ```text
//! Info:           CPE_LT:    412/  20480     2%
//! ```
//!
//! Only lines ending in `%` are considered. A line is attributed to the first
//! keyword of the backend's table that it contains; the count is the field
//! following the keyword's `:`, cut at the first `/`, with thousands
//! separators removed.

use crate::report::ResourceReport;
use tracing::warn;

/// Maps a keyword found in a log line to the resource kind it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKeyword {
    /// Substring identifying the utilization line.
    pub keyword: &'static str,
    /// Resource kind stored in the report.
    pub kind: &'static str,
}

/// Returns true if `line` is a utilization line, i.e. ends with `%` once trimmed.
pub fn is_resource_line(line: &str) -> bool {
    line.trim().ends_with('%')
}

/// Extracts the count following `keyword` in a utilization line.
///
/// Returns `None` if the keyword is absent, no `:` follows it, or the field
/// is not a finite, non-negative number.
pub fn extract_resource_count(line: &str, keyword: &str) -> Option<f64> {
    let start = line.find(keyword)? + keyword.len();
    let (_, after_colon) = line[start..].split_once(':')?;
    let field = after_colon.split('/').next()?.trim().replace(',', "");
    field
        .parse::<f64>()
        .ok()
        .filter(|count| count.is_finite() && *count >= 0.0)
}

/// Parses a complete log into a report.
///
/// Every kind in `keywords` is present in the result; kinds not found in the
/// log stay at zero. A later line for the same keyword overwrites an earlier
/// one.
pub fn parse_resource_log(log: &str, keywords: &[ResourceKeyword]) -> ResourceReport {
    let mut report = ResourceReport::zeroed(keywords.iter().map(|k| k.kind));

    for line in log.lines() {
        if !is_resource_line(line) {
            continue;
        }
        let Some(entry) = keywords.iter().find(|k| line.contains(k.keyword)) else {
            continue;
        };
        match extract_resource_count(line, entry.keyword) {
            Some(count) => report.set(entry.kind, count),
            None => warn!(line = line.trim(), kind = entry.kind, "unparsable resource line"),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: &[ResourceKeyword] = &[
        ResourceKeyword {
            keyword: "RAM_HALF",
            kind: "RAM_HALF",
        },
        ResourceKeyword {
            keyword: "CPE_LT",
            kind: "CPE LT",
        },
    ];

    #[test]
    fn thousands_separator_is_stripped() {
        let line = "... RAM_HALF: 12,345 / 50000  24.7%";
        assert_eq!(extract_resource_count(line, "RAM_HALF"), Some(12345.0));
        let report = parse_resource_log(line, KEYWORDS);
        assert_eq!(report.get("RAM_HALF"), 12345.0);
    }

    #[test]
    fn log_prefix_with_colon() {
        let line = "Info:           CPE_LT:    412/  20480     2%";
        assert_eq!(extract_resource_count(line, "CPE_LT"), Some(412.0));
    }

    #[test]
    fn line_without_percent_is_ignored() {
        let log = "Info: RAM_HALF: 7/ 64 10\nInfo: CPE_LT: 3/ 100";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("RAM_HALF"), 0.0);
        assert_eq!(report.get("CPE LT"), 0.0);
    }

    #[test]
    fn trailing_whitespace_after_percent() {
        let log = "Info: CPE_LT: 9/ 100  9%   \n";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("CPE LT"), 9.0);
    }

    #[test]
    fn unknown_keyword_leaves_defaults() {
        let log = "Info: CPE_RAMIO: 25/ 100 25%\nInfo: GPIO: 4/ 162 2%";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report, ResourceReport::zeroed(["RAM_HALF", "CPE LT"]));
    }

    #[test]
    fn first_keyword_wins() {
        // A line naming both keywords is attributed to the first table entry.
        let log = "Info: RAM_HALF CPE_LT: 5/ 10 50%";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("RAM_HALF"), 5.0);
        assert_eq!(report.get("CPE LT"), 0.0);
    }

    #[test]
    fn unparsable_count_is_skipped() {
        let log = "Info: CPE_LT: n/a 0%";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("CPE LT"), 0.0);
    }

    #[test]
    fn negative_and_non_finite_counts_are_skipped() {
        for field in ["-3", "inf", "NaN", "-0.5"] {
            let line = format!("Info: CPE_LT: {field}/ 10 1%");
            assert_eq!(extract_resource_count(&line, "CPE_LT"), None, "{field}");
        }
        let log = "Info: CPE_LT: 4/ 10 40%\nInfo: CPE_LT: -3/ 10 1%";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("CPE LT"), 4.0);
    }

    #[test]
    fn later_line_overwrites() {
        let log = "Info: CPE_LT: 5/ 10 50%\nInfo: CPE_LT: 6/ 10 60%";
        let report = parse_resource_log(log, KEYWORDS);
        assert_eq!(report.get("CPE LT"), 6.0);
    }
}
