//! Text helpers shared by the job and blog pages: slugs, tags, dates,
//! previews and markdown rendering.

use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use time::{macros::format_description, Date, OffsetDateTime};

lazy_static! {
    static ref NON_SLUG_RE: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref MARKUP_RE: Regex = Regex::new(r"[#_*`>]").unwrap();
}

const PREVIEW_CHARS: usize = 200;
pub const MISSING: &str = "—";

/// URL-safe identifier derived from a title. Idempotent.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Append a trimmed tag unless it is empty or already present.
/// Returns whether the tag was added.
pub fn add_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    let tag = raw.trim();
    if tag.is_empty() || tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

/// Normalize a submitted tag list: trimmed, non-empty, first occurrence wins.
pub fn dedupe_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Vec::new();
    for t in raw {
        add_tag(&mut tags, t.as_ref());
    }
    tags
}

/// Long-form date, e.g. `October 19, 2026`.
pub fn format_date(ts: OffsetDateTime) -> String {
    format_day(ts.date())
}

pub fn format_day(date: Date) -> String {
    date.format(format_description!("[month repr:long] [day padding:none], [year]"))
        .unwrap_or_else(|_| MISSING.to_string())
}

/// `YYYY-MM-DD` of a timestamp.
pub fn iso_day(ts: OffsetDateTime) -> String {
    ts.date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Reformat a stored `YYYY-MM-DD` value; anything unparsable shows as missing.
pub fn format_iso_day(raw: Option<&str>) -> String {
    raw.and_then(|s| Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok())
        .map(format_day)
        .unwrap_or_else(|| MISSING.to_string())
}

/// Card excerpt: markdown punctuation stripped, first 200 characters, `...`.
pub fn preview(content: &str) -> String {
    let plain = MARKUP_RE.replace_all(content, "");
    let mut out: String = plain.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// Split a comma-delimited skills field into trimmed, non-empty entries.
pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `$85,000`, or the missing marker for a zero or negative salary.
pub fn format_salary(salary: f64) -> String {
    if !salary.is_finite() || salary <= 0.0 {
        return MISSING.to_string();
    }
    let whole = salary.round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

/// Render GitHub-flavored markdown to HTML. Raw HTML passes through, so
/// sections authored as HTML render unchanged.
pub fn render_markdown(src: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_FOOTNOTES);
    let parser = Parser::new_ext(src, opts);
    let mut out = String::with_capacity(src.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Initials for an avatar fallback: first letter of each word, upper-cased.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & Axum: 2024 Edition  "), "rust-axum-2024-edition");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in ["Hello, World!", "Ünïcode Títle", "a--b__c", "already-a-slug", ""] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not idempotent for {title:?}");
        }
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = dedupe_tags(["rust", " rust ", "", "axum", "  "]);
        assert_eq!(tags, vec!["rust", "axum"]);

        let mut tags = tags;
        assert!(!add_tag(&mut tags, "axum"));
        assert!(add_tag(&mut tags, "sqlx"));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn dates_render_long_form() {
        assert_eq!(format_date(datetime!(2026-10-19 08:30 UTC)), "October 19, 2026");
        assert_eq!(format_date(datetime!(2025-03-05 00:00 UTC)), "March 5, 2025");
        assert_eq!(iso_day(datetime!(2025-03-05 23:59 UTC)), "2025-03-05");
    }

    #[test]
    fn iso_days_tolerate_garbage() {
        assert_eq!(format_iso_day(Some("2026-01-31")), "January 31, 2026");
        assert_eq!(format_iso_day(Some("next week")), MISSING);
        assert_eq!(format_iso_day(None), MISSING);
    }

    #[test]
    fn preview_strips_markup_and_truncates() {
        assert_eq!(preview("# Title\n**bold** `code`"), " Title\nbold code...");
        let long = "x".repeat(500);
        assert_eq!(preview(&long).chars().count(), 203);
    }

    #[test]
    fn skills_split_on_commas() {
        assert_eq!(split_skills("Rust, SQL,, Docker "), vec!["Rust", "SQL", "Docker"]);
        assert!(split_skills("").is_empty());
    }

    #[test]
    fn salary_grouping() {
        assert_eq!(format_salary(85000.0), "$85,000");
        assert_eq!(format_salary(1234567.0), "$1,234,567");
        assert_eq!(format_salary(999.0), "$999");
        assert_eq!(format_salary(0.0), MISSING);
    }

    #[test]
    fn markdown_renders_gfm() {
        let html = render_markdown("# Hi\n\n~~old~~ new\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn initials_from_display_name() {
        assert_eq!(initials("ada lovelace"), "AL");
        assert_eq!(initials("Anonymous"), "A");
        assert_eq!(initials(""), "");
    }
}
