//! String format checks.
//!
//! Each format is a cheap syntactic gate, not a full standards validator:
//! `date` does no calendar math, `email` is a pragmatic pattern, `idn-email`
//! only demands exactly one `@`. IP formats lean on `std::net` parsing, the
//! rest are anchored regexes compiled once.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrFormat {
    Date,
    DateTime,
    Duration,
    Email,
    IdnEmail,
    Hostname,
    Ipv4,
    Ipv6,
    RegexSyntax,
    Time,
    Uri,
    Uuid,
}

static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?$").unwrap());

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}[Tt]([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)$",
    )
    .unwrap()
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});

static URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S+$").unwrap());

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// ISO-8601 duration grammar. Written procedurally: the natural regex needs a
/// lookahead ("P alone is not a duration") that the `regex` crate rejects.
fn is_duration(s: &str) -> bool {
    let Some(mut rest) = s.strip_prefix('P') else { return false };
    if rest.is_empty() {
        return false;
    }

    // Whole-week form stands alone.
    if let Some(w) = rest.strip_suffix('W') {
        return !w.is_empty() && w.bytes().all(|b| b.is_ascii_digit());
    }

    fn eat_components(s: &str, units: &[char], fraction_on_last: bool) -> Option<usize> {
        let mut consumed = 0;
        let bytes = s.as_bytes();
        for (unit_idx, unit) in units.iter().enumerate() {
            let start = consumed;
            let mut i = consumed;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == start {
                continue; // component absent
            }
            // Optional fraction, only legal on the final unit (seconds).
            if fraction_on_last && unit_idx == units.len() - 1 && i < bytes.len() && bytes[i] == b'.'
            {
                let frac_start = i + 1;
                let mut j = frac_start;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j == frac_start {
                    return None;
                }
                i = j;
            }
            if i < bytes.len() && s[i..].starts_with(*unit) {
                consumed = i + unit.len_utf8();
            }
            // Digits not followed by this unit: leave them for the next one.
        }
        Some(consumed)
    }

    let date_len = match eat_components(rest, &['Y', 'M', 'D'], false) {
        Some(n) => n,
        None => return false,
    };
    let mut any = date_len > 0;
    rest = &rest[date_len..];

    if let Some(time_part) = rest.strip_prefix('T') {
        if time_part.is_empty() {
            return false;
        }
        let time_len = match eat_components(time_part, &['H', 'M', 'S'], true) {
            Some(n) => n,
            None => return false,
        };
        if time_len != time_part.len() || time_len == 0 {
            return false;
        }
        any = true;
        rest = "";
    }

    any && rest.is_empty()
}

impl StrFormat {
    /// Name reported in `invalid_string` issues and descriptors.
    pub fn name(&self) -> &'static str {
        match self {
            StrFormat::Date => "date",
            StrFormat::DateTime => "date-time",
            StrFormat::Duration => "duration",
            StrFormat::Email => "email",
            StrFormat::IdnEmail => "idn-email",
            StrFormat::Hostname => "hostname",
            StrFormat::Ipv4 => "ipv4",
            StrFormat::Ipv6 => "ipv6",
            StrFormat::RegexSyntax => "regex",
            StrFormat::Time => "time",
            StrFormat::Uri => "uri",
            StrFormat::Uuid => "uuid",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "date" => StrFormat::Date,
            "date-time" => StrFormat::DateTime,
            "duration" => StrFormat::Duration,
            "email" => StrFormat::Email,
            "idn-email" => StrFormat::IdnEmail,
            "hostname" => StrFormat::Hostname,
            "ipv4" => StrFormat::Ipv4,
            "ipv6" => StrFormat::Ipv6,
            "regex" => StrFormat::RegexSyntax,
            "time" => StrFormat::Time,
            "uri" => StrFormat::Uri,
            "uuid" => StrFormat::Uuid,
            _ => return None,
        })
    }

    pub fn check(&self, s: &str) -> bool {
        match self {
            StrFormat::Date => DATE.is_match(s),
            StrFormat::DateTime => DATE_TIME.is_match(s),
            StrFormat::Duration => is_duration(s),
            StrFormat::Email => EMAIL.is_match(s),
            StrFormat::IdnEmail => {
                let mut parts = s.splitn(3, '@');
                matches!(
                    (parts.next(), parts.next(), parts.next()),
                    (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
                )
            }
            StrFormat::Hostname => s.len() <= 253 && HOSTNAME.is_match(s),
            StrFormat::Ipv4 => s.parse::<std::net::Ipv4Addr>().is_ok(),
            StrFormat::Ipv6 => s.parse::<std::net::Ipv6Addr>().is_ok(),
            StrFormat::RegexSyntax => Regex::new(s).is_ok(),
            StrFormat::Time => TIME.is_match(s),
            StrFormat::Uri => URI.is_match(s),
            StrFormat::Uuid => UUID.is_match(s),
        }
    }
}
