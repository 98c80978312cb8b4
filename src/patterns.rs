//! Canonical value-shape patterns used by the Profiler (§4.1) to detect
//! regex-matched data shapes ahead of LLM classification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::DetectedPattern;

pub const UUID: &str = "uuid";
pub const STRIPE_ID: &str = "stripe_id";
pub const EMAIL: &str = "email";
pub const AWS_SES_EMAIL: &str = "aws_ses_email";
pub const TWILIO_SID: &str = "twilio_sid";
pub const ISO_4217: &str = "iso_4217";
pub const HTTP_URL: &str = "http_url";
pub const UNIX_SECONDS: &str = "unix_seconds";
pub const UNIX_MILLIS: &str = "unix_millis";
pub const UNIX_MICROS: &str = "unix_micros";
pub const UNIX_NANOS: &str = "unix_nanos";

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static STRIPE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(pi_|pm_|ch_|cus_|sub_|inv_|price_|prod_|txn_|re_|pout_|seti_|cs_)[A-Za-z0-9]+$",
    )
    .unwrap()
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// SES-style bounce/notification mailbox addresses, a narrower subset of
/// `EMAIL` used as an external-id witness (`bounces+` / `complaints+` local
/// parts on an amazonses.com-style domain).
static AWS_SES_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(bounces|complaints)\+[A-Za-z0-9._%+-]+@.+\.amazonses\.com$").unwrap()
});

static TWILIO_SID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(AC|SM|MM|PN|SK)[0-9a-fA-F]{32}$").unwrap());

static ISO_4217_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

static HTTP_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s]+$").unwrap());

static UNIX_SECONDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());
static UNIX_MILLIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13}$").unwrap());
static UNIX_MICROS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{16}$").unwrap());
static UNIX_NANOS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{19}$").unwrap());

/// One named pattern and the regex that backs it.
struct NamedPattern {
    name: &'static str,
    regex: &'static Lazy<Regex>,
}

const ALL_PATTERNS: &[NamedPattern] = &[
    NamedPattern { name: UUID, regex: &UUID_RE },
    NamedPattern { name: STRIPE_ID, regex: &STRIPE_ID_RE },
    NamedPattern { name: AWS_SES_EMAIL, regex: &AWS_SES_EMAIL_RE },
    NamedPattern { name: EMAIL, regex: &EMAIL_RE },
    NamedPattern { name: TWILIO_SID, regex: &TWILIO_SID_RE },
    NamedPattern { name: ISO_4217, regex: &ISO_4217_RE },
    NamedPattern { name: HTTP_URL, regex: &HTTP_URL_RE },
    NamedPattern { name: UNIX_SECONDS, regex: &UNIX_SECONDS_RE },
    NamedPattern { name: UNIX_MILLIS, regex: &UNIX_MILLIS_RE },
    NamedPattern { name: UNIX_MICROS, regex: &UNIX_MICROS_RE },
    NamedPattern { name: UNIX_NANOS, regex: &UNIX_NANOS_RE },
];

/// Runs every named pattern against `samples`, returning one `DetectedPattern`
/// per regex that matched at least one value (§4.1 step 3).
pub fn detect_patterns(samples: &[String]) -> Vec<DetectedPattern> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut detected = Vec::new();
    for pattern in ALL_PATTERNS {
        let matched: Vec<&String> = samples.iter().filter(|s| pattern.regex.is_match(s)).collect();
        if matched.is_empty() {
            continue;
        }
        let match_rate = matched.len() as f64 / samples.len() as f64;
        let matched_values = matched.into_iter().take(5).cloned().collect();
        detected.push(DetectedPattern { pattern_name: pattern.name, match_rate, matched_values });
    }
    detected
}

/// Digit-count → epoch scale, per §4.1's canonical-patterns table.
pub fn unix_scale_seconds_per_unit(pattern_name: &str) -> Option<f64> {
    match pattern_name {
        UNIX_SECONDS => Some(1.0),
        UNIX_MILLIS => Some(1e-3),
        UNIX_MICROS => Some(1e-6),
        UNIX_NANOS => Some(1e-9),
        _ => None,
    }
}

/// Decodes a digit-string epoch value at the given scale to a calendar
/// year, for the Unix-epoch routing sub-rule and its year-window guard.
pub fn decode_epoch_year(value: &str, pattern_name: &str) -> Option<i32> {
    let seconds_per_unit = unix_scale_seconds_per_unit(pattern_name)?;
    let raw: i64 = value.parse().ok()?;
    let epoch_seconds = raw as f64 * seconds_per_unit;
    chrono::DateTime::from_timestamp(epoch_seconds as i64, 0)
        .and_then(|dt| dt.format("%Y").to_string().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_uuid_pattern() {
        let samples = vec![
            "550e8400-e29b-41d4-a716-446655440000".to_string(),
            "not-a-uuid".to_string(),
        ];
        let detected = detect_patterns(&samples);
        let uuid = detected.iter().find(|p| p.pattern_name == UUID).unwrap();
        assert_eq!(uuid.match_rate, 0.5);
    }

    #[test]
    fn detects_iso_4217() {
        let samples = vec!["USD".to_string(), "EUR".to_string(), "usd".to_string()];
        let detected = detect_patterns(&samples);
        let currency = detected.iter().find(|p| p.pattern_name == ISO_4217).unwrap();
        assert!((currency.match_rate - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn no_match_yields_no_entry() {
        let samples = vec!["hello world".to_string()];
        let detected = detect_patterns(&samples);
        assert!(detected.iter().all(|p| p.pattern_name != UUID));
    }

    #[test]
    fn decodes_unix_seconds_to_year() {
        // 2021-09-09T01:46:40Z
        let year = decode_epoch_year("1631152000", UNIX_SECONDS).unwrap();
        assert_eq!(year, 2021);
    }
}
