//! Indicator types, classification, and normalization
//!
//! An [`Indicator`] carries a normalized value; normalization is idempotent
//! so a value can be re-normalized (for example when reconstructing a cache
//! key) without drifting.

use crate::error::{PivotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// The kind of value an analyst submits for enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorType {
    /// IPv4 or IPv6 address
    Ip,
    /// DNS domain name
    Domain,
    /// Email address
    Email,
    /// Hex digest (md5, sha1, sha256)
    Hash,
    /// HTTP(S) URL
    Url,
    /// Phone number
    Phone,
    /// Free-form text fallback
    Text,
}

impl IndicatorType {
    /// All known indicator types, in classification precedence order
    pub const ALL: [IndicatorType; 7] = [
        IndicatorType::Ip,
        IndicatorType::Domain,
        IndicatorType::Email,
        IndicatorType::Hash,
        IndicatorType::Url,
        IndicatorType::Phone,
        IndicatorType::Text,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::Ip => "ip",
            IndicatorType::Domain => "domain",
            IndicatorType::Email => "email",
            IndicatorType::Hash => "hash",
            IndicatorType::Url => "url",
            IndicatorType::Phone => "phone",
            IndicatorType::Text => "text",
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorType {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ip" => Ok(IndicatorType::Ip),
            "domain" => Ok(IndicatorType::Domain),
            "email" => Ok(IndicatorType::Email),
            "hash" => Ok(IndicatorType::Hash),
            "url" => Ok(IndicatorType::Url),
            "phone" => Ok(IndicatorType::Phone),
            "text" => Ok(IndicatorType::Text),
            other => Err(PivotError::Validation(format!(
                "unknown indicator type: {other}"
            ))),
        }
    }
}

/// A typed, normalized value of investigative interest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicator {
    /// Indicator type
    #[serde(rename = "type")]
    pub itype: IndicatorType,
    /// Normalized value
    pub value: String,
}

impl Indicator {
    /// Build an indicator of an explicit type, normalizing and validating
    /// the raw value. Malformed values are a [`PivotError::Validation`].
    pub fn new(itype: IndicatorType, raw: &str) -> Result<Self> {
        let value = normalize(itype, raw)?;
        Ok(Indicator { itype, value })
    }

    /// Guess the type of a raw value and build the indicator from it.
    ///
    /// Precedence: ip, hash (hex of md5/sha1/sha256 length), email, url,
    /// phone, domain, then free text.
    pub fn classify(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PivotError::Validation("empty indicator".into()));
        }

        if trimmed.parse::<IpAddr>().is_ok() {
            return Indicator::new(IndicatorType::Ip, trimmed);
        }
        if looks_like_hash(trimmed) {
            return Indicator::new(IndicatorType::Hash, trimmed);
        }
        if trimmed.contains('@') && !trimmed.contains('/') {
            return Indicator::new(IndicatorType::Email, trimmed);
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Indicator::new(IndicatorType::Url, trimmed);
        }
        if looks_like_phone(trimmed) {
            return Indicator::new(IndicatorType::Phone, trimmed);
        }
        if trimmed.contains('.') && !trimmed.contains(char::is_whitespace) {
            return Indicator::new(IndicatorType::Domain, trimmed);
        }
        Indicator::new(IndicatorType::Text, trimmed)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.itype, self.value)
    }
}

/// Normalize a raw value for the given type. Idempotent: normalizing an
/// already-normalized value returns it unchanged.
pub fn normalize(itype: IndicatorType, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PivotError::Validation("empty indicator".into()));
    }

    match itype {
        IndicatorType::Ip => {
            let addr: IpAddr = trimmed.parse().map_err(|_| {
                PivotError::Validation(format!("not an ip address: {trimmed}"))
            })?;
            Ok(addr.to_string())
        }
        IndicatorType::Domain => {
            let value = trimmed.to_ascii_lowercase();
            let value = value.trim_end_matches('.');
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(PivotError::Validation(format!(
                    "not a domain: {trimmed}"
                )));
            }
            Ok(value.to_string())
        }
        IndicatorType::Email => {
            if !trimmed.contains('@') {
                return Err(PivotError::Validation(format!(
                    "not an email address: {trimmed}"
                )));
            }
            Ok(trimmed.to_ascii_lowercase())
        }
        IndicatorType::Hash => {
            let value = trimmed.to_ascii_lowercase();
            if !looks_like_hash(&value) {
                return Err(PivotError::Validation(format!(
                    "not a recognized digest: {trimmed}"
                )));
            }
            Ok(value)
        }
        IndicatorType::Url => {
            let Some(scheme_end) = trimmed.find("://") else {
                return Err(PivotError::Validation(format!("not a url: {trimmed}")));
            };
            let scheme = trimmed[..scheme_end].to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(PivotError::Validation(format!("not a url: {trimmed}")));
            }
            Ok(format!("{scheme}{}", &trimmed[scheme_end..]))
        }
        IndicatorType::Phone => {
            let value: String = trimmed
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
                .collect();
            if !looks_like_phone(&value) {
                return Err(PivotError::Validation(format!(
                    "not a phone number: {trimmed}"
                )));
            }
            Ok(value)
        }
        IndicatorType::Text => Ok(trimmed.to_string()),
    }
}

fn looks_like_hash(s: &str) -> bool {
    matches!(s.len(), 32 | 40 | 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn looks_like_phone(s: &str) -> bool {
    let digits = s.chars().filter(char::is_ascii_digit).count();
    digits >= 7
        && s.chars().enumerate().all(|(i, c)| {
            c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')') || (i == 0 && c == '+')
        })
}
