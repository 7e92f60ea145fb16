//! Field validation for phone reports.
//!
//! Every validator is pure and returns the first rule the input breaks.
//! `PhoneReport::validate` runs them all and collects every failure so a
//! form can show them side by side.

use crate::imei::{validate_imei, ImeiError};
use crate::location::CAMEROON_BOUNDS;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest reward a report may offer, in FCFA.
pub const MAX_REWARD_FCFA: i64 = 10_000_000;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 500;

const COUNTRY_PREFIX: &str = "+237";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(String),
    #[error("{field} must contain at least {min} characters")]
    TooShort { field: String, min: usize },
    #[error("{field} must contain at most {max} characters")]
    TooLong { field: String, max: usize },
    #[error("enter a valid Cameroonian phone number (e.g. +237 6XX XXX XXX)")]
    InvalidPhone,
    #[error("enter a valid email address")]
    InvalidEmail,
    #[error("reward cannot be negative")]
    NegativeReward,
    #[error("reward cannot exceed 10,000,000 FCFA")]
    RewardTooHigh,
    #[error("location must be in Cameroon")]
    OutsideCameroon,
    #[error(transparent)]
    Imei(#[from] ImeiError),
}

/// Validate a Cameroonian phone number and normalise it to `+237XXXXXXXXX`.
///
/// Spaces, dashes and parentheses are ignored. The subscriber number is nine
/// digits; mobiles start with 6-9, landlines with 2-3.
pub fn validate_cameroon_phone(phone: &str) -> Result<String, FieldError> {
    if phone.trim().is_empty() {
        return Err(FieldError::Required("phone number".into()));
    }

    let clean: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();

    let subscriber = [clean.strip_prefix("+237"), clean.strip_prefix("237"), Some(clean.as_str())]
        .into_iter()
        .flatten()
        .find(|s| is_subscriber_number(s))
        .ok_or(FieldError::InvalidPhone)?;

    Ok(format!("{COUNTRY_PREFIX}{subscriber}"))
}

fn is_subscriber_number(s: &str) -> bool {
    s.len() == 9
        && s.bytes().all(|b| b.is_ascii_digit())
        && matches!(s.as_bytes()[0], b'2' | b'3' | b'6'..=b'9')
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() {
        return Err(FieldError::Required("email address".into()));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(FieldError::InvalidEmail);
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FieldError::InvalidEmail);
    };
    let domain_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if local.is_empty() || !domain_ok {
        return Err(FieldError::InvalidEmail);
    }
    Ok(())
}

/// Rewards are optional.
pub fn validate_reward(reward: Option<i64>) -> Result<(), FieldError> {
    match reward {
        Some(amount) if amount < 0 => Err(FieldError::NegativeReward),
        Some(amount) if amount > MAX_REWARD_FCFA => Err(FieldError::RewardTooHigh),
        _ => Ok(()),
    }
}

pub fn validate_required_text(value: &str, field: &str, min_len: usize) -> Result<(), FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(field.to_string()));
    }
    if trimmed.chars().count() < min_len {
        return Err(FieldError::TooShort {
            field: field.to_string(),
            min: min_len,
        });
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), FieldError> {
    validate_required_text(description, "description", MIN_DESCRIPTION_LEN)?;
    if description.trim().chars().count() > MAX_DESCRIPTION_LEN {
        return Err(FieldError::TooLong {
            field: "description".into(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

pub fn validate_cameroon_coordinates(lat: f64, lng: f64) -> Result<(), FieldError> {
    if CAMEROON_BOUNDS.contains(lat, lng) {
        Ok(())
    } else {
        Err(FieldError::OutsideCameroon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneStatus {
    Lost,
    Stolen,
    Found,
}

impl fmt::Display for PhoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lost => write!(f, "lost"),
            Self::Stolen => write!(f, "stolen"),
            Self::Found => write!(f, "found"),
        }
    }
}

/// A lost/stolen phone report as submitted from the report form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneReport {
    pub imei: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub color: Option<String>,
    pub status: PhoneStatus,
    pub description: String,
    #[serde(default)]
    pub reward: Option<i64>,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: String,
    pub location_address: String,
    pub location_lat: f64,
    pub location_lng: f64,
}

impl PhoneReport {
    /// Every failing field with its error, in form order. Empty when valid.
    pub fn validate(&self) -> Vec<(&'static str, FieldError)> {
        let checks: [(&'static str, Result<(), FieldError>); 10] = [
            ("imei", validate_imei(&self.imei).map_err(FieldError::from)),
            ("brand", validate_required_text(&self.brand, "brand", 2)),
            ("model", validate_required_text(&self.model, "model", 1)),
            ("description", validate_description(&self.description)),
            ("reward", validate_reward(self.reward)),
            ("ownerName", validate_required_text(&self.owner_name, "owner name", 2)),
            ("ownerPhone", validate_cameroon_phone(&self.owner_phone).map(drop)),
            ("ownerEmail", validate_email(&self.owner_email)),
            ("locationAddress", validate_required_text(&self.location_address, "location", 2)),
            ("location", validate_cameroon_coordinates(self.location_lat, self.location_lng)),
        ];

        checks
            .into_iter()
            .filter_map(|(field, result)| result.err().map(|e| (field, e)))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> PhoneReport {
        PhoneReport {
            imei: "356938035643809".into(),
            brand: "Tecno".into(),
            model: "Spark 10".into(),
            color: Some("Bleu".into()),
            status: PhoneStatus::Stolen,
            description: "Stolen at the Akwa market on Saturday".into(),
            reward: Some(50_000),
            owner_name: "Jean Mbarga".into(),
            owner_phone: "+237 6 77 12 34 56".into(),
            owner_email: "jean@example.cm".into(),
            location_address: "Akwa, Douala, Cameroon".into(),
            location_lat: 4.05,
            location_lng: 9.70,
        }
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(validate_cameroon_phone("677123456").unwrap(), "+237677123456");
        assert_eq!(validate_cameroon_phone("237 677 12 34 56").unwrap(), "+237677123456");
        assert_eq!(validate_cameroon_phone("+237 (6) 77-12-34-56").unwrap(), "+237677123456");
        assert_eq!(validate_cameroon_phone("222 23 45 67").unwrap(), "+237222234567");
        // A landline that happens to start with 237 is not a country prefix.
        assert_eq!(validate_cameroon_phone("237123456").unwrap(), "+237237123456");
    }

    #[test]
    fn test_phone_rejected() {
        assert_eq!(validate_cameroon_phone(""), Err(FieldError::Required("phone number".into())));
        assert_eq!(validate_cameroon_phone("477123456"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_cameroon_phone("67712345"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_cameroon_phone("+33612345678"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_cameroon_phone("6771234a6"), Err(FieldError::InvalidPhone));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("support@trackzer.cm").is_ok());
        assert_eq!(validate_email(""), Err(FieldError::Required("email address".into())));
        assert_eq!(validate_email("no-at-sign.cm"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@b@c.cm"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a @b.cm"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@nodot"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("@b.cm"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@b."), Err(FieldError::InvalidEmail));
    }

    #[test]
    fn test_reward() {
        assert!(validate_reward(None).is_ok());
        assert!(validate_reward(Some(0)).is_ok());
        assert_eq!(validate_reward(Some(-5)), Err(FieldError::NegativeReward));
        assert!(validate_reward(Some(MAX_REWARD_FCFA)).is_ok());
        assert_eq!(validate_reward(Some(MAX_REWARD_FCFA + 1)), Err(FieldError::RewardTooHigh));
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Tecno", "brand", 2).is_ok());
        assert_eq!(validate_required_text("   ", "brand", 2), Err(FieldError::Required("brand".into())));
        assert_eq!(
            validate_required_text(" a ", "brand", 2),
            Err(FieldError::TooShort { field: "brand".into(), min: 2 })
        );
    }

    #[test]
    fn test_description_bounds() {
        assert!(validate_description("Lost in a taxi").is_ok());
        assert!(matches!(validate_description("short"), Err(FieldError::TooShort { .. })));
        assert!(matches!(validate_description(&"x".repeat(501)), Err(FieldError::TooLong { .. })));
    }

    #[test]
    fn test_coordinates() {
        assert!(validate_cameroon_coordinates(3.848, 11.5021).is_ok());
        assert_eq!(validate_cameroon_coordinates(6.5244, 3.3792), Err(FieldError::OutsideCameroon));
    }

    #[test]
    fn test_valid_report() {
        assert!(report().is_valid());
    }

    #[test]
    fn test_report_collects_every_error() {
        let bad = PhoneReport {
            imei: "35693803564380A".into(),
            owner_email: "nope".into(),
            reward: Some(20_000_000),
            location_lat: 48.8566,
            location_lng: 2.3522,
            ..report()
        };
        let fields: Vec<&str> = bad.validate().iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["imei", "reward", "ownerEmail", "location"]);
        assert_eq!(bad.validate()[0].1, FieldError::Imei(ImeiError::NonDigit));
    }

    #[test]
    fn test_report_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["status"], "stolen");
        assert_eq!(json["ownerPhone"], "+237 6 77 12 34 56");
        let back: PhoneReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report());
    }
}
