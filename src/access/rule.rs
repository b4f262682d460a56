//! Access rule types and structural validation.

use serde::{Deserialize, Serialize};

use crate::access::validators::{is_valid_address, is_valid_email, is_valid_suins_name};
use crate::error::{Error, Result};

/// Which condition family (or combination) a rule enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    /// Restrict by recipient email.
    Email,
    /// Restrict by wallet address or SuiNS name.
    Wallet,
    /// Restrict by access window / duration.
    Time,
    /// Combination of the above families.
    Hybrid,
}

impl ConditionType {
    /// Parse a wire-format tag. Unknown tags are not coerced.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(ConditionType::Email),
            "wallet" => Some(ConditionType::Wallet),
            "time" => Some(ConditionType::Time),
            "hybrid" => Some(ConditionType::Hybrid),
            _ => None,
        }
    }

    /// Wire-format tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Email => "email",
            ConditionType::Wallet => "wallet",
            ConditionType::Time => "time",
            ConditionType::Hybrid => "hybrid",
        }
    }
}

/// A sharing rule attached to one file.
///
/// Field names follow the backend's JSON casing. Timestamps are Unix
/// epoch milliseconds; durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    /// Condition family this rule enforces.
    pub condition_type: ConditionType,

    /// Emails allowed to access the file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_emails: Vec<String>,

    /// Wallet addresses allowed to access the file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_addresses: Vec<String>,

    /// SuiNS names allowed to access the file.
    ///
    /// The wire spelling is `allowedSuiNS`, which camelCase renaming
    /// would mangle.
    #[serde(
        rename = "allowedSuiNS",
        alias = "allowedSuinsNames",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_suins_names: Vec<String>,

    /// Earliest access time (epoch ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_start_time: Option<i64>,

    /// Latest access time (epoch ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_end_time: Option<i64>,

    /// Maximum total duration of access (ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_access_duration: Option<i64>,

    /// Maximum number of accesses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_access_count: Option<i64>,

    /// For hybrid rules: whether every populated family must pass
    /// (AND) rather than any one of them (OR).
    #[serde(default)]
    pub require_all_conditions: bool,
}

impl AccessRule {
    /// An empty rule of the given type. Populate fields, then validate.
    pub fn new(condition_type: ConditionType) -> Self {
        Self {
            condition_type,
            allowed_emails: Vec::new(),
            allowed_addresses: Vec::new(),
            allowed_suins_names: Vec::new(),
            access_start_time: None,
            access_end_time: None,
            max_access_duration: None,
            max_access_count: None,
            require_all_conditions: false,
        }
    }

    fn has_email_condition(&self) -> bool {
        !self.allowed_emails.is_empty()
    }

    fn has_wallet_condition(&self) -> bool {
        !self.allowed_addresses.is_empty() || !self.allowed_suins_names.is_empty()
    }

    fn has_time_condition(&self) -> bool {
        self.access_start_time.is_some()
            || self.access_end_time.is_some()
            || self.max_access_duration.is_some()
    }
}

/// Validate a rule before it is sent to the backend.
///
/// First violation wins; the returned error names the offending field.
/// Every populated field is checked regardless of `condition_type`, so a
/// wallet rule with a malformed leftover email is still rejected.
pub fn validate_access_rule(rule: &AccessRule) -> Result<()> {
    for email in &rule.allowed_emails {
        if !is_valid_email(email) {
            return Err(Error::InvalidEmail(format!("Invalid email: {}", email)));
        }
    }

    for address in &rule.allowed_addresses {
        if !is_valid_address(address) {
            return Err(Error::InvalidAddress(format!(
                "Invalid wallet address: {}",
                address
            )));
        }
    }

    for name in &rule.allowed_suins_names {
        if !is_valid_suins_name(name) {
            return Err(Error::InvalidName(format!("Invalid SuiNS name: {}", name)));
        }
    }

    if let (Some(start), Some(end)) = (rule.access_start_time, rule.access_end_time) {
        if start >= end {
            return Err(Error::InvalidRule(
                "Access start time must be before end time".into(),
            ));
        }
    }

    if let Some(duration) = rule.max_access_duration {
        if duration <= 0 {
            return Err(Error::InvalidRule(
                "Max access duration must be positive".into(),
            ));
        }
    }

    if let Some(count) = rule.max_access_count {
        if count <= 0 {
            return Err(Error::InvalidRule("Max access count must be positive".into()));
        }
    }

    match rule.condition_type {
        ConditionType::Email if !rule.has_email_condition() => Err(Error::InvalidRule(
            "Email rule requires at least one allowed email".into(),
        )),
        ConditionType::Wallet if !rule.has_wallet_condition() => Err(Error::InvalidRule(
            "Wallet rule requires at least one address or SuiNS name".into(),
        )),
        ConditionType::Time if !rule.has_time_condition() => Err(Error::InvalidRule(
            "Time rule requires a start, end, or max duration".into(),
        )),
        ConditionType::Hybrid
            if !rule.has_email_condition()
                && !rule.has_wallet_condition()
                && !rule.has_time_condition() =>
        {
            Err(Error::InvalidRule(
                "Hybrid rule requires at least one populated condition".into(),
            ))
        }
        _ => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
