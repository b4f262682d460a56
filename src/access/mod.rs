//! # Access Control Policy
//!
//! Client-side structural validation of sharing rules, plus bulk import
//! classification. The server evaluates rules; this module only rejects
//! rules that could never be valid before a round trip is wasted.
//!
//! ## Rule Shape
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ACCESS RULE                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  condition_type: email | wallet | time | hybrid                        │
//! │                                                                         │
//! │  Condition families:                                                   │
//! │  • email  — allowed_emails[]                                           │
//! │  • wallet — allowed_addresses[] (0x + 64 hex)                          │
//! │             allowed_suins[]     (4-64 chars, ends in ".sui")           │
//! │  • time   — access_start_time / access_end_time (epoch ms)             │
//! │             max_access_duration (ms, > 0)                              │
//! │                                                                         │
//! │  max_access_count  — uses allowed (> 0)                                │
//! │  require_all       — AND vs OR across populated families               │
//! │                                                                         │
//! │  hybrid requires at least one populated family.                        │
//! │  Validation is first-violation-wins; no error aggregation.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod bulk;
mod rule;
mod validators;

pub use bulk::{parse_bulk_data, BulkParseResult};
pub use rule::{validate_access_rule, AccessRule, ConditionType};
pub use validators::{is_valid_address, is_valid_email, is_valid_suins_name, SUINS_SUFFIX};
