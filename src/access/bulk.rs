//! Bulk recipient import.
//!
//! Takes free-form pasted or CSV text and classifies every cell as an
//! email, wallet address, or SuiNS name. Unrecognizable cells become
//! row-indexed errors instead of aborting the parse, so one bad line in
//! a large import does not throw away the rest.

use std::collections::HashSet;

use crate::access::validators::{is_valid_address, is_valid_email, is_valid_suins_name};

/// Classified output of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkParseResult {
    /// Recognized emails, deduplicated, in first-seen order.
    pub emails: Vec<String>,
    /// Recognized wallet addresses, deduplicated, in first-seen order.
    pub addresses: Vec<String>,
    /// Recognized SuiNS names, deduplicated, in first-seen order.
    pub names: Vec<String>,
    /// One message per unrecognized cell, tagged with its row number.
    pub errors: Vec<String>,
}

impl BulkParseResult {
    /// Whether anything usable was recognized.
    pub fn has_recipients(&self) -> bool {
        !self.emails.is_empty() || !self.addresses.is_empty() || !self.names.is_empty()
    }

    /// Total number of recognized entries across all categories.
    pub fn recipient_count(&self) -> usize {
        self.emails.len() + self.addresses.len() + self.names.len()
    }
}

/// Parse bulk recipient data.
///
/// Rows are split on newlines, cells on commas, semicolons, and tabs.
/// There is no header row; every cell is data. Row numbers in error
/// messages are 1-based and count input lines, including lines that
/// turn out to be empty.
pub fn parse_bulk_data(input: &str) -> BulkParseResult {
    let mut result = BulkParseResult::default();
    let mut seen_emails = HashSet::new();
    let mut seen_addresses = HashSet::new();
    let mut seen_names = HashSet::new();

    for (idx, line) in input.lines().enumerate() {
        let row = idx + 1;
        for cell in line.split([',', ';', '\t']) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }

            if is_valid_email(cell) {
                if seen_emails.insert(cell.to_string()) {
                    result.emails.push(cell.to_string());
                }
            } else if is_valid_address(cell) {
                if seen_addresses.insert(cell.to_string()) {
                    result.addresses.push(cell.to_string());
                }
            } else if is_valid_suins_name(cell) {
                if seen_names.insert(cell.to_string()) {
                    result.names.push(cell.to_string());
                }
            } else {
                result
                    .errors
                    .push(format!("Row {}: unrecognized entry '{}'", row, cell));
            }
        }
    }

    result
}

// ============================================================================
// TESTS
// ============================================================================
