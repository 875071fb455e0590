// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient list splitting for the multi-email input.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use validator::ValidateEmail;

/// Output of the multi-email input: what it accepted and what it rejected.
///
/// The form stores both lists exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientList {
    pub emails: Vec<String>,
    pub invalids: Vec<String>,
}

fn is_separator(c: char) -> bool {
    c == ',' || c == ';' || c.is_whitespace()
}

/// Split free text into valid recipients and rejected entries.
///
/// Entries are NFKC-normalized and deduplicated case-insensitively; the
/// first spelling of an address is kept and input order is preserved.
pub fn split_recipients(raw: &str) -> RecipientList {
    let mut seen = HashSet::new();
    let mut list = RecipientList::default();

    for entry in raw.split(is_separator).filter(|s| !s.is_empty()) {
        let normalized: String = entry.nfkc().collect();
        if !seen.insert(normalized.to_lowercase()) {
            continue;
        }
        if is_valid_email(&normalized) {
            list.emails.push(normalized);
        } else {
            list.invalids.push(normalized);
        }
    }

    list
}

/// Single-label domains such as `localhost` are accepted.
pub fn is_valid_email(candidate: &str) -> bool {
    candidate.validate_email()
}
