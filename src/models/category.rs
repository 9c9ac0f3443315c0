// ABOUTME: Rider category model: declared, name-inferred, and power-estimated categories
// ABOUTME: Name inference is a pure ordered rule list; no match means unknown
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::physiology::{WKG_CAT_A, WKG_CAT_B, WKG_CAT_C};
use crate::models::rider::Sex;

/// A rider's category.
///
/// Known categories are the letters `A`–`D` plus `W` (women's field).
/// `Unknown` riders are auto-assigned the best-weighted finish group; in
/// ignore-categories mode they are folded into the selected group's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Category A (strongest).
    A,
    /// Category B.
    B,
    /// Category C.
    C,
    /// Category D.
    D,
    /// Women's category.
    W,
    /// No declared, inferred, or estimated category.
    Unknown,
    /// Folded into a start-group name (ignore-categories mode).
    Group(String),
}

impl Category {
    /// Build a known category from its letter; anything outside `ABCDW`
    /// is rejected.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'W' => Some(Self::W),
            _ => None,
        }
    }

    /// The category letter, when this is a known lettered category.
    #[must_use]
    pub const fn letter(&self) -> Option<char> {
        match self {
            Self::A => Some('A'),
            Self::B => Some('B'),
            Self::C => Some('C'),
            Self::D => Some('D'),
            Self::W => Some('W'),
            Self::Unknown | Self::Group(_) => None,
        }
    }

    /// Whether no category is known for the rider.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Report label: the letter, `X` for unknown, or the group name.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::W => "W",
            Self::Unknown => "X",
            Self::Group(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered name-inference rules. Riders commonly tag their category in
/// the last name ("Smith (B)", "Jones KISS-C", "Lee RACE B"); the first
/// matching rule wins, and an invalid captured letter yields Unknown
/// rather than falling through to later rules.
const NAME_RULES: &[&str] = &[
    // NAME (X)
    r"^.*\((.)\)$",
    // NAME X
    r"^.*\s(.)$",
    // NAME RACE-X
    r"^.*-(.)$",
    // NAME (RACE X)
    r"^.*\s(.)\)$",
    // NAME RACE-X INFO / NAME RACE-X) INFO
    r"^.*-(.)[ )].*$",
    // NAME (X) INFO
    r"^.*\((.)\).*$",
    // NAME RACE X) INFO
    r"^.*\s(.)\).*$",
];

fn name_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        NAME_RULES
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// Infer a category letter from a free-text last name.
///
/// Pure function over the name: applies the ordered rule list, takes the
/// first capture, and sanity-checks it against the known letters. No
/// match (or an invalid letter) means [`Category::Unknown`].
#[must_use]
pub fn infer_from_name(last_name: &str) -> Category {
    for rule in name_rules() {
        if let Some(caps) = rule.captures(last_name) {
            return caps
                .get(1)
                .and_then(|m| m.as_str().chars().next())
                .and_then(Category::from_letter)
                .unwrap_or(Category::Unknown);
        }
    }
    Category::Unknown
}

/// Estimate a physiological category from average power-to-weight.
///
/// Zero watts/kg (no weight or no ride) estimates nothing;
/// female-identified riders estimate `W` regardless of watts/kg.
#[must_use]
pub fn estimate_from_wkg(wkg: f64, sex: Sex) -> Category {
    if wkg <= 0.0 {
        Category::Unknown
    } else if sex == Sex::Female {
        Category::W
    } else if wkg > WKG_CAT_A {
        Category::A
    } else if wkg > WKG_CAT_B {
        Category::B
    } else if wkg > WKG_CAT_C {
        Category::C
    } else {
        Category::D
    }
}
