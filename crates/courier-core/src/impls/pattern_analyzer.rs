//! Regex-based PII analyzer.
//!
//! Detects the common entity types a document classifier cares about. Offsets
//! in the returned findings are character (not byte) offsets.

use std::net::Ipv4Addr;

use regex::Regex;

use crate::domain::Finding;
use crate::error::ProcessingError;
use crate::ports::Analyzer;

type Validator = fn(&str) -> bool;

struct Rule {
    entity_type: &'static str,
    pattern: Regex,
    score: f64,
    validate: Option<Validator>,
}

pub struct PatternAnalyzer {
    rules: Vec<Rule>,
}

impl PatternAnalyzer {
    /// Email, phone, SSN, card number and IPv4 rules.
    pub fn standard() -> Result<Self, regex::Error> {
        let rules = vec![
            Rule {
                entity_type: "EMAIL_ADDRESS",
                pattern: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
                score: 1.0,
                validate: None,
            },
            Rule {
                entity_type: "PHONE_NUMBER",
                pattern: Regex::new(
                    r"(?:\+?1[-.\s])?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
                )?,
                score: 0.75,
                validate: None,
            },
            Rule {
                entity_type: "US_SSN",
                pattern: Regex::new(r"\b\d{3}-\d{2}-\d{4}\b")?,
                score: 0.85,
                validate: Some(valid_ssn),
            },
            Rule {
                entity_type: "CREDIT_CARD",
                pattern: Regex::new(r"\b(?:\d[ -]?){12,18}\d\b")?,
                score: 1.0,
                validate: Some(luhn_valid),
            },
            Rule {
                entity_type: "IP_ADDRESS",
                pattern: Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b")?,
                score: 0.95,
                validate: Some(valid_ipv4),
            },
        ];
        Ok(Self { rules })
    }
}

impl Analyzer for PatternAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Finding>, ProcessingError> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            for m in rule.pattern.find_iter(text) {
                if rule.validate.is_some_and(|valid| !valid(m.as_str())) {
                    continue;
                }
                let start = text[..m.start()].chars().count();
                let end = start + m.as_str().chars().count();
                findings.push(Finding::new(rule.entity_type, start, end, rule.score));
            }
        }
        findings.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        Ok(findings)
    }
}

fn valid_ssn(s: &str) -> bool {
    let mut parts = s.split('-');
    let (Some(area), Some(group), Some(serial)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

fn valid_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn luhn_valid(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
