//! Unit serial numbers: `<prefix><zero-padded number>`, e.g. `PR-004`.
//!
//! New serials are always derived from the highest numeric suffix already in
//! use, never from the number of existing units, so gaps left by deleted
//! units cannot produce collisions.

use std::cmp::Ordering;
use std::fmt;

use h10cm_core::ServiceError;
use thiserror::Error;

/// Minimum zero-padded width of the numeric suffix.
pub const MIN_SERIAL_WIDTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerialError {
    #[error("serial number is empty")]
    Empty,

    #[error("serial number {0:?} has no numeric suffix")]
    NoNumericSuffix(String),

    #[error("serial number {0:?} cannot be incremented further")]
    Overflow(String),
}

impl From<SerialError> for ServiceError {
    fn from(err: SerialError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// A serial split into its prefix and numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialNumber {
    prefix: String,
    number: u64,
    width: usize,
}

impl SerialNumber {
    pub fn new(prefix: impl Into<String>, number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            number,
            width: MIN_SERIAL_WIDTH,
        }
    }

    /// Split `s` at its trailing run of ASCII digits.
    pub fn parse(s: &str) -> Result<Self, SerialError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SerialError::Empty);
        }
        let (prefix, digits) = split_trailing_digits(s);
        if digits.is_empty() {
            return Err(SerialError::NoNumericSuffix(s.to_string()));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| SerialError::Overflow(s.to_string()))?;
        Ok(Self {
            prefix: prefix.to_string(),
            number,
            width: digits.len().max(MIN_SERIAL_WIDTH),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(MIN_SERIAL_WIDTH);
        self
    }

    pub fn checked_next(&self) -> Result<Self, SerialError> {
        let number = self
            .number
            .checked_add(1)
            .ok_or_else(|| SerialError::Overflow(self.to_string()))?;
        Ok(Self { number, ..self.clone() })
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.prefix, self.number, width = self.width)
    }
}

fn split_trailing_digits(s: &str) -> (&str, &str) {
    let cut = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(cut)
}

/// Next free serial for `prefix`: one past the highest numeric suffix in
/// `existing` (any prefix), or `1` when nothing numeric exists yet.
pub fn next_serial<'a, I>(existing: I, prefix: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut max = 0u64;
    let mut width = MIN_SERIAL_WIDTH;
    for sn in existing.into_iter().filter_map(|s| SerialNumber::parse(s).ok()) {
        max = max.max(sn.number);
        width = width.max(sn.width);
    }
    SerialNumber::new(prefix, max.saturating_add(1))
        .with_width(width)
        .to_string()
}

/// `quantity` consecutive serials starting at (and including) `start`.
pub fn serial_sequence(start: &str, quantity: usize) -> Result<Vec<String>, SerialError> {
    let mut current = SerialNumber::parse(start)?;
    let mut out = Vec::with_capacity(quantity);
    for i in 0..quantity {
        if i > 0 {
            current = current.checked_next()?;
        }
        out.push(current.to_string());
    }
    Ok(out)
}

/// Human-friendly ordering: digit runs compare by value, so `PR-9` < `PR-10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ai, mut bi) = (a.char_indices().peekable(), b.char_indices().peekable());
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((sa, ca)), Some((sb, cb))) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let ea = run_end(a, sa);
                    let eb = run_end(b, sb);
                    let ord = cmp_digit_runs(&a[sa..ea], &b[sb..eb]);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    while ai.peek().is_some_and(|(i, _)| *i < ea) {
                        ai.next();
                    }
                    while bi.peek().is_some_and(|(i, _)| *i < eb) {
                        bi.next();
                    }
                } else {
                    let ord = ca.to_ascii_lowercase().cmp(&cb.to_ascii_lowercase());
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

fn run_end(s: &str, start: usize) -> usize {
    s[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|off| start + off)
        .unwrap_or(s.len())
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Default serial prefixes for a project type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialPrefixes {
    pub unit: &'static str,
    pub pcb: Option<&'static str>,
}

impl SerialPrefixes {
    pub fn for_project_type(project_type: &str) -> Self {
        if project_type.eq_ignore_ascii_case("PR") {
            Self { unit: "PR-", pcb: Some("PCB-") }
        } else {
            Self { unit: "ASSY-", pcb: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_serial_uses_max_not_count() {
        // PR-002 was deleted; count + 1 would collide with PR-003.
        assert_eq!(next_serial(["PR-001", "PR-003"], "PR-"), "PR-004");
    }

    #[test]
    fn next_serial_on_empty_project() {
        assert_eq!(next_serial(std::iter::empty::<&str>(), "ASSY-"), "ASSY-001");
        assert_eq!(next_serial(["legacy"], "PR-"), "PR-001");
    }

    #[test]
    fn next_serial_keeps_wider_padding() {
        assert_eq!(next_serial(["PR-0009", "PR-0010"], "PR-"), "PR-0011");
        assert_eq!(next_serial(["PR-999"], "PR-"), "PR-1000");
    }

    #[test]
    fn sequence_increments_and_pads() {
        assert_eq!(
            serial_sequence("PR-009", 3).unwrap(),
            ["PR-009", "PR-010", "PR-011"]
        );
        assert_eq!(serial_sequence("X7", 2).unwrap(), ["X007", "X008"]);
        assert!(serial_sequence("PR-001", 0).unwrap().is_empty());
    }

    #[test]
    fn sequence_rejects_bad_start() {
        assert_eq!(
            serial_sequence("PR-", 1),
            Err(SerialError::NoNumericSuffix("PR-".into()))
        );
        assert_eq!(serial_sequence("  ", 1), Err(SerialError::Empty));
        assert!(matches!(
            serial_sequence("A18446744073709551615", 2),
            Err(SerialError::Overflow(_))
        ));
    }

    #[test]
    fn parse_splits_prefix() {
        let sn = SerialNumber::parse("ASSY-2024-017").unwrap();
        assert_eq!(sn.prefix(), "ASSY-2024-");
        assert_eq!(sn.number(), 17);
        assert_eq!(SerialNumber::parse("PCB-042").unwrap().to_string(), "PCB-042");
        assert_eq!(
            SerialNumber::parse("PCB-"),
            Err(SerialError::NoNumericSuffix("PCB-".into()))
        );
    }

    #[test]
    fn natural_ordering() {
        let mut serials = vec!["PR-10", "PR-9", "PR-100", "pr-1", "PR-009"];
        serials.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(serials, ["pr-1", "PR-009", "PR-9", "PR-10", "PR-100"]);
        assert_eq!(natural_cmp("A", "A"), Ordering::Equal);
        assert_eq!(natural_cmp("A1", "A1B"), Ordering::Less);
    }

    #[test]
    fn prefixes_by_project_type() {
        let pr = SerialPrefixes::for_project_type("PR");
        assert_eq!(pr.unit, "PR-");
        assert_eq!(pr.pcb, Some("PCB-"));
        let other = SerialPrefixes::for_project_type("Assembly");
        assert_eq!(other.unit, "ASSY-");
        assert_eq!(other.pcb, None);
    }
}
