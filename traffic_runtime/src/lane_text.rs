use crate::vehicle_kind::{TypeAlphabet, VehicleKind};

/// Operator text for one lane: comma separated single-character type codes.
/// Parsed only when a simulation starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneInput(String);

impl LaneInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn push(&mut self, ch: char) {
        self.0.push(ch);
    }

    pub fn pop(&mut self) -> Option<char> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for LaneInput {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LaneInput {
    fn from(text: String) -> Self {
        Self(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneToken {
    Vehicle(VehicleKind),
    Unrecognized(String),
}

/// Splits lane text into tokens, left to right. Whitespace anywhere is
/// ignored and empty segments (`"c,,b"`, trailing commas) are dropped.
pub fn tokenize_lane(input: &str, alphabet: &TypeAlphabet) -> Vec<LaneToken> {
    let compact: String = input.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match (chars.next(), chars.next()) {
                (Some(code), None) => alphabet
                    .resolve(code)
                    .map(LaneToken::Vehicle)
                    .unwrap_or_else(|| LaneToken::Unrecognized(segment.to_string())),
                _ => LaneToken::Unrecognized(segment.to_string()),
            }
        })
        .collect()
}

/// Vehicle kinds requested by a lane, unrecognized codes skipped.
pub fn parse_lane_codes(input: &str, alphabet: &TypeAlphabet) -> Vec<VehicleKind> {
    tokenize_lane(input, alphabet)
        .into_iter()
        .filter_map(|token| match token {
            LaneToken::Vehicle(kind) => Some(kind),
            LaneToken::Unrecognized(_) => None,
        })
        .collect()
}
