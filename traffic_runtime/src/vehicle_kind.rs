use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Vehicle categories known to the client. Engine type strings outside this
/// table decode as [`VehicleKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Car,
    Bike,
    Bus,
    Truck,
    Ambulance,
    Fire,
    Police,
    Unspecified,
    Unknown,
}

impl VehicleKind {
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "car" => VehicleKind::Car,
            "bike" => VehicleKind::Bike,
            "bus" => VehicleKind::Bus,
            "truck" => VehicleKind::Truck,
            "ambulance" => VehicleKind::Ambulance,
            "fire" => VehicleKind::Fire,
            "police" => VehicleKind::Police,
            "unspecified" => VehicleKind::Unspecified,
            _ => VehicleKind::Unknown,
        }
    }

    /// Type string sent to the engine in spawn commands.
    pub fn wire_name(self) -> &'static str {
        match self {
            VehicleKind::Car => "car",
            VehicleKind::Bike => "bike",
            VehicleKind::Bus => "bus",
            VehicleKind::Truck => "truck",
            VehicleKind::Ambulance => "ambulance",
            VehicleKind::Fire => "fire",
            VehicleKind::Police => "police",
            VehicleKind::Unspecified => "unspecified",
            VehicleKind::Unknown => "unknown",
        }
    }

    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            VehicleKind::Ambulance | VehicleKind::Fire | VehicleKind::Police
        )
    }

    /// Priority assumed when the engine does not report one.
    pub fn default_priority(self) -> u32 {
        match self {
            VehicleKind::Ambulance | VehicleKind::Fire | VehicleKind::Police => 3,
            VehicleKind::Bus => 1,
            _ => 0,
        }
    }

    pub fn is_heavy(self) -> bool {
        matches!(self, VehicleKind::Truck | VehicleKind::Bus)
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Built-in type-code alphabets. Engines have shipped with both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphabetPreset {
    /// `c` car, `b` bike, `t` bus, `a` ambulance.
    #[default]
    Classic,
    /// `a` ambulance, `f` fire, `p` police, `b` bus, `c` car, `t` truck,
    /// `u` unspecified.
    Extended,
}

#[derive(Debug, Error)]
#[error("unknown alphabet preset '{0}' (expected classic or extended)")]
pub struct UnknownAlphabet(pub String);

impl FromStr for AlphabetPreset {
    type Err = UnknownAlphabet;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(AlphabetPreset::Classic),
            "extended" => Ok(AlphabetPreset::Extended),
            _ => Err(UnknownAlphabet(value.to_string())),
        }
    }
}

/// Mapping from single-character operator codes to vehicle kinds.
/// Codes are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlphabet {
    codes: BTreeMap<char, VehicleKind>,
}

impl TypeAlphabet {
    pub fn classic() -> Self {
        Self::from_pairs([
            ('c', VehicleKind::Car),
            ('b', VehicleKind::Bike),
            ('t', VehicleKind::Bus),
            ('a', VehicleKind::Ambulance),
        ])
    }

    pub fn extended() -> Self {
        Self::from_pairs([
            ('a', VehicleKind::Ambulance),
            ('f', VehicleKind::Fire),
            ('p', VehicleKind::Police),
            ('b', VehicleKind::Bus),
            ('c', VehicleKind::Car),
            ('t', VehicleKind::Truck),
            ('u', VehicleKind::Unspecified),
        ])
    }

    pub fn from_preset(preset: AlphabetPreset) -> Self {
        match preset {
            AlphabetPreset::Classic => Self::classic(),
            AlphabetPreset::Extended => Self::extended(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (char, VehicleKind)>) -> Self {
        let codes = pairs
            .into_iter()
            .map(|(code, kind)| (code.to_ascii_lowercase(), kind))
            .collect();
        Self { codes }
    }

    pub fn resolve(&self, code: char) -> Option<VehicleKind> {
        self.codes.get(&code.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, VehicleKind)> + '_ {
        self.codes.iter().map(|(code, kind)| (*code, *kind))
    }

    /// Comma separated list of accepted codes, used as an input placeholder.
    pub fn hint(&self) -> String {
        self.codes
            .keys()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for TypeAlphabet {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_and_extended_disagree_on_shared_letters() {
        let classic = TypeAlphabet::classic();
        let extended = TypeAlphabet::extended();
        assert_eq!(classic.len(), 4);
        assert_eq!(extended.len(), 7);
        assert_eq!(classic.resolve('b'), Some(VehicleKind::Bike));
        assert_eq!(extended.resolve('b'), Some(VehicleKind::Bus));
        assert_eq!(classic.resolve('t'), Some(VehicleKind::Bus));
        assert_eq!(extended.resolve('t'), Some(VehicleKind::Truck));
        assert_eq!(classic.resolve('f'), None);
    }

    #[test]
    fn codes_are_case_insensitive() {
        let alphabet = TypeAlphabet::classic();
        assert_eq!(alphabet.resolve('A'), Some(VehicleKind::Ambulance));
        assert_eq!(alphabet.hint(), "a,b,c,t");
    }

    #[test]
    fn wire_names_round_trip_and_fall_back() {
        for kind in [
            VehicleKind::Car,
            VehicleKind::Bike,
            VehicleKind::Bus,
            VehicleKind::Truck,
            VehicleKind::Ambulance,
            VehicleKind::Fire,
            VehicleKind::Police,
            VehicleKind::Unspecified,
        ] {
            assert_eq!(VehicleKind::from_wire(kind.wire_name()), kind);
        }
        assert_eq!(VehicleKind::from_wire("hovercraft"), VehicleKind::Unknown);
        assert_eq!(VehicleKind::from_wire(" Police "), VehicleKind::Police);
    }

    #[test]
    fn emergency_kinds_carry_high_priority() {
        assert_eq!(VehicleKind::Ambulance.default_priority(), 3);
        assert_eq!(VehicleKind::Fire.default_priority(), 3);
        assert_eq!(VehicleKind::Police.default_priority(), 3);
        assert_eq!(VehicleKind::Car.default_priority(), 0);
        assert!(!VehicleKind::Bus.is_emergency());
    }

    #[test]
    fn presets_parse_from_cli_text() {
        assert_eq!(
            "Extended".parse::<AlphabetPreset>().unwrap(),
            AlphabetPreset::Extended
        );
        assert!("greek".parse::<AlphabetPreset>().is_err());
    }
}
