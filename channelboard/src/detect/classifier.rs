//! Component Role Classifier
//!
//! Keyword-based classification of component types and pad labelling.
//!
//! Input: component type string (e.g. "cr2032-holder", "ATtiny85")
//! Output: role (power source, ground, connector, passive, ic, unknown)
//!
//! Types are split into lowercase alphanumeric tokens. A keyword matches a
//! token exactly; keywords of four or more characters also match as a token
//! prefix ("attiny" matches "attiny85").

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::footprint::{Footprint, Pad, PadRole};

/// Coarse electrical role of a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentRole {
    PowerSource,
    Ground,
    Connector,
    Passive,
    Ic,
    Unknown,
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentRole::PowerSource => "power source",
            ComponentRole::Ground => "ground",
            ComponentRole::Connector => "connector",
            ComponentRole::Passive => "passive",
            ComponentRole::Ic => "ic",
            ComponentRole::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// Checked in this order; the first table with a matching token wins.
const ROLE_KEYWORDS: &[(ComponentRole, &[&str])] = &[
    (
        ComponentRole::PowerSource,
        &[
            "battery", "cr2032", "coin", "cell", "lipo", "dc", "barrel", "psu", "supply",
            "power", "solar",
        ],
    ),
    (ComponentRole::Ground, &["gnd", "ground"]),
    (
        ComponentRole::Connector,
        &[
            "usb", "connector", "header", "jack", "socket", "terminal", "plug", "jst",
        ],
    ),
    (
        ComponentRole::Ic,
        &[
            "ic", "mcu", "chip", "timer", "microcontroller", "attiny", "atmega", "ne555",
            "lm555", "555", "esp32", "rp2040", "opamp", "lm358", "dip",
        ],
    ),
    (
        ComponentRole::Passive,
        &[
            "resistor", "res", "capacitor", "cap", "led", "diode", "inductor", "button",
            "switch", "pot", "potentiometer", "buzzer", "crystal", "fuse", "speaker",
        ],
    ),
];

fn tokens(component_type: &str) -> Vec<String> {
    component_type
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

fn keyword_matches(token: &str, keyword: &str) -> bool {
    token == keyword || (keyword.len() >= 4 && token.starts_with(keyword))
}

/// Classify a component type by keyword.
pub fn classify_role(component_type: &str) -> ComponentRole {
    let tokens = tokens(component_type);
    for (role, keywords) in ROLE_KEYWORDS {
        if tokens
            .iter()
            .any(|t| keywords.iter().any(|k| keyword_matches(t, k)))
        {
            return *role;
        }
    }
    ComponentRole::Unknown
}

/// Electrical label assigned to a pad for net inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadLabel {
    Vcc,
    Gnd,
    Signal,
    Data,
    /// 1-based pad position fallback
    Pin(usize),
}

impl fmt::Display for PadLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadLabel::Vcc => f.write_str("VCC"),
            PadLabel::Gnd => f.write_str("GND"),
            PadLabel::Signal => f.write_str("SIGNAL"),
            PadLabel::Data => f.write_str("DATA"),
            PadLabel::Pin(n) => write!(f, "PIN {}", n),
        }
    }
}

/// (type keyword, pad id, label). `*` applies to every type. Pad ids compare
/// case-insensitively.
const PAD_LABELS: &[(&str, &str, PadLabel)] = &[
    ("*", "vcc", PadLabel::Vcc),
    ("*", "vdd", PadLabel::Vcc),
    ("*", "vin", PadLabel::Vcc),
    ("*", "vbus", PadLabel::Vcc),
    ("*", "v+", PadLabel::Vcc),
    ("*", "5v", PadLabel::Vcc),
    ("*", "3v3", PadLabel::Vcc),
    ("*", "gnd", PadLabel::Gnd),
    ("*", "vss", PadLabel::Gnd),
    ("*", "v-", PadLabel::Gnd),
    ("*", "sda", PadLabel::Data),
    ("*", "scl", PadLabel::Data),
    ("*", "tx", PadLabel::Data),
    ("*", "rx", PadLabel::Data),
    ("*", "d+", PadLabel::Data),
    ("*", "d-", PadLabel::Data),
    ("*", "out", PadLabel::Signal),
    ("*", "in", PadLabel::Signal),
    ("battery", "+", PadLabel::Vcc),
    ("battery", "-", PadLabel::Gnd),
    ("cr2032", "+", PadLabel::Vcc),
    ("cr2032", "-", PadLabel::Gnd),
    ("jack", "+", PadLabel::Vcc),
    ("jack", "-", PadLabel::Gnd),
    ("led", "a", PadLabel::Signal),
    ("button", "1", PadLabel::Signal),
    ("button", "2", PadLabel::Signal),
];

fn table_label(type_tokens: &[String], pad_id: &str) -> Option<PadLabel> {
    let pad_id = pad_id.to_ascii_lowercase();
    PAD_LABELS.iter().find_map(|(kw, id, label)| {
        let type_matches = *kw == "*" || type_tokens.iter().any(|t| keyword_matches(t, kw));
        (type_matches && *id == pad_id).then_some(*label)
    })
}

/// Label one pad: per-type table, then the footprint's declared pad role,
/// then role defaults, then `PIN n`.
pub fn label_pad(role: ComponentRole, footprint: &Footprint, index: usize, pad: &Pad) -> PadLabel {
    if let Some(label) = table_label(&tokens(&footprint.component_type), &pad.id) {
        return label;
    }
    match pad.role {
        PadRole::Vcc => return PadLabel::Vcc,
        PadRole::Gnd => return PadLabel::Gnd,
        PadRole::Signal => return PadLabel::Signal,
        PadRole::Data => return PadLabel::Data,
        PadRole::Unknown => {}
    }
    match (role, index) {
        (ComponentRole::PowerSource, 0) => PadLabel::Vcc,
        (ComponentRole::PowerSource, 1) => PadLabel::Gnd,
        (ComponentRole::Ground, _) => PadLabel::Gnd,
        _ => PadLabel::Pin(index + 1),
    }
}

/// Label every pad of a footprint in pad order.
pub fn label_pads(role: ComponentRole, footprint: &Footprint) -> Vec<PadLabel> {
    footprint
        .pads
        .iter()
        .enumerate()
        .map(|(i, pad)| label_pad(role, footprint, i, pad))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::{FootprintLibrary, FootprintProvider};

    #[test]
    fn test_classify_roles() {
        assert_eq!(classify_role("cr2032-holder"), ComponentRole::PowerSource);
        assert_eq!(classify_role("DC-Jack"), ComponentRole::PowerSource);
        assert_eq!(classify_role("usb-connector"), ComponentRole::Connector);
        assert_eq!(classify_role("ATtiny85"), ComponentRole::Ic);
        assert_eq!(classify_role("ic-8"), ComponentRole::Ic);
        assert_eq!(classify_role("resistor"), ComponentRole::Passive);
        assert_eq!(classify_role("LED"), ComponentRole::Passive);
        assert_eq!(classify_role("GND-point"), ComponentRole::Ground);
        assert_eq!(classify_role("flux-compensator"), ComponentRole::Unknown);
    }

    #[test]
    fn test_short_keywords_do_not_prefix_match() {
        // "ic" must not swallow "icicle"
        assert_eq!(classify_role("icicle"), ComponentRole::Unknown);
    }

    #[test]
    fn test_pad_labels_from_footprint_roles() {
        let lib = FootprintLibrary::builtin();
        let fp = lib.resolve("attiny85");
        let labels = label_pads(ComponentRole::Ic, &fp);
        let by_id = |id: &str| labels[fp.pads.iter().position(|p| p.id == id).unwrap()];
        assert_eq!(by_id("8"), PadLabel::Vcc);
        assert_eq!(by_id("4"), PadLabel::Gnd);
        assert_eq!(by_id("5"), PadLabel::Data);
        assert_eq!(by_id("2"), PadLabel::Pin(2));
    }

    #[test]
    fn test_power_source_defaults() {
        let fp = Footprint::fallback("solar-panel");
        let labels = label_pads(classify_role("solar-panel"), &fp);
        assert_eq!(labels, vec![PadLabel::Vcc, PadLabel::Gnd]);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(PadLabel::Pin(3).to_string(), "PIN 3");
        assert_eq!(PadLabel::Vcc.to_string(), "VCC");
    }
}
