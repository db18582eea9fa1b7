//! Tests for connection detection

use channelboard::detect::clear_auto_detected;
use channelboard::footprint::{Footprint, FootprintLibrary, Pad, PadRole};
use channelboard::prelude::*;
use channelboard::Size;

fn single_pad_footprint(component_type: &str, pad_id: &str, role: PadRole) -> Footprint {
    Footprint {
        component_type: component_type.to_string(),
        aliases: vec![],
        size: Size::new(6.0, 6.0),
        pads: vec![Pad {
            id: pad_id.to_string(),
            offset: Point::new(0.0, 0.0),
            size: Size::new(1.5, 1.5),
            role,
        }],
        outline: None,
    }
}

fn power_pair() -> Vec<AssemblyComponent> {
    vec![
        AssemblyComponent::new("battery", 1).with_id("bat"),
        AssemblyComponent::new("attiny85", 1).with_id("mcu"),
    ]
}

fn ground_wire() -> ConnectionDef {
    ConnectionDef::manual(PadRef::new("bat/0", "-"), PadRef::new("mcu/0", "4"))
}

#[test]
fn test_power_source_feeds_ic() {
    let footprints = FootprintLibrary::new()
        .with_footprint(single_pad_footprint("solar-cell", "OUT+", PadRole::Vcc))
        .with_footprint(single_pad_footprint("sensor-ic", "VIN", PadRole::Unknown));
    let core = LayoutCore::new(footprints);
    let components = vec![
        AssemblyComponent::new("solar-cell", 1).with_id("pv"),
        AssemblyComponent::new("sensor-ic", 1).with_id("ic"),
    ];
    let result = core.detect_connections(&components, &[]);

    assert_eq!(result.connections.len(), 1);
    let conn = &result.connections[0];
    assert!(conn.is_power);
    assert!(conn.auto_detected);
    assert_eq!(conn.net.as_deref(), Some("VCC"));
    assert_eq!(conn.from, PadRef::new("pv/0", "OUT+"));
    assert_eq!(conn.to, PadRef::new("ic/0", "VIN"));
    assert_eq!(result.stats.power_connections, 1);
    assert_eq!(result.stats.ground_connections, 0);
    assert!(result.stats.unknown_types.is_empty());
}

#[test]
fn test_existing_ground_wire_leaves_only_power() {
    let core = LayoutCore::default();
    let existing = vec![ground_wire()];
    let result = core.detect_connections(&power_pair(), &existing);

    assert_eq!(result.connections.len(), 1, "Only VCC is left to connect");
    assert!(result.connections[0].joins(&PadRef::new("bat/0", "+"), &PadRef::new("mcu/0", "8")));
}

#[test]
fn test_detection_is_idempotent() {
    let core = LayoutCore::default();
    let components = vec![
        AssemblyComponent::new("battery", 1).with_id("bat"),
        AssemblyComponent::new("ne555", 2).with_id("timer"),
        AssemblyComponent::new("led", 1).with_id("d"),
    ];

    let first = core.detect_connections(&components, &[]);
    assert!(!first.connections.is_empty());

    let second = core.detect_connections(&components, &first.connections);
    assert!(second.connections.is_empty(), "Second pass should add nothing");
    assert_eq!(second.stats.total(), 0);
}

#[test]
fn test_existing_pairs_are_skipped() {
    let core = LayoutCore::default();
    let components = vec![
        AssemblyComponent::new("battery", 1).with_id("bat"),
        AssemblyComponent::new("ne555", 2).with_id("timer"),
    ];
    // Two of the three VCC pairs are wired by hand
    let existing = vec![
        ConnectionDef::manual(PadRef::new("bat/0", "+"), PadRef::new("timer/0", "8")),
        ConnectionDef::manual(PadRef::new("timer/0", "8"), PadRef::new("timer/1", "8")),
    ];
    let result = core.detect_connections(&components, &existing);
    assert_eq!(result.stats.power_connections, 1);
    assert!(result.connections[0].joins(&PadRef::new("bat/0", "+"), &PadRef::new("timer/1", "8")));
    assert_eq!(result.stats.ground_connections, 3);
}

#[test]
fn test_usb_data_lines_pair_with_ic() {
    let core = LayoutCore::default();
    let components = vec![
        AssemblyComponent::new("usb-connector", 1).with_id("usb"),
        AssemblyComponent::new("attiny85", 1).with_id("mcu"),
    ];
    let result = core.detect_connections(&components, &[]);

    assert_eq!(result.stats.other_connections, 2);
    let data: Vec<&ConnectionDef> = result
        .connections
        .iter()
        .filter(|c| !c.is_power && !c.is_ground)
        .collect();
    assert_eq!(data[0].net.as_deref(), Some("DATA1"));
    assert_eq!(data[1].net.as_deref(), Some("DATA2"));
}

#[test]
fn test_unknown_types_reported() {
    let core = LayoutCore::default();
    let components = vec![
        AssemblyComponent::new("flux-compensator", 2).with_id("fc"),
        AssemblyComponent::new("battery", 1).with_id("bat"),
    ];
    let result = core.detect_connections(&components, &[]);
    assert_eq!(result.stats.unknown_types, vec!["flux-compensator".to_string()]);
}

#[test]
fn test_clear_keeps_manual_connections() {
    let core = LayoutCore::default();
    let manual = ground_wire();
    let mut connections = vec![manual.clone()];
    let detected = core.detect_connections(&power_pair(), &connections);
    connections.extend(detected.connections);
    assert_eq!(connections.len(), 2);

    assert_eq!(clear_auto_detected(&mut connections), 1);
    assert_eq!(connections, vec![manual]);
}
