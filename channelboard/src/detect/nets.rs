//! Net resolution: connected pad sets of a connection list, with names.

use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

use crate::model::{ConnectionDef, PadRef};

/// Pad → net name for every pad that takes part in a connection.
///
/// A net is named after the first explicit `net` among its connections, then
/// `GND`/`VCC` from the ground/power flags, then `N<k>` in order of first
/// appearance.
#[derive(Debug, Clone, Default)]
pub struct NetMap {
    pad_nets: HashMap<PadRef, String>,
}

/// Dense ids for pads in order of first appearance.
pub(crate) struct PadIndex {
    ids: HashMap<PadRef, usize>,
    pads: Vec<PadRef>,
}

impl PadIndex {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
            pads: Vec::new(),
        }
    }

    pub(crate) fn intern(&mut self, pad: &PadRef) -> usize {
        if let Some(&id) = self.ids.get(pad) {
            return id;
        }
        let id = self.pads.len();
        self.ids.insert(pad.clone(), id);
        self.pads.push(pad.clone());
        id
    }

    pub(crate) fn get(&self, pad: &PadRef) -> Option<usize> {
        self.ids.get(pad).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.pads.len()
    }
}

impl NetMap {
    pub fn build(connections: &[ConnectionDef]) -> Self {
        let mut index = PadIndex::new();
        for conn in connections {
            index.intern(&conn.from);
            index.intern(&conn.to);
        }

        let mut uf = UnionFind::<usize>::new(index.len());
        for conn in connections {
            if let (Some(a), Some(b)) = (index.get(&conn.from), index.get(&conn.to)) {
                uf.union(a, b);
            }
        }

        let mut names: HashMap<usize, String> = HashMap::new();
        for conn in connections {
            if let (Some(net), Some(a)) = (&conn.net, index.get(&conn.from)) {
                names.entry(uf.find(a)).or_insert_with(|| net.clone());
            }
        }
        for conn in connections.iter().filter(|c| c.is_ground) {
            if let Some(a) = index.get(&conn.from) {
                names.entry(uf.find(a)).or_insert_with(|| "GND".to_string());
            }
        }
        for conn in connections.iter().filter(|c| c.is_power) {
            if let Some(a) = index.get(&conn.from) {
                names.entry(uf.find(a)).or_insert_with(|| "VCC".to_string());
            }
        }

        let mut next = 1;
        let mut pad_nets = HashMap::new();
        for (id, pad) in index.pads.iter().enumerate() {
            let root = uf.find(id);
            let name = names
                .entry(root)
                .or_insert_with(|| {
                    let name = format!("N{}", next);
                    next += 1;
                    name
                })
                .clone();
            pad_nets.insert(pad.clone(), name);
        }

        Self { pad_nets }
    }

    pub fn net_of(&self, pad: &PadRef) -> Option<&str> {
        self.pad_nets.get(pad).map(String::as_str)
    }

    /// Net carried by a connection (its explicit name wins).
    pub fn net_for(&self, conn: &ConnectionDef) -> String {
        conn.net
            .clone()
            .or_else(|| self.net_of(&conn.from).map(str::to_string))
            .unwrap_or_else(|| "N0".to_string())
    }

    /// Are both pads on the same net?
    pub fn same_net(&self, a: &PadRef, b: &PadRef) -> bool {
        matches!((self.net_of(a), self.net_of(b)), (Some(x), Some(y)) if x == y)
    }

    /// Distinct net names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pad_nets.values().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(a: &str, b: &str) -> ConnectionDef {
        let (ai, ap) = a.split_once(':').unwrap();
        let (bi, bp) = b.split_once(':').unwrap();
        ConnectionDef::manual(PadRef::new(ai, ap), PadRef::new(bi, bp))
    }

    #[test]
    fn test_transitive_pads_share_a_net() {
        let conns = vec![conn("a/0:1", "b/0:1"), conn("b/0:1", "c/0:2"), conn("d/0:1", "e/0:1")];
        let nets = NetMap::build(&conns);
        assert!(nets.same_net(&PadRef::new("a/0", "1"), &PadRef::new("c/0", "2")));
        assert!(!nets.same_net(&PadRef::new("a/0", "1"), &PadRef::new("d/0", "1")));
        assert_eq!(nets.net_of(&PadRef::new("a/0", "1")), Some("N1"));
        assert_eq!(nets.net_of(&PadRef::new("e/0", "1")), Some("N2"));
    }

    #[test]
    fn test_explicit_name_and_flags() {
        let mut ground = conn("bat/0:-", "ic/0:4");
        ground.is_ground = true;
        let named = conn("ic/0:5", "usb/0:D+").with_net("USB_DP");
        let nets = NetMap::build(&[ground, named]);
        assert_eq!(nets.net_of(&PadRef::new("ic/0", "4")), Some("GND"));
        assert_eq!(nets.net_of(&PadRef::new("usb/0", "D+")), Some("USB_DP"));
        assert_eq!(nets.names(), vec!["GND", "USB_DP"]);
    }

    #[test]
    fn test_unconnected_pad_has_no_net() {
        let nets = NetMap::build(&[conn("a/0:1", "b/0:1")]);
        assert_eq!(nets.net_of(&PadRef::new("a/0", "2")), None);
    }
}
