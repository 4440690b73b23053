//! Structured monitoring view
//!
//! Projects the monitoring live set into
//! `module → script → {variables, states, functions, properties, events}`,
//! each a `name → entry` map holding the latest observation (highest
//! `timestamp`, later arrival on ties).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use pulse_protocol::{MonitoringEntry, MonitoringKind};

/// Latest observation per name, grouped by kind
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptView {
    pub variables: BTreeMap<String, Arc<MonitoringEntry>>,
    pub states: BTreeMap<String, Arc<MonitoringEntry>>,
    pub functions: BTreeMap<String, Arc<MonitoringEntry>>,
    pub properties: BTreeMap<String, Arc<MonitoringEntry>>,
    pub events: BTreeMap<String, Arc<MonitoringEntry>>,
}

impl ScriptView {
    fn slot(&mut self, kind: MonitoringKind) -> &mut BTreeMap<String, Arc<MonitoringEntry>> {
        match kind {
            MonitoringKind::Variable => &mut self.variables,
            MonitoringKind::State => &mut self.states,
            MonitoringKind::Function => &mut self.functions,
            MonitoringKind::Property => &mut self.properties,
            MonitoringKind::Event => &mut self.events,
        }
    }
}

/// `module → script → view`
pub type MonitoringStructure = BTreeMap<String, BTreeMap<String, ScriptView>>;

/// Build the view from entries in arrival order
pub fn project<'a>(
    entries: impl IntoIterator<Item = &'a Arc<MonitoringEntry>>,
    source_id: Option<&str>,
) -> MonitoringStructure {
    let mut structure = MonitoringStructure::new();

    for entry in entries {
        if source_id.is_some_and(|s| entry.source_id != s) {
            continue;
        }

        let slot = structure
            .entry(entry.module_id.clone())
            .or_default()
            .entry(entry.script_id.clone())
            .or_default()
            .slot(entry.kind);

        let newer = slot
            .get(&entry.name)
            .is_none_or(|current| current.timestamp <= entry.timestamp);
        if newer {
            slot.insert(entry.name.clone(), Arc::clone(entry));
        }
    }

    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::monitoring;

    #[test]
    fn test_latest_wins() {
        let entries = vec![
            monitoring("m1", 20, "cart", MonitoringKind::Variable, "items"),
            monitoring("m2", 10, "cart", MonitoringKind::Variable, "items"),
            monitoring("m3", 20, "cart", MonitoringKind::Variable, "total"),
            monitoring("m4", 20, "cart", MonitoringKind::Variable, "total"),
            monitoring("m5", 5, "cart", MonitoringKind::Event, "checkout"),
            monitoring("m6", 5, "auth", MonitoringKind::State, "phase"),
        ];

        let structure = project(&entries, None);
        let cart = &structure["cart"]["main.js"];
        assert_eq!(cart.variables["items"].id, "m1");
        // equal timestamps: later arrival wins
        assert_eq!(cart.variables["total"].id, "m4");
        assert_eq!(cart.events["checkout"].id, "m5");
        assert!(cart.states.is_empty());
        assert_eq!(structure["auth"]["main.js"].states["phase"].id, "m6");
    }

    #[test]
    fn test_source_filter() {
        let entries = vec![monitoring("m1", 1, "cart", MonitoringKind::State, "open")];
        assert!(project(&entries, Some("other")).is_empty());
        assert_eq!(project(&entries, Some("app")).len(), 1);
    }
}
