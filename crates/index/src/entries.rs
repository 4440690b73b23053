//! `Indexable` implementations for the protocol entry types

use pulse_protocol::{LogEntry, MonitoringEntry};

use crate::{Dimension, Indexable};

impl Indexable for LogEntry {
    #[inline]
    fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn index_keys(&self) -> Vec<(Dimension, &str)> {
        let mut keys = vec![
            (Dimension::Source, self.source_id.as_str()),
            (Dimension::Level, self.level.as_str()),
        ];
        if let Some(script_id) = &self.script_id {
            keys.push((Dimension::Script, script_id.as_str()));
        }
        keys
    }
}

impl Indexable for MonitoringEntry {
    #[inline]
    fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn index_keys(&self) -> Vec<(Dimension, &str)> {
        vec![
            (Dimension::Source, self.source_id.as_str()),
            (Dimension::Module, self.module_id.as_str()),
            (Dimension::Script, self.script_id.as_str()),
            (Dimension::Kind, self.kind.as_str()),
            (Dimension::Name, self.name.as_str()),
        ]
    }
}
