//! Secondary index dimensions

use std::fmt;

/// A secondary key a record can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    /// `sourceId` (logs and monitoring)
    Source,
    /// `level` (logs)
    Level,
    /// `scriptId` (logs and monitoring)
    Script,
    /// `moduleId` (monitoring)
    Module,
    /// `type` (monitoring)
    Kind,
    /// `name` (monitoring)
    Name,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "sourceId",
            Self::Level => "level",
            Self::Script => "scriptId",
            Self::Module => "moduleId",
            Self::Kind => "type",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
