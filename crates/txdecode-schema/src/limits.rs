use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

/// Default maximum message nesting depth for one walk.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum number of field records visited in one walk.
pub const DEFAULT_MAX_FIELDS: usize = 65_536;

/// Bounds applied to every recursive walk over untrusted bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkLimits {
    /// Maximum nesting depth; the top-level message is depth 1.
    pub max_depth: usize,
    /// Maximum number of field records, counted across all nesting levels.
    pub max_fields: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

/// Running counters for one walk.
#[derive(Debug)]
pub(crate) struct Budget {
    limits: WalkLimits,
    depth: usize,
    fields: usize,
    deepest: usize,
}

impl Budget {
    pub(crate) fn new(limits: WalkLimits) -> Self {
        Self {
            limits,
            depth: 0,
            fields: 0,
            deepest: 0,
        }
    }

    pub(crate) fn enter(&mut self) -> Result<(), SchemaError> {
        if self.depth >= self.limits.max_depth {
            return Err(SchemaError::DepthExceeded {
                max: self.limits.max_depth,
            });
        }
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn count_field(&mut self) -> Result<(), SchemaError> {
        if self.fields >= self.limits.max_fields {
            return Err(SchemaError::FieldCountExceeded {
                max: self.limits.max_fields,
            });
        }
        self.fields += 1;
        Ok(())
    }

    pub(crate) fn fields(&self) -> usize {
        self.fields
    }

    pub(crate) fn deepest(&self) -> usize {
        self.deepest
    }
}
