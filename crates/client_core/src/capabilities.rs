//! Permission codes resolved once per session into a capability set that the
//! table layer receives explicitly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<PermissionCode>);

impl CapabilitySet {
    pub fn from_codes(codes: impl IntoIterator<Item = u32>) -> Self {
        Self(codes.into_iter().map(PermissionCode).collect())
    }

    pub fn allows(&self, code: PermissionCode) -> bool {
        self.0.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: String,
    pub title: String,
    /// Column is hidden unless the session holds this permission.
    pub required: Option<PermissionCode>,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            required: None,
        }
    }

    pub fn gated(mut self, code: u32) -> Self {
        self.required = Some(PermissionCode(code));
        self
    }

    pub fn visible_to(&self, caps: &CapabilitySet) -> bool {
        self.required.map_or(true, |code| caps.allows(code))
    }
}

pub fn visible_columns<'a>(columns: &'a [ColumnSpec], caps: &CapabilitySet) -> Vec<&'a ColumnSpec> {
    columns.iter().filter(|c| c.visible_to(caps)).collect()
}
