//! Saved filter and sorter settings of a list.

use serde::{Deserialize, Serialize};

/// The descriptors a view saves between sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    /// Filter descriptor; `None` means no filter.
    pub filter: Option<String>,
    /// Sorter descriptor; `None` means source order.
    pub sorter: Option<String>,
    /// Display name of the sorter.
    pub sorter_name: Option<String>,
}

impl ListSettings {
    pub fn is_default(&self) -> bool {
        self.filter.is_none() && self.sorter.is_none()
    }
}
