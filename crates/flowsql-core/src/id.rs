//! Strongly-typed identifiers used across the engine.
//!
//! `ProcessId` is fixed for the lifetime of the process and `UniqueId` is minted
//! fresh per worker invocation; together they name output objects
//! (`Part-<processId>-<uniqueId>`).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! new_uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn get(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.simple())
            }
        }
    };
}

new_uuid_id!(ProcessId);
new_uuid_id!(UniqueId);

static PROCESS_ID: Lazy<ProcessId> = Lazy::new(|| ProcessId(Uuid::new_v4()));

/// Identifier shared by every output object this process writes.
pub fn process_id() -> ProcessId {
    *PROCESS_ID
}

impl UniqueId {
    pub fn fresh() -> Self {
        UniqueId(Uuid::new_v4())
    }
}
