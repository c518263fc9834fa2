//! Enforcement switches for a single note read.

use serde::{Deserialize, Serialize};

use crate::note::AccessContext;
use crate::types::LogId;

/// Options for retrieving a note.
///
/// Every check defaults to enforcing. Status checks that must not consume a
/// read, or must see past the burn date, switch individual checks off rather
/// than bypassing the store.
///
/// | field | `true` | `false` |
/// |---|---|---|
/// | `check_allowed_reads` | fail once reads consumed >= allowed reads | ignore the budget |
/// | `check_burn_date` | fail once now >= burn date | ignore expiry |
/// | `add_access` | record this read | leave access state untouched |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct NoteReadOptions {
    pub check_allowed_reads: bool,
    pub check_burn_date: bool,
    pub add_access: bool,
    /// Context stored on the access record when `add_access` is set.
    pub context: AccessContext,
}

impl Default for NoteReadOptions {
    fn default() -> Self {
        Self {
            check_allowed_reads: true,
            check_burn_date: true,
            add_access: true,
            context: AccessContext::default(),
        }
    }
}

impl NoteReadOptions {
    /// Fully enforcing read recorded against the given request log.
    pub fn for_log(log_id: LogId) -> Self {
        Self::default().with_context(AccessContext::for_log(log_id))
    }

    /// Read that neither enforces nor records anything.
    pub fn inspect() -> Self {
        Self {
            check_allowed_reads: false,
            check_burn_date: false,
            add_access: false,
            context: AccessContext::default(),
        }
    }

    pub fn with_check_allowed_reads(mut self, check: bool) -> Self {
        self.check_allowed_reads = check;
        self
    }

    pub fn with_check_burn_date(mut self, check: bool) -> Self {
        self.check_burn_date = check;
        self
    }

    pub fn with_add_access(mut self, add: bool) -> Self {
        self.add_access = add;
        self
    }

    pub fn with_context(mut self, context: AccessContext) -> Self {
        self.context = context;
        self
    }
}
