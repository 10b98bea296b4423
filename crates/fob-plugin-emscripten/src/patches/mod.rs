//! Catalog of loader transformations
//!
//! Each transformation is one pattern lookup plus a fixed substitution. They
//! are pure: the same input always yields the same [`PatchOutcome`], and a
//! failed outcome carries the input back unchanged.
//!
//! | Name            | Edit                                                    |
//! |-----------------|---------------------------------------------------------|
//! | `electron-shim` | declare `ENVIRONMENT_IS_ELECTRON`, exclude it from Node |
//! | `wasm-url-pre`  | `new URL("index.wasm", ..)` → `new URL("index.wasm")`   |
//! | `wasm-url-post` | `new URL("index.wasm")` → `new URL("index.wasm", import.meta.url)` |
//! | `worker-hoist`  | hoist `new Worker(new URL(.., import.meta.url))`'s URL  |

mod electron;
mod wasm_url;
mod worker;

pub use electron::ElectronShim;
pub use wasm_url::{WasmUrlPost, WasmUrlPre};
pub use worker::{HOISTED_WORKER_URL, WorkerHoist};

use crate::error::PatchFailure;
use serde::{Deserialize, Serialize};

/// Result of one transformation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Transformed text, or the untouched input when the patch failed
    pub code: String,
    pub failure: Option<PatchFailure>,
}

impl PatchOutcome {
    pub fn applied(code: String) -> Self {
        Self {
            code,
            failure: None,
        }
    }

    pub fn failed(input: &str, failure: PatchFailure) -> Self {
        Self {
            code: input.to_string(),
            failure: Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }

    /// Split into the patched text or the failure
    pub fn into_result(self) -> Result<String, PatchFailure> {
        match self.failure {
            None => Ok(self.code),
            Some(failure) => Err(failure),
        }
    }
}

/// A named, pure text edit on loader source
pub trait Transformation: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, code: &str) -> PatchOutcome;
}

/// Identifies one of the catalog's transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchKind {
    ElectronShim,
    WasmUrlPre,
    WasmUrlPost,
    WorkerHoist,
}

impl PatchKind {
    pub const ALL: [PatchKind; 4] = [
        PatchKind::ElectronShim,
        PatchKind::WasmUrlPre,
        PatchKind::WasmUrlPost,
        PatchKind::WorkerHoist,
    ];

    /// The transformation this kind stands for
    pub fn transformation(self) -> &'static dyn Transformation {
        match self {
            PatchKind::ElectronShim => &ElectronShim,
            PatchKind::WasmUrlPre => &WasmUrlPre,
            PatchKind::WasmUrlPost => &WasmUrlPost,
            PatchKind::WorkerHoist => &WorkerHoist,
        }
    }

    pub fn name(self) -> &'static str {
        self.transformation().name()
    }

    pub fn apply(self, code: &str) -> PatchOutcome {
        self.transformation().apply(code)
    }
}

impl std::fmt::Display for PatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatchKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Unknown patch: {}", s))
    }
}
