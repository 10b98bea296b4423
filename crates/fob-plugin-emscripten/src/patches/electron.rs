use super::{PatchOutcome, Transformation};
use crate::error::PatchFailure;
use crate::matcher::{self, Pattern};
use regex::Regex;

const NAME: &str = "electron-shim";

/// Emscripten decides it runs under Node when `process` is an object, which
/// is also true in an Electron renderer. The shim adds an Electron check and
/// excludes it from the Node branch so the web code path is taken.
const ELECTRON_DECLARATION: &str = "var ENVIRONMENT_IS_ELECTRON = typeof process == \"object\" && typeof navigator == \"object\" && navigator.userAgent.toLowerCase().includes(\"electron\");";

const ELECTRON_GUARD: &str = " && !ENVIRONMENT_IS_ELECTRON";

static NODE_DECLARATION: Pattern = Pattern::new("ENVIRONMENT_IS_NODE", || {
    Regex::new(r"var ENVIRONMENT_IS_NODE\b.*?;").unwrap()
});

/// Injects `ENVIRONMENT_IS_ELECTRON` above Emscripten's Node detection
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectronShim;

impl Transformation for ElectronShim {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, code: &str) -> PatchOutcome {
        let Some(span) = matcher::find(code, &NODE_DECLARATION) else {
            return PatchOutcome::failed(
                code,
                PatchFailure::pattern_not_found(NAME, NODE_DECLARATION.name()),
            );
        };

        if span.text.contains("ENVIRONMENT_IS_ELECTRON") {
            return PatchOutcome::failed(code, PatchFailure::already_applied(NAME));
        }

        // The lazy match always ends at the declaration's terminating `;`.
        let expression = &span.text[..span.text.len() - 1];
        let replacement = format!("{ELECTRON_DECLARATION}\n{expression}{ELECTRON_GUARD};");

        PatchOutcome::applied(span.replace_in(code, &replacement))
    }
}
