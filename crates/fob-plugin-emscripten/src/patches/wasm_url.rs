use super::{PatchOutcome, Transformation};
use crate::error::PatchFailure;
use crate::matcher::{self, Pattern};
use regex::Regex;

const PRE: &str = "wasm-url-pre";
const POST: &str = "wasm-url-post";

/// `new URL("index.wasm"[, base])`. The base may hold one level of
/// parentheses; anything deeper is left for the caller to report.
static WASM_URL_ANY: Pattern = Pattern::new("wasm", || {
    Regex::new(
        r#"new\s+URL\s*\(\s*["']index\.wasm["'](?:\s*,\s*(?:[^()]|\([^()]*\))*)?\)"#,
    )
    .unwrap()
});

/// `new URL("index.wasm")` with no base argument
static WASM_URL_BARE: Pattern = Pattern::new("wasm", || {
    Regex::new(r#"new\s+URL\s*\(\s*["']index\.wasm["']\s*\)"#).unwrap()
});

const BARE_WASM_URL: &str = r#"new URL("index.wasm")"#;
const MODULE_RELATIVE_WASM_URL: &str = r#"new URL("index.wasm", import.meta.url)"#;

/// Drops the base argument before bundling so the bundler resolves the
/// binary relative to itself instead of leaving a runtime lookup behind
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmUrlPre;

impl Transformation for WasmUrlPre {
    fn name(&self) -> &'static str {
        PRE
    }

    fn apply(&self, code: &str) -> PatchOutcome {
        match matcher::find(code, &WASM_URL_ANY) {
            Some(span) => PatchOutcome::applied(span.replace_in(code, BARE_WASM_URL)),
            None => PatchOutcome::failed(
                code,
                PatchFailure::pattern_not_found(PRE, WASM_URL_ANY.name()),
            ),
        }
    }
}

/// Restores `import.meta.url` as the base once the loader's final location
/// is fixed. Only the bare form is accepted, so running it twice never adds
/// a second base argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmUrlPost;

impl Transformation for WasmUrlPost {
    fn name(&self) -> &'static str {
        POST
    }

    fn apply(&self, code: &str) -> PatchOutcome {
        match matcher::find(code, &WASM_URL_BARE) {
            Some(span) => PatchOutcome::applied(span.replace_in(code, MODULE_RELATIVE_WASM_URL)),
            None => PatchOutcome::failed(
                code,
                PatchFailure::pattern_not_found(POST, WASM_URL_BARE.name()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMITTED: &str = r#"var wasmBinaryFile = new URL('index.wasm', import.meta.url).href;"#;

    #[test]
    fn test_pre_drops_base_argument() {
        let outcome = WasmUrlPre.apply(EMITTED);
        assert_eq!(
            outcome.code,
            r#"var wasmBinaryFile = new URL("index.wasm").href;"#
        );
    }

    #[test]
    fn test_pre_accepts_bare_form() {
        let code = r#"f(new URL( "index.wasm" ))"#;
        assert_eq!(WasmUrlPre.apply(code).code, r#"f(new URL("index.wasm"))"#);
    }

    #[test]
    fn test_pre_without_wasm_url_fails() {
        let code = r#"new URL("other.wasm", import.meta.url)"#;
        let outcome = WasmUrlPre.apply(code);
        assert_eq!(outcome.code, code);
        assert_eq!(outcome.reason().unwrap(), "Could not find wasm");
    }

    #[test]
    fn test_post_adds_module_base() {
        let code = r#"var wasmBinaryFile = new URL("index.wasm").href;"#;
        assert_eq!(
            WasmUrlPost.apply(code).code,
            r#"var wasmBinaryFile = new URL("index.wasm", import.meta.url).href;"#
        );
    }

    #[test]
    fn test_post_twice_does_not_duplicate_argument() {
        let once = WasmUrlPost.apply(r#"new URL("index.wasm")"#).code;
        let twice = WasmUrlPost.apply(&once);

        assert!(twice.is_failed());
        assert_eq!(twice.code, once);
        assert_eq!(once.matches("import.meta.url").count(), 1);
    }

    #[test]
    fn test_post_without_pre_fails_cleanly() {
        let outcome = WasmUrlPost.apply(EMITTED);
        assert!(outcome.is_failed());
        assert_eq!(outcome.code, EMITTED);
    }

    #[test]
    fn test_pre_then_post_restores_two_argument_form() {
        let pre = WasmUrlPre.apply(EMITTED).code;
        let post = WasmUrlPost.apply(&pre).code;
        assert_eq!(
            post,
            r#"var wasmBinaryFile = new URL("index.wasm", import.meta.url).href;"#
        );
    }

    #[test]
    fn test_pre_with_call_base_keeps_parens_balanced() {
        let code = r#"var f = new URL("index.wasm", getBase()).href;"#;
        let outcome = WasmUrlPre.apply(code);
        assert!(!outcome.is_failed());
        assert_eq!(outcome.code, r#"var f = new URL("index.wasm").href;"#);
    }

    #[test]
    fn test_pre_with_nested_call_base_fails_cleanly() {
        let code = r#"var f = new URL("index.wasm", resolve(getBase())).href;"#;
        let outcome = WasmUrlPre.apply(code);
        assert!(outcome.is_failed());
        assert_eq!(outcome.code, code);
    }

    #[test]
    fn test_pre_with_custom_base() {
        let code = r#"new URL("index.wasm", self.location.href)"#;
        assert_eq!(WasmUrlPre.apply(code).code, BARE_WASM_URL);
    }
}
