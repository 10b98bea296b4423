use super::{PatchOutcome, Transformation};
use crate::error::PatchFailure;
use crate::matcher::{self, Pattern};
use regex::Regex;

const NAME: &str = "worker-hoist";

/// Identifier the hoisted worker URL is bound to
pub const HOISTED_WORKER_URL: &str = "__emscripten_worker_url";

/// Any single line that constructs a worker
static WORKER_CONSTRUCTION: Pattern = Pattern::new("worker-construction", || {
    Regex::new(r"(?m)^[ \t]*.*\bnew\s+Worker\s*\(.*$").unwrap()
});

/// `new Worker(new URL(.., import.meta.url)` at the start of the call
static WORKER_URL_ARGUMENT: Pattern = Pattern::new("worker-url-argument", || {
    Regex::new(
        r#"new\s+Worker\s*\(\s*new\s+URL\s*\(\s*(?:(?:"[^"\n]*"|'[^'\n]*')\s*,\s*)?import\.meta\.url\s*\)"#,
    )
    .unwrap()
});

static MODULE_RELATIVE_URL: Pattern = Pattern::new("worker-url-argument", || {
    Regex::new(
        r#"new\s+URL\s*\(\s*(?:(?:"[^"\n]*"|'[^'\n]*')\s*,\s*)?import\.meta\.url\s*\)"#,
    )
    .unwrap()
});

/// Moves the module-relative URL out of a `new Worker(..)` call into its own
/// `const`, so bundlers stop treating the call site as a worker entry point
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerHoist;

impl Transformation for WorkerHoist {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, code: &str) -> PatchOutcome {
        let mut saw_worker = false;

        // Loaders may construct other workers (pthread scripts, trusted
        // types) before the module-relative one
        for statement in matcher::find_all(code, &WORKER_CONSTRUCTION) {
            saw_worker = true;

            let url = matcher::find_in(code, &statement, &WORKER_URL_ARGUMENT)
                .and_then(|argument| matcher::find_in(code, &argument, &MODULE_RELATIVE_URL));
            let Some(url) = url else {
                continue;
            };

            let indent_len = statement.text.len() - statement.text.trim_start().len();
            let indent = &statement.text[..indent_len];

            let mut replacement = format!("{indent}const {HOISTED_WORKER_URL} = {};\n", url.text);
            replacement.push_str(&code[statement.start()..url.start()]);
            replacement.push_str(HOISTED_WORKER_URL);
            replacement.push_str(&code[url.end()..statement.end()]);

            return PatchOutcome::applied(statement.replace_in(code, &replacement));
        }

        let missing = if saw_worker {
            &WORKER_URL_ARGUMENT
        } else {
            &WORKER_CONSTRUCTION
        };
        PatchOutcome::failed(code, PatchFailure::pattern_not_found(NAME, missing.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAWN: &str = r#"    worker = new Worker(new URL("index.js", import.meta.url), { type: "module", name: "em-pthread" });"#;

    #[test]
    fn test_hoists_url_into_const() {
        let code = format!("function allocateUnusedWorker() {{\n{SPAWN}\n}}");
        let outcome = WorkerHoist.apply(&code);
        assert!(!outcome.is_failed(), "{:?}", outcome.failure);

        let lines: Vec<&str> = outcome.code.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            r#"    const __emscripten_worker_url = new URL("index.js", import.meta.url);"#
        );
        assert_eq!(
            lines[2],
            r#"    worker = new Worker(__emscripten_worker_url, { type: "module", name: "em-pthread" });"#
        );
        assert_eq!(lines[3], "}");
    }

    #[test]
    fn test_single_argument_module_url() {
        let code = "var w = new Worker(new URL(import.meta.url));";
        let outcome = WorkerHoist.apply(code);
        assert_eq!(
            outcome.code,
            "const __emscripten_worker_url = new URL(import.meta.url);\nvar w = new Worker(__emscripten_worker_url);"
        );
    }

    #[test]
    fn test_missing_worker_names_outer_pattern() {
        let outcome = WorkerHoist.apply("var x = 1;");
        assert_eq!(outcome.code, "var x = 1;");
        assert_eq!(
            outcome.failure,
            Some(PatchFailure::pattern_not_found(NAME, "worker-construction"))
        );
    }

    #[test]
    fn test_worker_without_module_url_names_inner_pattern() {
        let code = r#"worker = new Worker("pthread.worker.js");"#;
        let outcome = WorkerHoist.apply(code);
        assert_eq!(outcome.code, code);
        assert_eq!(
            outcome.failure,
            Some(PatchFailure::pattern_not_found(NAME, "worker-url-argument"))
        );
    }

    #[test]
    fn test_skips_workers_without_module_url() {
        let code = "var w0 = new Worker(pthreadMainJs);\n\
                    var w1 = new Worker(new URL(\"index.js\", import.meta.url));";
        let outcome = WorkerHoist.apply(code);
        assert!(!outcome.is_failed(), "{:?}", outcome.failure);
        assert_eq!(
            outcome.code,
            "var w0 = new Worker(pthreadMainJs);\n\
             const __emscripten_worker_url = new URL(\"index.js\", import.meta.url);\n\
             var w1 = new Worker(__emscripten_worker_url);"
        );
    }

    #[test]
    fn test_second_application_fails_cleanly() {
        let once = WorkerHoist.apply(SPAWN).code;
        let twice = WorkerHoist.apply(&once);

        assert_eq!(twice.code, once);
        assert_eq!(
            twice.failure,
            Some(PatchFailure::pattern_not_found(NAME, "worker-url-argument"))
        );
    }

    #[test]
    fn test_url_not_first_argument_is_ignored() {
        let code = r#"new Worker(script, new URL("x.js", import.meta.url));"#;
        assert!(WorkerHoist.apply(code).is_failed());
    }
}
