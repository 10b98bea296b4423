//! Rolldown integration
//!
//! Maps rolldown's `transform`, `generate_bundle` and `write_bundle` hooks
//! onto the host-agnostic hooks of [`EmscriptenPlugin`]. Each output
//! generation starts a fresh build in the directory rolldown resolved from
//! its `dir`/`file` options.

use crate::artifact::OutputFormat;
use crate::context::resolve_out_dir;
use crate::pipeline::{BundleEntry, BundleEntryKind};
use crate::plugin::EmscriptenPlugin;
use rolldown_common::Output;
use rolldown_plugin::{
    HookGenerateBundleArgs, HookNoopReturn, HookTransformArgs, HookTransformOutput,
    HookTransformReturn, HookUsage, HookWriteBundleArgs, Plugin, PluginContext,
    SharedTransformPluginContext,
};
use std::borrow::Cow;
use std::sync::Arc;

fn output_format(format: rolldown_common::OutputFormat) -> OutputFormat {
    match format {
        rolldown_common::OutputFormat::Cjs => OutputFormat::Cjs,
        rolldown_common::OutputFormat::Iife => OutputFormat::Iife,
        rolldown_common::OutputFormat::Umd => OutputFormat::Umd,
        _ => OutputFormat::Es,
    }
}

impl Plugin for EmscriptenPlugin {
    fn name(&self) -> Cow<'static, str> {
        EmscriptenPlugin::name(self).into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform | HookUsage::GenerateBundle | HookUsage::WriteBundle
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let patched = EmscriptenPlugin::transform(self, args.id, args.code);

        async move {
            Ok(patched.map(|code| HookTransformOutput {
                code: Some(code),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }

    fn generate_bundle(
        &self,
        _ctx: &PluginContext,
        args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let format = output_format(args.options.format);
        self.begin_build(resolve_out_dir(
            &args.options.cwd,
            args.options.dir.as_deref(),
            args.options.file.as_deref(),
        ));

        // Asset bytes are never inspected, so only chunk text is copied out
        let mut entries: Vec<BundleEntry> = args
            .bundle
            .iter()
            .map(|output| match output {
                Output::Chunk(chunk) => {
                    let modules = chunk.modules.keys.iter().map(|id| {
                        let id: &str = id.as_ref();
                        id.to_string()
                    });
                    BundleEntry::chunk(chunk.filename.to_string(), chunk.code.clone())
                        .with_modules(modules)
                }
                Output::Asset(asset) => BundleEntry::asset(asset.filename.to_string(), Vec::new()),
            })
            .collect();

        EmscriptenPlugin::generate_bundle(self, format, &mut entries);

        for (output, entry) in args.bundle.iter_mut().zip(entries) {
            let (Output::Chunk(chunk), BundleEntryKind::Chunk { code }) = (output, entry.kind)
            else {
                continue;
            };
            if chunk.code != code {
                let mut patched = (**chunk).clone();
                patched.code = code;
                *chunk = Arc::new(patched);
            }
        }

        async { Ok(()) }
    }

    fn write_bundle(
        &self,
        _ctx: &PluginContext,
        _args: &mut HookWriteBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let plugin = self.clone();

        async move {
            plugin.write_bundle().await;
            Ok(())
        }
    }
}
