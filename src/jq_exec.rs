use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, load};
use jaq_json::Val;
use serde_json::Value;

/// Run a jq filter over one document; every output becomes a record.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| {
        let reasons: Vec<_> = errs.into_iter().map(|(_, err)| err).collect();
        anyhow!("cannot parse jq filter `{filter_src}`: {reasons:?}")
    })?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let names: Vec<&str> = errs.iter().flat_map(|(_, list)| list.iter().map(|(name, _)| *name)).collect();
            anyhow!("jq filter `{filter_src}` uses undefined names: {}", names.join(", "))
        })?;

    let inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &inputs), Val::from(input.clone())))
        .map(|out| {
            let v = out.map_err(|e| anyhow!("jq filter failed: {e:?}"))?;
            // Val's Display is JSON text
            Ok(serde_json::from_str(&v.to_string())?)
        })
        .collect()
}
