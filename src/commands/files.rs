//! Post-processing of already compiled models

use std::path::PathBuf;

use anyhow::bail;

use snowball::adapters::BatchReport;
use snowball::adapters::file::{assemble_all, rewrite_all};
use snowball::core::services::{NotebookAssembler, SqlRewriter};
use snowball::output::BatchResult;

use super::Context;

/// Rewrite compiled models into stored procedures in place
pub fn rewrite(ctx: &Context, root: Option<PathBuf>) -> anyhow::Result<()> {
    let root = root.unwrap_or_else(|| ctx.paths().compiled_dir());
    let report = rewrite_all(&root, &SqlRewriter::new())?;
    finish("rewrite", report, ctx)
}

/// Assemble compiled models into notebooks
pub fn assemble(ctx: &Context, root: Option<PathBuf>, out: Option<PathBuf>) -> anyhow::Result<()> {
    let paths = ctx.paths();
    let root = root.unwrap_or_else(|| paths.compiled_dir());
    let out = out.unwrap_or_else(|| paths.notebooks_dir());

    let assembler = NotebookAssembler::new().with_retarget(ctx.config.retarget());
    let report = assemble_all(&root, &out, &assembler)?;
    finish("assemble", report, ctx)
}

fn finish(action: &str, report: BatchReport, ctx: &Context) -> anyhow::Result<()> {
    let clean = report.is_clean();
    let summary = report.summary();
    BatchResult::new(action, report).render(ctx.output_mode);
    if !clean {
        bail!("{action}: {summary}");
    }
    Ok(())
}
