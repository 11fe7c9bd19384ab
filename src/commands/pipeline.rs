//! Full build-and-package pipelines

use anyhow::bail;

use snowball::output::PipelineResult;
use snowball::runner::PipelineReport;

use super::Context;

/// Build the project and rewrite its models into stored procedures
pub async fn sql(ctx: &Context) -> anyhow::Result<()> {
    let settings = ctx.settings()?;
    let mut reporter = ctx.reporter();
    let report = ctx.runner().sql_pipeline(&settings, reporter.as_mut()).await?;
    finish("sql", report, ctx)
}

/// Build the project and assemble its models into notebooks
pub async fn notebooks(ctx: &Context) -> anyhow::Result<()> {
    let settings = ctx.settings()?;
    let mut reporter = ctx.reporter();
    let report = ctx.runner().notebook_pipeline(&settings, reporter.as_mut()).await?;
    finish("notebooks", report, ctx)
}

fn finish(name: &str, report: PipelineReport, ctx: &Context) -> anyhow::Result<()> {
    let result = PipelineResult::new(name, report);
    result.render(ctx.output_mode);
    if !result.success {
        bail!("{name} pipeline finished with failures");
    }
    Ok(())
}
