//! Single build operations

use anyhow::bail;

use snowball::core::models::{BuildOperation, PRE_RUN_SETUP_MACRO};
use snowball::output::BuildResult;
use snowball::runner::count_models;

use super::Context;

/// Run one dbt operation with a progress gauge
pub async fn build(ctx: &Context, operation: BuildOperation) -> anyhow::Result<()> {
    let settings = ctx.settings()?;
    let target = count_models(&settings.paths);
    let request = settings.request(operation);

    let mut reporter = ctx.reporter();
    let outcome = ctx.runner().run(&request, target, reporter.as_mut()).await?;

    let failure = outcome.ensure_success().err();
    BuildResult::new(outcome).render(ctx.output_mode);
    if let Some(failure) = failure {
        bail!(failure);
    }
    Ok(())
}

/// Run the pre-run setup macro
pub async fn setup(ctx: &Context) -> anyhow::Result<()> {
    build(
        ctx,
        BuildOperation::RunOperation {
            name: PRE_RUN_SETUP_MACRO.to_string(),
        },
    )
    .await
}
