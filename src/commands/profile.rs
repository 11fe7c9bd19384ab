//! Show the resolved dbt profile

use snowball::config::DbProfile;
use snowball::output::ProfileResult;

use super::Context;

/// Print the connection details for the configured profile and target
pub fn profile(ctx: &Context) -> anyhow::Result<()> {
    let build = &ctx.config.build;
    let details = DbProfile::load(&ctx.paths().profiles_file(), &build.profile, &build.target)?;

    ProfileResult {
        profile: build.profile.clone(),
        target: build.target.clone(),
        details,
    }
    .render(ctx.output_mode);
    Ok(())
}
