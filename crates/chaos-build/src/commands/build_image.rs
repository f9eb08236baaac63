use crate::Context;
use chaos_build_container::{BuildAction, ImageBuilder, ProcessExecutor};
use chaos_build_core::{ImageName, UnameHost};
use colored::Colorize;
use std::path::Path;

/// build-image コマンドを処理
pub fn handle(ctx: &Context, name: &str, context: &Path) -> anyhow::Result<()> {
    let name = ImageName::new(name)?;
    let builder = ImageBuilder::new(&ctx.engine, &ctx.workdir);
    let plan = builder.plan(&name, context, &ctx.env, &UnameHost)?;

    if ctx.dry_run {
        println!("{}", plan.invocation);
        return Ok(());
    }

    match &plan.action {
        BuildAction::Build { platform } => {
            eprintln!(
                "{} {} をビルド中 ({})",
                "→".blue(),
                plan.image.full_reference.cyan(),
                platform.docker_platform()
            );
        }
        BuildAction::Pull => {
            eprintln!("{} {} を pull 中", "→".blue(), plan.image.full_reference.cyan());
        }
    }

    builder.execute(&plan, &ProcessExecutor)?;

    eprintln!("{} {}", "✓".green(), plan.image.full_reference);
    Ok(())
}
