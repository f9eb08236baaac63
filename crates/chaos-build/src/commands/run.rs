use crate::Context;
use chaos_build_container::{ContainerRunner, ProcessExecutor, RunOptions, current_user};
use chaos_build_core::{ImageName, UnameHost, detect_platform};

/// run コマンドを処理
pub fn handle(
    ctx: &Context,
    image: &str,
    interactive: bool,
    extra_env: Vec<String>,
    volumes: Vec<String>,
    command: Vec<String>,
) -> anyhow::Result<()> {
    let options = RunOptions {
        image: ImageName::new(image)?,
        interactive,
        extra_env,
        volumes,
        command,
    };

    let platform = detect_platform(&ctx.env, &UnameHost)?;
    let runner = ContainerRunner::new(&ctx.engine, &ctx.workdir).with_user(current_user());
    let plan = runner.plan(&options, &ctx.env, &platform)?;

    // dry-run ではキャッシュディレクトリも作成しない
    if ctx.dry_run {
        println!("{}", plan.invocation);
        return Ok(());
    }

    runner.execute(&plan, &ProcessExecutor)?;
    Ok(())
}
