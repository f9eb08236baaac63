use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation};
use chaos_build_core::{
    EnvironmentView, HostArchitecture, ImageName, PlatformInfo, ResolvedImage, detect_platform,
};
use std::path::{Path, PathBuf};

/// イメージを用意する方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildAction {
    /// `buildx build --load` でローカルビルド
    Build { platform: PlatformInfo },
    /// レジストリから pull
    Pull,
}

/// 組み立て済みのビルド（または pull）コマンド
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub image: ResolvedImage,
    pub action: BuildAction,
    pub invocation: Invocation,
}

/// イメージのビルド（または pull）コマンドを組み立てる
pub struct ImageBuilder {
    engine: String,
    workdir: PathBuf,
}

impl ImageBuilder {
    /// `workdir` はローカルキャッシュのデフォルト位置の基準
    pub fn new(engine: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            workdir: workdir.into(),
        }
    }

    /// ビルドまたは pull のコマンドを組み立て
    ///
    /// `IMAGE_<NAME>_BUILD` / `IMAGE_BUILD` が `1` ならビルド、それ以外は pull します。
    /// ターゲットプラットフォームの検出はビルド時のみ行います。
    pub fn plan<H>(
        &self,
        name: &ImageName,
        context: &Path,
        env: &EnvironmentView,
        host: &H,
    ) -> Result<BuildPlan>
    where
        H: HostArchitecture + ?Sized,
    {
        let image = ResolvedImage::resolve(name, env);

        if !image.build_enabled {
            let mut invocation = Invocation::new(&self.engine);
            invocation.arg("pull").arg(&image.full_reference);
            return Ok(BuildPlan {
                image,
                action: BuildAction::Pull,
                invocation,
            });
        }

        let platform = detect_platform(env, host)?;

        let mut invocation = Invocation::new(&self.engine);
        invocation
            .args(["buildx", "build", "--load"])
            .opt("--platform", platform.docker_platform());

        for (key, value) in env.forwarded() {
            invocation.opt("--build-arg", format!("{}={}", key, value));
        }

        self.add_cache_args(&mut invocation, name, &image, env);

        invocation
            .opt("-t", &image.full_reference)
            .arg(context.display().to_string());

        Ok(BuildPlan {
            image,
            action: BuildAction::Build { platform },
            invocation,
        })
    }

    /// キャッシュ設定
    ///
    /// - `DOCKER_CACHE=1`: ローカルディレクトリのキャッシュを読み書き
    /// - それ以外: `DISABLE_CACHE_FROM=1` でない限り既存イメージをキャッシュ元にする
    fn add_cache_args(
        &self,
        invocation: &mut Invocation,
        name: &ImageName,
        image: &ResolvedImage,
        env: &EnvironmentView,
    ) {
        if env.get("DOCKER_CACHE") == Some("1") {
            let cache_dir = env
                .get_non_empty("DOCKER_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| self.workdir.join(".cache").join(format!("image-{}", name)));
            let cache_dir = cache_dir.display();
            invocation
                .opt("--cache-from", format!("type=local,src={}", cache_dir))
                .opt("--cache-to", format!("type=local,dest={}", cache_dir));
        } else if env.get("DISABLE_CACHE_FROM") != Some("1") {
            invocation.opt("--cache-from", &image.full_reference);
        }
    }

    /// 組み立てたコマンドを実行
    pub fn execute<E>(&self, plan: &BuildPlan, executor: &E) -> Result<()>
    where
        E: CommandExecutor + ?Sized,
    {
        match &plan.action {
            BuildAction::Build { platform } => tracing::info!(
                "Building image: {} ({})",
                plan.image.full_reference,
                platform.docker_platform()
            ),
            BuildAction::Pull => tracing::info!("Pulling image: {}", plan.image.full_reference),
        }
        executor.run(&plan.invocation)?;
        tracing::info!("Image ready: {}", plan.image.full_reference);
        Ok(())
    }
}
