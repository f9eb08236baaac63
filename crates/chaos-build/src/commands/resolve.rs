use crate::Context;
use chaos_build_core::{ImageName, PlatformInfo, ResolvedImage, UnameHost, detect_platform};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Resolution<'a> {
    name: &'a str,
    #[serde(flatten)]
    image: ResolvedImage,
    platform: PlatformInfo,
}

/// resolve コマンドを処理
pub fn handle(ctx: &Context, name: &str, format: OutputFormat) -> anyhow::Result<()> {
    let name = ImageName::new(name)?;
    let resolution = Resolution {
        name: name.as_str(),
        image: ResolvedImage::resolve(&name, &ctx.env),
        platform: detect_platform(&ctx.env, &UnameHost)?,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        OutputFormat::Text => {
            let source = if resolution.platform.from_explicit_override {
                "TARGET_PLATFORM"
            } else {
                "host"
            };
            println!("image:     {}", resolution.name.cyan());
            println!("build:     {}", resolution.image.build_enabled);
            println!("tag:       {}", resolution.image.tag);
            println!("reference: {}", resolution.image.full_reference);
            println!(
                "platform:  {} ({})",
                resolution.platform.docker_platform(),
                source
            );
        }
    }

    Ok(())
}
