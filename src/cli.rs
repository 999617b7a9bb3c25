use clap::Parser;
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged builds report just the tag
    if let Some(tag) = option_env!("WPILIB_HEADERS_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("WPILIB_HEADERS_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("WPILIB_HEADERS_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup; clap wants a &'static str
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "wpilib-headers")]
#[command(about = "Fetches WPILib, NI and vendor headers and generates compile_flags.txt and IncludeAll.h")]
#[command(version = get_version())]
#[command(
    after_help = "Examples:\n  wpilib-headers\n  wpilib-headers src/main/include\n  wpilib-headers src/main/include ~/robot\n\nHeaders are cached in ~/.wpilib-headers (override with WPILIB_HEADERS_ROOT)."
)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory that receives the generated IncludeAll.h
    #[arg(default_value = ".")]
    pub target_dir: PathBuf,

    /// Project directory holding build.gradle; compile_flags.txt is written here
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,
}
