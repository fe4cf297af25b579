use anyhow::Result;
use seyuna_launcher::{
    error::{diagnostic, exit_code_for},
    launch::Launcher,
    platform::Platform,
    runtime::RealRuntime,
};
use std::ffi::OsString;
use std::sync::Arc;

/// seyuna launcher
///
/// Installs the seyuna CLI on first use, then runs it with every argument
/// passed through unchanged. The launcher itself takes no options; it is
/// configured through `SEYUNA_*` environment variables.
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let code = match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", diagnostic(&e));
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(args: &[OsString]) -> Result<i32> {
    let platform = Platform::detect()?;
    let launcher = Launcher::from_env(Arc::new(RealRuntime), platform)?;
    launcher.launch(args).await
}
