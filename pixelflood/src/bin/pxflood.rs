// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use clap::Parser;
use pixelflood::{CLIArg, CommonResult, run_app, set_mimalloc_in_main,
                 setup_default_miette_global_report_handler, throws};

const REPORT_FOOTER: &str = "Run `pxflood --help` to see every option and its default.";

#[tokio::main]
#[allow(clippy::needless_return)]
async fn main() -> CommonResult<()> {
    set_mimalloc_in_main!();

    throws!({
        setup_default_miette_global_report_handler(REPORT_FOOTER);

        let cli_arg = CLIArg::parse();
        cli_arg.tracing_config().install_global()?;
        // % is Display, ? is Debug.
        tracing::debug!(message = "Start logging...", cli_arg = ?cli_arg);

        run_app(cli_arg.server_config()).await?;

        tracing::debug!(message = "Stop logging...");
    })
}
