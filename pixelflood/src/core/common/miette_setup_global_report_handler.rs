// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Install the global [miette](https://docs.rs/miette/latest/miette/index.html) report
//! handler used when `main() -> miette::Result<_>` exits with an error (can't bind the
//! port, can't open or map the framebuffer, invalid flags).
//!
//! The [`miette::ErrorHook`] is lazily evaluated, so the report width is only computed
//! if an error actually gets printed.

use miette::MietteHandlerOpts;
use tracing::debug;

pub const DEFAULT_REPORT_WIDTH: usize = 100;

/// The report width comes from `$COLUMNS` when the shell exports it (the server usually
/// runs headless, on a console or under a service manager, so there is no tty to ask).
pub fn setup_default_miette_global_report_handler(footer: &'static str) {
    miette::set_hook(Box::new(|_report| {
        let report_width = {
            let it = report_width_from_env(std::env::var("COLUMNS").ok().as_deref());
            debug!("miette::set_hook -> report_width: {}", it);
            it
        };
        Box::new(
            MietteHandlerOpts::new()
                .width(report_width)
                .wrap_lines(true)
                .force_graphical(true)
                .unicode(true)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .with_cause_chain()
                .footer(footer.to_string())
                .build(),
        )
    }))
    .ok();
}

fn report_width_from_env(columns: Option<&str>) -> usize {
    columns
        .and_then(|it| it.trim().parse::<usize>().ok())
        .filter(|it| *it > 0)
        .unwrap_or(DEFAULT_REPORT_WIDTH)
}
