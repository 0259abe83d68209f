// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

/// Create the appender for `--log-file`. The file is never rotated, the server appends
/// to it for as long as it runs.
///
/// Note that if you wrap this up in a non blocking writer, events logged right before a
/// fatal startup error are lost, since `main` returns before the worker drains.
///
/// # Errors
///
/// Returns an error if:
/// - The path has no parent directory
/// - The path has no file name
pub fn try_create(
    path_str: &str,
) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
    let path = PathBuf::from(&path_str);

    let parent = match path.parent() {
        // A bare file name ("pxflood.log") has an empty parent, which means cwd.
        Some(it) if it.as_os_str().is_empty() => PathBuf::from("."),
        Some(it) => it.to_path_buf(),
        None => miette::bail!(
            "Log file path {} has no parent folder.",
            path.display()
        ),
    };

    let Some(file_name) = path.file_name() else {
        miette::bail!("Log file path {} has no file name.", path.display())
    };

    Ok(tracing_appender::rolling::never(parent, file_name))
}
