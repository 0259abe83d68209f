// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on error types, see:
//!
//! 1. [Article](https://developerlife.com/2024/06/10/rust-miette-error-handling/)
//! 2. [Video](https://youtu.be/TmLF7vI8lKk)
//!
//! Startup code returns [`CommonResult`]. The typed errors that can end up inside it
//! ([`crate::ConfigError`], [`crate::DeviceError`], [`crate::BindError`]) derive
//! [`miette::Diagnostic`], so the report printed by `main` carries a diagnostic code and
//! help text. Protocol level problems are never errors, they are dropped commands.

/// Type alias to make it easy to work with [`miette::Result`] and [`miette::Report`],
/// which are [`std::error::Error`] wrappers.
///
/// - It is basically `miette::Result<T, miette::Report>`.
/// - Any error type that implements [`miette::Diagnostic`] converts into it with `?`.
pub type CommonResult<T> = miette::Result<T>;
