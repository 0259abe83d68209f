// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use miette::IntoDiagnostic;
use tracing::subscriber::DefaultGuard;
use tracing_core::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{CommonResult, ok, try_create_layers};

/// Where the display layer writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
}

/// Which layers get created. The file variants carry the path of the log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    Display(DisplayPreference),
    File(String),
    DisplayAndFile(DisplayPreference, String),
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

impl TracingConfig {
    /// Log to stderr only, at `level_filter`, or also to `maybe_log_file`.
    #[must_use]
    pub fn new(level_filter: LevelFilter, maybe_log_file: Option<String>) -> Self {
        let writer_config = match maybe_log_file {
            Some(path) => WriterConfig::DisplayAndFile(DisplayPreference::Stderr, path),
            None => WriterConfig::Display(DisplayPreference::Stderr),
        };
        Self {
            writer_config,
            level_filter,
        }
    }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { self.level_filter }

    #[must_use]
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    /// Install the layers as the global default subscriber. Call once, from `main`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file can't be created, or if a global subscriber has
    /// already been installed.
    pub fn install_global(self) -> CommonResult<()> {
        let layers = try_create_layers(self)?;
        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .into_diagnostic()?;
        ok!()
    }

    /// Install the layers for the current thread only, until the returned guard is
    /// dropped. Used by tests, which run in parallel in one process.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file can't be created.
    pub fn install_thread_local(self) -> CommonResult<DefaultGuard> {
        let layers = try_create_layers(self)?;
        let subscriber = tracing_subscriber::registry().with(layers);
        ok!(tracing::subscriber::set_default(subscriber))
    }
}
