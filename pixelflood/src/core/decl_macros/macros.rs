// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Wrap the given block or stmt so that it returns `Ok(())`. It is just syntactic sugar
/// that helps having to write `Ok(())` at the end of every fallible `main`.
///
/// ```
/// use pixelflood::{CommonResult, throws};
///
/// fn run() -> CommonResult<()> {
///     throws!({
///         let answer = 6 * 7;
///         assert_eq!(answer, 42);
///     })
/// }
/// # run().unwrap();
/// ```
#[macro_export]
macro_rules! throws {
    ($it: block) => {{
        $it
        return Ok(())
    }};
    ($it: stmt) => {{
        $it
        return Ok(())
    }};
}

/// Short for `Ok(())` or `Ok($value)`.
#[macro_export]
macro_rules! ok {
    // No args.
    () => {
        Ok(())
    };
    // With arg.
    ($value:expr) => {
        Ok($value)
    };
}

/// `mimalloc` is a replacement for the default global allocator. It's optimized for
/// multi-threaded use cases where lots of small objects are created and destroyed, such
/// as one task (plus its buffers) per client connection.
/// - <https://crates.io/crates/mimalloc>
///
/// Call it inside `main` of a binary that depends on `mimalloc`.
#[macro_export]
macro_rules! set_mimalloc_in_main {
    () => {{
        use mimalloc::MiMalloc;

        #[global_allocator]
        static GLOBAL: MiMalloc = MiMalloc;
    }};
}
