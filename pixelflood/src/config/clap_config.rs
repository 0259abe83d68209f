// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::path::PathBuf;

use clap::{Args, Parser};
use tracing_core::LevelFilter;

use crate::{AlphaMode, Backend, BindMode, ChannelOrder, FlushTransform, ScreenMode,
            ServerConfig, Size, TracingConfig, config_defaults, protocol_constants};

/// More info: <https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_2/index.html>
#[derive(Debug, Parser)]
#[command(bin_name = "pxflood")]
#[command(about = "Pixel flood server: draw on a framebuffer over TCP, one pixel at a time")]
#[command(version)]
#[command(next_line_help = true)]
#[command(arg_required_else_help(false))]
pub struct CLIArg {
    #[command(flatten)]
    pub canvas_options: CanvasOption,

    #[command(flatten)]
    pub network_options: NetworkOption,

    #[command(flatten)]
    pub log_options: LogOption,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Canvas")]
pub struct CanvasOption {
    #[arg(long, default_value_t = config_defaults::WIDTH, help = "Canvas width in pixels")]
    pub width: u32,

    #[arg(long, default_value_t = config_defaults::HEIGHT, help = "Canvas height in pixels")]
    pub height: u32,

    #[arg(
        long,
        default_value_t = config_defaults::BYTES_PER_PIXEL,
        help = "Device pixel size, 4 (XRGB8888) or 3 (RGB888)"
    )]
    pub bytes_per_pixel: u8,

    #[arg(long, value_enum, default_value_t = ChannelOrder::Bgr, help = "Order of the color channels in a device pixel")]
    pub channel_order: ChannelOrder,

    #[arg(
        long,
        default_value = config_defaults::DEVICE,
        help = "Framebuffer device (or a file of the right size)"
    )]
    pub device: PathBuf,

    #[arg(
        long,
        short = 'm',
        value_enum,
        default_value_t = Backend::Direct,
        help = "Write pixels straight into the mapped device, or into a buffer flushed at --framerate"
    )]
    pub mode: Backend,

    #[arg(long, default_value_t = config_defaults::FRAMERATE, help = "Flushes per second, scheduled mode only")]
    pub framerate: u32,

    #[arg(long, conflicts_with = "invert", help = "Reverse the bytes of each pixel when flushing")]
    pub byteswap: bool,

    #[arg(long, help = "Invert all bits when flushing")]
    pub invert: bool,

    #[arg(long, help = "Ignore the alpha byte of 8 digit colors and write them opaque")]
    pub no_alpha: bool,

    #[arg(long, help = "Start from a black canvas instead of the current screen contents")]
    pub clear_screen: bool,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Network")]
pub struct NetworkOption {
    #[arg(long, short = 'p', default_value_t = protocol_constants::DEFAULT_PORT, help = "TCP port to listen on")]
    pub port: u16,

    #[arg(long, conflicts_with = "ipv6_only", help = "Listen on IPv4 only")]
    pub ipv4_only: bool,

    #[arg(long, help = "Listen on IPv6 only")]
    pub ipv6_only: bool,

    #[arg(
        long,
        default_value_t = protocol_constants::DEFAULT_GRAB_SIZE,
        help = "Bytes read from a client socket at a time"
    )]
    pub grab_size: usize,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogOption {
    #[arg(
        long,
        short = 'l',
        default_value_t = LevelFilter::INFO,
        help = "One of off, error, warn, info, debug, trace"
    )]
    pub log_level: LevelFilter,

    #[arg(long, help = "Also write the log to this file")]
    pub log_file: Option<String>,
}

impl CLIArg {
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        let canvas = &self.canvas_options;
        let network = &self.network_options;
        ServerConfig {
            size: Size::new(canvas.width, canvas.height),
            bytes_per_pixel: canvas.bytes_per_pixel,
            channel_order: canvas.channel_order,
            framerate: canvas.framerate,
            device: canvas.device.clone(),
            transform: match (canvas.byteswap, canvas.invert) {
                (true, _) => FlushTransform::ByteSwap,
                (false, true) => FlushTransform::Invert,
                (false, false) => FlushTransform::None,
            },
            alpha_mode: if canvas.no_alpha {
                AlphaMode::Ignore
            } else {
                AlphaMode::Blend
            },
            screen_mode: if canvas.clear_screen {
                ScreenMode::Clear
            } else {
                ScreenMode::Keep
            },
            bind_mode: match (network.ipv4_only, network.ipv6_only) {
                (true, _) => BindMode::Ipv4Only,
                (false, true) => BindMode::Ipv6Only,
                (false, false) => BindMode::DualStack,
            },
            port: network.port,
            grab_size: network.grab_size,
            backend: canvas.mode,
        }
    }

    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::new(self.log_options.log_level, self.log_options.log_file.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WriterConfig;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> CLIArg {
        CLIArg::try_parse_from(std::iter::once("pxflood").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_match_server_config_default() {
        assert_eq!(parse(&[]).server_config(), ServerConfig::default());
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "--width", "64", "--height", "48", "--bytes-per-pixel", "3",
            "--channel-order", "rgb", "--device", "/tmp/fb", "--mode", "scheduled",
            "--framerate", "30", "--invert", "--no-alpha", "--clear-screen",
            "--port", "1337", "--ipv6-only", "--grab-size", "512",
        ])
        .server_config();

        assert_eq!(config, ServerConfig {
            size: Size::new(64, 48),
            bytes_per_pixel: 3,
            channel_order: ChannelOrder::Rgb,
            framerate: 30,
            device: PathBuf::from("/tmp/fb"),
            transform: FlushTransform::Invert,
            alpha_mode: AlphaMode::Ignore,
            screen_mode: ScreenMode::Clear,
            bind_mode: BindMode::Ipv6Only,
            port: 1337,
            grab_size: 512,
            backend: Backend::Scheduled,
        });
    }

    #[test]
    fn test_byteswap_and_ipv4_only() {
        let config = parse(&["--byteswap", "--ipv4-only"]).server_config();
        assert_eq!(config.transform, FlushTransform::ByteSwap);
        assert_eq!(config.bind_mode, BindMode::Ipv4Only);
    }

    #[test]
    fn test_conflicting_flags_are_rejected() {
        assert!(CLIArg::try_parse_from(["pxflood", "--byteswap", "--invert"]).is_err());
        assert!(CLIArg::try_parse_from(["pxflood", "--ipv4-only", "--ipv6-only"]).is_err());
    }

    #[test]
    fn test_unknown_channel_order_is_rejected() {
        assert!(CLIArg::try_parse_from(["pxflood", "--channel-order", "grb"]).is_err());
    }

    #[test]
    fn test_tracing_config() {
        let it = parse(&["--log-level", "debug", "--log-file", "pxflood.log"]).tracing_config();
        assert_eq!(it.get_level_filter(), LevelFilter::DEBUG);
        assert!(matches!(it.get_writer_config(), WriterConfig::DisplayAndFile(_, path) if path == "pxflood.log"));

        let it = parse(&[]).tracing_config();
        assert_eq!(it.get_level_filter(), LevelFilter::INFO);
        assert!(matches!(it.get_writer_config(), WriterConfig::Display(_)));
    }
}
