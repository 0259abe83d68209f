// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tracing::trace;

use crate::{AlphaMode, Command, PixelStore, Pos, Reply};

/// Per connection state: the offset, plus a handle to the shared canvas.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn PixelStore>,
    offset: Pos,
    alpha_mode: AlphaMode,
}

impl Session {
    #[must_use]
    pub fn new(store: Arc<dyn PixelStore>, alpha_mode: AlphaMode) -> Self {
        Self {
            store,
            offset: Pos::default(),
            alpha_mode,
        }
    }

    #[must_use]
    pub fn offset(&self) -> Pos { self.offset }

    /// Parse and run one line. Lines that don't parse are ignored.
    pub fn execute(&mut self, line: &[u8]) -> Option<Reply> {
        match Command::parse(line, self.alpha_mode) {
            Some(command) => self.apply(command),
            None => {
                trace!(message = "Ignoring line", line = %String::from_utf8_lossy(line));
                None
            }
        }
    }

    pub fn apply(&mut self, command: Command) -> Option<Reply> {
        match command {
            Command::Size => Some(Reply::Size(self.store.bounds())),
            Command::Offset { x, y } => {
                let bounds = self.store.bounds();
                // The offset must leave room for at least one more pixel on each axis.
                if x < bounds.width.saturating_sub(1) && y < bounds.height.saturating_sub(1) {
                    self.offset = Pos::new(x, y);
                }
                None
            }
            Command::SetPixel { pos, paint } => {
                if let Some(target) = pos.checked_add(self.offset) {
                    self.store.set(target, paint);
                }
                None
            }
            // Reads at the coordinates as sent, without the offset. Existing clients
            // depend on this asymmetry.
            Command::GetPixel { pos } => self
                .store
                .get(pos)
                .map(|color| Reply::Pixel { pos, color }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BytesPerPixel, ChannelOrder, GridLayout, Paint, PixelFormat, Rgb,
                ScheduledBuffer, Size};
    use pretty_assertions::assert_eq;

    fn canvas(width: u32, height: u32) -> Arc<ScheduledBuffer> {
        Arc::new(ScheduledBuffer::new(GridLayout::new(
            Size::new(width, height),
            PixelFormat::new(BytesPerPixel::Four, ChannelOrder::Bgr),
        )))
    }

    fn session(store: &Arc<ScheduledBuffer>) -> Session {
        Session::new(store.clone(), AlphaMode::Blend)
    }

    #[test]
    fn test_size_reports_bounds() {
        let store = canvas(1280, 800);
        let mut session = session(&store);
        assert_eq!(
            session.execute(b"SIZE"),
            Some(Reply::Size(Size::new(1280, 800)))
        );
        session.execute(b"OFFSET 5 5");
        assert_eq!(
            session.execute(b"SIZE"),
            Some(Reply::Size(Size::new(1280, 800)))
        );
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let store = canvas(16, 16);
        let mut session = session(&store);
        assert_eq!(session.execute(b"PX 3 4 12ab9f"), None);
        assert_eq!(
            session.execute(b"PX 3 4"),
            Some(Reply::Pixel {
                pos: Pos::new(3, 4),
                color: Rgb::new(0x12, 0xab, 0x9f)
            })
        );
    }

    #[test]
    fn test_offset_applies_to_set() {
        let store = canvas(16, 16);
        let mut session = session(&store);
        session.execute(b"OFFSET 10 10");
        assert_eq!(session.offset(), Pos::new(10, 10));

        session.execute(b"PX 1 2 ff0000");
        assert_eq!(store.get(Pos::new(11, 12)), Some(Rgb::new(0xff, 0, 0)));
        assert_eq!(store.get(Pos::new(1, 2)), Some(Rgb::BLACK));
    }

    #[test]
    fn test_get_ignores_offset() {
        let store = canvas(16, 16);
        store.set(Pos::new(1, 1), Paint::Opaque(Rgb::new(0, 0, 0xff)));
        let mut session = session(&store);
        session.execute(b"OFFSET 4 4");
        assert_eq!(
            session.execute(b"PX 1 1"),
            Some(Reply::Pixel {
                pos: Pos::new(1, 1),
                color: Rgb::new(0, 0, 0xff)
            })
        );
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        let store = canvas(16, 8);
        let mut session = session(&store);
        session.execute(b"OFFSET 2 3");

        session.execute(b"OFFSET 15 0");
        assert_eq!(session.offset(), Pos::new(2, 3));
        session.execute(b"OFFSET 0 7");
        assert_eq!(session.offset(), Pos::new(2, 3));

        session.execute(b"OFFSET 14 6");
        assert_eq!(session.offset(), Pos::new(14, 6));
    }

    #[test]
    fn test_set_out_of_bounds_is_dropped() {
        let store = canvas(4, 4);
        let mut session = session(&store);
        session.execute(b"OFFSET 2 2");
        assert_eq!(session.execute(b"PX 2 0 ffffff"), None);
        assert_eq!(session.execute(b"PX 4294967295 0 ffffff"), None);

        let mut frame = vec![];
        store.snapshot_into(&mut frame);
        assert!(frame.iter().all(|it| *it == 0));
    }

    #[test]
    fn test_get_out_of_bounds_has_no_reply() {
        let store = canvas(4, 4);
        let mut session = session(&store);
        assert_eq!(session.execute(b"PX 4 0"), None);
        assert_eq!(session.execute(b"PX 0 4"), None);
    }

    #[test]
    fn test_blend_over_stored_pixel() {
        let store = canvas(2, 2);
        let mut session = session(&store);
        session.execute(b"PX 0 0 800000");
        session.execute(b"PX 0 0 00ff0080");
        assert_eq!(store.get(Pos::new(0, 0)), Some(Rgb::new(0x40, 0x80, 0x00)));
    }

    #[test]
    fn test_alpha_ignored() {
        let store = canvas(2, 2);
        let mut session = Session::new(store.clone(), AlphaMode::Ignore);
        session.execute(b"PX 0 0 800000");
        session.execute(b"PX 0 0 00ff0080");
        assert_eq!(store.get(Pos::new(0, 0)), Some(Rgb::new(0, 0xff, 0)));
    }

    #[test]
    fn test_unknown_verb_keeps_session_usable() {
        let store = canvas(3, 3);
        let mut session = session(&store);
        assert_eq!(session.execute(b"FOO bar"), None);
        assert_eq!(session.execute(b"SIZE"), Some(Reply::Size(Size::new(3, 3))));
    }
}
