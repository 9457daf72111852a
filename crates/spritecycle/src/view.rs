use std::io::{self, Write};
use std::time::Duration;

use provider::{ImageData, SlotIndex, SLOT_COUNT};
use scheduler::SlotView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotLine {
    visible: bool,
    bytes: Option<usize>,
}

/// Terminal stand-in for a four-slot image view. Prints one line whenever the
/// visible slot, the display name or the error signal changes.
pub struct ConsoleView<W: Write = io::Stdout> {
    out: W,
    name: Option<String>,
    slots: [SlotLine; SLOT_COUNT],
}

impl ConsoleView {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            name: None,
            slots: [SlotLine {
                visible: false,
                bytes: None,
            }; SLOT_COUNT],
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::warn!(%err, "failed to write to console");
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SlotView for ConsoleView<W> {
    fn set_slot_visible(&mut self, slot: SlotIndex, visible: bool) {
        let line = &mut self.slots[slot.index()];
        if line.visible == visible {
            return;
        }
        line.visible = visible;
        if visible {
            let name = self.name.as_deref().unwrap_or("-");
            let line = match self.slots[slot.index()].bytes {
                Some(bytes) => format!("{name} {slot}: {bytes} bytes"),
                None => format!("{name} {slot}: (empty)"),
            };
            self.emit(&line);
        }
    }

    fn set_slot_image(&mut self, slot: SlotIndex, image: Option<&ImageData>) {
        self.slots[slot.index()].bytes = image.map(ImageData::len);
        tracing::debug!(%slot, loaded = image.is_some(), "slot image updated");
    }

    fn set_input_error_flash(&mut self, duration: Duration) {
        let line = format!(
            "! invalid input (clears in {})",
            humantime::format_duration(duration)
        );
        self.emit(&line);
    }

    fn clear_input_error_flash(&mut self) {
        tracing::debug!("invalid input signal cleared");
    }

    fn set_display_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
        self.emit(&format!("name: {name}"));
    }
}
