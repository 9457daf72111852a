use std::time::Duration;

use provider::{ImageData, SlotIndex};

/// Rendering surface driven by a session. Every call happens on the apply
/// context; implementations decide how (or whether) anything is drawn.
pub trait SlotView {
    fn set_slot_visible(&mut self, slot: SlotIndex, visible: bool);

    fn set_slot_image(&mut self, slot: SlotIndex, image: Option<&ImageData>);

    fn set_input_error_flash(&mut self, duration: Duration);

    fn clear_input_error_flash(&mut self);

    fn set_display_name(&mut self, name: &str);
}

/// Shows exactly `slot` and hides the other three.
pub(crate) fn show_only(view: &mut dyn SlotView, slot: SlotIndex) {
    for candidate in SlotIndex::ALL {
        view.set_slot_visible(candidate, candidate == slot);
    }
}
