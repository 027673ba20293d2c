//! Button Edges
//!
//! Debouncing happens upstream; this module only sees clean press and
//! release edges. A press captures the paired knobs' positions so the pots
//! can be held still while a gesture borrows them. A release either commits
//! the gesture or, if the knobs were never used, fires the button's own
//! action.

use crate::channel::{Button, ButtonArray};
use crate::combo::{ComboKey, ComboState, ComboTable, HoverGesture};
use crate::conditioning::PotConditioner;
use crate::flags::{Trigger, TriggerTable};
use crate::params::PlaybackParams;

/// What a release did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The button was not down
    Ignored,
    /// A gesture was latched
    Combo,
    /// The button's plain action fired, or it has none
    Plain,
}

/// Which buttons are held
#[derive(Debug, Clone, Default)]
pub struct ButtonPanel {
    down: ButtonArray<bool>,
}

impl ButtonPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, button: Button) -> bool {
        self.down[button]
    }

    /// Record a press and snapshot the knobs of every idle gesture on it.
    /// A repeated press without a release is ignored.
    pub fn press(&mut self, button: Button, combos: &mut ComboTable, pots: &PotConditioner) {
        if self.down[button] {
            return;
        }
        self.down[button] = true;

        for key in ComboKey::for_button(button).filter(|k| k.follows_button()) {
            if !combos.is_engaged(key) {
                combos.set_latched_value(key, pots.bracketed(key.knob()));
            }
        }
    }

    /// Record a release, latching active gestures and committing bank hovers
    pub fn release(
        &mut self,
        button: Button,
        combos: &mut ComboTable,
        params: &mut PlaybackParams,
        triggers: &mut TriggerTable,
    ) -> Release {
        if !self.down[button] {
            return Release::Ignored;
        }
        self.down[button] = false;

        let mut used = false;
        for key in ComboKey::for_button(button).filter(|k| k.follows_button()) {
            if combos.state(key) == ComboState::Active {
                combos.latch(key);
                used = true;
            }
        }

        if used {
            commit_hover(button, combos, params, triggers);
            return Release::Combo;
        }

        match button {
            Button::Play(c) => triggers.set(Trigger::PlayButton(c)),
            Button::Reverse(c) => triggers.set(Trigger::ReverseTrig(c)),
            Button::Rec => triggers.set(Trigger::RecTrig),
            Button::Bank(_) | Button::RecBank | Button::Edit => {}
        }
        Release::Plain
    }
}

fn commit_hover(
    button: Button,
    combos: &ComboTable,
    params: &mut PlaybackParams,
    triggers: &mut TriggerTable,
) {
    match button {
        Button::Bank(c) => {
            let bank = combos.hover(HoverGesture::Bank(c));
            let chan = &mut params.channels[c];
            if chan.bank != bank {
                log::debug!("channel {:?} bank {} -> {}", c, chan.bank, bank);
                chan.bank = bank;
                triggers.set(Trigger::BankChanged(c));
            }
        }
        Button::RecBank => {
            let bank = combos.hover(HoverGesture::RecBank);
            if params.rec.bank != bank {
                log::debug!("record bank {} -> {}", params.rec.bank, bank);
                params.rec.bank = bank;
                triggers.set(Trigger::RecBankChanged);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{PlayChannel, PotArray, PotChannel};
    use crate::config::EngineConfig;

    const ONE: PlayChannel = PlayChannel::One;

    fn settled_pots(value: u16) -> PotConditioner {
        let mut pots = PotConditioner::new(&EngineConfig::default());
        let raw = PotArray::splat(value);
        for _ in 0..1000 {
            pots.process(&raw);
        }
        pots
    }

    #[test]
    fn test_press_snapshots_knobs() {
        let pots = settled_pots(3000);
        let mut panel = ButtonPanel::new();
        let mut combos = ComboTable::new();

        panel.press(Button::Reverse(ONE), &mut combos, &pots);
        assert!(panel.is_down(Button::Reverse(ONE)));
        assert_eq!(
            combos.latched_value(ComboKey::ReverseStart(ONE)),
            pots.bracketed(PotChannel::Start(ONE))
        );
        // The other channel's gesture is untouched
        assert_eq!(combos.latched_value(ComboKey::ReverseStart(PlayChannel::Two)), 0);
    }

    #[test]
    fn test_press_keeps_engaged_snapshot() {
        let pots = settled_pots(3000);
        let mut panel = ButtonPanel::new();
        let mut combos = ComboTable::new();
        let key = ComboKey::ReverseStart(ONE);
        combos.set_latched_value(key, 1234);
        combos.activate(key);
        combos.latch(key);

        panel.press(Button::Reverse(ONE), &mut combos, &pots);
        assert_eq!(combos.latched_value(key), 1234);
    }

    #[test]
    fn test_release_without_gesture_fires_action() {
        let pots = settled_pots(0);
        let mut panel = ButtonPanel::new();
        let mut combos = ComboTable::new();
        let mut params = PlaybackParams::default();
        let mut triggers = TriggerTable::new();

        panel.press(Button::Reverse(ONE), &mut combos, &pots);
        let released = panel.release(Button::Reverse(ONE), &mut combos, &mut params, &mut triggers);
        assert_eq!(released, Release::Plain);
        assert!(triggers.is_set(Trigger::ReverseTrig(ONE)));

        panel.press(Button::Rec, &mut combos, &pots);
        panel.release(Button::Rec, &mut combos, &mut params, &mut triggers);
        assert!(triggers.is_set(Trigger::RecTrig));
    }

    #[test]
    fn test_release_latches_and_commits_bank() {
        let pots = settled_pots(0);
        let mut panel = ButtonPanel::new();
        let mut combos = ComboTable::new();
        let mut params = PlaybackParams::default();
        let mut triggers = TriggerTable::new();
        let key = ComboKey::BankSample { bank: ONE, knob: ONE };

        panel.press(Button::Bank(ONE), &mut combos, &pots);
        combos.activate(key);
        combos.set_hover(HoverGesture::Bank(ONE), 7);

        let released = panel.release(Button::Bank(ONE), &mut combos, &mut params, &mut triggers);
        assert_eq!(released, Release::Combo);
        assert_eq!(combos.state(key), ComboState::Latched);
        assert_eq!(params.channels[ONE].bank, 7);
        assert!(triggers.is_set(Trigger::BankChanged(ONE)));
    }

    #[test]
    fn test_release_when_up_is_ignored() {
        let mut panel = ButtonPanel::new();
        let mut combos = ComboTable::new();
        let mut params = PlaybackParams::default();
        let mut triggers = TriggerTable::new();

        let released = panel.release(Button::Play(ONE), &mut combos, &mut params, &mut triggers);
        assert_eq!(released, Release::Ignored);
        assert_eq!(triggers.pending().count(), 0);
    }
}
