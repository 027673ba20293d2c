//! Mode/Flag Dispatcher
//!
//! Drains pending triggers once per tick and turns each into exactly one
//! call on the sampler engine or recorder. Play triggers arriving from the
//! trigger jacks are held back by a settle delay so an external sequencer's
//! pitch CV has arrived before playback starts; for the first part of that
//! delay the pitch CV is latched.

use crate::channel::{PerChannel, PlayChannel};
use crate::config::TimingConfig;
use crate::flags::{Trigger, TriggerTable};
use crate::host::{Host, PlayState};
use crate::keyed::Key;
use crate::params::{GlobalModes, PlaybackParams};

/// Tick timestamps of the most recent play trigger per channel
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayTrigTimers {
    stamped: PerChannel<u32>,
}

impl PlayTrigTimers {
    pub fn stamp(&mut self, chan: PlayChannel, now: u32) {
        self.stamped[chan] = now;
    }

    /// Ticks since the channel's last trigger, correct across counter wrap
    pub fn elapsed(&self, chan: PlayChannel, now: u32) -> u32 {
        now.wrapping_sub(self.stamped[chan])
    }
}

/// Everything the dispatcher may touch
pub(crate) struct Dispatcher<'a, H: Host> {
    pub now: u32,
    pub timing: &'a TimingConfig,
    pub timers: &'a PlayTrigTimers,
    pub triggers: &'a mut TriggerTable,
    pub params: &'a mut PlaybackParams,
    pub modes: &'a mut GlobalModes,
    pub host: &'a mut H,
}

impl<H: Host> Dispatcher<'_, H> {
    pub fn run(&mut self) {
        for &chan in PlayChannel::ALL {
            if self.triggers.take(Trigger::ReverseTrig(chan)) {
                let params = &mut self.params.channels[chan];
                params.reverse = !params.reverse;
                log::debug!("channel {:?} reverse {}", chan, params.reverse);
                self.host.toggle_reverse(chan);
            }
        }

        for &chan in PlayChannel::ALL {
            if self.triggers.take(Trigger::PlayButton(chan)) {
                log::debug!("channel {:?} toggle play", chan);
                self.host.toggle_playing(chan);
            }
        }

        for &chan in PlayChannel::ALL {
            self.run_play_trigger(chan);
        }

        if self.triggers.take(Trigger::RecTrig) {
            log::debug!("toggle recording");
            self.host.toggle_recording();
        }

        if self.triggers.take(Trigger::ToggleMonitor) {
            self.toggle_monitor();
        }

        for &chan in PlayChannel::ALL {
            if self.triggers.take(Trigger::ToggleLooping(chan)) {
                self.toggle_looping(chan);
            }
        }
    }

    fn run_play_trigger(&mut self, chan: PlayChannel) {
        if self.triggers.is_set(Trigger::PlayTrigDelaying(chan)) {
            let elapsed = self.timers.elapsed(chan, self.now);
            self.triggers.assign(
                Trigger::LatchPitchCv(chan),
                elapsed <= self.timing.play_trig_latch_pitch,
            );

            if elapsed > self.timing.play_trig_delay {
                self.triggers.clear(Trigger::PlayTrigDelaying(chan));
                self.triggers.clear(Trigger::LatchPitchCv(chan));
                self.triggers.set(Trigger::PlayTrig(chan));
            }
        }

        if self.triggers.take(Trigger::PlayTrig(chan)) {
            self.triggers.clear(Trigger::LatchPitchCv(chan));
            log::debug!("channel {:?} start playing", chan);
            self.host.start_playing(chan);
        }
    }

    fn toggle_monitor(&mut self) {
        if self.modes.enable_recording && self.modes.monitor_recording {
            self.modes.enable_recording = false;
            self.modes.monitor_recording = false;
            log::debug!("monitoring off");
            self.host.stop_recording();
        } else {
            self.modes.enable_recording = true;
            self.modes.monitor_recording = true;
            for (_, params) in self.params.channels.iter_mut() {
                params.looping = false;
            }
            log::debug!("monitoring on");
        }
    }

    /// Turning looping on for a silent channel also starts it
    fn toggle_looping(&mut self, chan: PlayChannel) {
        let params = &mut self.params.channels[chan];
        params.looping = !params.looping;
        log::debug!("channel {:?} looping {}", chan, params.looping);

        if params.looping && self.host.play_state(chan) == PlayState::Silent {
            self.triggers.set(Trigger::PlayButton(chan));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::host::mock::{Call, MockHost};

    const ONE: PlayChannel = PlayChannel::One;
    const TWO: PlayChannel = PlayChannel::Two;

    struct Rig {
        timing: TimingConfig,
        timers: PlayTrigTimers,
        triggers: TriggerTable,
        params: PlaybackParams,
        modes: GlobalModes,
        host: MockHost,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                timing: EngineConfig::default().timing,
                timers: PlayTrigTimers::default(),
                triggers: TriggerTable::new(),
                params: PlaybackParams::default(),
                modes: GlobalModes::default(),
                host: MockHost::new(),
            }
        }

        fn run(&mut self, now: u32) {
            Dispatcher {
                now,
                timing: &self.timing,
                timers: &self.timers,
                triggers: &mut self.triggers,
                params: &mut self.params,
                modes: &mut self.modes,
                host: &mut self.host,
            }
            .run();
        }
    }

    #[test]
    fn test_triggers_fire_once() {
        let mut rig = Rig::new();
        rig.triggers.set(Trigger::ReverseTrig(TWO));
        rig.triggers.set(Trigger::PlayButton(ONE));
        rig.triggers.set(Trigger::RecTrig);

        rig.run(1);
        assert_eq!(
            rig.host.take_calls(),
            vec![Call::ToggleReverse(TWO), Call::TogglePlaying(ONE), Call::ToggleRecording]
        );
        assert!(rig.params.channels[TWO].reverse);

        rig.run(2);
        assert!(rig.host.take_calls().is_empty());
        assert_eq!(rig.triggers.pending().count(), 0);
    }

    #[test]
    fn test_play_trigger_waits_out_delay() {
        let mut rig = Rig::new();
        rig.timers.stamp(ONE, 1000);
        rig.triggers.set(Trigger::PlayTrigDelaying(ONE));

        rig.run(1000 + 100);
        assert!(rig.triggers.is_set(Trigger::LatchPitchCv(ONE)));

        rig.run(1000 + 256);
        assert!(rig.triggers.is_set(Trigger::LatchPitchCv(ONE)));

        rig.run(1000 + 257);
        assert!(!rig.triggers.is_set(Trigger::LatchPitchCv(ONE)));
        assert!(rig.triggers.is_set(Trigger::PlayTrigDelaying(ONE)));

        rig.run(1000 + 520);
        assert!(rig.host.take_calls().is_empty());

        rig.run(1000 + 521);
        assert_eq!(rig.host.take_calls(), vec![Call::StartPlaying(ONE)]);
        assert!(!rig.triggers.is_set(Trigger::PlayTrigDelaying(ONE)));

        rig.run(1000 + 522);
        assert!(rig.host.take_calls().is_empty());
    }

    #[test]
    fn test_play_trigger_across_counter_wrap() {
        let mut rig = Rig::new();
        rig.timers.stamp(TWO, u32::MAX - 10);
        rig.triggers.set(Trigger::PlayTrigDelaying(TWO));

        rig.run(5);
        assert!(rig.triggers.is_set(Trigger::LatchPitchCv(TWO)));
        assert!(rig.host.take_calls().is_empty());

        rig.run(511);
        assert_eq!(rig.host.take_calls(), vec![Call::StartPlaying(TWO)]);
    }

    #[test]
    fn test_channels_time_independently() {
        let mut rig = Rig::new();
        rig.timers.stamp(ONE, 0);
        rig.timers.stamp(TWO, 400);
        rig.triggers.set(Trigger::PlayTrigDelaying(ONE));
        rig.triggers.set(Trigger::PlayTrigDelaying(TWO));

        rig.run(500);
        assert!(!rig.triggers.is_set(Trigger::LatchPitchCv(ONE)));
        assert!(rig.triggers.is_set(Trigger::LatchPitchCv(TWO)));

        rig.run(521);
        assert_eq!(rig.host.take_calls(), vec![Call::StartPlaying(ONE)]);
        assert!(rig.triggers.is_set(Trigger::PlayTrigDelaying(TWO)));
    }

    #[test]
    fn test_toggle_monitor() {
        let mut rig = Rig::new();
        rig.params.channels[ONE].looping = true;
        rig.triggers.set(Trigger::ToggleMonitor);
        rig.run(1);
        assert!(rig.modes.enable_recording);
        assert!(rig.modes.monitor_recording);
        assert!(!rig.params.channels[ONE].looping);
        assert!(rig.host.take_calls().is_empty());

        rig.triggers.set(Trigger::ToggleMonitor);
        rig.run(2);
        assert!(!rig.modes.enable_recording);
        assert!(!rig.modes.monitor_recording);
        assert_eq!(rig.host.take_calls(), vec![Call::StopRecording]);
    }

    #[test]
    fn test_looping_on_starts_silent_channel() {
        let mut rig = Rig::new();
        rig.triggers.set(Trigger::ToggleLooping(ONE));
        rig.run(1);
        assert!(rig.params.channels[ONE].looping);
        assert!(rig.triggers.is_set(Trigger::PlayButton(ONE)));

        // The play button is pressed on the next pass
        rig.run(2);
        assert_eq!(rig.host.take_calls(), vec![Call::TogglePlaying(ONE)]);

        rig.host.play_state[ONE] = PlayState::Playing;
        rig.triggers.set(Trigger::ToggleLooping(ONE));
        rig.run(3);
        assert!(!rig.params.channels[ONE].looping);

        rig.triggers.set(Trigger::ToggleLooping(ONE));
        rig.run(4);
        assert!(rig.params.channels[ONE].looping);
        assert!(!rig.triggers.is_set(Trigger::PlayButton(ONE)));
    }
}
