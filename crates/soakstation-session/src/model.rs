//! Aggregated view of a controller.
//!
//! [`DeviceModel`] folds decoded events into the latest known state;
//! [`ModelSink`] keeps one up to date and publishes it on a watch channel.

use std::collections::BTreeMap;

use serde::Serialize;
use soakstation_protocol::{
    DeviceStateEvent, Event, Notification, SoftwareVersion, StatusOutcome, TimerState,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::sink::EventSink;

/// A stored preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub target_temperature: f64,
    pub duration_seconds: u8,
    pub outlets_enabled: Vec<u8>,
    pub name: String,
}

/// Firmware versions reported by the technical info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Firmware {
    pub valve: SoftwareVersion,
    pub bluetooth: SoftwareVersion,
    pub ui: SoftwareVersion,
}

/// Outlet limits reported by the outlet settings record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletLimits {
    pub outlet_flag: u8,
    pub min_duration_seconds: u8,
    pub max_temperature: f64,
    pub min_temperature: f64,
}

/// Latest known state of one controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceModel {
    pub slots: Vec<u8>,
    pub outlet1: Option<bool>,
    pub outlet2: Option<bool>,
    pub target_temperature: Option<f64>,
    pub actual_temperature: Option<f64>,
    pub timer_state: Option<TimerState>,
    pub remaining_seconds: Option<u16>,
    pub update_counter: Option<u8>,
    pub outlets_enabled: Vec<u8>,
    pub default_preset_slot: Option<u8>,
    pub controller_settings: Vec<u8>,
    pub outlet_limits: Option<OutletLimits>,
    pub nickname: Option<String>,
    pub firmware: Option<Firmware>,
    pub client_name: Option<String>,
    pub presets: BTreeMap<u8, Preset>,
}

impl DeviceModel {
    /// Fold `event` into the model. Returns whether anything changed.
    pub fn apply(&mut self, event: &Event) -> bool {
        let before = self.clone();

        match &event.notification {
            Notification::DeviceState(state) => self.apply_state(state),
            Notification::ControlsOperated(operated) => self.apply_state(&operated.state),
            Notification::Slots(slots) => self.slots = slots.slots.clone(),
            Notification::DeviceSettings(settings) => {
                self.outlets_enabled = settings.outlets_enabled.clone();
                self.default_preset_slot = Some(settings.default_preset_slot);
                self.controller_settings = settings.controller_settings.clone();
            }
            Notification::OutletSettings(settings) => {
                self.outlet_limits = Some(OutletLimits {
                    outlet_flag: settings.outlet_flag,
                    min_duration_seconds: settings.min_duration_seconds,
                    max_temperature: settings.max_temperature,
                    min_temperature: settings.min_temperature,
                });
                self.update_counter = Some(settings.update_counter);
            }
            Notification::TechnicalInfo(info) => {
                self.firmware = Some(Firmware {
                    valve: info.valve_version,
                    bluetooth: info.bluetooth_version,
                    ui: info.ui_version,
                });
            }
            Notification::Nickname(nickname) => self.nickname = Some(nickname.nickname.clone()),
            Notification::ClientDetails(details) => {
                self.client_name = Some(details.client_name.clone())
            }
            Notification::PresetDetails(preset) => {
                self.presets.insert(
                    preset.preset_slot,
                    Preset {
                        target_temperature: preset.target_temperature,
                        duration_seconds: preset.duration_seconds,
                        outlets_enabled: preset.outlets_enabled.clone(),
                        name: preset.name.clone(),
                    },
                );
            }
            Notification::Status(status) => match status.outcome() {
                StatusOutcome::Success => debug!(slot = event.client_slot, "command succeeded"),
                StatusOutcome::Failure => warn!(slot = event.client_slot, "command failed"),
                StatusOutcome::Other(value) => {
                    warn!(slot = event.client_slot, status = value, "unexpected status")
                }
            },
            Notification::Unrecognized { .. } => {}
        }

        *self != before
    }

    fn apply_state(&mut self, state: &DeviceStateEvent) {
        self.timer_state = Some(state.timer_state);
        self.target_temperature = Some(state.target_temperature);
        self.actual_temperature = Some(state.actual_temperature);
        self.outlet1 = Some(state.outlet1);
        self.outlet2 = Some(state.outlet2);
        self.remaining_seconds = Some(state.remaining_seconds);
        self.update_counter = Some(state.update_counter);
    }

    /// Whether either outlet is known to be running.
    pub fn is_running(&self) -> bool {
        self.outlet1 == Some(true) || self.outlet2 == Some(true)
    }
}

/// Event sink that maintains a [`DeviceModel`].
#[derive(Debug)]
pub struct ModelSink {
    tx: watch::Sender<DeviceModel>,
}

impl ModelSink {
    /// Create a sink and a receiver observing its model.
    pub fn new() -> (Self, watch::Receiver<DeviceModel>) {
        let (tx, rx) = watch::channel(DeviceModel::default());
        (Self { tx }, rx)
    }

    /// Another receiver for the same model.
    pub fn subscribe(&self) -> watch::Receiver<DeviceModel> {
        self.tx.subscribe()
    }
}

impl EventSink for ModelSink {
    fn deliver(&mut self, event: Event) {
        self.tx.send_if_modified(|model| model.apply(&event));
    }
}

#[cfg(test)]
mod tests {
    use soakstation_protocol::{
        ControlsOperatedEvent, NicknameEvent, PresetDetailsEvent, StatusEvent,
    };

    use super::*;

    fn event(notification: Notification) -> Event {
        Event {
            client_slot: 2,
            notification,
        }
    }

    fn running_state() -> DeviceStateEvent {
        DeviceStateEvent {
            timer_state: TimerState::Running,
            target_temperature: 38.5,
            actual_temperature: 37.0,
            outlet1: true,
            outlet2: false,
            remaining_seconds: 600,
            update_counter: 4,
        }
    }

    #[test]
    fn device_state_updates_outlets_and_temperatures() {
        let mut model = DeviceModel::default();
        assert!(model.apply(&event(Notification::DeviceState(running_state()))));

        assert_eq!(model.outlet1, Some(true));
        assert_eq!(model.outlet2, Some(false));
        assert!(model.is_running());
        assert_eq!(model.target_temperature, Some(38.5));
        assert_eq!(model.timer_state, Some(TimerState::Running));
        assert_eq!(model.remaining_seconds, Some(600));
    }

    #[test]
    fn outlets_are_unknown_until_reported() {
        let model = DeviceModel::default();
        assert_eq!(model.outlet1, None);
        assert_eq!(model.outlet2, None);
        assert!(!model.is_running());

        let json = serde_json::to_value(&model).unwrap();
        assert!(json["outlet1"].is_null());
    }

    #[test]
    fn controls_operated_updates_like_state() {
        let mut model = DeviceModel::default();
        let mut state = running_state();
        state.outlet2 = true;
        model.apply(&event(Notification::ControlsOperated(ControlsOperatedEvent {
            change_made: true,
            state,
        })));
        assert_eq!(model.outlet2, Some(true));
    }

    #[test]
    fn repeated_event_reports_no_change() {
        let mut model = DeviceModel::default();
        let nickname = event(Notification::Nickname(NicknameEvent {
            nickname: "Bathroom".to_string(),
        }));
        assert!(model.apply(&nickname));
        assert!(!model.apply(&nickname));
        assert!(!model.apply(&event(Notification::Status(StatusEvent { status: 1 }))));
    }

    #[test]
    fn presets_are_keyed_by_slot() {
        let mut model = DeviceModel::default();
        model.apply(&event(Notification::PresetDetails(PresetDetailsEvent {
            preset_slot: 3,
            target_temperature: 40.0,
            duration_seconds: 120,
            outlets_enabled: vec![0],
            name: "Bath".to_string(),
        })));
        assert_eq!(model.presets[&3].name, "Bath");
    }

    #[test]
    fn model_serializes_to_json() {
        let mut model = DeviceModel::default();
        model.apply(&event(Notification::DeviceState(running_state())));

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["outlet1"], true);
        assert_eq!(json["timer_state"], "running");
        assert_eq!(json["remaining_seconds"], 600);
    }

    #[tokio::test]
    async fn model_sink_publishes_changes() {
        let (mut sink, mut rx) = ModelSink::new();
        sink.deliver(event(Notification::DeviceState(running_state())));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().outlet1, Some(true));

        sink.deliver(event(Notification::Status(StatusEvent { status: 1 })));
        assert!(!rx.has_changed().unwrap());
    }
}
