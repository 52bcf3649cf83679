//! Mapping raw registers to published values.

use serde::Serialize;

use crate::constants::{ENERGY_WRAP, WH_PER_KWH};
use crate::payload::registers::RawRegisters;
use crate::sink::{Channel, ChannelValue, Sink};

/// One decoded frame.
///
/// Energy values are in kWh and wrap at 1000 kWh so they survive a trip
/// through an `f32` without losing the Wh digit; the `_raw` strings carry
/// the full counter in Wh. Power values are in W (var for reactive).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    pub active_energy_pos: f32,
    pub active_energy_neg: f32,
    pub reactive_energy_pos: f32,
    pub reactive_energy_neg: f32,
    pub active_power_pos: f32,
    pub active_power_neg: f32,
    pub reactive_power_pos: f32,
    pub reactive_power_neg: f32,
    pub active_energy_pos_raw: String,
    pub active_energy_neg_raw: String,
    pub reactive_energy_pos_raw: String,
    pub reactive_energy_neg_raw: String,
}

/// `(raw mod 1_000_000) / 1000`, in [0, 1000).
pub fn scale_energy(raw: u32) -> f32 {
    (raw % ENERGY_WRAP) as f32 / WH_PER_KWH
}

pub fn scale_power(raw: u32) -> f32 {
    raw as f32
}

/// Turn raw registers into a reading. Pure.
pub fn map(raw: &RawRegisters) -> MeterReading {
    MeterReading {
        active_energy_pos: scale_energy(raw.active_energy_pos),
        active_energy_neg: scale_energy(raw.active_energy_neg),
        reactive_energy_pos: scale_energy(raw.reactive_energy_pos),
        reactive_energy_neg: scale_energy(raw.reactive_energy_neg),
        active_power_pos: scale_power(raw.active_power_pos),
        active_power_neg: scale_power(raw.active_power_neg),
        reactive_power_pos: scale_power(raw.reactive_power_pos),
        reactive_power_neg: scale_power(raw.reactive_power_neg),
        active_energy_pos_raw: raw.active_energy_pos.to_string(),
        active_energy_neg_raw: raw.active_energy_neg.to_string(),
        reactive_energy_pos_raw: raw.reactive_energy_pos.to_string(),
        reactive_energy_neg_raw: raw.reactive_energy_neg.to_string(),
    }
}

impl From<&RawRegisters> for MeterReading {
    fn from(raw: &RawRegisters) -> Self {
        map(raw)
    }
}

impl MeterReading {
    /// All twelve channels with their values, numeric channels first.
    pub fn channels(&self) -> [(Channel, ChannelValue); 12] {
        use ChannelValue::{Number, Text};
        [
            (Channel::ActiveEnergyPos, Number(self.active_energy_pos)),
            (Channel::ActiveEnergyNeg, Number(self.active_energy_neg)),
            (Channel::ReactiveEnergyPos, Number(self.reactive_energy_pos)),
            (Channel::ReactiveEnergyNeg, Number(self.reactive_energy_neg)),
            (Channel::ActivePowerPos, Number(self.active_power_pos)),
            (Channel::ActivePowerNeg, Number(self.active_power_neg)),
            (Channel::ReactivePowerPos, Number(self.reactive_power_pos)),
            (Channel::ReactivePowerNeg, Number(self.reactive_power_neg)),
            (Channel::ActiveEnergyPosRaw, Text(self.active_energy_pos_raw.clone())),
            (Channel::ActiveEnergyNegRaw, Text(self.active_energy_neg_raw.clone())),
            (Channel::ReactiveEnergyPosRaw, Text(self.reactive_energy_pos_raw.clone())),
            (Channel::ReactiveEnergyNegRaw, Text(self.reactive_energy_neg_raw.clone())),
        ]
    }

    /// Publish every channel to `sink`. Change suppression is up to the sink.
    pub fn publish<S: Sink + ?Sized>(&self, sink: &mut S) {
        for (channel, value) in self.channels() {
            sink.publish(channel, value);
        }
    }
}
