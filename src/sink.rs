//! # Reading Sinks
//!
//! The pipeline hands every decoded value to a [`Sink`]. Whether an
//! unchanged value is worth forwarding is the sink's decision;
//! [`ChangeFilter`] wraps any sink and drops repeats per channel.

use std::collections::HashMap;
use std::fmt;

use log::info;
use serde::Serialize;

/// Output channels, one per published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    ActiveEnergyPos,
    ActiveEnergyNeg,
    ReactiveEnergyPos,
    ReactiveEnergyNeg,
    ActivePowerPos,
    ActivePowerNeg,
    ReactivePowerPos,
    ReactivePowerNeg,
    ActiveEnergyPosRaw,
    ActiveEnergyNegRaw,
    ReactiveEnergyPosRaw,
    ReactiveEnergyNegRaw,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::ActiveEnergyPos => "active_energy_pos",
            Channel::ActiveEnergyNeg => "active_energy_neg",
            Channel::ReactiveEnergyPos => "reactive_energy_pos",
            Channel::ReactiveEnergyNeg => "reactive_energy_neg",
            Channel::ActivePowerPos => "active_power_pos",
            Channel::ActivePowerNeg => "active_power_neg",
            Channel::ReactivePowerPos => "reactive_power_pos",
            Channel::ReactivePowerNeg => "reactive_power_neg",
            Channel::ActiveEnergyPosRaw => "active_energy_pos_raw",
            Channel::ActiveEnergyNegRaw => "active_energy_neg_raw",
            Channel::ReactiveEnergyPosRaw => "reactive_energy_pos_raw",
            Channel::ReactiveEnergyNegRaw => "reactive_energy_neg_raw",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Channel::ActiveEnergyPos | Channel::ActiveEnergyNeg => "kWh",
            Channel::ReactiveEnergyPos | Channel::ReactiveEnergyNeg => "kvarh",
            Channel::ActivePowerPos | Channel::ActivePowerNeg => "W",
            Channel::ReactivePowerPos | Channel::ReactivePowerNeg => "var",
            Channel::ActiveEnergyPosRaw | Channel::ActiveEnergyNegRaw => "Wh",
            Channel::ReactiveEnergyPosRaw | Channel::ReactiveEnergyNegRaw => "varh",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Number(f32),
    Text(String),
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Number(v) => write!(f, "{v:.3}"),
            ChannelValue::Text(s) => f.write_str(s),
        }
    }
}

/// Receives decoded values.
pub trait Sink {
    fn publish(&mut self, channel: Channel, value: ChannelValue);
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn publish(&mut self, channel: Channel, value: ChannelValue) {
        (**self).publish(channel, value);
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn publish(&mut self, channel: Channel, value: ChannelValue) {
        (**self).publish(channel, value);
    }
}

/// Forwards a value only if it differs from the last one forwarded on the
/// same channel.
#[derive(Debug, Default)]
pub struct ChangeFilter<S> {
    inner: S,
    last: HashMap<Channel, ChannelValue>,
}

impl<S: Sink> ChangeFilter<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: HashMap::new(),
        }
    }

    /// Last forwarded value of `channel`.
    pub fn state(&self, channel: Channel) -> Option<&ChannelValue> {
        self.last.get(&channel)
    }

    /// Forget all remembered states; the next value on every channel is
    /// forwarded.
    pub fn reset(&mut self) {
        self.last.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Sink for ChangeFilter<S> {
    fn publish(&mut self, channel: Channel, value: ChannelValue) {
        if self.last.get(&channel) == Some(&value) {
            return;
        }
        self.last.insert(channel, value.clone());
        self.inner.publish(channel, value);
    }
}

/// Logs each value at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn publish(&mut self, channel: Channel, value: ChannelValue) {
        info!("{channel}: {value} {}", channel.unit());
    }
}

/// Records everything it is given, in order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub published: Vec<(Channel, ChannelValue)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value published on `channel`.
    pub fn latest(&self, channel: Channel) -> Option<&ChannelValue> {
        self.published
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Sink for MemorySink {
    fn publish(&mut self, channel: Channel, value: ChannelValue) {
        self.published.push((channel, value));
    }
}
