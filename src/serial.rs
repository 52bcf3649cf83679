//! # AM550 Serial Communication
//!
//! Reads the meter's customer interface with `tokio-serial` and drives an
//! [`Am550Meter`] from a single task. Every poll interval the runner moves
//! whatever bytes arrived into a queue and ticks the meter once, which is
//! the cooperative loop the meter expects. A lost port ends the run; there
//! is no reconnection.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info};
use tokio::io::AsyncReadExt;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tokio_serial::SerialPortBuilderExt;

use crate::config::SerialConfig;
use crate::error::Am550Error;
use crate::meter::Am550Meter;
use crate::sink::Sink;

const READ_CHUNK: usize = 256;

/// Open `config.port` as 8N1 at the configured baud rate.
pub fn open_port(config: &SerialConfig) -> Result<tokio_serial::SerialStream, Am550Error> {
    tokio_serial::new(&config.port, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::None)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| Am550Error::SerialPortError(e.to_string()))
}

/// Owns the meter and the receive queue for one port.
pub struct SerialRunner<R> {
    port: R,
    meter: Am550Meter,
    queue: VecDeque<u8>,
    poll_interval: Duration,
}

impl SerialRunner<tokio_serial::SerialStream> {
    pub fn open(config: &SerialConfig, meter: Am550Meter) -> Result<Self, Am550Error> {
        let port = open_port(config)?;
        info!("opened {} at {} baud", config.port, config.baudrate);
        Ok(Self::new(port, meter, config.poll_interval()))
    }
}

impl<R: tokio::io::AsyncRead + Unpin> SerialRunner<R> {
    /// Runner over any byte stream; tests use an in-memory reader.
    pub fn new(port: R, meter: Am550Meter, poll_interval: Duration) -> Self {
        Self {
            port,
            meter,
            queue: VecDeque::with_capacity(READ_CHUNK),
            poll_interval,
        }
    }

    pub fn meter(&self) -> &Am550Meter {
        &self.meter
    }

    /// Move the bytes that arrive within one poll interval into the queue.
    ///
    /// Returns `false` once the stream has ended.
    async fn fill_queue(&mut self) -> Result<bool, Am550Error> {
        let mut buf = [0u8; READ_CHUNK];
        match timeout(self.poll_interval, self.port.read(&mut buf)).await {
            Err(_elapsed) => Ok(true),
            Ok(Ok(0)) => Ok(false),
            Ok(Ok(n)) => {
                self.queue.extend(&buf[..n]);
                Ok(true)
            }
            Ok(Err(e)) => Err(Am550Error::SerialPortError(e.to_string())),
        }
    }

    /// One cooperative tick: read what is there, then poll the meter.
    ///
    /// Rejected frames are logged by the meter and do not end the run.
    pub async fn step<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<bool, Am550Error> {
        let open = self.fill_queue().await?;
        let now = Instant::now().into_std();
        if let Err(err) = self.meter.tick(&mut self.queue, now, sink) {
            debug!("tick ended with {err}");
        }
        Ok(open)
    }

    /// Tick until the stream ends or the port fails.
    pub async fn run<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Am550Error> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.step(sink).await? {
            ticker.tick().await;
        }

        // Let the last frame go idle so it is not lost at end of stream.
        tokio::time::sleep(self.drain_delay()).await;
        self.step(sink).await?;
        info!("serial stream closed, stats: {:?}", self.meter.stats());
        Ok(())
    }

    fn drain_delay(&self) -> Duration {
        self.meter.idle_timeout() + self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AesKey;
    use crate::frame::FrameBuilder;
    use crate::payload::RawRegisters;
    use crate::sink::{Channel, ChannelValue, MemorySink};

    #[tokio::test]
    async fn test_runner_decodes_frame_from_stream() {
        let key = AesKey::from([7u8; 16]);
        let registers = RawRegisters {
            active_energy_pos: 1_234_567,
            active_power_pos: 1500,
            ..Default::default()
        };
        let frame = FrameBuilder::new().build(&key, &registers).unwrap();

        let meter = Am550Meter::with_idle_timeout(key, Duration::from_millis(20));
        let mut runner = SerialRunner::new(&frame[..], meter, Duration::from_millis(5));
        let mut sink = MemorySink::new();

        runner.run(&mut sink).await.unwrap();

        assert_eq!(runner.meter().stats().frames_decoded, 1);
        assert_eq!(
            sink.latest(Channel::ActivePowerPos),
            Some(&ChannelValue::Number(1500.0))
        );
        assert_eq!(
            sink.latest(Channel::ActiveEnergyPosRaw),
            Some(&ChannelValue::Text("1234567".into()))
        );
    }
}
