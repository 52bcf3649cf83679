use std::path::PathBuf;

use am550_rs::logging::{init_logger_with_level, log_error, log_info};
use am550_rs::util::hex::{decode_hex, encode_hex_upper};
use am550_rs::{
    AesKey, Am550Meter, ChangeFilter, FrameBuilder, LogSink, MeterConfig, RawRegisters,
    SerialConfig, SerialRunner,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "am550-cli")]
#[command(about = "CLI tool for the AM550 smart meter customer interface")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read frames from a serial port and log every changed value
    Listen {
        /// JSON configuration file; command-line options override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short, long)]
        key: Option<String>,
        #[arg(short, long)]
        baudrate: Option<u32>,
        #[arg(long)]
        idle_timeout_ms: Option<u64>,
    },
    /// Decode one frame given as hex
    Decode {
        #[arg(short, long)]
        key: String,
        frame: String,
    },
    /// Print an encrypted frame carrying the given register values
    Simulate {
        #[arg(short, long)]
        key: String,
        #[arg(long, default_value_t = 1)]
        invocation_counter: u32,
        /// Eight values: energy +A -A +R -R (Wh/varh), power +P -P +Q -Q (W/var)
        #[arg(value_delimiter = ',', required = true)]
        registers: Vec<u32>,
    },
}

fn listen_config(
    config: Option<PathBuf>,
    port: Option<String>,
    key: Option<String>,
    baudrate: Option<u32>,
    idle_timeout_ms: Option<u64>,
) -> Result<MeterConfig> {
    let mut meter_config = match (config, key) {
        (Some(path), key) => {
            let mut loaded = MeterConfig::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            if let Some(key) = key {
                loaded.key = key;
            }
            loaded
        }
        (None, Some(key)) => MeterConfig::new(key),
        (None, None) => bail!("either --config or --key is required"),
    };

    if let Some(port) = port {
        let serial = meter_config
            .serial
            .get_or_insert_with(|| SerialConfig::new(port.clone()));
        serial.port = port;
    }
    if let (Some(baudrate), Some(serial)) = (baudrate, meter_config.serial.as_mut()) {
        serial.baudrate = baudrate;
    }
    if let Some(idle_timeout_ms) = idle_timeout_ms {
        meter_config.idle_timeout_ms = idle_timeout_ms;
    }

    meter_config.validate()?;
    Ok(meter_config)
}

fn registers_from(values: &[u32]) -> Result<RawRegisters> {
    let [aep, aen, rep, ren, app, apn, rpp, rpn] = values else {
        bail!("expected 8 register values, got {}", values.len());
    };
    Ok(RawRegisters {
        active_energy_pos: *aep,
        active_energy_neg: *aen,
        reactive_energy_pos: *rep,
        reactive_energy_neg: *ren,
        active_power_pos: *app,
        active_power_neg: *apn,
        reactive_power_pos: *rpp,
        reactive_power_neg: *rpn,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger_with_level(cli.log_level);

    match cli.command {
        Commands::Listen {
            config,
            port,
            key,
            baudrate,
            idle_timeout_ms,
        } => {
            let config = listen_config(config, port, key, baudrate, idle_timeout_ms)?;
            let Some(serial) = config.serial.clone() else {
                bail!("no serial port configured, use --port");
            };

            let meter = Am550Meter::from_config(&config)?;
            meter.dump_config();

            let mut runner = SerialRunner::open(&serial, meter)
                .with_context(|| format!("opening {}", serial.port))?;
            let mut sink = ChangeFilter::new(LogSink);
            if let Err(e) = runner.run(&mut sink).await {
                log_error(&format!("serial runner stopped: {e}"));
                return Err(e.into());
            }
        }
        Commands::Decode { key, frame } => {
            let key = AesKey::from_hex(&key).context("parsing key")?;
            let frame = decode_hex(&frame).context("parsing frame")?;
            let reading = am550_rs::decode_frame(&frame, &key)?;
            println!("{}", serde_json::to_string_pretty(&reading)?);
        }
        Commands::Simulate {
            key,
            invocation_counter,
            registers,
        } => {
            let key = AesKey::from_hex(&key).context("parsing key")?;
            let registers = registers_from(&registers)?;
            let frame = FrameBuilder::new()
                .invocation_counter(invocation_counter)
                .build(&key, &registers)?;
            log_info(&format!("built {}-byte frame", frame.len()));
            println!("{}", encode_hex_upper(&frame));
        }
    }

    Ok(())
}
