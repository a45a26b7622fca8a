#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};

#[cfg(feature = "cli")]
use gridseq::{midi::ports, Host, LiveChannel, LiveRelease, PortConfig, SequencerConfig};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReleaseArg {
    /// Send a note-off when a pad is released
    Forward,
    /// Ignore pad releases
    Ignore,
}

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(author, version, about = "Step sequencer for an 8x8 pad controller and a MIDI drum")]
struct Args {
    /// Print the available MIDI ports and exit
    #[arg(long)]
    list: bool,

    /// MIDI client name
    #[arg(long)]
    client_name: Option<String>,

    /// Substring of the controller surface's port names
    #[arg(long)]
    surface: Option<String>,

    /// Substring of the instrument's port names
    #[arg(long)]
    instrument: Option<String>,

    /// Substring of the beat clock's output port name
    #[arg(long)]
    clock: Option<String>,

    /// Instrument channel of track 1 (1-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    channel: Option<u8>,

    /// Note number sent for every trigger
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    note: Option<u8>,

    /// Velocity of sequenced triggers
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    velocity: Option<u8>,

    /// What a released pad does in live-trigger mode
    #[arg(long, value_enum)]
    live_release: Option<ReleaseArg>,

    /// Live-trigger channel: "column", or a fixed track 1-6
    #[arg(long, value_parser = parse_live_channel)]
    live_channel: Option<LiveChannel>,

    /// Capacity of the deferred instrument-input queue
    #[arg(long)]
    queue_capacity: Option<usize>,
}

#[cfg(feature = "cli")]
impl Args {
    fn port_config(&self) -> PortConfig {
        let defaults = PortConfig::default();
        PortConfig {
            client_name: self.client_name.clone().unwrap_or(defaults.client_name),
            surface: self.surface.clone().unwrap_or(defaults.surface),
            instrument: self.instrument.clone().unwrap_or(defaults.instrument),
            clock: self.clock.clone().unwrap_or(defaults.clock),
        }
    }

    fn sequencer_config(&self) -> SequencerConfig {
        let defaults = SequencerConfig::default();
        SequencerConfig {
            instrument_channel: self
                .channel
                .map_or(defaults.instrument_channel, |c| c - 1),
            note: self.note.unwrap_or(defaults.note),
            velocity: self.velocity.unwrap_or(defaults.velocity),
            live_release: match self.live_release {
                Some(ReleaseArg::Forward) => LiveRelease::Forward,
                Some(ReleaseArg::Ignore) => LiveRelease::Ignore,
                None => defaults.live_release,
            },
            live_channel: self.live_channel.unwrap_or(defaults.live_channel),
            queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
        }
    }
}

#[cfg(feature = "cli")]
fn parse_live_channel(value: &str) -> Result<LiveChannel, String> {
    if value.eq_ignore_ascii_case("column") {
        return Ok(LiveChannel::Column);
    }
    match value.parse::<usize>() {
        Ok(track @ 1..=6) => Ok(LiveChannel::Fixed(track - 1)),
        _ => Err(format!("expected \"column\" or a track 1-6, got \"{}\"", value)),
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let port_config = args.port_config();

    if args.list {
        let (inputs, outputs) = ports::available_ports(&port_config.client_name)?;
        println!("Inputs:");
        for name in inputs {
            println!("  {}", name);
        }
        println!("Outputs:");
        for name in outputs {
            println!("  {}", name);
        }
        return Ok(());
    }

    let config = args.sequencer_config();
    log::info!("starting {} with {:?}", port_config.client_name, config);
    let host = Host::start(&port_config, config)?;

    println!("Running. Press Enter to quit.");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let stats = host.stats();
    drop(host);
    log::info!("stopped, {:?}", stats);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature to be enabled");
    std::process::exit(1);
}
