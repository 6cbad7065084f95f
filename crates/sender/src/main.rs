mod walk;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use smooth::{
    BroadcastVariant, EncoderContext, FieldRegistry, NetworkClock, RoutingMode, SceneNode,
    SmoothBroadcaster, SmoothConfig, SmoothNodeEncoder, SmoothReceiver, SystemClock, Transport,
    UdpTransport,
};
use walk::Walk;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    Full,
    Xyh,
    Xy,
}

impl From<Variant> for BroadcastVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Full => BroadcastVariant::Full,
            Variant::Xyh => BroadcastVariant::Xyh,
            Variant::Xy => BroadcastVariant::Xy,
        }
    }
}

#[derive(Parser)]
#[command(name = "smooth-sender")]
#[command(about = "Broadcasts a scripted walk as smooth-node pose updates")]
struct Args {
    #[arg(short, long, help = "RON config file, created with defaults if missing")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Destination address; omit to only log datagrams")]
    target: Option<SocketAddr>,

    #[arg(short, long, default_value = "0.0.0.0:0")]
    bind: String,

    #[arg(short, long, default_value_t = 1000)]
    do_id: u32,

    #[arg(short, long, help = "Send authoritative updates from this channel")]
    sender_channel: Option<u64>,

    #[arg(short, long, help = "Broadcasts per second")]
    rate: Option<u32>,

    #[arg(long, default_value_t = 0, help = "Stop after this many broadcasts (0 runs forever)")]
    ticks: u64,

    #[arg(short, long, value_enum)]
    variant: Option<Variant>,

    #[arg(long, default_value_t = 20.0)]
    radius: f32,

    #[arg(long, help = "Decode and log updates arriving on this address instead of sending")]
    listen: Option<SocketAddr>,
}

/// Where the sender's datagrams go.
enum Output {
    Udp(UdpTransport),
    Log,
}

impl Transport for Output {
    fn send_datagram(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Output::Udp(transport) => transport.send_datagram(data),
            Output::Log => {
                log::info!("{} bytes: {}", data.len(), hex(data));
                Ok(())
            }
        }
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => SmoothConfig::load_or_create(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SmoothConfig::default(),
    };
    let config = apply_overrides(base, &args);
    log::debug!("{:?}", config);

    match args.listen {
        Some(addr) => listen(addr, &config, args.ticks),
        None => broadcast(&args, &config),
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(mut config: SmoothConfig, args: &Args) -> SmoothConfig {
    if let Some(rate) = args.rate {
        config.broadcast_rate = rate;
    }
    if let Some(variant) = args.variant {
        config.variant = variant.into();
    }
    if let Some(sender_channel) = args.sender_channel {
        config.routing = RoutingMode::Authoritative { sender_channel };
    }
    config
}

fn broadcast(args: &Args, config: &SmoothConfig) -> Result<()> {
    let output = match args.target {
        Some(target) => {
            let mut transport = UdpTransport::bind(args.bind.as_str())
                .with_context(|| format!("failed to bind {}", args.bind))?;
            transport.set_target(target);
            log::info!("Sending from {} to {}", transport.local_addr(), target);
            Output::Udp(transport)
        }
        None => {
            log::info!("No target given, logging datagrams");
            Output::Log
        }
    };

    let context = EncoderContext::from_config(config, NetworkClock::new(SystemClock::new(), 0.0));
    let node = SceneNode::new("walker");
    let mut walk = Walk::new(args.radius, config.broadcast_rate.max(1) * 2);

    let mut broadcaster = SmoothBroadcaster::new(output, config.broadcast_rate, config.variant);
    broadcaster.add(SmoothNodeEncoder::initialize(node.clone(), args.do_id, context));
    if let Some(encoder) = broadcaster.encoder_mut(args.do_id) {
        encoder.set_location(walk.zone());
    }

    let resync = broadcaster.send_everything();
    log::info!("Initial resync: {:?}", resync);

    let mut broadcasts = 0u64;
    let mut last_frame = Instant::now();
    while args.ticks == 0 || broadcasts < args.ticks {
        let now = Instant::now();
        let delta = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;

        if let Some(report) = broadcaster.update(delta) {
            broadcasts += 1;
            log::debug!("Broadcast {} ({:?}): {:?}", broadcasts, walk.phase(), report);

            if let Some(zone) = walk.step(&node) {
                if let Some(encoder) = broadcaster.encoder_mut(args.do_id) {
                    encoder.set_location(zone);
                    encoder.log_locations();
                }
            }
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    if let Output::Udp(transport) = broadcaster.transport() {
        let stats = transport.stats();
        log::info!("Sent {} datagrams ({} bytes)", stats.datagrams_sent, stats.bytes_sent);
    }
    Ok(())
}

fn listen(addr: SocketAddr, config: &SmoothConfig, limit: u64) -> Result<()> {
    let mut transport =
        UdpTransport::bind(addr).with_context(|| format!("failed to bind {}", addr))?;
    log::info!("Listening on {}", transport.local_addr());

    let schema = FieldRegistry::smooth_node(config.first_field_number);
    let kind = config.routing.kind();
    let mut receiver = SmoothReceiver::new();
    let mut received = 0u64;

    while limit == 0 || received < limit {
        for (data, from) in transport.receive()? {
            match receiver.receive_datagram(&data, kind, &schema) {
                Ok(update) => {
                    received += 1;
                    log::info!(
                        "{} object {} {:?} pos = {} hpr = {} location = {:?} t = {} (+{:?})",
                        from,
                        update.do_id,
                        update.shape,
                        update.pose.pos,
                        update.pose.hpr,
                        update.location,
                        update.timestamp,
                        update.elapsed_ticks
                    );
                }
                Err(err) => log::warn!("Dropped datagram from {}: {}", from, err),
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("Tracked {} objects", receiver.len());
    Ok(())
}
