use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use seal_receiver::{Datagram, Receiver};

/// Collector for security seal tamper reports
#[derive(Debug, Parser)]
#[command(name = "seal-receiver", version)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// UDP port to bind to
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let receiver = Receiver::bind((args.host.as_str(), args.port))
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    info!("listening on {}", receiver.local_addr()?);

    loop {
        let (datagram, from) = receiver.recv().context("receiving datagram")?;
        match datagram {
            Datagram::Report(_) => info!("{} from {}", datagram, from),
            Datagram::Malformed { .. } => warn!("{} from {}", datagram, from),
        }
    }
}
