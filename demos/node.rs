use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;

use chord::{Chord, IdSpace, Node};

use clap::Parser;

use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on, picked by the OS if omitted.
    #[arg(long)]
    port: Option<u16>,
    /// `host:port` of a node already in the ring. Starts a new ring if omitted.
    #[arg(long)]
    seed: Option<String>,
    /// Width of the identifier space in bits.
    #[arg(long, default_value_t = 64)]
    bits: u8,
    /// Values to store once joined.
    #[arg(long = "put")]
    values: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    let mut builder = Chord::builder();
    builder.id_bits(cli.bits);
    if let Some(port) = cli.port {
        builder.port(port);
    }

    let chord = builder.build().expect("Failed to create Chord node");

    let seed = cli.seed.as_deref().map(|seed| {
        let (host, port) = seed.rsplit_once(':').expect("seed must be host:port");
        let port = port.parse().expect("invalid seed port");
        let space = IdSpace::new(cli.bits).expect("invalid id bits");

        Node::new(host, port, &space)
    });

    chord.join(seed.as_ref()).expect("Failed to join the Chord ring");

    info!(local = %chord.local(), "Chord node is running! Press Ctrl+C to leave the ring.");

    for value in &cli.values {
        match chord.add_key(value) {
            Ok(key) => info!(?key, %value, "Stored value"),
            Err(error) => warn!(%value, %error, "Failed to store value"),
        }
    }

    let (tx_interrupted, rx_interrupted) = channel();

    ctrlc::set_handler(move || {
        let _ = tx_interrupted.send(());
    })
    .expect("Error setting Ctrl-C handler");

    loop {
        match rx_interrupted.recv_timeout(Duration::from_secs(10)) {
            Err(RecvTimeoutError::Timeout) => {
                info!(
                    successor = %chord.successor(),
                    predecessor = ?chord.predecessor(),
                    keys = chord.store().len(),
                    "=== Chord Node Status ==="
                );
            }
            _ => break,
        }
    }

    info!("Leaving the ring...");
    chord.depart();
    chord.shutdown();
}
