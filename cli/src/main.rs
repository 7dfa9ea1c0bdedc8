//! Scripted-fault harness for a simulated SWIM-KV cluster: boots a
//! peer set over a [`SimNetwork`], optionally kills peers and injects
//! client CRUD calls at specific ticks, and lets `tracing` print the
//! resulting event stream.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use swimkv_net::{Address, SimNetwork, TracingEventLog};
use swimkv_node::{Peer, PeerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of peers to bring up, including the introducer.
    #[arg(long, default_value_t = 5)]
    peers: u32,

    /// Number of ticks to run the cluster for.
    #[arg(long, default_value_t = 50)]
    ticks: u64,

    /// Kill a peer at a given tick: `--kill <id>@<tick>`, repeatable.
    #[arg(long = "kill")]
    kills: Vec<String>,

    /// Inject a CREATE at a given tick: `--create key=value@tick`, repeatable.
    #[arg(long = "create")]
    creates: Vec<String>,

    /// Inject a READ at a given tick: `--read key@tick`, repeatable.
    #[arg(long = "read")]
    reads: Vec<String>,

    /// Inject an UPDATE at a given tick: `--update key=value@tick`, repeatable.
    #[arg(long = "update")]
    updates: Vec<String>,

    /// Inject a DELETE at a given tick: `--delete key@tick`, repeatable.
    #[arg(long = "delete")]
    deletes: Vec<String>,
}

fn split_at_tick(spec: &str) -> Result<(&str, u64)> {
    let (body, tick) = spec
        .rsplit_once('@')
        .with_context(|| format!("expected `...@tick`, got `{spec}`"))?;
    let tick: u64 = tick.parse().with_context(|| format!("bad tick in `{spec}`"))?;
    Ok((body, tick))
}

fn parse_kill(spec: &str) -> Result<(u32, u64)> {
    let (id, tick) = split_at_tick(spec)?;
    let id: u32 = id.parse().with_context(|| format!("bad peer id in `{spec}`"))?;
    Ok((id, tick))
}

fn parse_key_value(spec: &str) -> Result<(String, String, u64)> {
    let (body, tick) = split_at_tick(spec)?;
    match body.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string(), tick)),
        None => bail!("expected `key=value@tick`, got `{spec}`"),
    }
}

fn parse_key(spec: &str) -> Result<(String, u64)> {
    let (key, tick) = split_at_tick(spec)?;
    Ok((key.to_string(), tick))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.peers == 0 {
        bail!("--peers must be at least 1");
    }

    let kills = args.kills.iter().map(|s| parse_kill(s)).collect::<Result<Vec<_>>>()?;
    let creates = args.creates.iter().map(|s| parse_key_value(s)).collect::<Result<Vec<_>>>()?;
    let reads = args.reads.iter().map(|s| parse_key(s)).collect::<Result<Vec<_>>>()?;
    let updates = args.updates.iter().map(|s| parse_key_value(s)).collect::<Result<Vec<_>>>()?;
    let deletes = args.deletes.iter().map(|s| parse_key(s)).collect::<Result<Vec<_>>>()?;

    let net = SimNetwork::new();
    let log = TracingEventLog;
    let introducer = Address::INTRODUCER;

    let mut peers: Vec<Peer> = (1..=args.peers)
        .map(|id| {
            let me = if id == 1 { introducer } else { Address::new(id, 0) };
            Peer::new(PeerConfig::new(me, introducer), &net)
        })
        .collect();

    tracing::info!(peers = args.peers, ticks = args.ticks, "starting cluster");

    for tick in 1..=args.ticks {
        for &(id, at) in &kills {
            if at == tick {
                let victim = Address::new(id, 0);
                tracing::warn!(?victim, tick, "killing peer");
                net.kill(victim);
            }
        }
        for (key, value, at) in &creates {
            if *at == tick {
                peers[0].client_create(&net, key, value);
            }
        }
        for (key, at) in &reads {
            if *at == tick {
                peers[0].client_read(&net, key);
            }
        }
        for (key, value, at) in &updates {
            if *at == tick {
                peers[0].client_update(&net, key, value);
            }
        }
        for (key, at) in &deletes {
            if *at == tick {
                peers[0].client_delete(&net, key);
            }
        }

        for peer in &mut peers {
            peer.tick(&net, &log);
        }
    }

    tracing::info!("cluster run complete");
    Ok(())
}
