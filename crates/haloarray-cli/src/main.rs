// crates/haloarray-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use haloarray_core::HaloSpec;
use haloarray_decomp::Decomposition;
use haloarray_topology::{factorize_dims, LocalTransport, LocaleTopology};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "haloarray-cli",
    about = "haloarray diagnostic CLI",
    long_about = "Inspect how haloarray would factorize a locale count and split an array shape, without needing a real multi-process launch.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show the Cartesian mesh `dims` a locale count factorizes into.
    Factorize {
        /// Total number of locales.
        #[arg(long)]
        num_locales: u32,

        /// Comma-separated per-axis locale counts; `0` entries are
        /// auto-filled (e.g. `0,0,3`).
        #[arg(long, value_delimiter = ',')]
        dims: Vec<u32>,
    },

    /// Simulate a decomposition of `shape` over a `dims`-shaped mesh and
    /// report every tile's authoritative and with-halo boxes.
    Report {
        /// Comma-separated global array shape (e.g. `300,600`).
        #[arg(long, value_delimiter = ',')]
        shape: Vec<i64>,

        /// Comma-separated per-axis locale counts; `0` entries are
        /// auto-filled. Length must match `shape`.
        #[arg(long, value_delimiter = ',')]
        dims: Vec<u32>,

        /// Comma-separated halo width per axis (both faces); defaults to 0.
        #[arg(long, value_delimiter = ',')]
        halo: Vec<u64>,

        /// Emit JSON instead of a text table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize)]
struct TileReport {
    cart_rank: i32,
    cart_coord: Vec<u32>,
    authoritative: Vec<[i64; 2]>,
    with_halo: Vec<[i64; 2]>,
    halo: Vec<[u64; 2]>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Factorize { num_locales, dims } => factorize(num_locales, dims),
        Cmd::Report {
            shape,
            dims,
            halo,
            json,
        } => report(shape, dims, halo, json),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn factorize(num_locales: u32, dims: Vec<u32>) -> Result<()> {
    info!(num_locales, ?dims, "factorizing locale count");
    let filled = factorize_dims(&dims, num_locales).context("factorizing dims")?;
    println!("{filled:?}");
    Ok(())
}

fn report(shape: Vec<i64>, dims: Vec<u32>, halo: Vec<u64>, json: bool) -> Result<()> {
    if dims.len() != shape.len() {
        bail!(
            "dims has {} axes, shape has {} axes",
            dims.len(),
            shape.len()
        );
    }
    let halo_spec = if halo.is_empty() {
        HaloSpec::Scalar(0)
    } else {
        HaloSpec::PerAxis(halo)
    };

    let num_locales: u32 = {
        let fixed: u32 = dims.iter().filter(|&&d| d != 0).product();
        if dims.iter().all(|&d| d != 0) {
            fixed
        } else {
            bail!("--dims must have every axis fixed (no zero/auto entries) for `report`, since the simulated transport needs a concrete world size; pass the already-factorized dims from `factorize` instead");
        }
    };

    info!(?shape, ?dims, num_locales, "simulating decomposition");
    let reports = simulate(num_locales, shape, dims, halo_spec)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            println!(
                "rank {:>3} coord {:?} authoritative {:?} with_halo {:?} halo {:?}",
                r.cart_rank, r.cart_coord, r.authoritative, r.with_halo, r.halo
            );
        }
    }
    Ok(())
}

fn build_report(
    transport: &LocalTransport,
    shape: Vec<i64>,
    dims: Vec<u32>,
    halo: &HaloSpec,
) -> Result<TileReport> {
    let world = transport.world();
    let topology =
        LocaleTopology::new(transport, world, None, Some(dims), None, None).context("building topology")?;
    let cart_rank = topology.inter_locale_group().rank();
    let decomposition = Decomposition::new(topology, shape, halo).context("building decomposition")?;
    let tile = decomposition.local_extent(cart_rank);

    Ok(TileReport {
        cart_rank,
        cart_coord: tile.cart_coord().to_vec(),
        authoritative: to_pairs(&tile.authoritative_box().to_slice()),
        with_halo: to_pairs(&tile.with_halo_box().to_slice()),
        halo: tile.halo().to_vec(),
    })
}

fn simulate(num_locales: u32, shape: Vec<i64>, dims: Vec<u32>, halo: HaloSpec) -> Result<Vec<TileReport>> {
    let transports = LocalTransport::hub(num_locales as usize);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for transport in transports {
            let tx = tx.clone();
            let shape = shape.clone();
            let dims = dims.clone();
            let halo = halo.clone();
            scope.spawn(move || {
                let result = build_report(&transport, shape, dims, &halo).map_err(|e| e.to_string());
                let _ = tx.send(result);
            });
        }
    });
    drop(tx);

    let mut reports = Vec::new();
    for result in rx {
        reports.push(result.map_err(|msg| anyhow::anyhow!(msg))?);
    }
    reports.sort_by_key(|r| r.cart_rank);
    Ok(reports)
}

fn to_pairs(slices: &[std::ops::Range<i64>]) -> Vec<[i64; 2]> {
    slices.iter().map(|r| [r.start, r.end]).collect()
}
