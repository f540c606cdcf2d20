//! redwire CLI Client
//!
//! Sends one command given on the command line, or every line of stdin as a
//! single pipelined batch.

use std::io::{self, BufRead};
use std::process;

use clap::Parser;
use redwire::{Client, Config, Reply, Request, ResultCell};
use tracing_subscriber::{fmt, EnvFilter};

/// redwire CLI
#[derive(Parser, Debug)]
#[command(name = "redwire-cli")]
#[command(about = "Send commands to a RESP server")]
#[command(version)]
struct Args {
    /// Server URL (redis://host:port/db); overrides host, port and db
    #[arg(short, long)]
    url: Option<String>,

    /// Server hostname
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Database index selected on connect
    #[arg(short = 'n', long, default_value = "0")]
    db: i64,

    /// Connect/read/write timeout in milliseconds (0 disables)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Wrap a stdin batch in MULTI/EXEC
    #[arg(long)]
    transaction: bool,

    /// Command and arguments; read stdin when omitted
    command: Vec<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    tracing::debug!("redwire-cli v{} connecting to {}", redwire::VERSION, config.addr());

    let mut client = match Client::open(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", config.addr(), e);
            process::exit(1);
        }
    };

    let outcome = if args.command.is_empty() {
        run_batch(&mut client, args.transaction)
    } else {
        run_single(&mut client, &args.command)
    };

    client.close();

    if let Err(e) = outcome {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn build_config(args: &Args) -> redwire::Result<Config> {
    let base = match &args.url {
        Some(url) => Config::from_url(url)?,
        None => Config::builder()
            .host(&args.host)
            .port(args.port)
            .db_index(args.db)
            .build(),
    };

    Ok(Config {
        connect_timeout: timeout(args.timeout_ms),
        read_timeout: timeout(args.timeout_ms),
        write_timeout: timeout(args.timeout_ms),
        ..base
    })
}

fn timeout(ms: u64) -> Option<std::time::Duration> {
    (ms > 0).then(|| std::time::Duration::from_millis(ms))
}

fn run_single(client: &mut Client, command: &[String]) -> redwire::Result<()> {
    let request = Request::from_args(command)?;
    let reply = client.send_one(&request)?;
    println!("{}", reply);
    Ok(())
}

/// Read stdin lines and send them as one batch
fn run_batch(client: &mut Client, transaction: bool) -> redwire::Result<()> {
    let mut requests = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() || words[0].starts_with('#') {
            continue;
        }
        requests.push(Request::from_args(words)?);
    }

    let mut pipe = if transaction {
        client.transaction()
    } else {
        client.pipeline()
    };

    let cells: Vec<ResultCell<Reply>> = requests
        .into_iter()
        .map(|request| pipe.enqueue::<Reply>(request))
        .collect();

    // Cells bound before a failure still print
    let outcome = pipe.commit();

    for cell in cells.iter().filter(|cell| cell.is_set()) {
        cell.with(|reply| {
            if let Some(reply) = reply {
                println!("{}", reply);
            }
        });
    }

    if !outcome? {
        println!("(transaction aborted)");
    }
    Ok(())
}
