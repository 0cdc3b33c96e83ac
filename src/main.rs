//! Command-line interface for the cfilter export tool.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};

use cfilter_export::config::{DAEMON_CONF_NAME, daemon_app_dir};
use cfilter_export::{DaemonClient, LevelFilter, Network, Settings, export, init_logging};

#[tokio::main]
async fn main() {
    let matches = Command::new("cfilter-export")
        .version(cfilter_export::VERSION)
        .about("Exports committed compact block filters from a daemon RPC server")
        .arg(
            Arg::new("rpcuser")
                .short('u')
                .long("rpcuser")
                .value_name("USER")
                .help("Username for RPC connections"),
        )
        .arg(
            Arg::new("rpcpass")
                .short('P')
                .long("rpcpass")
                .value_name("PASS")
                .help("Password for RPC connections"),
        )
        .arg(
            Arg::new("rpccert")
                .long("rpccert")
                .value_name("FILE")
                .help("File containing the daemon TLS certificate")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("rpcconnect")
                .short('c')
                .long("rpcconnect")
                .value_name("ADDRESS")
                .help("Network address of the daemon RPC server"),
        )
        .arg(
            Arg::new("targetheight")
                .short('t')
                .long("targetheight")
                .value_name("HEIGHT")
                .help("Target height to export filters for; defaults to the chain tip")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("testnet")
                .long("testnet")
                .help("Use the test network")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Print progress and final statistics to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hashes")
                .long("hashes")
                .help("Write filter hashes to stdout as an embeddable text manifest")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("binary")
                .short('b')
                .long("binary")
                .help("Write length-prefixed raw filter data to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
        .get_matches();

    // Layer 1: defaults. Layer 2: the daemon's own config file, when one
    // exists. Layer 3: command-line flags.
    let mut settings = Settings::new(Network::Mainnet);
    settings.apply_daemon_config_file(&daemon_app_dir().join(DAEMON_CONF_NAME));

    if let Some(user) = matches.get_one::<String>("rpcuser") {
        settings.rpc_user = user.clone();
    }
    if let Some(pass) = matches.get_one::<String>("rpcpass") {
        settings.rpc_pass = pass.clone();
    }
    if let Some(cert) = matches.get_one::<PathBuf>("rpccert") {
        settings.rpc_cert = cert.clone();
    }
    if let Some(connect) = matches.get_one::<String>("rpcconnect") {
        settings.rpc_connect = Some(connect.clone());
    }
    if let Some(target) = matches.get_one::<u64>("targetheight") {
        settings.target_height = Some(*target);
    }
    if matches.get_flag("testnet") {
        settings.network = Network::Testnet;
    }
    settings.progress = matches.get_flag("progress");
    settings.hashes = matches.get_flag("hashes");
    settings.binary = matches.get_flag("binary");

    if let Err(e) = settings.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let level = match matches.get_one::<String>("log-level").map(String::as_str) {
        Some("error") => LevelFilter::ERROR,
        Some("warn") => LevelFilter::WARN,
        Some("debug") => LevelFilter::DEBUG,
        Some("trace") => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let client = match DaemonClient::connect(&settings).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to connect to daemon: {}", e);
            process::exit(1);
        }
    };

    // Stdout is the data sink; diagnostics go to stderr only.
    let out = BufWriter::new(io::stdout().lock());
    let result = export::run(&client, &settings, out).await;

    client.shutdown().await;

    if let Err(e) = result {
        eprintln!("Export failed: {}", e);
        process::exit(1);
    }
}
