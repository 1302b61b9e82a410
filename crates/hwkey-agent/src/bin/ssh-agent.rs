use std::process;
use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::Level;
use std::io::Write;

use hwkey_agent::{config::Mode, AgentConfig, AgentServer};
use hwkey_session::PortConfig;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Opts {
    /// Start the agent, listening on the UNIX-domain socket (or, on
    /// Windows, the Named Pipe) at PATH.
    #[clap(short = 'a', long, value_name = "PATH")]
    agent_path: Option<String>,

    /// Don't start the agent, only output the ssh-ed25519 public key.
    #[clap(short = 'p', long)]
    show_pubkey: bool,

    /// List possible serial ports to use with --port.
    #[clap(short = 'L', long)]
    list_ports: bool,

    /// Set serial port device PATH. If not passed, auto-detection is attempted.
    #[clap(long, value_name = "PATH")]
    port: Option<String>,

    /// Set serial port speed in bits per second.
    #[clap(long, value_name = "BPS", default_value_t = hwkey_transport::DEVICE_BAUD_RATE)]
    speed: u32,

    /// Enable typing of a phrase to be hashed as the User Supplied Secret.
    #[clap(long)]
    uss: bool,

    /// Read FILE ('-' for stdin) and hash its contents as the USS.
    #[clap(long, value_name = "FILE")]
    uss_file: Option<String>,

    /// Pinentry PROGRAM for use by --uss.
    #[clap(long, value_name = "PROGRAM")]
    pinentry: Option<String>,

    /// Verbose logging.
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let opts = Opts::parse();

    if opts.verbose {
        env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .format(|buf, record| {
                if record.level() == Level::Info {
                    writeln!(buf, "{}", record.args())
                } else {
                    writeln!(buf, "{}: {}", record.level(), record.args())
                }
            })
            .init();
    }

    let mut exclusive = 0;
    if opts.agent_path.is_some() {
        exclusive += 1;
    }
    if opts.show_pubkey {
        exclusive += 1;
    }
    if opts.list_ports {
        exclusive += 1;
    }
    if exclusive == 0 {
        log::error!("pass one of --agent-path, --show-pubkey, or --list-ports");
        process::exit(2);
    }
    if exclusive > 1 {
        log::error!("pass only one of --agent-path, --show-pubkey, or --list-ports");
        process::exit(2);
    }
    if opts.uss && opts.uss_file.is_some() {
        log::error!("pass only one of --uss or --uss-file");
        process::exit(2);
    }

    if opts.list_ports {
        match hwkey_transport::list_ports() {
            Ok(ports) if ports.is_empty() => {
                log::info!("no serial ports found");
                process::exit(1);
            }
            Ok(ports) => {
                for port in ports {
                    println!("{port}");
                }
                process::exit(0);
            }
            Err(e) => {
                log::error!("failed to list ports: {e}");
                process::exit(1);
            }
        }
    }

    let uss = if opts.uss {
        hwkey_agent::UssMode::Interactive
    } else if let Some(path) = opts.uss_file {
        hwkey_agent::UssMode::File(path)
    } else {
        hwkey_agent::UssMode::None
    };

    let mode = if opts.show_pubkey {
        Mode::ShowPubkey
    } else if opts.list_ports {
        Mode::ListPorts
    } else {
        Mode::Serve(opts.agent_path.expect("exclusivity check guarantees this"))
    };

    let config = AgentConfig {
        mode: mode.clone(),
        port: PortConfig {
            path: opts.port,
            baud: opts.speed,
        },
        uss,
        pinentry: opts.pinentry,
    };

    match mode {
        Mode::ShowPubkey => run_show_pubkey(config),
        Mode::Serve(path) => run_serve(&config, path),
        Mode::ListPorts => unreachable!("handled above"),
    }
}

fn run_show_pubkey(config: AgentConfig) {
    let session = hwkey_agent::build_session(&config);
    match session.public_key() {
        Ok(pubkey) => {
            println!("{}", hwkey_agent::authorized_key_line(&pubkey));
            process::exit(0);
        }
        Err(e) => {
            log::error!("could not reach device: {e}");
            process::exit(1);
        }
    }
}

fn run_serve(config: &AgentConfig, endpoint_path: String) {
    let session = Arc::new(hwkey_agent::build_session(config));
    let server = Arc::new(AgentServer::new(
        Arc::clone(&session),
        hwkey_agent::default_notifier(),
    ));

    install_signal_handler(&endpoint_path);

    if let Err(e) = hwkey_agent::serve(&endpoint_path, server) {
        log::error!("{e}");
        let _ = std::fs::remove_file(&endpoint_path);
        process::exit(1);
    }
}

fn install_signal_handler(endpoint_path: &str) {
    let endpoint_path = endpoint_path.to_string();
    // SIGHUP intentionally falls outside what ctrlc registers: the
    // agent runs detached from its controlling terminal and should not
    // treat a hangup as a shutdown request.
    ctrlc::set_handler(move || {
        log::info!("signal received, shutting down");
        let _ = std::fs::remove_file(&endpoint_path);
        process::exit(0);
    })
    .expect("error setting signal handler");
}
