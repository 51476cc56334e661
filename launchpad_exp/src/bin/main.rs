use clap::{App, Arg, ArgMatches};
use color_eyre::eyre::{self, WrapErr};
use color_eyre::Report;
use launchpad::error::EXIT_MALFORMED;
use launchpad::{ParserOptions, PeerFormat, TrailingPolicy, Variant};
use launchpad_exp::dispatch::Dispatcher;
use launchpad_exp::machine::{DryRun, Ssh, Transport};
use launchpad_exp::progress::TracingProgressBar;
use launchpad_exp::{
    request, DispatchConfig, FailurePolicy, Mode, WaitPolicy, EXIT_DISPATCH,
};
use std::sync::Arc;

const DEFAULT_SSH: &str = "ssh";

struct LaunchArgs {
    config: String,
    variant: Variant,
    options: ParserOptions,
    dispatch: DispatchConfig,
    mode: Mode,
    dry_run: bool,
    ssh: String,
    print_topology: bool,
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(report) => {
            eprintln!("Error: {:?}", report);
            exit_code(&report)
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32, Report> {
    color_eyre::install()?;
    let args = parse_args(&matches())?;

    // init logging; the length is set once we know how many nodes there are
    let progress = TracingProgressBar::init(0);

    let topology =
        launchpad::parse_file(&args.config, args.variant, args.options)
            .wrap_err_with(|| format!("parse {}", args.config))?;
    tracing::info!(
        "{}: {} config with {} nodes",
        args.config,
        args.variant,
        topology.node_count()
    );
    if args.print_topology {
        let json = serde_json::to_string_pretty(&topology)
            .wrap_err("topology to json")?;
        println!("{}", json);
    }

    let requests = request::requests(&topology, &args.dispatch, args.mode)
        .wrap_err("synthesize commands")?;
    progress.set_len(requests.len() as u64);
    progress.set_message(args.mode.name());

    let transport: Arc<dyn Transport> = if args.dry_run {
        Arc::new(DryRun)
    } else {
        Arc::new(Ssh::with_binary(args.ssh))
    };
    let mut dispatcher = Dispatcher::new(
        transport,
        args.dispatch.wait(),
        args.dispatch.failure(),
    );
    dispatcher.set_progress(progress.clone());
    let summary = dispatcher.dispatch_all(requests).await;
    progress.finish();

    if summary.is_success() {
        tracing::info!(
            "{} done on {} nodes",
            args.mode.name(),
            summary.attempted().len()
        );
        return Ok(0);
    }
    for failure in summary.failures() {
        tracing::error!("{}", failure);
    }
    tracing::error!(
        "{} of {} attempted nodes failed",
        summary.failures().len(),
        summary.attempted().len()
    );
    if args.dispatch.failure().is_abort() {
        Ok(EXIT_DISPATCH)
    } else {
        Ok(0)
    }
}

/// Maps the root cause of `report` to an exit code.
fn exit_code(report: &Report) -> i32 {
    report
        .chain()
        .find_map(|e| e.downcast_ref::<launchpad::Error>())
        .map(launchpad::Error::exit_code)
        .unwrap_or(EXIT_MALFORMED)
}

fn matches() -> ArgMatches<'static> {
    App::new("launchpad")
        .version("0.1")
        .author("Vitor Enes <vitorenesduarte@gmail.com>")
        .about("Starts (or kills) a distributed algorithm on every machine of a config.")
        .arg(
            Arg::with_name("config")
                .value_name("CONFIG")
                .help("config with the scalars, machines and relation lists")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("variant")
                .long("variant")
                .value_name("VARIANT")
                .help("config format; e.g. 'quorum' or 'checkpoint'")
                .possible_values(&["quorum", "checkpoint"])
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("user")
                .long("user")
                .value_name("USER")
                .help("remote user; terminate kills all its processes")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("program")
                .long("program")
                .value_name("PROGRAM")
                .help("program started on each machine; e.g. 'java KooToueg'")
                .required_unless("terminate")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("terminate")
                .long("terminate")
                .help("kill the processes of the remote user"),
        )
        .arg(
            Arg::with_name("parallel")
                .long("parallel")
                .help("don't wait for a node to exit before the next one"),
        )
        .arg(
            Arg::with_name("continue_on_failure")
                .long("continue-on-failure")
                .help("keep dispatching after a node fails"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("reject tokens after the last section"),
        )
        .arg(
            Arg::with_name("resolve_peers")
                .long("resolve-peers")
                .help("send peers as machine addresses"),
        )
        .arg(
            Arg::with_name("dry_run")
                .long("dry-run")
                .help("print the ssh commands instead of running them"),
        )
        .arg(
            Arg::with_name("print_topology")
                .long("print-topology")
                .help("print the parsed topology as json"),
        )
        .arg(
            Arg::with_name("ssh")
                .long("ssh")
                .value_name("SSH")
                .help("ssh binary; default: ssh")
                .takes_value(true),
        )
        .get_matches()
}

fn parse_args(matches: &ArgMatches<'_>) -> Result<LaunchArgs, Report> {
    let config = matches
        .value_of("config")
        .ok_or_else(|| eyre::eyre!("config should be set"))?
        .to_string();
    let variant = parse_variant(matches.value_of("variant"))?;
    let user = matches
        .value_of("user")
        .ok_or_else(|| eyre::eyre!("user should be set"))?;
    let program = matches
        .value_of("program")
        .map(launchpad::util::words)
        .unwrap_or_default();

    let mut options = ParserOptions::new();
    if matches.is_present("strict") {
        options.set_trailing(TrailingPolicy::Reject);
    }

    let mut dispatch = DispatchConfig::new(user, program);
    if matches.is_present("parallel") {
        dispatch.set_wait(WaitPolicy::Parallel);
    }
    if matches.is_present("continue_on_failure") {
        dispatch.set_failure(FailurePolicy::Continue);
    }
    if matches.is_present("resolve_peers") {
        dispatch.set_peer_format(PeerFormat::Address);
    }

    let mode = if matches.is_present("terminate") {
        Mode::Terminate
    } else {
        Mode::Launch
    };

    Ok(LaunchArgs {
        config,
        variant,
        options,
        dispatch,
        mode,
        dry_run: matches.is_present("dry_run"),
        ssh: matches.value_of("ssh").unwrap_or(DEFAULT_SSH).to_string(),
        print_topology: matches.is_present("print_topology"),
    })
}

fn parse_variant(variant: Option<&str>) -> Result<Variant, Report> {
    variant
        .ok_or_else(|| eyre::eyre!("variant should be set"))?
        .parse::<Variant>()
        .map_err(|e| eyre::eyre!(e))
}
