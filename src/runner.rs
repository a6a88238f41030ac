use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{Cli, Commands};
use sparky::config::Config;
use sparky::external::{tools, SystemInvoker, ToolInvoker};
use sparky::options::{Features, Options};
use sparky::output::RunSummary;
use sparky::pipeline::StagePipeline;
use sparky::probe::{LiveProbe, NetworkProbe};
use sparky::scheduler::Scheduler;

fn print_banner() {
    println!(
        r#"
   ___ _ __   __ _ _ __| | ___   _
  / __| '_ \ / _` | '__| |/ / | | |
  \__ \ |_) | (_| | |  |   <| |_| |
  |___/ .__/ \__,_|_|  |_|\_\\__, |
      |_|                    |___/
"#
    );
}

fn init_logging(debug: bool, verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let crate_level = if debug { "debug" } else if verbose { "info" } else { "warn" };
    // Keep resolver and HTTP internals quiet even in debug mode.
    let filter_str = format!(
        "sparky={crate},reqwest=info,hyper=info,hickory_proto=warn,hickory_resolver=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.debug, cli.verbose);

    match cli.command {
        Commands::CheckDeps { config } => check_deps(&config),
        Commands::Scan { domain, file, vhost, smart_fuzz, sqli, nuclei, js_fuzz, wcd, threads, config, out } => {
            let features = Features { vhost, smart_fuzz, sqli, nuclei, js_fuzz, wcd };
            run_scan(domain, file, features, threads, &config, out).await
        }
    }
}

fn check_deps(config: &str) -> anyhow::Result<()> {
    let cfg = Config::load(Path::new(config)).with_context(|| format!("loading {}", config))?;
    let all = Features { vhost: true, smart_fuzz: true, sqli: true, nuclei: true, js_fuzz: true, wcd: true };
    let mut missing = 0;
    for status in tools::tool_statuses(&cfg, &all) {
        match status.location {
            Some(loc) => println!("[+] {:<14} {}", status.name, loc),
            None => {
                missing += 1;
                println!("[-] {:<14} not found", status.name);
            }
        }
    }
    if missing > 0 {
        anyhow::bail!("{} tools missing", missing);
    }
    println!("[*] All tools available");
    Ok(())
}

fn collect_domains(domain: Option<String>, file: Option<String>) -> anyhow::Result<Vec<String>> {
    let domains = match (domain, file) {
        (Some(d), _) => vec![sparky::utils::normalize_domain(&d)],
        (None, Some(f)) => sparky::utils::read_domains(Path::new(&f)).with_context(|| format!("reading {}", f))?,
        (None, None) => anyhow::bail!("either --domain or --file is required"),
    };
    let domains: Vec<String> = domains.into_iter().filter(|d| !d.is_empty()).collect();
    if domains.is_empty() {
        anyhow::bail!("no domains to scan");
    }
    Ok(domains)
}

async fn run_scan(
    domain: Option<String>,
    file: Option<String>,
    features: Features,
    threads: Option<usize>,
    config: &str,
    out: Option<String>,
) -> anyhow::Result<()> {
    let cfg = Config::load(Path::new(config)).with_context(|| format!("loading {}", config))?;
    tools::check_dependencies(&cfg, &features)?;
    let domains = collect_domains(domain, file)?;

    let output_base = match out.map(PathBuf::from).or_else(|| cfg.output_base()) {
        Some(p) => p,
        None => std::env::current_dir().context("resolving current directory")?,
    };
    sparky::utils::ensure_dir(&output_base)?;

    let concurrency = threads.unwrap_or(cfg.settings.threads);
    let probe: Arc<dyn NetworkProbe> = Arc::new(LiveProbe::new(&cfg)?);
    let invoker: Arc<dyn ToolInvoker> = Arc::new(SystemInvoker);
    let options = Arc::new(Options::new(features, concurrency, output_base, cfg));

    tracing::info!(domains = domains.len(), concurrency = options.concurrency, ?features, "Starting scan");
    print_banner();
    println!("[>] Domains: {}", domains.len());
    println!("[~] Concurrency: {}", options.concurrency);
    println!("[>] Output: {}", options.output_base.display());
    println!("\n{}\n", "-".repeat(60));

    let pipeline = StagePipeline::new(options.clone(), invoker, probe);
    let scheduler = Scheduler::new(options.concurrency);
    let outcomes = scheduler
        .run(domains, move |domain| {
            let pipeline = pipeline.clone();
            async move { pipeline.run(&domain).await }
        })
        .await;

    RunSummary::tally(&outcomes).print();
    Ok(())
}
