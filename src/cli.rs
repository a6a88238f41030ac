use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Per-domain recon pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the recon pipeline against one domain or a list of domains
    Scan {
        /// Target domain (e.g. example.com)
        #[arg(short = 'd', long, conflicts_with = "file", required_unless_present = "file")]
        domain: Option<String>,

        /// File with newline-delimited domains
        #[arg(short = 'f', long)]
        file: Option<String>,

        /// Virtual host discovery on non-CDN IPs
        #[arg(long, default_value_t = false)]
        vhost: bool,

        /// Smart fuzzing on subdomains answering 4xx
        #[arg(long = "sm", default_value_t = false)]
        smart_fuzz: bool,

        /// sqlmap on gf SQLi candidates
        #[arg(long, default_value_t = false)]
        sqli: bool,

        /// nuclei on active subdomains
        #[arg(long, default_value_t = false)]
        nuclei: bool,

        /// Fuzz JS directories for unlinked files
        #[arg(long = "js-fuzz", default_value_t = false)]
        js_fuzz: bool,

        /// Web cache deception check on static assets
        #[arg(long, default_value_t = false)]
        wcd: bool,

        /// Domains processed concurrently (overrides settings.threads)
        #[arg(short = 't', long)]
        threads: Option<usize>,

        /// Config file
        #[arg(short = 'c', long, default_value = sparky::config::DEFAULT_CONFIG_PATH)]
        config: String,

        /// Base output directory (overrides paths.output_dir)
        #[arg(short = 'o', long)]
        out: Option<String>,
    },

    /// Report which external tools are installed
    CheckDeps {
        /// Config file
        #[arg(short = 'c', long, default_value = sparky::config::DEFAULT_CONFIG_PATH)]
        config: String,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
