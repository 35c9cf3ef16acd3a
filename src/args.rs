use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-profiler")]
#[command(about = "Crawls a website and profiles it with a chain of LLM prompts")]
#[command(version)]
pub struct Args {
    /// Address to bind (overrides the config file)
    #[arg(long, env = "SITE_PROFILER_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SITE_PROFILER_PORT")]
    pub port: Option<u16>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
