use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zipfan")]
#[command(version)]
#[command(about = "Unpack a ZIP archive from object storage into individual objects", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfan event.json                      unpack per the event description\n  \
  echo '{...}' | zipfan                  read the event from stdin\n  \
  zipfan event.json --concurrency 32     cap concurrent entry uploads\n  \
  zipfan event.json --endpoint-url http://localhost:9000   use MinIO")]
pub struct Cli {
    /// Event JSON file (reads stdin when omitted)
    #[arg(value_name = "EVENT")]
    pub event: Option<PathBuf>,

    /// AWS region override
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (switches to path-style addressing)
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Cap on concurrently transferring entries (default: one task per entry)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Don't print the response JSON
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
