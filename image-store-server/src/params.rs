use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(about = "Uploads, lists and downloads named images")]
pub struct Args {
    /// JSON file holding `conn_str`
    #[clap(long, default_value = "config")]
    pub(crate) config: PathBuf,
    /// Overrides `conn_str` from the config file
    #[clap(long, env = "IMAGE_STORE_CONN_STR")]
    pub(crate) conn_str: Option<String>,
    #[clap(long, default_value = "127.0.0.1:4000")]
    pub(crate) http_addr: String,
    /// Defaults to ~/Downloads
    #[clap(long)]
    pub(crate) downloads_dir: Option<PathBuf>,
    #[clap(long, default_value_t = 5000)]
    pub(crate) connect_timeout_ms: u64,
    #[clap(long)]
    pub(crate) log_file: Option<PathBuf>,
}

impl Args {
    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
