pub mod error;
pub mod logger;
pub mod query;
pub mod routes;
pub mod server;
pub mod settings;

use std::path::PathBuf;

use structopt::StructOpt;

use crate::settings::Settings;

#[derive(Debug, StructOpt)]
#[structopt(name = "heimskra", about = "Real-estate map viewer API")]
pub struct Args {
    /// Address to bind, overrides the configured value.
    #[structopt(short = "b", long = "bind")]
    pub bind: Option<String>,

    /// Directory holding the processed dataset and the tile archive.
    #[structopt(short = "d", long = "data-dir", parse(from_os_str))]
    pub data_dir: Option<PathBuf>,

    /// Directory with configuration overrides (a `default.toml` inside).
    #[structopt(short = "c", long = "config-dir", parse(from_os_str))]
    pub config_dir: Option<PathBuf>,
}

/// Shared, read-only request context. Cheap to clone into every handler;
/// nothing in here is mutated across requests.
#[derive(Clone, Debug)]
pub struct Context {
    pub settings: Settings,
}

impl Context {
    pub fn new(settings: Settings) -> Context {
        Context { settings }
    }

    pub fn from_args(args: &Args) -> Result<Context, failure::Error> {
        let mut settings = Settings::new(&args.config_dir)?;
        if let Some(ref bind) = args.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref data_dir) = args.data_dir {
            settings.data_dir = data_dir.clone();
        }
        Ok(Context { settings })
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.settings.data_dir.join(&self.settings.dataset_filename)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.settings.data_dir.join(&self.settings.archive_filename)
    }
}
