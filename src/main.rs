use structopt::StructOpt;

use heimskra::{logger, server, Args, Context};

#[tokio::main]
async fn main() -> Result<(), failure::Error> {
    let _guard = logger::logger_init();
    let args = Args::from_args();
    let ctx = Context::from_args(&args)?;
    server::runserver(ctx).await
}
