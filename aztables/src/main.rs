use anyhow::Result;
use std::io;

fn main() -> Result<()> {
    aztables::load_dotenv()?;
    env_logger::init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let ctx = aztables::default_context();
    let count = runtime.block_on(aztables::run(ctx, &mut io::stdout().lock()))?;
    log::debug!("listed {count} tables");

    Ok(())
}
