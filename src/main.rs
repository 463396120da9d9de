// crates.io
use color_eyre::Result;
// self
use token_guardian::{config::Config, obs, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	obs::init_tracing();

	let config = Config::from_env();

	server::serve(config).await?;

	Ok(())
}
