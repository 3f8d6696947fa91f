use anyhow::Result;
use aviary::{db::Db, Config, GenealogyService};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "genealogy")]
#[command(about = "Print a bird's recorded parents and offspring as JSON")]
struct Args {
    /// Bird id to look up
    bird_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let service = GenealogyService::new(Db::new(config.db_path()), config.genealogy.clone());

    let genealogy = service.genealogy(&args.bird_id).await?;
    println!("{}", serde_json::to_string_pretty(&genealogy)?);

    if genealogy.parents.is_none() {
        eprintln!("Parentage of {} is not recorded.", args.bird_id);
    }

    Ok(())
}
