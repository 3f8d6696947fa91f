use anyhow::Result;
use aviary::{db::Db, Config, GenealogyService};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "consanguinity")]
#[command(about = "Check whether two birds are too closely related to pair")]
struct Args {
    /// First bird id
    bird_a: String,

    /// Second bird id
    bird_b: String,

    /// Generations of ancestry to compare (defaults to config)
    #[arg(short, long)]
    max_generations: Option<usize>,

    /// Fail if either bird is not stored instead of reporting no known relation
    #[arg(short, long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let service = GenealogyService::new(Db::new(config.db_path()), config.genealogy.clone());

    let strict = if args.strict { Some(true) } else { None };
    let options = service.options(args.max_generations, strict)?;
    let verdict = service
        .check_consanguinity(&args.bird_a, &args.bird_b, options)
        .await?;

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    if !options.strict && !verdict.is_related {
        eprintln!("Note: unknown bird ids also report \"Safe to breed\"; pass --strict to reject them.");
    }

    Ok(())
}
