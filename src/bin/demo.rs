//! DirDoc Demo Binary
//!
//! Stores, reloads and deletes a sample `Auto` record.

use clap::Parser;
use dirdoc::{Config, Engine, Model, Record};
use tracing_subscriber::{fmt, EnvFilter};

/// DirDoc Demo
#[derive(Parser, Debug)]
#[command(name = "dirdoc-demo")]
#[command(about = "Round-trip a sample record through a DirDoc store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: String,

    /// Explicit key for the sample record (allocated when omitted)
    #[arg(short, long)]
    key: Option<String>,

    /// Keep the record instead of deleting it at the end
    #[arg(long)]
    keep: bool,
}

#[derive(Debug, Default)]
struct Auto {
    key: Option<String>,
    name: Option<String>,
    age: i32,
    passengers: Option<Vec<String>>,
}

impl Record for Auto {
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: String) {
        self.key = Some(key);
    }
}

fn auto_model() -> Model<Auto> {
    Model::new()
        .constructor(Auto::default)
        .field("Name", |a: &Auto| a.name.as_ref(), |a, v| a.name = Some(v))
        .field("Age", |a: &Auto| Some(&a.age), |a, v| a.age = v)
        .array_field("Passengers", |a: &Auto| a.passengers.as_deref(), |a, v| {
            a.passengers = Some(v)
        })
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dirdoc=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("DirDoc Demo v{}", dirdoc::VERSION);

    if let Err(e) = run(&args) {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> dirdoc::Result<()> {
    let config = Config::builder().data_dir(&args.data_dir).build();
    let engine = Engine::open(config)?;

    engine.register_parse_codec::<i32>();
    engine.register_model(auto_model())?;

    let mut auto = Auto {
        key: args.key.clone(),
        name: Some("SuperCrazy".to_string()),
        age: 12,
        passengers: Some(vec!["me".into(), "you".into(), "marley".into()]),
    };

    println!("Key: {}", auto.key.as_deref().unwrap_or("<none>"));
    engine.store(&mut auto)?;
    println!("Key: {}", auto.key.as_deref().unwrap_or("<none>"));

    let key = auto.key.clone().unwrap_or_default();
    if let Some(found) = engine.find::<Auto>(&key)? {
        println!("{}", found.passengers.unwrap_or_default().join(","));
    }

    if args.keep {
        return Ok(());
    }

    let deleted = engine.delete_record(&auto)?;
    println!("Deleted: {}", deleted);
    println!("Found after delete: {}", engine.find::<Auto>(&key)?.is_some());

    Ok(())
}
