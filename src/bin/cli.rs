//! arborkv CLI
//!
//! Command-line front end over the database façade. Keys and values are
//! 32-bit integers; the store lives in the given data directory.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use arborkv::{ArborError, Config, Database};

/// arborkv CLI
#[derive(Parser, Debug)]
#[command(name = "arborkv-cli")]
#[command(about = "Disk-resident AVL-indexed key-value store")]
#[command(version)]
struct Args {
    /// Data directory holding tree.bin and data.bin
    #[arg(short, long, default_value = "./arborkv_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a key-value pair
    Add {
        /// The key to insert
        key: i32,

        /// The value to store
        value: i32,
    },

    /// Get a value by key
    Get {
        /// The key to look up
        key: i32,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: i32,
    },

    /// Print the tree height
    Height,

    /// Print a sideways rendering of the tree
    Dump,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arborkv=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder().data_dir(&args.data_dir).build();
    let mut db = match Database::<i32, i32>::open(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&mut db, args.command);
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(db: &mut Database<i32, i32>, command: Commands) -> Result<(), ArborError> {
    match command {
        Commands::Add { key, value } => {
            db.add(key, &value)?;
            println!("OK");
        }
        Commands::Get { key } => {
            let value = db.get(&key)?;
            println!("{}", value);
        }
        Commands::Del { key } => {
            db.remove(&key)?;
            println!("OK");
        }
        Commands::Height => {
            println!("{}", db.get_height()?);
        }
        Commands::Dump => {
            print!("{}", db.dump()?);
        }
    }
    Ok(())
}
