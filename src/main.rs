use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use arcfinder::api_client::ArcfinderClient;
use arcfinder::catalog;
use arcfinder::config::Config;
use arcfinder::error::ClientError;
use arcfinder::images::{ImageCache, ImageRef};
use arcfinder::maps::{self, MAPS};
use arcfinder::metaforge::Record;
use arcfinder::{logging, web};

#[derive(Parser, Debug)]
#[command(name = "arcfinder")]
#[command(about = "Caching proxy and browser for the MetaForge ARC Raiders API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/arcfinder/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// arcfinder server to browse (overrides config)
  #[arg(short, long, global = true)]
  server: Option<String>,

  /// Print raw JSON instead of a listing
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the caching proxy
  Serve,
  /// Search and filter the item catalog
  Items {
    /// Match against name, description, type and category
    #[arg(short = 'q', long)]
    search: Option<String>,
    #[arg(short, long)]
    rarity: Option<String>,
    #[arg(short = 't', long = "type")]
    item_type: Option<String>,
  },
  /// Show one item by id or slug
  Item { id: String },
  /// List quests
  Quests,
  /// List traders
  Traders,
  /// Show one trader and their stock
  Trader { id: String },
  /// List ARC threats
  Arcs,
  /// List maps
  Maps,
  /// Show one map
  Map { slug: String },
  /// Inspect or manage the local image cache
  Images {
    #[command(subcommand)]
    action: ImagesAction,
  },
}

#[derive(Subcommand, Debug)]
enum ImagesAction {
  /// Entry count and total size
  Stats,
  /// Delete every cached image
  Clear,
  /// Resolve an image through the cache
  Fetch {
    url: String,
    /// Write the image bytes to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  dotenvy::dotenv().ok();

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let config = if let Some(server) = args.server.clone() {
    let mut config = config;
    config.client.server_url = server;
    config
  } else {
    config
  };

  let default_filter = match args.command {
    Command::Serve => "arcfinder=info,tower_http=info",
    _ => "arcfinder=warn",
  };
  let _log_guard = logging::init(&config.logging, default_filter);

  match args.command {
    Command::Serve => web::serve(&config).await,
    Command::Images { action } => run_images(&config, action, args.json).await,
    command => run_browse(&config, command, args.json).await,
  }
}

async fn run_browse(config: &Config, command: Command, json: bool) -> Result<()> {
  let client = ArcfinderClient::new(&config.client.server_url)?;

  match command {
    Command::Items {
      search,
      rarity,
      item_type,
    } => {
      let items = client.items().await.map_err(retry_hint)?;
      let found = catalog::search(&items, search.as_deref().unwrap_or(""));
      let found = catalog::filter_by_rarity(found, rarity.as_deref().unwrap_or("all"));
      let found = catalog::filter_by_type(found, item_type.as_deref().unwrap_or("all"));

      if json {
        return print_json(&found);
      }
      for item in &found {
        println!(
          "{:<28} {:<32} {:<10} {}",
          item.id,
          item.name,
          item.rarity().unwrap_or("-"),
          item.item_type().unwrap_or("-")
        );
      }
      println!("{} of {} items", found.len(), items.len());
    }
    Command::Item { id } => {
      let item = client
        .item(&id)
        .await
        .map_err(retry_hint)?
        .ok_or_else(|| eyre!("Item not found: {}", id))?;
      if json {
        return print_json(&item);
      }
      print_record(&item);
    }
    Command::Quests => print_records(&client.quests().await.map_err(retry_hint)?, json)?,
    Command::Traders => print_records(&client.traders().await.map_err(retry_hint)?, json)?,
    Command::Trader { id } => {
      let traders = client.traders().await.map_err(retry_hint)?;
      let trader =
        catalog::find_trader(&traders, &id).ok_or_else(|| eyre!("Trader not found: {}", id))?;
      if json {
        return print_json(trader);
      }
      print_record(trader);
      for stock in trader.list_field("items") {
        let name = stock.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        let price = stock
          .get("trader_price")
          .map(|v| v.to_string())
          .unwrap_or_else(|| "-".into());
        println!("  {:<32} {}", name, price);
      }
    }
    Command::Arcs => print_records(&client.arcs().await.map_err(retry_hint)?, json)?,
    Command::Maps => {
      if json {
        return print_json(&MAPS);
      }
      for map in MAPS {
        println!("{:<20} {}", map.slug, map.name);
      }
    }
    Command::Map { slug } => {
      let map = maps::map_by_slug(&slug).ok_or_else(|| eyre!("Map not found: {}", slug))?;
      if json {
        return print_json(map);
      }
      println!("{}", map.name);
      println!("  image: {}", map.image);
      println!("  interactive: {}", maps::embed_url(map));
    }
    Command::Serve | Command::Images { .. } => {
      return Err(eyre!("not a browsing command"));
    }
  }

  Ok(())
}

async fn run_images(config: &Config, action: ImagesAction, json: bool) -> Result<()> {
  let cache = ImageCache::open(&config.image_db_path()?, reqwest::Client::new());

  match action {
    ImagesAction::Stats => {
      let stats = cache.stats();
      if json {
        return print_json(&stats);
      }
      println!("{} images, {} bytes", stats.count, stats.total_bytes);
    }
    ImagesAction::Clear => {
      cache.clear();
      println!("Image cache cleared");
    }
    ImagesAction::Fetch { url, output } => match cache.resolve(&url).await {
      ImageRef::Cached { bytes, .. } => {
        println!("{} ({} bytes, cached)", url, bytes.len());
        if let Some(path) = output {
          std::fs::write(&path, &bytes)
            .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
        }
      }
      ImageRef::Remote { url } => println!("{} (not cached, use remote URL)", url),
      ImageRef::Placeholder => println!("(no image)"),
    },
  }

  Ok(())
}

/// Data-fetch failures tell the user how to retry.
fn retry_hint(err: ClientError) -> color_eyre::Report {
  eyre!("{}\nIs `arcfinder serve` running? Retry the command once it is reachable.", err)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_record(record: &Record) {
  println!("{} ({})", record.name, record.id);
  if let Some(description) = record.description() {
    println!("  {}", description);
  }
  for key in ["rarity", "item_type", "category", "location"] {
    if let Some(value) = record.str_field(key) {
      println!("  {}: {}", key, value);
    }
  }
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
  if json {
    return print_json(records);
  }
  for record in records {
    println!("{:<28} {}", record.id, record.name);
  }
  println!("{} total", records.len());
  Ok(())
}
