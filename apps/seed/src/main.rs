use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use shared::domain::{CategoryId, NewItem};
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Populates an inventory database with the starter catalog.
#[derive(Parser, Debug)]
struct Cli {
    /// Connection string of the database to fill, e.g. sqlite://./data/inventory.db
    database_url: String,
}

struct CategorySeed {
    title: &'static str,
    description: &'static str,
}

struct ItemSeed {
    name: &'static str,
    description: &'static str,
    /// Position in `CATEGORIES`.
    category: usize,
    price: &'static str,
    number_in_stock: i64,
}

const CATEGORIES: [CategorySeed; 4] = [
    CategorySeed {
        title: "Guitar",
        description: "One of the most iconic instruments, includes both acoustic and electric guitars.",
    },
    CategorySeed {
        title: "Bass",
        description: "A vital instrument to any song, the bass complements and builds the base of entire genres.",
    },
    CategorySeed {
        title: "Drums",
        description: "Impossible to play without it, the drums lay the tempo and rythm, available at a variety of prices and types.",
    },
    CategorySeed {
        title: "Piano",
        description: "One of the most classical and widely used instruments in the world, great for all kinds of players and genres.",
    },
];

const ITEMS: [ItemSeed; 8] = [
    ItemSeed {
        name: "Fender Stratocaster",
        description: "One of the most iconic guitar models, the Fender Stratocaster is perfect for most types of genres. Ranging from jazz to hard rock, everyone loves the Stratocaster.",
        category: 0,
        price: "849.99",
        number_in_stock: 10,
    },
    ItemSeed {
        name: "Fender Jazz Bass",
        description: "One of the most widely used and traditional basses, the Fender Jazz Bass has a perfect feel and groove to every type of genre, as well as being affordable for beginners.",
        category: 1,
        price: "849.99",
        number_in_stock: 13,
    },
    ItemSeed {
        name: "Pearl Export EXX 20",
        description: "One of the most recognizable drum brands ever, this drum kit serves as a great kit for professionals and beginners alike, providing all kinds of different sounds and feel.",
        category: 2,
        price: "950",
        number_in_stock: 5,
    },
    ItemSeed {
        name: "Yamaha YDP S35 Digital Piano",
        description: "One of the most famous brands for musical instruments, this Yamaha piano provides incredible touch and response, as well as cristal-clear sounds.",
        category: 3,
        price: "900",
        number_in_stock: 8,
    },
    ItemSeed {
        name: "Gretsch Catalina Maple 22\" 5pc Shell Pack",
        description: "One of the most reliable brands in the industry, this Gretsch drumkit is very reliable, with vintage and high quality tonal characteristics. Perfect for professional drummers.",
        category: 2,
        price: "900",
        number_in_stock: 3,
    },
    ItemSeed {
        name: "Martin D-28 Standard Dreadnought",
        description: "Made by one of the most recognizable acoustic guitar brands, the Martin D-28 Standard Dreadnought is one of the best acoustics in the industry, with a rich sound and amazing feel.",
        category: 0,
        price: "3200",
        number_in_stock: 1,
    },
    ItemSeed {
        name: "Ibanez RG450DX",
        description: "Possibly the most popular brand for shredding, Ibanez provides another perfect guitar for metal enthusiasts! Affordable, with a clean and slick neck, and floyd-rose bridge, what's not to love?",
        category: 0,
        price: "449.99",
        number_in_stock: 20,
    },
    ItemSeed {
        name: "Jackson JS Series Concert Bass JS3",
        description: "By one of the most popular brands for metal enthusiasts, this bass provides a rich and heavy sound with its active pickups and ergonomic design, all at a affordable price.",
        category: 1,
        price: "349.99",
        number_in_stock: 17,
    },
];

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli.database_url).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %format!("{error:#}"), "seeding failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(database_url: &str) -> Result<()> {
    info!(%database_url, "connecting");
    let storage = Storage::new(database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;
    let seeded = populate(&storage).await;
    storage.close().await;
    seeded
}

async fn populate(storage: &Storage) -> Result<()> {
    let categories = create_categories(storage).await?;
    create_items(storage, &categories).await
}

/// Returns the new ids in `CATEGORIES` order.
async fn create_categories(storage: &Storage) -> Result<Vec<CategoryId>> {
    info!("adding categories");
    try_join_all(CATEGORIES.iter().map(|seed| async move {
        let id = storage
            .create_category(seed.title, seed.description)
            .await
            .with_context(|| format!("failed to add category {}", seed.title))?;
        info!(title = seed.title, %id, "added category");
        Ok::<_, anyhow::Error>(id)
    }))
    .await
}

async fn create_items(storage: &Storage, categories: &[CategoryId]) -> Result<()> {
    info!("adding items");
    try_join_all(ITEMS.iter().map(|seed| async move {
        let category = *categories
            .get(seed.category)
            .with_context(|| format!("no category at position {}", seed.category))?;
        let item = NewItem {
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            price: seed.price.to_string(),
            number_in_stock: seed.number_in_stock,
            categories: vec![category],
        };
        let id = storage
            .create_item(&item)
            .await
            .with_context(|| format!("failed to add item {}", seed.name))?;
        info!(name = seed.name, %id, "added item");
        Ok::<_, anyhow::Error>(())
    }))
    .await?;
    Ok(())
}
