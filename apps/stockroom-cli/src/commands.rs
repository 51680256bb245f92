//! Command handlers

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::sync::Arc;

use chrono::Utc;
use stockroom_core::{
    AddItemForm, Backend, DeleteOutcome, Inventory, InventoryView, ItemStore, LocationCatalog,
    LocationEditor, LocationLevel, LocationPath, LocationTarget, MemoryItemStore,
    SqliteItemStore, StatusKind, StockroomConfig,
};
use stockroom_seed::{
    convert, migrate_store, read_json, upload_items, upload_seed, write_json, TestDataGenerator,
};
use stockroom_server::AppState;

use crate::output::{item_line, print_items};
use crate::{Cli, Commands, LocationArgs, SeedCommands};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let catalog = Arc::new(match &config.catalog.path {
        Some(path) => LocationCatalog::load(path)?,
        None => LocationCatalog::builtin(),
    });
    let json = cli.json;

    match cli.command {
        Commands::Locations => {
            if json {
                println!("{}", catalog.to_json()?);
            } else {
                print!("{}", catalog.format_tree());
            }
        }
        Commands::List {
            section,
            search,
            low_stock,
            ordered,
        } => {
            let inv = open_inventory(&config, &catalog)?;
            let mut view = InventoryView::new();
            view.apply_snapshot(inv.snapshot()?);
            if let Some(term) = search.as_deref() {
                view.search(term);
            } else if let Some(section) = section.as_deref() {
                view.select_section(section);
            }
            let items: Vec<_> = view
                .visible_items()
                .filter(|i| !low_stock || i.status(StatusKind::LowStock))
                .filter(|i| !ordered || i.status(StatusKind::OrderPlaced))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                if let Some(main) = view.highlighted_location() {
                    let path = LocationPath::main_only(main);
                    println!("highlight: {}", catalog.display_path(&path));
                }
                print_items(&catalog, items);
            }
        }
        Commands::Add { name, location } => {
            let inv = open_inventory(&config, &catalog)?;
            let mut form = AddItemForm::new(catalog.clone());
            form.set_name(&name);
            for (target, level, value) in selections(&location) {
                form.select(target, level, value)?;
            }
            let existing = inv.store().list()?;
            let similar = form.similar_items(&existing);
            if !similar.is_empty() {
                eprintln!("similar items: {}", similar.join(", "));
            }
            let id = inv.add_item(form.submit()?)?;
            println!("{}", id);
        }
        Commands::Status { id, kind, off } => {
            let kind = StatusKind::parse(&kind).ok_or_else(|| {
                format!("unknown status '{}', expected lowStock or orderPlaced", kind)
            })?;
            let inv = open_inventory(&config, &catalog)?;
            let item = inv.set_status(&id, kind, !off)?;
            println!("{}", item_line(&catalog, &item));
        }
        Commands::Swap { id } => {
            let inv = open_inventory(&config, &catalog)?;
            let item = inv.swap_locations(&id)?;
            println!("{}", item_line(&catalog, &item));
        }
        Commands::Move { id, location } => {
            let inv = open_inventory(&config, &catalog)?;
            let item = inv.get(&id)?;
            let mut editor = LocationEditor::new(catalog.clone());
            editor.open(&item)?;
            for (target, level, value) in selections(&location) {
                editor.select(target, level, value)?;
            }
            let change = editor.save()?;
            let updated = inv.apply_location_change(change)?;
            editor.close();
            println!("{}", item_line(&catalog, &updated));
        }
        Commands::Memo { id, text } => {
            let inv = open_inventory(&config, &catalog)?;
            let item = inv.update_memo(&id, text.as_deref().unwrap_or(""))?;
            println!("{}", item_line(&catalog, &item));
        }
        Commands::Delete { id, yes } => {
            let inv = open_inventory(&config, &catalog)?;
            let confirm = |prompt: &str| yes || ask(prompt);
            match inv.delete_with_confirmation(&id, &confirm)? {
                DeleteOutcome::Deleted => println!("deleted {}", id),
                DeleteOutcome::Cancelled => println!("cancelled"),
            }
        }
        Commands::Watch => {
            let inv = open_inventory(&config, &catalog)?;
            let mut view = InventoryView::new();
            for snapshot in inv.subscribe()? {
                if json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                    continue;
                }
                view.apply_snapshot(snapshot);
                println!(
                    "-- version {}: {} item(s), {} low stock, {} ordered",
                    view.version(),
                    view.items().len(),
                    view.low_stock_items().len(),
                    view.order_placed_items().len()
                );
                print_items(&catalog, view.visible_items());
            }
        }
        Commands::Seed { cmd } => match cmd {
            SeedCommands::Convert { csv, json: out } => {
                let items = convert(BufReader::new(File::open(&csv)?))?;
                let mut writer = BufWriter::new(File::create(&out)?);
                write_json(&items, &mut writer)?;
                writer.flush()?;
                println!("converted {} row(s) to {}", items.len(), out.display());
            }
            SeedCommands::Upload { json: path, batch_size } => {
                let items = read_json(BufReader::new(File::open(&path)?))?;
                let store = open_store(&config)?;
                let batch_size = batch_size.unwrap_or(config.seed.batch_size);
                let report = upload_seed(&*store, items, batch_size)?;
                println!("uploaded {} item(s) in {} batch(es)", report.items, report.batches);
            }
        },
        Commands::Migrate => {
            if config.database.backend != Backend::Sqlite {
                return Err("migrate needs the sqlite backend".into());
            }
            let store = SqliteItemStore::open(&config.database.path)?;
            let count = migrate_store(&store)?;
            println!("migrated {} document(s)", count);
        }
        Commands::Generate { count, seed } => {
            let store = open_store(&config)?;
            let generator = match seed {
                Some(seed) => TestDataGenerator::seeded(catalog.clone(), seed),
                None => TestDataGenerator::new(catalog.clone()),
            };
            let items = generator
                .with_config(config.generator.clone())?
                .items(count, Utc::now());
            let report = upload_items(&*store, items, config.seed.batch_size)?;
            println!("added {} test item(s)", report.items);
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let state = Arc::new(AppState::from_config(&config)?);
            tokio::runtime::Runtime::new()?.block_on(stockroom_server::serve(&addr, state))?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<StockroomConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = StockroomConfig::load(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => StockroomConfig::load_standard()?,
    };
    if let Some(db) = &cli.db {
        config.database.backend = Backend::Sqlite;
        config.database.path = db.clone();
    }
    if cli.memory {
        config.database.backend = Backend::Memory;
    }
    config.validate()?;
    Ok(config)
}

fn open_store(config: &StockroomConfig) -> Result<Arc<dyn ItemStore>> {
    tracing::debug!(
        backend = ?config.database.backend,
        path = %config.database.path.display(),
        "opening item store"
    );
    Ok(match config.database.backend {
        Backend::Memory => Arc::new(MemoryItemStore::new()),
        Backend::Sqlite => Arc::new(SqliteItemStore::open(&config.database.path)?),
    })
}

fn open_inventory(
    config: &StockroomConfig,
    catalog: &Arc<LocationCatalog>,
) -> Result<Inventory<dyn ItemStore>> {
    Ok(Inventory::new(open_store(config)?, catalog.clone()))
}

/// Picker selections in the order a user would make them.
fn selections(args: &LocationArgs) -> Vec<(LocationTarget, LocationLevel, &str)> {
    [
        (LocationTarget::Sales, LocationLevel::Main, &args.main),
        (LocationTarget::Sales, LocationLevel::Sub, &args.sub),
        (LocationTarget::Sales, LocationLevel::Final, &args.final_),
        (LocationTarget::Storage, LocationLevel::Main, &args.storage_main),
        (LocationTarget::Storage, LocationLevel::Sub, &args.storage_sub),
        (LocationTarget::Storage, LocationLevel::Final, &args.storage_final),
    ]
    .into_iter()
    .filter_map(|(target, level, value)| value.as_deref().map(|v| (target, level, v)))
    .collect()
}

fn ask(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selections_keep_picker_order() {
        let args = LocationArgs {
            sub: Some("red".into()),
            main: Some("sales".into()),
            storage_sub: Some("ss".into()),
            ..Default::default()
        };
        let picked = selections(&args);
        assert_eq!(
            picked,
            vec![
                (LocationTarget::Sales, LocationLevel::Main, "sales"),
                (LocationTarget::Sales, LocationLevel::Sub, "red"),
                (LocationTarget::Storage, LocationLevel::Sub, "ss"),
            ]
        );
    }

    #[test]
    fn test_memory_flag_overrides_db() {
        let cli = <Cli as clap::Parser>::try_parse_from([
            "stockroom",
            "--db",
            "/tmp/x.db",
            "--memory",
            "locations",
        ])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        let cli = Cli {
            config: Some(path),
            ..cli
        };
        let config = load_config(&cli).unwrap();
        assert_eq!(config.database.backend, Backend::Memory);
    }
}
