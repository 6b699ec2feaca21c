//! Load gun definitions from a directory and replay the login handshake.
//!
//! ```text
//! cargo run -p gunsmith-data --example reload -- <resource-root> <item>...
//! ```
//!
//! Every `<item>` (e.g. `cgm:pistol`) is registered as a gun item on both
//! sides. Definitions are read from `<resource-root>/<ns>/guns/<path>.json`.

use bytes::BytesMut;
use gunsmith_core::id::Identifier;
use gunsmith_core::item::ItemTable;
use gunsmith_core::registry::GunRegistry;
use gunsmith_core::sync::{UpdateGuns, handle_update_guns};
use gunsmith_data::{DirectorySource, GunLoader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let root = args.next().ok_or("usage: reload <resource-root> <item>...")?;
    let ids = args
        .map(|s| Identifier::parse(&s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut items = ItemTable::new();
    for id in &ids {
        items.register_gun(id.clone());
    }

    let server = GunRegistry::new();
    let summary = GunLoader::default().reload(&DirectorySource::new(root), &server, &items)?;
    println!(
        "server: {} loaded, {} fallback",
        summary.loaded, summary.fallbacks
    );

    let mut frame = BytesMut::new();
    UpdateGuns::from_registry(&server).encode(&mut frame)?;
    println!("UpdateGuns frame: {} bytes", frame.len());

    let client = GunRegistry::new();
    handle_update_guns(&client, &mut frame, &items)?;
    for (id, gun) in client.snapshot().iter() {
        println!(
            "{id}: damage {} ammo {}",
            gun.projectile.damage,
            gun.projectile
                .item
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string)
        );
    }
    Ok(())
}
