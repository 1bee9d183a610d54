use shared::domain::NewItem;
use storage::Storage;

#[tokio::test]
async fn catalog_survives_reopening_the_database_file() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("inventory_acceptance_{suffix}"));
    let db_path = temp_root.join("catalog.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    let guitar = storage
        .create_category("Guitar", "One of the most iconic instruments")
        .await
        .expect("category");
    let item_id = storage
        .create_item(&NewItem {
            name: "Martin D-28 Standard Dreadnought".to_string(),
            description: "acoustic".to_string(),
            price: "3200".to_string(),
            number_in_stock: 1,
            categories: vec![guitar],
        })
        .await
        .expect("item");
    storage.close().await;

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let detail = reopened
        .get_item(item_id)
        .await
        .expect("get item")
        .expect("item persisted");
    assert_eq!(detail.price, "3200");
    assert!(detail.references(guitar));

    let referencing = reopened
        .list_items_in_category(guitar)
        .await
        .expect("referencing items");
    assert_eq!(referencing.len(), 1);
    reopened.close().await;

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
