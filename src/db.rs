use mongodb::bson::Document;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

/// Connects to the MongoDB deployment and selects the application database.
pub async fn connect(uri: &str, db_name: &str) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(db_name))
}

/// Provisions the record-store indexes: a unique index on the business id of
/// each collection plus secondary lookup indexes.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    db.collection::<Document>("payments")
        .create_indexes(index_set("payment_id"))
        .await?;
    db.collection::<Document>("subscriptions")
        .create_indexes(index_set("subscription_id"))
        .await?;
    Ok(())
}

fn index_set(business_id_field: &str) -> Vec<IndexModel> {
    let unique = IndexModel::builder()
        .keys(ascending(business_id_field))
        .options(IndexOptions::builder().unique(true).build())
        .build();
    let mut models = vec![unique];
    for field in ["user_id", "customer_id", "status", "created_at"] {
        models.push(IndexModel::builder().keys(ascending(field)).build());
    }
    models
}

fn ascending(field: &str) -> Document {
    let mut keys = Document::new();
    keys.insert(field, 1);
    keys
}
