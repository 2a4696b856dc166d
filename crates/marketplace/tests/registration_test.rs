use geo_shard::{Filter, Probe, ShardClient, ShardConfig, ShardEntity, ShardKey};
use marketplace::buyer::BuyerError;
use marketplace::lifecycle::Marketplace;
use marketplace::model::{Buyer, BuyerCreate, BuyerStatus, Seller, SellerCreate, SellerStatus};
use marketplace::seller::SellerError;

fn buyer(email: &str, phone: &str, country: &str, state: Option<&str>) -> BuyerCreate {
    BuyerCreate {
        name: "Test Buyer".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        country: country.to_string(),
        state: state.map(str::to_string),
        address: None,
    }
}

fn seller(n: u32, email: &str, country: &str, state: Option<&str>) -> SellerCreate {
    SellerCreate {
        business_name: format!("Shop {n}"),
        email: email.to_string(),
        phone: format!("+91 90000 {n:05}"),
        gst_number: format!("29abcde{n:04}f1z5"),
        pan_number: format!("ABCDE{n:04}F"),
        country: country.to_string(),
        state: state.map(str::to_string),
    }
}

async fn count_in<T: ShardEntity>(market: &Marketplace, shard: ShardKey) -> usize {
    market
        .shards()
        .repository::<T>(shard)
        .await
        .unwrap()
        .count(Filter::all())
        .await
        .unwrap_or(0)
}

#[tokio::test]
async fn test_buyer_lands_in_state_shard() {
    let market = Marketplace::in_memory(ShardConfig::default());

    let created = market
        .buyers
        .register(buyer("Asha@Example.com", "+91 98300 00001", "in", Some("west bengal")))
        .await
        .expect("Failed to register buyer");
    assert_eq!(created.email, "asha@example.com");
    assert_eq!(created.status, BuyerStatus::Active);

    let located = market
        .shards()
        .locator()
        .require::<Buyer>(&Probe::id(&created.id))
        .await
        .unwrap();
    assert_eq!(located.shard, ShardKey::india_state("WB").unwrap());

    let found = market
        .buyers
        .find_by_email(" ASHA@example.com ")
        .await
        .unwrap()
        .expect("Buyer not found by email");
    assert_eq!(found, created);
    assert!(market.buyers.find_by_email("nobody@x.com").await.unwrap().is_none());

    market.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_buyer_email_rejected_before_write() {
    let market = Marketplace::in_memory(ShardConfig::default());
    market
        .buyers
        .register(buyer("dup@x.com", "+91 98300 00001", "IN", Some("Rajasthan")))
        .await
        .unwrap();

    let err = market
        .buyers
        .register(buyer("DUP@x.com", "+1 555 000 0002", "US", None))
        .await
        .unwrap_err();
    assert_eq!(err, BuyerError::AlreadyExists("email dup@x.com".to_string()));
    assert_eq!(count_in::<Buyer>(&market, ShardKey::US).await, 0);

    let err = market
        .buyers
        .register(buyer("other@x.com", "+91-98300-00001", "EU", None))
        .await
        .unwrap_err();
    assert!(matches!(err, BuyerError::AlreadyExists(ref what) if what.starts_with("phone")));
    assert_eq!(count_in::<Buyer>(&market, ShardKey::EU).await, 0);

    market.shutdown().await;
}

#[tokio::test]
async fn test_seller_email_found_in_any_shard_is_a_conflict() {
    let market = Marketplace::in_memory(ShardConfig::default());
    market
        .sellers
        .register(seller(1, "shop@x.com", "IN", Some("Rajasthan")))
        .await
        .unwrap();

    let err = market
        .sellers
        .register(seller(2, "shop@x.com", "EU", None))
        .await
        .unwrap_err();
    assert!(matches!(err, SellerError::AlreadyExists(ref what) if what.starts_with("email")));
    assert_eq!(count_in::<Seller>(&market, ShardKey::EU).await, 0);

    market.shutdown().await;
}

#[tokio::test]
async fn test_seller_duplicate_gst_rejected() {
    let market = Marketplace::in_memory(ShardConfig::default());
    let first = market
        .sellers
        .register(seller(1, "one@x.com", "US", None))
        .await
        .unwrap();
    assert_eq!(first.gst_number, "29ABCDE0001F1Z5");
    assert_eq!(first.status, SellerStatus::Pending);

    let mut copy = seller(2, "two@x.com", "IN", Some("Delhi"));
    copy.gst_number = "29abcde0001f1z5".to_string();
    let err = market.sellers.register(copy).await.unwrap_err();
    assert_eq!(
        err,
        SellerError::AlreadyExists("gstNumber 29ABCDE0001F1Z5".to_string())
    );

    let mut copy = seller(3, "three@x.com", "EU", None);
    copy.pan_number = first.pan_number.to_lowercase();
    let err = market.sellers.register(copy).await.unwrap_err();
    assert!(matches!(err, SellerError::AlreadyExists(ref what) if what.starts_with("panNumber")));

    market.shutdown().await;
}

#[tokio::test]
async fn test_invalid_fields_rejected() {
    let market = Marketplace::in_memory(ShardConfig::default());

    let err = market
        .buyers
        .register(buyer("not-an-email", "+91 98300 00001", "IN", None))
        .await
        .unwrap_err();
    assert!(matches!(err, BuyerError::ValidationError(_)));

    let mut bad = seller(1, "s@x.com", "US", None);
    bad.pan_number = "SHORT".to_string();
    let err = market.sellers.register(bad).await.unwrap_err();
    assert!(matches!(err, SellerError::ValidationError(_)));
    assert!(market.shards().manager().cached_shards().await.is_empty());

    market.shutdown().await;
}

#[tokio::test]
async fn test_write_falls_back_when_state_shard_is_down() {
    let market = Marketplace::in_memory(ShardConfig::default());
    let wb = ShardKey::india_state("WB").unwrap();
    market.connector().fail_shard(wb).await;

    let created = market
        .buyers
        .register(buyer("kolkata@x.com", "+91 98300 00009", "IN", Some("West Bengal")))
        .await
        .unwrap();
    assert_eq!(created.state.as_deref(), Some("West Bengal"));

    let located = market
        .shards()
        .locator()
        .require::<Buyer>(&Probe::id(&created.id))
        .await
        .unwrap();
    assert_eq!(located.shard, ShardKey::IN_DEFAULT);

    market.shutdown().await;
}

#[tokio::test]
async fn test_admin_mutations_follow_the_record() {
    let market = Marketplace::in_memory(ShardConfig::default());
    let created = market
        .buyers
        .register(buyer("m@x.com", "+91 98300 00003", "IN", Some("Maharashtra")))
        .await
        .unwrap();

    let blocked = market.buyers.block(&created.id).await.unwrap();
    assert_eq!(blocked.status, BuyerStatus::Blocked);
    assert_eq!(blocked.created_at, created.created_at);
    let active = market.buyers.unblock(&created.id).await.unwrap();
    assert_eq!(active.status, BuyerStatus::Active);

    let s = market
        .sellers
        .register(seller(4, "tn@x.com", "IN", Some("Tamil Nadu")))
        .await
        .unwrap();
    assert_eq!(
        market.sellers.approve(&s.id).await.unwrap().status,
        SellerStatus::Approved
    );
    assert_eq!(
        market.sellers.suspend(&s.id).await.unwrap().status,
        SellerStatus::Suspended
    );

    market.buyers.delete(&created.id).await.unwrap();
    assert!(market.buyers.get(&created.id).await.unwrap().is_none());
    assert!(matches!(
        market.buyers.block(&created.id).await,
        Err(BuyerError::NotFound(_))
    ));

    market.shutdown().await;
}
