use anyhow::Context;
use geo_shard::tracing::setup_tracing;
use geo_shard::{ListParams, ShardClient, ShardConfig};
use marketplace::lifecycle::Marketplace;
use marketplace::model::{BuyerCreate, NewProduct, PlaceOrder, SellerCreate};
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = ShardConfig::from_env();
    info!(?config, "Starting marketplace");
    let market = Marketplace::in_memory(config);

    let buyer = async {
        market
            .buyers
            .register(BuyerCreate {
                name: "Asha Sen".to_string(),
                email: "asha@example.com".to_string(),
                phone: "+91 98300 00001".to_string(),
                country: "IN".to_string(),
                state: Some("West Bengal".to_string()),
                address: Some("12 Park Street, Kolkata".to_string()),
            })
            .await
    }
    .instrument(tracing::info_span!("buyer_registration"))
    .await
    .context("registering buyer")?;

    let seller = async {
        let seller = market
            .sellers
            .register(SellerCreate {
                business_name: "Lumen Lamps".to_string(),
                email: "sales@lumen.example".to_string(),
                phone: "+49 30 1234567".to_string(),
                gst_number: "29ABCDE1234F1Z5".to_string(),
                pan_number: "ABCDE1234F".to_string(),
                country: "EU".to_string(),
                state: None,
            })
            .await?;
        market.sellers.approve(&seller.id).await
    }
    .instrument(tracing::info_span!("seller_onboarding"))
    .await
    .context("onboarding seller")?;

    let product = market
        .products
        .create_product(NewProduct {
            seller_id: seller.id.clone(),
            name: "Desk Lamp".to_string(),
            category: "Lighting".to_string(),
            price: 24.5,
            stock: 10,
        })
        .await
        .context("creating product")?;

    let order = async {
        market
            .orders
            .place_order(PlaceOrder {
                buyer_id: buyer.id.clone(),
                product_id: product.id.clone(),
                quantity: 3,
            })
            .await
    }
    .instrument(tracing::info_span!("order_processing"))
    .await;
    match &order {
        Ok(order) => info!(order_id = %order.id, total = order.total, "Order processed"),
        Err(e) => warn!(error = %e, "Order processing failed"),
    }

    let duplicate = market
        .buyers
        .register(BuyerCreate {
            name: "Someone Else".to_string(),
            email: "ASHA@example.com".to_string(),
            phone: "+1 555 0100 200".to_string(),
            country: "US".to_string(),
            state: None,
            address: None,
        })
        .await;
    if let Err(e) = duplicate {
        info!(error = %e, "Duplicate registration rejected");
    }

    let page = market
        .buyers
        .list(ListParams::default())
        .await
        .context("listing buyers")?;
    info!(total = page.total, partial = page.partial, "Buyer listing");
    println!("{}", serde_json::to_string_pretty(&page)?);

    market.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
