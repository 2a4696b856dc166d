//! [`ShardEntity`] implementation for [`Product`].

use super::ProductError;
use crate::model::{Product, ProductCreate, ProductUpdate};
use crate::validation;
use geo_shard::ShardEntity;

fn check_price(price: f64) -> Result<f64, ProductError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ProductError::ValidationError(format!("invalid price: {price}")))
    }
}

fn check_stock(stock: i64) -> Result<i64, ProductError> {
    if stock >= 0 {
        Ok(stock)
    } else {
        Err(ProductError::ValidationError(format!("invalid stock: {stock}")))
    }
}

impl ShardEntity for Product {
    type Create = ProductCreate;
    type Update = ProductUpdate;
    type Error = ProductError;

    const COLLECTION: &'static str = "products";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "category"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create_params(params: ProductCreate, created_at: u64) -> Result<Self, ProductError> {
        let ProductCreate {
            product,
            country,
            state,
        } = params;
        Ok(Self {
            id: String::new(),
            seller_id: product.seller_id,
            name: validation::required("name", &product.name).map_err(ProductError::ValidationError)?,
            category: validation::required("category", &product.category)
                .map_err(ProductError::ValidationError)?
                .to_lowercase(),
            price: check_price(product.price)?,
            stock: check_stock(product.stock)?,
            country,
            state,
            created_at,
        })
    }

    fn on_update(&mut self, update: ProductUpdate) -> Result<(), ProductError> {
        if let Some(name) = update.name {
            self.name = validation::required("name", &name).map_err(ProductError::ValidationError)?;
        }
        if let Some(category) = update.category {
            self.category = validation::required("category", &category)
                .map_err(ProductError::ValidationError)?
                .to_lowercase();
        }
        if let Some(price) = update.price {
            self.price = check_price(price)?;
        }
        if let Some(stock) = update.stock {
            self.stock = check_stock(stock)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewProduct;

    fn create(price: f64, stock: i64) -> Result<Product, ProductError> {
        Product::from_create_params(
            ProductCreate {
                product: NewProduct {
                    seller_id: "sellers-us-1".into(),
                    name: "Lamp".into(),
                    category: "Home".into(),
                    price,
                    stock,
                },
                country: "US".into(),
                state: None,
            },
            5,
        )
    }

    #[test]
    fn test_create_validates_price_and_stock() {
        let product = create(19.5, 3).unwrap();
        assert_eq!(product.category, "home");
        assert!(create(-1.0, 3).is_err());
        assert!(create(f64::NAN, 3).is_err());
        assert!(create(1.0, -3).is_err());
    }

    #[test]
    fn test_update_is_all_or_nothing_per_field() {
        let mut product = create(10.0, 1).unwrap();
        product
            .on_update(ProductUpdate {
                price: Some(12.0),
                stock: Some(4),
                ..ProductUpdate::default()
            })
            .unwrap();
        assert_eq!((product.price, product.stock), (12.0, 4));

        let err = product
            .on_update(ProductUpdate {
                stock: Some(-1),
                ..ProductUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, ProductError::ValidationError(_)));
    }
}
