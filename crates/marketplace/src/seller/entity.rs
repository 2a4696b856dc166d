//! [`ShardEntity`] implementation for [`Seller`].

use super::SellerError;
use crate::model::{Seller, SellerCreate, SellerStatus, SellerUpdate};
use crate::validation;
use geo_shard::ShardEntity;

/// Length of a GST registration number.
const GST_LEN: usize = 15;
/// Length of a PAN.
const PAN_LEN: usize = 10;

impl ShardEntity for Seller {
    type Create = SellerCreate;
    type Update = SellerUpdate;
    type Error = SellerError;

    const COLLECTION: &'static str = "sellers";
    const SEARCH_FIELDS: &'static [&'static str] = &["businessName", "email", "gstNumber"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["email", "phone", "gstNumber", "panNumber"];
    const DEDUP_FIELD: &'static str = "email";

    fn id(&self) -> &str {
        &self.id
    }

    /// New sellers wait for approval.
    fn from_create_params(params: SellerCreate, created_at: u64) -> Result<Self, SellerError> {
        let invalid = SellerError::ValidationError;
        Ok(Self {
            id: String::new(),
            business_name: validation::required("businessName", &params.business_name)
                .map_err(invalid)?,
            email: validation::email(&params.email).map_err(invalid)?,
            phone: validation::phone(&params.phone).map_err(invalid)?,
            gst_number: validation::code("gstNumber", &params.gst_number, GST_LEN)
                .map_err(invalid)?,
            pan_number: validation::code("panNumber", &params.pan_number, PAN_LEN)
                .map_err(invalid)?,
            country: validation::required("country", &params.country)
                .map_err(invalid)?
                .to_ascii_uppercase(),
            state: validation::optional(params.state),
            status: SellerStatus::Pending,
            created_at,
        })
    }

    fn on_update(&mut self, update: SellerUpdate) -> Result<(), SellerError> {
        if let Some(name) = update.business_name {
            self.business_name =
                validation::required("businessName", &name).map_err(SellerError::ValidationError)?;
        }
        if let Some(next) = update.status {
            let allowed = matches!(
                (self.status, next),
                (SellerStatus::Pending, SellerStatus::Approved)
                    | (SellerStatus::Pending, SellerStatus::Suspended)
                    | (SellerStatus::Approved, SellerStatus::Suspended)
                    | (SellerStatus::Suspended, SellerStatus::Approved)
            );
            if !allowed {
                return Err(SellerError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
            self.status = next;
        }
        Ok(())
    }
}
