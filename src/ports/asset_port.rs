//! Asset storage port.

use crate::domain::asset::{Asset, AssetType};
use crate::domain::error::TrackerError;

pub trait AssetPort: Send + Sync {
    /// `Ok(None)` when no asset has this id.
    fn get_asset_by_id(&self, id: &str) -> Result<Option<Asset>, TrackerError>;

    fn get_assets_by_type(&self, asset_type: AssetType) -> Result<Vec<Asset>, TrackerError>;

    /// Inserts or replaces by id.
    fn save_asset(&self, asset: &Asset) -> Result<(), TrackerError>;
}
