//! Places directory trait

use async_trait::async_trait;

use crate::{Coordinates, PlaceResult, Result};

/// Third-party places directory (e.g. Google Places Text Search)
///
/// Results come back in the directory's own ranking. Callers in the dialogue
/// core never see the error branch: the provider lookup adapter logs it and
/// treats it as "not found".
#[async_trait]
pub trait PlacesSearch: Send + Sync + 'static {
    async fn search(
        &self,
        query: &str,
        bias_location: Option<Coordinates>,
        radius_meters: Option<u32>,
    ) -> Result<Vec<PlaceResult>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
