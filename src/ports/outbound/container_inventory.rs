use crate::sbom_generation::domain::Dependency;
use crate::shared::Result;
use async_trait::async_trait;

/// ContainerInventory port for listing the packages inside an image
#[async_trait]
pub trait ContainerInventory: Send + Sync {
    /// Returns one direct, depth-0 dependency per package found in `image`.
    ///
    /// # Errors
    /// Returns an error if the inventory tool is missing or fails.
    async fn inventory(&self, image: &str) -> Result<Vec<Dependency>>;
}
