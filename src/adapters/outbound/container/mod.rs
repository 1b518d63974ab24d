/// Container image adapters
mod syft_inventory;

pub use syft_inventory::SyftInventory;
