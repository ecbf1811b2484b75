// Provider capabilities: the metric, inventory and process backends are
// injected behind traits so the engines never touch the OS directly.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{InventoryInstance, ProcessRecord};

/// Backend failures that abort a tick or query. Everything else (a vanished
/// volume, a skipped process, an odd property value) is absorbed locally by
/// the engines and never reaches the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported inventory class: {0}")]
    UnsupportedClass(String),
}

/// The four counter categories the live-metrics view reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricCounter {
    /// Total processor utilization, percent.
    ProcessorTotal,
    /// Committed memory, bytes.
    CommittedBytes,
    /// Available memory, MB.
    AvailableMegabytes,
    /// Free space of the named volume, MB.
    VolumeFreeMegabytes(String),
}

/// Instantaneous scalar readings plus fixed-volume discovery.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    async fn read_counter(&self, counter: &MetricCounter) -> Result<f64, ProviderError>;

    /// Names of fixed (local, non-removable) volumes. Removable, network and
    /// optical volumes are excluded.
    async fn fixed_volumes(&self) -> Result<Vec<String>, ProviderError>;

    /// Total capacity of a volume in MB (bytes / 1 048 576, truncating).
    async fn volume_capacity_mb(&self, name: &str) -> Result<u64, ProviderError>;
}

/// Hardware-description queries: all instances of a named class, each an
/// ordered bag of dynamically-typed properties.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn query_class(&self, class: &str) -> Result<Vec<InventoryInstance>, ProviderError>;
}

/// Live process enumeration. A process that cannot be introspected is
/// omitted by the provider rather than failing the enumeration.
#[async_trait]
pub trait ProcessProvider: Send + Sync {
    async fn processes(&self) -> Result<Vec<ProcessRecord>, ProviderError>;
}

/// Inventory class identifiers. Case-sensitive string constants, passed
/// through to the provider verbatim.
pub mod classes {
    pub const PROCESSOR: &str = "processor";
    pub const VIDEO_CONTROLLER: &str = "video-controller";
    pub const IDE_CONTROLLER: &str = "IDE-controller";
    pub const BATTERY: &str = "battery";
    pub const BIOS: &str = "BIOS";
    pub const PHYSICAL_MEMORY: &str = "physical-memory";
    pub const CACHE_MEMORY: &str = "cache-memory";
    pub const USB_CONTROLLER: &str = "USB-controller";
    pub const DISK_DRIVE: &str = "disk-drive";
    pub const LOGICAL_DISK: &str = "logical-disk";
    pub const KEYBOARD: &str = "keyboard";
    pub const NETWORK_ADAPTER: &str = "network-adapter";
    pub const ACCOUNT: &str = "account";

    pub const ALL: &[&str] = &[
        PROCESSOR,
        VIDEO_CONTROLLER,
        IDE_CONTROLLER,
        BATTERY,
        BIOS,
        PHYSICAL_MEMORY,
        CACHE_MEMORY,
        USB_CONTROLLER,
        DISK_DRIVE,
        LOGICAL_DISK,
        KEYBOARD,
        NETWORK_ADAPTER,
        ACCOUNT,
    ];
}
