// Shared test helpers: scriptable fake providers.
// Not every test binary uses every fake.
#![allow(dead_code)]

use async_trait::async_trait;
use hwscope::models::{InventoryInstance, ProcessRecord, PropertyValue};
use hwscope::providers::{
    InventoryProvider, MetricCounter, MetricProvider, ProcessProvider, ProviderError,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Metric backend with fixed readings. Volumes can lose their free-space
/// reading mid-test to simulate an unplugged drive, and the CPU counter can
/// be switched into failure.
pub struct FakeMetricProvider {
    pub cpu_percent: f64,
    pub committed_bytes: f64,
    pub available_mb: f64,
    volumes: Vec<(String, u64)>,
    free_mb: Mutex<HashMap<String, f64>>,
    fail_cpu: AtomicBool,
}

impl Default for FakeMetricProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMetricProvider {
    pub fn new() -> Self {
        Self {
            cpu_percent: 12.5,
            committed_bytes: 4.0 * 1024.0 * 1024.0 * 1024.0,
            available_mb: 2048.0,
            volumes: Vec::new(),
            free_mb: Mutex::new(HashMap::new()),
            fail_cpu: AtomicBool::new(false),
        }
    }

    pub fn with_volume(mut self, name: &str, total_mb: u64, free_mb: f64) -> Self {
        self.volumes.push((name.to_string(), total_mb));
        self.free_mb.lock().unwrap().insert(name.to_string(), free_mb);
        self
    }

    pub fn set_free(&self, name: &str, free_mb: f64) {
        self.free_mb.lock().unwrap().insert(name.to_string(), free_mb);
    }

    /// The volume stops answering free-space reads, as if unplugged.
    pub fn drop_volume_reading(&self, name: &str) {
        self.free_mb.lock().unwrap().remove(name);
    }

    pub fn fail_cpu(&self, fail: bool) {
        self.fail_cpu.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl MetricProvider for FakeMetricProvider {
    async fn read_counter(&self, counter: &MetricCounter) -> Result<f64, ProviderError> {
        match counter {
            MetricCounter::ProcessorTotal => {
                if self.fail_cpu.load(Ordering::Relaxed) {
                    Err(ProviderError::Unavailable("counters offline".into()))
                } else {
                    Ok(self.cpu_percent)
                }
            }
            MetricCounter::CommittedBytes => Ok(self.committed_bytes),
            MetricCounter::AvailableMegabytes => Ok(self.available_mb),
            MetricCounter::VolumeFreeMegabytes(name) => self
                .free_mb
                .lock()
                .unwrap()
                .get(name)
                .copied()
                .ok_or_else(|| ProviderError::Unavailable(format!("volume {name} is not mounted"))),
        }
    }

    async fn fixed_volumes(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.volumes.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn volume_capacity_mb(&self, name: &str) -> Result<u64, ProviderError> {
        self.volumes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, total)| *total)
            .ok_or_else(|| ProviderError::Unavailable(format!("volume {name} is not mounted")))
    }
}

/// Inventory backend with a fixed class table. Unknown classes surface
/// `UnsupportedClass`; `fail` turns every query into `Unavailable`.
#[derive(Default)]
pub struct FakeInventoryProvider {
    pub instances: HashMap<String, Vec<InventoryInstance>>,
    pub fail: bool,
}

impl FakeInventoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: &str, instances: Vec<InventoryInstance>) -> Self {
        self.instances.insert(class.to_string(), instances);
        self
    }

    pub fn failing() -> Self {
        Self {
            instances: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl InventoryProvider for FakeInventoryProvider {
    async fn query_class(&self, class: &str) -> Result<Vec<InventoryInstance>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Unavailable("backend offline".into()));
        }
        self.instances
            .get(class)
            .cloned()
            .ok_or_else(|| ProviderError::UnsupportedClass(class.to_string()))
    }
}

/// Process backend returning a fixed record list.
#[derive(Default)]
pub struct FakeProcessProvider {
    pub records: Vec<ProcessRecord>,
}

impl FakeProcessProvider {
    pub fn new(records: Vec<ProcessRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ProcessProvider for FakeProcessProvider {
    async fn processes(&self) -> Result<Vec<ProcessRecord>, ProviderError> {
        Ok(self.records.clone())
    }
}

/// Instance builder shorthand for inventory tests.
pub fn instance(identity: &str, properties: &[(&str, PropertyValue)]) -> InventoryInstance {
    let mut instance = InventoryInstance::new(identity);
    for (name, value) in properties {
        instance.push(*name, value.clone());
    }
    instance
}
