// Hardware telemetry and inventory via sysinfo, plus procfs/sysfs on Linux

mod linux;

use crate::models::{BYTES_PER_MEGABYTE, InventoryInstance, ProcessRecord, PropertyValue};
use crate::providers::{
    InventoryProvider, MetricCounter, MetricProvider, ProcessProvider, ProviderError, classes,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{DiskKind, Disks, Networks, ProcessesToUpdate, System, Users};
use tracing::instrument;

pub struct SysinfoRepo {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    networks: Arc<std::sync::Mutex<Networks>>,
    users: Arc<std::sync::Mutex<Users>>,
    last_cpu_refresh: Arc<std::sync::Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned<T>(e: std::sync::PoisonError<T>) -> ProviderError {
    ProviderError::Unavailable(format!("sysinfo lock poisoned: {e}"))
}

fn task_join(e: tokio::task::JoinError) -> ProviderError {
    ProviderError::Unavailable(format!("sysinfo task join: {e}"))
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        let users = Users::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            networks: Arc::new(std::sync::Mutex::new(networks)),
            users: Arc::new(std::sync::Mutex::new(users)),
            last_cpu_refresh: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    async fn processor_total(&self) -> Result<f64, ProviderError> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;

            let now = Instant::now();
            let usage = if let Ok(mut guard) = last_cpu_refresh.lock() {
                if let Some((prev_ts, prev_usage)) = *guard {
                    let dt = now.duration_since(prev_ts);
                    if dt >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
                        // Enough time has passed, refresh and get new usage
                        sys.refresh_cpu_all();
                        let new_usage = sys.global_cpu_usage() as f64;
                        *guard = Some((now, new_usage));
                        new_usage
                    } else {
                        // Not enough time has passed, return cached usage without blocking
                        prev_usage
                    }
                } else {
                    // First call: refresh to establish baseline
                    sys.refresh_cpu_all();
                    *guard = Some((now, 0.0));
                    0.0
                }
            } else {
                // Lock failed, refresh and return 0.0
                sys.refresh_cpu_all();
                0.0
            };

            Ok(usage.clamp(0.0, 100.0))
        })
        .await
        .map_err(task_join)?
    }

    async fn committed_bytes(&self) -> Result<f64, ProviderError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_memory();
            Ok(sys.used_memory() as f64)
        })
        .await
        .map_err(task_join)?
    }

    async fn available_megabytes(&self) -> Result<f64, ProviderError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_memory();
            Ok(sys.available_memory() as f64 / BYTES_PER_MEGABYTE as f64)
        })
        .await
        .map_err(task_join)?
    }

    async fn volume_free_megabytes(&self, name: String) -> Result<f64, ProviderError> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks.lock().map_err(lock_poisoned)?;
            disks_guard.refresh(true);
            disks_guard
                .list()
                .iter()
                .find(|d| d.mount_point().to_string_lossy() == name)
                .map(|d| d.available_space() as f64 / BYTES_PER_MEGABYTE as f64)
                .ok_or_else(|| ProviderError::Unavailable(format!("volume {name} is not mounted")))
        })
        .await
        .map_err(task_join)?
    }
}

#[async_trait]
impl MetricProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "read_counter"))]
    async fn read_counter(&self, counter: &MetricCounter) -> Result<f64, ProviderError> {
        match counter {
            MetricCounter::ProcessorTotal => self.processor_total().await,
            MetricCounter::CommittedBytes => self.committed_bytes().await,
            MetricCounter::AvailableMegabytes => self.available_megabytes().await,
            MetricCounter::VolumeFreeMegabytes(name) => {
                self.volume_free_megabytes(name.clone()).await
            }
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "fixed_volumes"))]
    async fn fixed_volumes(&self) -> Result<Vec<String>, ProviderError> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks.lock().map_err(lock_poisoned)?;
            disks_guard.refresh(true);
            let mut names: Vec<String> = disks_guard
                .list()
                .iter()
                .filter(|d| !d.is_removable())
                .map(|d| d.mount_point().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names.dedup();
            Ok(names)
        })
        .await
        .map_err(task_join)?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "volume_capacity"))]
    async fn volume_capacity_mb(&self, name: &str) -> Result<u64, ProviderError> {
        let disks = self.disks.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let disks_guard = disks.lock().map_err(lock_poisoned)?;
            disks_guard
                .list()
                .iter()
                .find(|d| d.mount_point().to_string_lossy() == name)
                .map(|d| d.total_space() / BYTES_PER_MEGABYTE)
                .ok_or_else(|| ProviderError::Unavailable(format!("volume {name} is not mounted")))
        })
        .await
        .map_err(task_join)?
    }
}

#[async_trait]
impl InventoryProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "query_class"))]
    async fn query_class(&self, class: &str) -> Result<Vec<InventoryInstance>, ProviderError> {
        match class {
            classes::PROCESSOR => self.processor_instances().await,
            classes::PHYSICAL_MEMORY => self.physical_memory_instances().await,
            classes::CACHE_MEMORY => blocking_instances(cache_memory_instances).await,
            classes::BIOS => blocking_instances(bios_instances).await,
            classes::BATTERY => blocking_instances(battery_instances).await,
            classes::LOGICAL_DISK => self.logical_disk_instances().await,
            classes::DISK_DRIVE => self.disk_drive_instances().await,
            classes::NETWORK_ADAPTER => self.network_adapter_instances().await,
            classes::ACCOUNT => self.account_instances().await,
            other => Err(ProviderError::UnsupportedClass(other.to_string())),
        }
    }
}

/// sysfs-only collectors run off the runtime like every other provider call.
async fn blocking_instances(
    collect: fn() -> Vec<InventoryInstance>,
) -> Result<Vec<InventoryInstance>, ProviderError> {
    tokio::task::spawn_blocking(move || Ok(collect()))
        .await
        .map_err(task_join)?
}

impl SysinfoRepo {
    async fn processor_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let sys = sys.lock().map_err(lock_poisoned)?;
            let mut instance = InventoryInstance::new("processor:0");
            let brand = sys
                .cpus()
                .first()
                .map(|c| c.brand().to_string())
                .filter(|s| !s.is_empty());
            let name = linux::read_cpu_model()
                .or(brand)
                .unwrap_or_else(|| "Unknown".into());
            instance.push("Name", PropertyValue::Text(name));
            let vendor = sys
                .cpus()
                .first()
                .map(|c| c.vendor_id().to_string())
                .unwrap_or_default();
            instance.push("Manufacturer", PropertyValue::Text(vendor));
            let physical = System::physical_core_count().unwrap_or(0) as i64;
            instance.push("NumberOfCores", PropertyValue::Integer(physical));
            instance.push(
                "NumberOfLogicalProcessors",
                PropertyValue::Integer(sys.cpus().len() as i64),
            );
            let clock_mhz = sys.cpus().first().map(|c| c.frequency() as i64).unwrap_or(0);
            instance.push("MaxClockSpeed", PropertyValue::Integer(clock_mhz));
            instance.push(
                "Architecture",
                PropertyValue::Text(std::env::consts::ARCH.to_string()),
            );
            Ok(vec![instance])
        })
        .await
        .map_err(task_join)?
    }

    async fn physical_memory_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_memory();
            let mut instance = InventoryInstance::new("memory:0");
            instance.push("Name", PropertyValue::Text("System Memory".into()));
            instance.push("Capacity", PropertyValue::Integer(sys.total_memory() as i64));
            instance.push(
                "SwapCapacity",
                PropertyValue::Integer(sys.total_swap() as i64),
            );
            Ok(vec![instance])
        })
        .await
        .map_err(task_join)?
    }

    async fn logical_disk_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks.lock().map_err(lock_poisoned)?;
            disks_guard.refresh(true);
            let instances = disks_guard
                .list()
                .iter()
                .map(|d| {
                    let mount = d.mount_point().to_string_lossy().into_owned();
                    let mut instance = InventoryInstance::new(mount.clone());
                    instance.push("Name", PropertyValue::Text(mount));
                    instance.push(
                        "FileSystem",
                        PropertyValue::Text(d.file_system().to_string_lossy().into_owned()),
                    );
                    instance.push("Size", PropertyValue::Integer(d.total_space() as i64));
                    instance.push(
                        "FreeSpace",
                        PropertyValue::Integer(d.available_space() as i64),
                    );
                    instance.push("Removable", PropertyValue::Boolean(d.is_removable()));
                    instance.push("MediaKind", PropertyValue::Text(disk_kind_name(d.kind())));
                    instance
                })
                .collect();
            Ok(instances)
        })
        .await
        .map_err(task_join)?
    }

    async fn disk_drive_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks.lock().map_err(lock_poisoned)?;
            disks_guard.refresh(true);
            let mut seen = HashSet::new();
            let mut instances = Vec::new();
            for d in disks_guard.list() {
                let device = d.name().to_string_lossy().into_owned();
                if !seen.insert(device.clone()) {
                    continue;
                }
                let mut instance = InventoryInstance::new(device.clone());
                instance.push("Name", PropertyValue::Text(device));
                instance.push("MediaType", PropertyValue::Text(disk_kind_name(d.kind())));
                instance.push("Size", PropertyValue::Integer(d.total_space() as i64));
                instances.push(instance);
            }
            Ok(instances)
        })
        .await
        .map_err(task_join)?
    }

    async fn network_adapter_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = networks.lock().map_err(lock_poisoned)?;
            networks_guard.refresh(true);
            let mut instances: Vec<InventoryInstance> = networks_guard
                .list()
                .iter()
                .map(|(name, data)| {
                    let mut instance = InventoryInstance::new(name.clone());
                    instance.push("Name", PropertyValue::Text(name.clone()));
                    instance.push(
                        "MACAddress",
                        PropertyValue::Text(data.mac_address().to_string()),
                    );
                    let addresses: Vec<String> = data
                        .ip_networks()
                        .iter()
                        .map(|n| n.addr.to_string())
                        .collect();
                    instance.push("IPAddresses", PropertyValue::TextArray(addresses));
                    instance.push("Mtu", PropertyValue::Integer(data.mtu() as i64));
                    instance
                })
                .collect();
            instances.sort_by(|a, b| a.identity.cmp(&b.identity));
            Ok(instances)
        })
        .await
        .map_err(task_join)?
    }

    async fn account_instances(&self) -> Result<Vec<InventoryInstance>, ProviderError> {
        let users = self.users.clone();
        tokio::task::spawn_blocking(move || {
            let users_guard = users.lock().map_err(lock_poisoned)?;
            let instances = users_guard
                .list()
                .iter()
                .map(|user| {
                    let mut instance = InventoryInstance::new(format!("account:{}", user.name()));
                    instance.push("Name", PropertyValue::Text(user.name().to_string()));
                    let groups: Vec<String> = user
                        .groups()
                        .iter()
                        .map(|g| g.name().to_string())
                        .collect();
                    instance.push("Groups", PropertyValue::TextArray(groups));
                    instance
                })
                .collect();
            Ok(instances)
        })
        .await
        .map_err(task_join)?
    }
}

fn disk_kind_name(kind: DiskKind) -> String {
    match kind {
        DiskKind::HDD => "HDD".into(),
        DiskKind::SSD => "SSD".into(),
        DiskKind::Unknown(_) => "Unknown".into(),
    }
}

fn cache_memory_instances() -> Vec<InventoryInstance> {
    linux::read_cpu_caches()
        .into_iter()
        .enumerate()
        .map(|(index, cache)| {
            let mut instance = InventoryInstance::new(format!("cache:{index}"));
            instance.push(
                "Name",
                PropertyValue::Text(format!("L{} {}", cache.level, cache.cache_type)),
            );
            instance.push("Level", PropertyValue::Integer(cache.level as i64));
            instance.push("Size", PropertyValue::Text(cache.size));
            instance.push("Type", PropertyValue::Text(cache.cache_type));
            instance.push(
                "WaysOfAssociativity",
                cache
                    .ways_of_associativity
                    .map(|w| PropertyValue::Integer(w as i64))
                    .unwrap_or(PropertyValue::Empty),
            );
            instance.push("SharedCpuList", PropertyValue::Text(cache.shared_cpu_list));
            instance
        })
        .collect()
}

fn bios_instances() -> Vec<InventoryInstance> {
    let dmi = |field: &str| {
        linux::read_dmi_field(field)
            .map(PropertyValue::Text)
            .unwrap_or(PropertyValue::Empty)
    };
    let mut instance = InventoryInstance::new("bios:0");
    instance.push("Name", dmi("bios_vendor"));
    instance.push("Version", dmi("bios_version"));
    instance.push("ReleaseDate", dmi("bios_date"));
    instance.push("SystemManufacturer", dmi("sys_vendor"));
    instance.push("ProductName", dmi("product_name"));
    instance.push("BoardManufacturer", dmi("board_vendor"));
    instance.push("BoardName", dmi("board_name"));
    vec![instance]
}

fn battery_instances() -> Vec<InventoryInstance> {
    linux::read_batteries()
        .into_iter()
        .map(|battery| {
            let mut instance = InventoryInstance::new(battery.id);
            instance.push("Name", PropertyValue::Text(battery.model_name));
            instance.push("Manufacturer", PropertyValue::Text(battery.manufacturer));
            instance.push("Technology", PropertyValue::Text(battery.technology));
            instance.push("Status", PropertyValue::Text(battery.status));
            instance.push(
                "Capacity",
                battery
                    .capacity_percent
                    .map(PropertyValue::Integer)
                    .unwrap_or(PropertyValue::Empty),
            );
            instance.push(
                "CycleCount",
                battery
                    .cycle_count
                    .map(PropertyValue::Integer)
                    .unwrap_or(PropertyValue::Empty),
            );
            instance
        })
        .collect()
}

#[async_trait]
impl ProcessProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "processes"))]
    async fn processes(&self) -> Result<Vec<ProcessRecord>, ProviderError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_processes(ProcessesToUpdate::All, true);
            let mut records: Vec<ProcessRecord> = sys
                .processes()
                .values()
                .map(|p| ProcessRecord {
                    pid: p.pid().as_u32(),
                    name: p.name().to_string_lossy().into_owned(),
                    memory_bytes: p.memory(),
                })
                .collect();
            // Process table iteration order is arbitrary; give callers a
            // deterministic provider order.
            records.sort_by_key(|r| r.pid);
            Ok(records)
        })
        .await
        .map_err(task_join)?
    }
}
