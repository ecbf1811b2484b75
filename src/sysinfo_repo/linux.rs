// Linux-specific helpers: /proc, DMI, cpufreq sysfs, power supplies.

/// Read first "model name" from /proc/cpuinfo (Linux). Prefer over sysinfo when it returns "cpu0" etc.
pub(super) fn read_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        for line in content.lines() {
            if line.starts_with("model name") {
                let name = line
                    .find(": ")
                    .map(|i| line[i + 2..].trim())
                    .filter(|s| !s.is_empty() && *s != "cpu0")?;
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Read one field from DMI (Linux), e.g. "bios_vendor" or "product_name".
pub(super) fn read_dmi_field(field: &str) -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/sys/class/dmi/id/{field}");
        let v = std::fs::read_to_string(&path).ok()?;
        let v = v.trim();
        if v.is_empty() {
            return None;
        }
        return Some(v.to_string());
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = field;
        None
    }
}

/// One CPU cache as described under /sys/devices/system/cpu/cpu0/cache.
pub(super) struct CpuCache {
    pub(super) level: u8,
    pub(super) cache_type: String,
    pub(super) size: String,
    pub(super) ways_of_associativity: Option<u16>,
    pub(super) shared_cpu_list: String,
}

/// Enumerate cpu0's caches (Linux). Index order follows the sysfs directory
/// numbering, L1 data/instruction first.
pub(super) fn read_cpu_caches() -> Vec<CpuCache> {
    let mut caches = Vec::new();
    #[cfg(target_os = "linux")]
    {
        for index in 0..16u32 {
            let dir = format!("/sys/devices/system/cpu/cpu0/cache/index{index}");
            let Some(level) = read_trimmed(&format!("{dir}/level")) else {
                break;
            };
            let Ok(level) = level.parse::<u8>() else {
                continue;
            };
            caches.push(CpuCache {
                level,
                cache_type: read_trimmed(&format!("{dir}/type")).unwrap_or_default(),
                size: read_trimmed(&format!("{dir}/size")).unwrap_or_default(),
                ways_of_associativity: read_trimmed(&format!("{dir}/ways_of_associativity"))
                    .and_then(|v| v.parse().ok()),
                shared_cpu_list: read_trimmed(&format!("{dir}/shared_cpu_list")).unwrap_or_default(),
            });
        }
    }
    caches
}

/// One battery as described under /sys/class/power_supply.
pub(super) struct PowerSupplyBattery {
    pub(super) id: String,
    pub(super) model_name: String,
    pub(super) manufacturer: String,
    pub(super) technology: String,
    pub(super) status: String,
    pub(super) capacity_percent: Option<i64>,
    pub(super) cycle_count: Option<i64>,
}

/// Enumerate batteries (Linux). Desktops legitimately return an empty list.
pub(super) fn read_batteries() -> Vec<PowerSupplyBattery> {
    let mut batteries = Vec::new();
    #[cfg(target_os = "linux")]
    {
        let Ok(entries) = std::fs::read_dir("/sys/class/power_supply") else {
            return batteries;
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        for name in names {
            let dir = format!("/sys/class/power_supply/{name}");
            if read_trimmed(&format!("{dir}/type")).as_deref() != Some("Battery") {
                continue;
            }
            batteries.push(PowerSupplyBattery {
                id: name,
                model_name: read_trimmed(&format!("{dir}/model_name")).unwrap_or_default(),
                manufacturer: read_trimmed(&format!("{dir}/manufacturer")).unwrap_or_default(),
                technology: read_trimmed(&format!("{dir}/technology")).unwrap_or_default(),
                status: read_trimmed(&format!("{dir}/status")).unwrap_or_default(),
                capacity_percent: read_trimmed(&format!("{dir}/capacity"))
                    .and_then(|v| v.parse().ok()),
                cycle_count: read_trimmed(&format!("{dir}/cycle_count"))
                    .and_then(|v| v.parse().ok()),
            });
        }
    }
    batteries
}

#[cfg(target_os = "linux")]
fn read_trimmed(path: &str) -> Option<String> {
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}
