//! One-shot hardware identity probe
//!
//! Looks up the CPU model, motherboard, RAM module, physical disks and monitor
//! names. Each lookup is a [`ProbeChain`] of registry/sysfs reads and shell
//! fallbacks ending in a fixed placeholder, so detection never fails.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::command::{parse_csv_rows, powershell, read_registry};
use super::{clean, FnProbe, Platform, ProbeChain, SharedRunner};
use crate::format::marketing_size;

const CPU_KEY: &str = r"HARDWARE\DESCRIPTION\System\CentralProcessor\0";
const BIOS_KEY: &str = r"HARDWARE\DESCRIPTION\System\BIOS";

const RAM_QUERY: &str =
    "Get-CimInstance Win32_PhysicalMemory | Select-Object Manufacturer,PartNumber,Speed | ConvertTo-Csv -NoTypeInformation";
const DISK_QUERY: &str =
    "Get-PhysicalDisk | Select-Object -Property FriendlyName,Size | ConvertTo-Csv -NoTypeInformation";
const MONITOR_QUERY: &str =
    "Get-CimInstance WmiMonitorID -Namespace root\\wmi | ForEach-Object {($_.UserFriendlyName -ne 0 | ForEach-Object {[char]$_}) -join ''}";

pub const GENERIC_CPU: &str = "Generic CPU";
pub const GENERIC_BOARD: &str = "Generic Motherboard";
pub const GENERIC_RAM: &str = "Standard Memory";
pub const GENERIC_STORAGE: &str = "Generic Storage";
pub const GENERIC_DISPLAY: &str = "Generic Display";

/// Vendor placeholders firmware leaves in DMI tables.
const OEM_FILLERS: &[&str] = &[
    "to be filled by o.e.m.",
    "default string",
    "not applicable",
    "o.e.m.",
    "not specified",
];

/// Block devices that are never physical drives.
const VIRTUAL_BLOCK_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "sr", "fd"];

static DMI_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(Size|Manufacturer|Part Number|Speed):\s*(.*?)\s*$")
        .expect("static regex")
});

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));

/// A physical drive as reported by the storage stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalDisk {
    pub name: String,
    pub size: u64,
}

impl PhysicalDisk {
    /// `• Samsung SSD 980 PRO 1TB [0.91 TiB (1.0 TB)]`
    pub fn label(&self) -> String {
        if self.size == 0 {
            format!("• {}", self.name)
        } else {
            format!("• {} [{}]", self.name, marketing_size(self.size))
        }
    }
}

/// Everything the identity probe learned about the machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HardwareIdentity {
    pub cpu: String,
    pub board: String,
    pub ram: String,
    pub monitor: String,
    pub disks: Vec<PhysicalDisk>,
    pub logical_cores: usize,
    pub total_memory: u64,
    pub rating: u8,
}

impl HardwareIdentity {
    /// Probe the running machine.
    pub fn detect(runner: SharedRunner) -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let brand = sys.cpus().first().map(|cpu| cpu.brand().to_string());
        let sources = IdentitySources::new(runner, Platform::current(), "/");

        Self::assemble(&sources, brand, sys.cpus().len(), sys.total_memory())
    }

    /// Run every lookup against the given sources.
    pub fn assemble(
        sources: &IdentitySources,
        cpu_brand: Option<String>,
        logical_cores: usize,
        total_memory: u64,
    ) -> Self {
        let identity = Self {
            cpu: resolve("cpu", sources.cpu_chain(cpu_brand), GENERIC_CPU),
            board: resolve("board", sources.board_chain(), GENERIC_BOARD),
            ram: resolve("ram", sources.ram_chain(), GENERIC_RAM),
            monitor: resolve("monitor", sources.monitor_chain(), GENERIC_DISPLAY),
            disks: sources
                .disk_chain()
                .first_success()
                .map(|hit| hit.value)
                .unwrap_or_default(),
            logical_cores,
            total_memory,
            rating: hardware_rating(logical_cores, total_memory),
        };

        tracing::info!(
            cpu = %identity.cpu,
            board = %identity.board,
            disks = identity.disks.len(),
            "hardware identity detected"
        );
        identity
    }

    /// Disk lines for display, falling back to the storage placeholder.
    pub fn disk_labels(&self) -> Vec<String> {
        if self.disks.is_empty() {
            vec![GENERIC_STORAGE.to_string()]
        } else {
            self.disks.iter().map(PhysicalDisk::label).collect()
        }
    }
}

/// Print the identity as an aligned table or pretty JSON.
pub fn print_identity(identity: &HardwareIdentity, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(identity)?);
        return Ok(());
    }

    println!("{:<10} {}", "CPU", identity.cpu);
    println!("{:<10} {}", "Board", identity.board);
    println!("{:<10} {}", "Memory", identity.ram);
    println!("{:<10} {}", "Display", identity.monitor);
    for (i, disk) in identity.disk_labels().iter().enumerate() {
        let label = if i == 0 { "Storage" } else { "" };
        println!("{:<10} {}", label, disk);
    }
    println!(
        "{:<10} {} logical cores, {}",
        "Capacity",
        identity.logical_cores,
        crate::format::human_size(identity.total_memory)
    );
    println!("{:<10} {}/100", "Rating", identity.rating);
    Ok(())
}

fn resolve(what: &str, mut chain: ProbeChain<String>, placeholder: &str) -> String {
    match chain.first_success() {
        Some(hit) => {
            tracing::debug!(what, source = hit.source, value = %hit.value, "identity probe hit");
            hit.value
        }
        None => {
            tracing::debug!(what, "identity probe fell back to placeholder");
            placeholder.to_string()
        }
    }
}

/// Where identity data is read from. `root` prefixes every sysfs/procfs path.
#[derive(Clone)]
pub struct IdentitySources {
    runner: SharedRunner,
    platform: Platform,
    root: PathBuf,
}

impl IdentitySources {
    pub fn new(runner: SharedRunner, platform: Platform, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            platform,
            root: root.into(),
        }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn registry(&self, key: &str, value: &str) -> Option<String> {
        if self.platform != Platform::Windows {
            return None;
        }
        read_registry(self.runner.as_ref(), key, value).and_then(|v| meaningful(&v))
    }

    fn powershell(&self, script: &str) -> Option<String> {
        if self.platform != Platform::Windows {
            return None;
        }
        powershell(self.runner.as_ref(), script)
    }

    fn dmi(&self, field: &str) -> Option<String> {
        fs::read_to_string(self.path("sys/class/dmi/id").join(field))
            .ok()
            .and_then(|v| meaningful(&v))
    }

    fn cpu_chain(&self, brand: Option<String>) -> ProbeChain<String> {
        let registry = self.clone();
        let procfs = self.clone();
        let mut brand = brand;

        ProbeChain::new()
            .with(FnProbe::new("registry", move || {
                registry.registry(CPU_KEY, "ProcessorNameString")
            }))
            .with(FnProbe::new("sensor-api", move || {
                brand.take().and_then(|b| clean(&b))
            }))
            .with(FnProbe::new("cpuinfo", move || {
                let text = fs::read_to_string(procfs.path("proc/cpuinfo")).ok()?;
                parse_cpuinfo_model(&text)
            }))
    }

    fn board_chain(&self) -> ProbeChain<String> {
        let baseboard = self.clone();
        let system = self.clone();
        let dmi_board = self.clone();
        let dmi_system = self.clone();

        ProbeChain::new()
            .with(FnProbe::new("registry-baseboard", move || {
                compose_board(
                    baseboard.registry(BIOS_KEY, "BaseBoardManufacturer"),
                    baseboard.registry(BIOS_KEY, "BaseBoardProduct"),
                    true,
                )
            }))
            .with(FnProbe::new("registry-system", move || {
                compose_board(
                    system.registry(BIOS_KEY, "SystemManufacturer"),
                    system.registry(BIOS_KEY, "SystemProductName"),
                    false,
                )
            }))
            .with(FnProbe::new("dmi-board", move || {
                compose_board(dmi_board.dmi("board_vendor"), dmi_board.dmi("board_name"), true)
            }))
            .with(FnProbe::new("dmi-system", move || {
                compose_board(
                    dmi_system.dmi("sys_vendor"),
                    dmi_system.dmi("product_name"),
                    false,
                )
            }))
    }

    fn ram_chain(&self) -> ProbeChain<String> {
        let wmi = self.clone();
        let dmidecode = self.clone();

        ProbeChain::new()
            .with(FnProbe::new("physical-memory", move || {
                let csv = wmi.powershell(RAM_QUERY)?;
                parse_ram_csv(&csv)
            }))
            .with(FnProbe::new("dmidecode", move || {
                if dmidecode.platform != Platform::Linux {
                    return None;
                }
                let args = ["-t".to_string(), "17".to_string()];
                match dmidecode.runner.run("dmidecode", &args) {
                    Ok(out) => parse_dmidecode_memory(&out),
                    Err(err) => {
                        tracing::debug!(%err, "dmidecode unavailable");
                        None
                    }
                }
            }))
    }

    fn disk_chain(&self) -> ProbeChain<Vec<PhysicalDisk>> {
        let storage = self.clone();
        let sysfs = self.clone();

        ProbeChain::new()
            .with(FnProbe::new("physical-disk", move || {
                let csv = storage.powershell(DISK_QUERY)?;
                non_empty(parse_physical_disks(&csv))
            }))
            .with(FnProbe::new("sysfs-block", move || {
                non_empty(read_block_devices(&sysfs.path("sys/block")))
            }))
    }

    fn monitor_chain(&self) -> ProbeChain<String> {
        let wmi = self.clone();
        let drm = self.clone();

        ProbeChain::new()
            .with(FnProbe::new("monitor-id", move || {
                let out = wmi.powershell(MONITOR_QUERY)?;
                join_monitors(out.lines().map(str::to_string))
            }))
            .with(FnProbe::new("edid", move || {
                join_monitors(read_edid_names(&drm.path("sys/class/drm")))
            }))
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Clean a firmware string, dropping OEM filler values.
pub fn meaningful(value: &str) -> Option<String> {
    let cleaned = clean(value)?;
    let lower = cleaned.to_lowercase();
    if OEM_FILLERS.iter().any(|filler| lower == *filler) {
        return None;
    }
    Some(cleaned)
}

/// Join manufacturer and product; both must be present.
///
/// With `reject_system` the pair is refused when the manufacturer is a generic
/// "System manufacturer" style placeholder.
pub fn compose_board(
    manufacturer: Option<String>,
    product: Option<String>,
    reject_system: bool,
) -> Option<String> {
    let manufacturer = manufacturer?;
    let product = product?;
    if reject_system && manufacturer.contains("System") {
        return None;
    }
    clean(&format!("{manufacturer} {product}"))
}

/// `"<part> @ <speed> MHz"`, prefixed by the manufacturer when it is meaningful.
/// An empty speed drops the suffix.
pub fn format_ram_row(manufacturer: &str, part: &str, speed: &str) -> String {
    let manufacturer = manufacturer.trim();
    let part = part.trim();
    let speed = speed.trim();
    let module = if speed.is_empty() {
        part.to_string()
    } else {
        format!("{part} @ {speed} MHz")
    };
    if manufacturer.contains("0000") || manufacturer.chars().count() < 2 {
        module
    } else {
        format!("{manufacturer} {module}")
    }
}

/// First module from the `Win32_PhysicalMemory` CSV.
pub fn parse_ram_csv(csv: &str) -> Option<String> {
    parse_csv_rows(csv)
        .into_iter()
        .find(|row| row.len() >= 3)
        .map(|row| format_ram_row(&row[0], &row[1], &row[2]))
}

/// First populated module in `dmidecode -t 17` output.
pub fn parse_dmidecode_memory(output: &str) -> Option<String> {
    for device in output.split("Memory Device").skip(1) {
        let mut size = None;
        let mut manufacturer = "";
        let mut part = "";
        let mut speed = None;

        for caps in DMI_FIELD.captures_iter(device) {
            let value = caps.get(2).map_or("", |m| m.as_str());
            match &caps[1] {
                "Size" => size = Some(value),
                "Manufacturer" => manufacturer = value,
                "Part Number" => part = value,
                "Speed" => speed = LEADING_NUMBER.find(value).map(|m| m.as_str()),
                _ => {}
            }
        }

        let populated = size.is_some_and(|s| !s.starts_with("No Module") && s != "Unknown");
        if !populated {
            continue;
        }
        let Some(part) = meaningful(part) else {
            continue;
        };
        let manufacturer = meaningful(manufacturer).unwrap_or_default();
        return Some(format_ram_row(&manufacturer, &part, speed.unwrap_or_default()));
    }
    None
}

/// `model name` from `/proc/cpuinfo`.
pub fn parse_cpuinfo_model(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, model)| clean(model))
}

/// Rows of the `Get-PhysicalDisk` CSV. Rows with an unparsable size are skipped.
pub fn parse_physical_disks(csv: &str) -> Vec<PhysicalDisk> {
    parse_csv_rows(csv)
        .into_iter()
        .filter_map(|row| {
            let name = clean(row.first()?)?;
            let size = row.get(1)?.parse::<u64>().ok()?;
            Some(PhysicalDisk { name, size })
        })
        .collect()
}

/// Physical drives under a `/sys/block` style directory.
pub fn read_block_devices(block_root: &Path) -> Vec<PhysicalDisk> {
    let Ok(entries) = fs::read_dir(block_root) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !VIRTUAL_BLOCK_PREFIXES.iter().any(|p| name.starts_with(p)))
        .collect();
    names.sort();

    names
        .into_iter()
        .filter_map(|name| {
            let dir = block_root.join(&name);
            let sectors = fs::read_to_string(dir.join("size"))
                .ok()?
                .trim()
                .parse::<u64>()
                .ok()?;
            if sectors == 0 {
                return None;
            }
            let model = fs::read_to_string(dir.join("device/model"))
                .ok()
                .and_then(|m| clean(&m))
                .unwrap_or(name);
            Some(PhysicalDisk {
                name: model,
                size: sectors * 512,
            })
        })
        .collect()
}

/// Monitor names from every connector's EDID blob under a `/sys/class/drm` directory.
pub fn read_edid_names(drm_root: &Path) -> Vec<String> {
    let pattern = format!("{}/*/edid", drm_root.display());
    let Ok(paths) = glob::glob(&pattern) else {
        return Vec::new();
    };

    paths
        .flatten()
        .filter_map(|path| fs::read(path).ok())
        .filter_map(|blob| parse_edid_name(&blob))
        .collect()
}

const EDID_HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
const EDID_DESCRIPTORS: [usize; 4] = [54, 72, 90, 108];
const EDID_NAME_TAG: u8 = 0xFC;

/// Display product name from the base EDID block.
pub fn parse_edid_name(edid: &[u8]) -> Option<String> {
    if edid.len() < 128 || edid[..8] != EDID_HEADER {
        return None;
    }

    EDID_DESCRIPTORS.iter().find_map(|&offset| {
        let descriptor = &edid[offset..offset + 18];
        // Display descriptors start with a zero pixel clock.
        if descriptor[0] != 0 || descriptor[1] != 0 || descriptor[3] != EDID_NAME_TAG {
            return None;
        }
        let text: String = descriptor[5..]
            .iter()
            .take_while(|&&b| b != 0x0A)
            .map(|&b| char::from(b))
            .collect();
        clean(&text)
    })
}

/// Join distinct monitor names with `" + "`.
fn join_monitors(names: impl IntoIterator<Item = String>) -> Option<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in names.into_iter().filter_map(|n| clean(&n)) {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen.join(" + "))
    }
}

/// Rough 0-100 score: five points per logical core plus one per GiB of RAM.
pub fn hardware_rating(logical_cores: usize, total_memory: u64) -> u8 {
    let gib = total_memory / (1024 * 1024 * 1024);
    let score = (logical_cores as u64).saturating_mul(5).saturating_add(gib);
    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::command::{CommandError, MockCommandRunner};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn failing_runner() -> SharedRunner {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|p, _| {
            Err(CommandError::Empty {
                program: p.to_string(),
            })
        });
        Arc::new(runner)
    }

    fn edid_with_name(name: &str) -> Vec<u8> {
        let mut edid = vec![0u8; 128];
        edid[..8].copy_from_slice(&EDID_HEADER);
        // First descriptor: detailed timing (non-zero pixel clock).
        edid[54] = 0x01;
        edid[55] = 0x1D;
        // Second descriptor: monitor name.
        edid[72 + 3] = EDID_NAME_TAG;
        let mut text = name.as_bytes().to_vec();
        text.push(0x0A);
        while text.len() < 13 {
            text.push(0x20);
        }
        edid[72 + 5..72 + 18].copy_from_slice(&text[..13]);
        edid
    }

    #[test]
    fn board_rejects_system_manufacturer() {
        assert_eq!(
            compose_board(
                Some("System manufacturer".into()),
                Some("System Product Name".into()),
                true
            ),
            None
        );
        assert_eq!(
            compose_board(Some("ASUSTeK COMPUTER INC.".into()), Some("PRIME B550M-A".into()), true)
                .as_deref(),
            Some("ASUSTeK COMPUTER INC. PRIME B550M-A")
        );
        assert_eq!(compose_board(Some("LENOVO".into()), None, false), None);
    }

    #[test]
    fn oem_filler_is_treated_as_absent() {
        assert_eq!(meaningful("To Be Filled By O.E.M."), None);
        assert_eq!(meaningful("  Default string \n"), None);
        assert_eq!(
            meaningful("Micro-Star International Co., Ltd.").as_deref(),
            Some("Micro-Star International Co., Ltd.")
        );
    }

    #[test]
    fn ram_row_drops_placeholder_manufacturer() {
        assert_eq!(
            format_ram_row("00000000", "CMK16GX4M2B3200C16", "3200"),
            "CMK16GX4M2B3200C16 @ 3200 MHz"
        );
        assert_eq!(
            format_ram_row("", "KF3200C16D4/8GX", "3200"),
            "KF3200C16D4/8GX @ 3200 MHz"
        );
        assert_eq!(
            format_ram_row("Samsung", "M378A2K43CB1-CTD", "2666"),
            "Samsung M378A2K43CB1-CTD @ 2666 MHz"
        );
        assert_eq!(format_ram_row("QEMU", "DIMM-1", ""), "QEMU DIMM-1");
    }

    #[test]
    fn ram_csv_uses_first_module() {
        let csv = "\"Manufacturer\",\"PartNumber\",\"Speed\"\r\n\"Kingston\",\"KHX3200C16D4/16GX  \",\"3200\"\r\n\"Kingston\",\"KHX3200C16D4/16GX\",\"3200\"";
        assert_eq!(
            parse_ram_csv(csv).as_deref(),
            Some("Kingston KHX3200C16D4/16GX @ 3200 MHz")
        );
    }

    #[test]
    fn dmidecode_skips_empty_slots() {
        let out = "\
Handle 0x0040, DMI type 17, 92 bytes
Memory Device
\tSize: No Module Installed
\tManufacturer: Not Specified
\tPart Number: Not Specified
\tSpeed: Unknown

Handle 0x0041, DMI type 17, 92 bytes
Memory Device
\tSize: 16 GB
\tManufacturer: Samsung
\tPart Number: M471A2K43DB1-CWE
\tSpeed: 3200 MT/s
\tConfigured Memory Speed: 2933 MT/s
";
        assert_eq!(
            parse_dmidecode_memory(out).as_deref(),
            Some("Samsung M471A2K43DB1-CWE @ 3200 MHz")
        );
    }

    #[test]
    fn dmidecode_treats_vm_filler_as_absent() {
        let vm_only = "\
Handle 0x1100, DMI type 17, 40 bytes
Memory Device
\tSize: 8 GB
\tManufacturer: QEMU
\tPart Number: Not Specified
\tSpeed: Unknown
";
        assert_eq!(parse_dmidecode_memory(vm_only), None);

        let no_speed = "\
Handle 0x1100, DMI type 17, 40 bytes
Memory Device
\tSize: 8 GB
\tManufacturer: Not Specified
\tPart Number: DIMM-8G
\tSpeed: Unknown
";
        assert_eq!(parse_dmidecode_memory(no_speed).as_deref(), Some("DIMM-8G"));
    }

    #[test]
    fn cpuinfo_model_name_is_read() {
        let text = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz\n";
        assert_eq!(
            parse_cpuinfo_model(text).as_deref(),
            Some("Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz")
        );
    }

    #[test]
    fn physical_disks_parse_and_label() {
        let csv = "\"FriendlyName\",\"Size\"\r\n\"WDC WD40EZRZ-00GXCB0\",\"4000000000000\"\r\n\"broken\",\"n/a\"";
        let disks = parse_physical_disks(csv);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].label(), "• WDC WD40EZRZ-00GXCB0 [3.64 TiB (4.0 TB)]");
    }

    #[test]
    fn edid_name_is_decoded() {
        assert_eq!(
            parse_edid_name(&edid_with_name("DELL U2415")).as_deref(),
            Some("DELL U2415")
        );
        assert_eq!(parse_edid_name(&[0u8; 128]), None);
        assert_eq!(parse_edid_name(&[0u8; 16]), None);
    }

    #[test]
    fn rating_is_capped() {
        assert_eq!(hardware_rating(8, 16 * 1024 * 1024 * 1024), 56);
        assert_eq!(hardware_rating(64, 128 * 1024 * 1024 * 1024), 100);
        assert_eq!(hardware_rating(0, 0), 0);
    }

    #[test]
    fn windows_sources_use_registry_and_powershell() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|program, args| {
            let last = args.last().cloned().unwrap_or_default();
            match (program, last.as_str()) {
                ("reg", "ProcessorNameString") => Ok(
                    "    ProcessorNameString    REG_SZ    AMD Ryzen 5 5600X 6-Core Processor".into(),
                ),
                ("reg", "BaseBoardManufacturer") => {
                    Ok("    BaseBoardManufacturer    REG_SZ    System manufacturer".into())
                }
                ("reg", "BaseBoardProduct") => {
                    Ok("    BaseBoardProduct    REG_SZ    System Product Name".into())
                }
                ("reg", "SystemManufacturer") => {
                    Ok("    SystemManufacturer    REG_SZ    Dell Inc.".into())
                }
                ("reg", "SystemProductName") => {
                    Ok("    SystemProductName    REG_SZ    XPS 15 9570".into())
                }
                ("powershell", script) if script.contains("Win32_PhysicalMemory") => Ok(concat!(
                    "\"Manufacturer\",\"PartNumber\",\"Speed\"\r\n",
                    "\"80AD000080AD\",\"HMA81GS6CJR8N-VK\",\"2667\""
                )
                .into()),
                ("powershell", script) if script.contains("Get-PhysicalDisk") => {
                    Ok("\"FriendlyName\",\"Size\"\r\n\"NVMe Samsung 512GB\",\"512110190592\"".into())
                }
                ("powershell", script) if script.contains("WmiMonitorID") => {
                    Ok("LG HDR 4K\r\nDELL P2419H".into())
                }
                (program, _) => Err(CommandError::Empty {
                    program: program.to_string(),
                }),
            }
        });

        let sources = IdentitySources::new(Arc::new(runner), Platform::Windows, "/nonexistent");
        let identity = HardwareIdentity::assemble(
            &sources,
            Some("ignored".into()),
            12,
            32 * 1024 * 1024 * 1024,
        );

        assert_eq!(identity.cpu, "AMD Ryzen 5 5600X 6-Core Processor");
        assert_eq!(identity.board, "Dell Inc. XPS 15 9570");
        assert_eq!(identity.ram, "HMA81GS6CJR8N-VK @ 2667 MHz");
        assert_eq!(identity.monitor, "LG HDR 4K + DELL P2419H");
        assert_eq!(identity.disk_labels(), vec!["• NVMe Samsung 512GB [512.1 GB]"]);
        assert_eq!(identity.rating, 92);
    }

    #[test]
    fn linux_sources_read_sysfs_tree() {
        let root = tempdir().unwrap();
        let path = |rel: &str| root.path().join(rel);

        fs::create_dir_all(path("proc")).unwrap();
        fs::write(path("proc/cpuinfo"), "model name\t: AMD Ryzen 7 PRO 4750U\n").unwrap();

        fs::create_dir_all(path("sys/class/dmi/id")).unwrap();
        fs::write(path("sys/class/dmi/id/board_vendor"), "LENOVO\n").unwrap();
        fs::write(path("sys/class/dmi/id/board_name"), "20UJS00K00\n").unwrap();

        fs::create_dir_all(path("sys/block/nvme0n1/device")).unwrap();
        fs::write(path("sys/block/nvme0n1/size"), "1000215216\n").unwrap();
        fs::write(
            path("sys/block/nvme0n1/device/model"),
            "SAMSUNG MZVLB512HBJQ-000L7  \n",
        )
        .unwrap();
        fs::create_dir_all(path("sys/block/loop0")).unwrap();
        fs::write(path("sys/block/loop0/size"), "2048\n").unwrap();

        fs::create_dir_all(path("sys/class/drm/card0-eDP-1")).unwrap();
        fs::write(path("sys/class/drm/card0-eDP-1/edid"), edid_with_name("LEN40BA")).unwrap();
        fs::create_dir_all(path("sys/class/drm/card0-HDMI-A-1")).unwrap();
        fs::write(path("sys/class/drm/card0-HDMI-A-1/edid"), b"").unwrap();

        let sources = IdentitySources::new(failing_runner(), Platform::Linux, root.path());
        let identity = HardwareIdentity::assemble(&sources, None, 16, 16 * 1024 * 1024 * 1024);

        assert_eq!(identity.cpu, "AMD Ryzen 7 PRO 4750U");
        assert_eq!(identity.board, "LENOVO 20UJS00K00");
        assert_eq!(identity.ram, GENERIC_RAM);
        assert_eq!(identity.monitor, "LEN40BA");
        assert_eq!(
            identity.disks,
            vec![PhysicalDisk {
                name: "SAMSUNG MZVLB512HBJQ-000L7".into(),
                size: 1000215216 * 512,
            }]
        );
    }

    #[test]
    fn everything_missing_yields_placeholders() {
        let sources = IdentitySources::new(failing_runner(), Platform::Other, "/nonexistent");
        let identity = HardwareIdentity::assemble(&sources, Some("   ".into()), 4, 0);

        assert_eq!(identity.cpu, GENERIC_CPU);
        assert_eq!(identity.board, GENERIC_BOARD);
        assert_eq!(identity.ram, GENERIC_RAM);
        assert_eq!(identity.monitor, GENERIC_DISPLAY);
        assert_eq!(identity.disk_labels(), vec![GENERIC_STORAGE.to_string()]);
    }
}
