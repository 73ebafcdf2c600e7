//! Raw writes to block devices.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::knowledge::DangerLevel;
use crate::shell::PipelineStage;

use super::Warning;

static BLOCK_DEVICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/dev/(sd[a-z]|hd[a-z]|vd[a-z]|xvd[a-z]|nvme\d|mmcblk\d|disk\d|md\d|dm-\d)")
        .expect("Invalid block device regex")
});

/// `dd of=/dev/sdX`.
pub fn check_dd(stage: &PipelineStage) -> Option<Warning> {
    if stage.command != "dd" {
        return None;
    }
    stage
        .args()
        .into_iter()
        .filter_map(|arg| arg.strip_prefix("of="))
        .find(|target| BLOCK_DEVICE.is_match(target))
        .map(|device| {
            Warning::new(
                "disk.dd_device",
                DangerLevel::Critical,
                format!("dd writing to block device {device} overwrites everything on it."),
            )
        })
}

/// `mkfs` and `mkfs.<type>`.
pub fn check_mkfs(stage: &PipelineStage) -> Option<Warning> {
    if stage.command != "mkfs" && !stage.command.starts_with("mkfs.") {
        return None;
    }
    let target = stage
        .args()
        .into_iter()
        .rev()
        .find(|a| !a.starts_with('-'))
        .unwrap_or("the target device");
    Some(Warning::new(
        "disk.mkfs",
        DangerLevel::Critical,
        format!("{} formats {target}, erasing all data on it.", stage.command),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parse_pipeline;

    fn stage(input: &str) -> PipelineStage {
        parse_pipeline(input).unwrap().stages.remove(0)
    }

    #[test]
    fn test_dd_to_disk() {
        let warning = check_dd(&stage("dd if=image.iso of=/dev/sdb bs=4M")).unwrap();
        assert!(warning.message.contains("/dev/sdb"));
        assert!(check_dd(&stage("dd if=/dev/zero of=/dev/nvme0n1")).is_some());
    }

    #[test]
    fn test_dd_to_file() {
        assert!(check_dd(&stage("dd if=/dev/zero of=disk.img bs=1M count=10")).is_none());
        assert!(check_dd(&stage("dd if=/dev/sda of=backup.img")).is_none());
    }

    #[test]
    fn test_mkfs() {
        let warning = check_mkfs(&stage("mkfs.ext4 -L data /dev/sdc1")).unwrap();
        assert!(warning.message.contains("/dev/sdc1"));
        assert!(check_mkfs(&stage("mkfs -t xfs /dev/vdb")).is_some());
        assert!(check_mkfs(&stage("mkdir x")).is_none());
    }
}
