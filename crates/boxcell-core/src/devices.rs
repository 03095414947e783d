//! The standard character-device table and its provisioning.
//!
//! The major/minor pairs must match the host kernel's device numbering
//! for the nodes to behave correctly.

use std::path::Path;

use boxcell_common::error::Result;

use crate::sys::Syscalls;

/// A single character device to create under the container's `/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Node name under `/dev`.
    pub name: &'static str,
    /// Major device number.
    pub major: u64,
    /// Minor device number.
    pub minor: u64,
}

/// Permission bits applied to every provisioned node.
pub const DEVICE_MODE: u32 = 0o666;

/// The standard devices every container receives.
pub const DEVICE_TABLE: &[DeviceSpec] = &[
    DeviceSpec { name: "null", major: 1, minor: 3 },
    DeviceSpec { name: "zero", major: 1, minor: 5 },
    DeviceSpec { name: "random", major: 1, minor: 8 },
    DeviceSpec { name: "urandom", major: 1, minor: 9 },
    DeviceSpec { name: "console", major: 5, minor: 1 },
    DeviceSpec { name: "tty", major: 5, minor: 0 },
    DeviceSpec { name: "full", major: 1, minor: 7 },
];

/// Creates every [`DEVICE_TABLE`] entry under `<root>/dev`.
///
/// Must run after the `/dev` tmpfs is mounted. The first failing node
/// aborts the remaining entries; nothing is cleaned up.
///
/// # Errors
///
/// Returns [`DeviceCreateFailure`](boxcell_common::error::BoxcellError::DeviceCreateFailure)
/// for the node that could not be created.
pub fn provision_devices(root: &Path, sys: &dyn Syscalls) -> Result<()> {
    let dev_dir = root.join("dev");
    for device in DEVICE_TABLE {
        sys.mknod_char(&dev_dir.join(device.name), DEVICE_MODE, device.major, device.minor)?;
    }
    tracing::debug!(root = %root.display(), count = DEVICE_TABLE.len(), "devices provisioned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::recording::{RecordingSyscalls, SysOp};

    #[test]
    fn provisions_every_table_entry_in_order() {
        let sys = RecordingSyscalls::new();
        let root = Path::new("/tmp/ctr/rootfs");

        provision_devices(root, &sys).expect("provisioning should succeed");

        let ops = sys.ops();
        assert_eq!(ops.len(), DEVICE_TABLE.len());
        for (op, device) in ops.iter().zip(DEVICE_TABLE) {
            assert_eq!(
                *op,
                SysOp::MknodChar {
                    node: root.join("dev").join(device.name),
                    mode: DEVICE_MODE,
                    major: device.major,
                    minor: device.minor,
                }
            );
        }
    }

    #[test]
    fn table_contains_expected_major_minor_pairs() {
        let find = |name: &str| {
            DEVICE_TABLE
                .iter()
                .find(|d| d.name == name)
                .map(|d| (d.major, d.minor))
        };
        assert_eq!(find("null"), Some((1, 3)));
        assert_eq!(find("zero"), Some((1, 5)));
        assert_eq!(find("random"), Some((1, 8)));
        assert_eq!(find("urandom"), Some((1, 9)));
        assert_eq!(find("console"), Some((5, 1)));
        assert_eq!(find("tty"), Some((5, 0)));
        assert_eq!(find("full"), Some((1, 7)));
    }
}
