//! # boxcell-core
//!
//! Low-level Linux isolation primitives for the boxcell runtime.
//!
//! This crate provides:
//! - **Kernel operations**: a narrow [`sys::Syscalls`] capability wrapping
//!   every privileged syscall the setup sequence needs, with a native
//!   implementation and a recording one for tests.
//! - **Mount sequencing**: the fixed, order-sensitive mount list that turns
//!   a bare root directory into a bootable-looking tree.
//! - **Devices**: the standard character-device table and its provisioning.
//! - **Cgroups v1**: per-container CPU and memory cgroup assignment.
//! - **Root switching**: `pivot_root(2)` and `chroot(2)` variants.
//! - **Namespaces**: isolation-level to clone/unshare flag mapping.

pub mod cgroup;
pub mod devices;
pub mod filesystem;
pub mod namespace;
pub mod sys;
