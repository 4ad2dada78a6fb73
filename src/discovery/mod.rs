// SPDX-License-Identifier: GPL-3.0-only
pub mod audit;
pub mod service;

pub use audit::AuditListener;
pub use service::DiscoveryService;
