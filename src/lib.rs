// Audit-log field verification harness
//
// Drives a management server into a state where exactly one write is audited,
// then reads the record back from the audit file and from a syslog listener
// and checks its fields.

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod model;
pub mod scenario;
pub mod server;
pub mod setup;
pub mod syslog;
pub mod timeout;
