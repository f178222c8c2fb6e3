//! Purpose: Shared library crate behind the `vitrine-probe` binary and tests.
//! Exports: `error`, `request`, `decode`, `report`.
//! Role: Internal library; the binary wires these together and owns process concerns.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Modules stay pure where possible; only `request` touches the network.
pub mod decode;
pub mod error;
pub mod report;
pub mod request;
