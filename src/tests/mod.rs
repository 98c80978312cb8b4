//! Integration-style scenario tests exercising the core end-to-end against
//! fake/in-memory collaborators (§8 "End-to-end scenarios (seed the test
//! suite)"), laid out like `src/tests/*_test.rs` for service-level test
//! suites that outgrow a single `#[cfg(test)] mod tests` block.

mod scenarios;
