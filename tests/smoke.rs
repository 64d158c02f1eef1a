//! Basic smoke test to verify crate compiles.

#[test]
fn crate_compiles() {
    // If this test runs, the crate skeleton is valid.
    let _ = std::any::type_name::<gatekeeper::GatekeeperConfig>();
    let _ = std::any::type_name::<gatekeeper::GatekeeperError>();
    let _ = std::any::type_name::<gatekeeper::AccessState>();
}
