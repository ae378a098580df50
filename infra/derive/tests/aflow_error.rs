#[test]
fn aflow_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/aflow_error_pass.rs");
    t.pass("tests/ui/aflow_error_context.rs");
}
