#[test]
fn bus_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/bus_error_pass.rs");
    t.pass("tests/ui/bus_error_context_roundtrip.rs");
    t.compile_fail("tests/ui/bus_error_tuple_variant.rs");
    t.compile_fail("tests/ui/bus_error_no_context.rs");
    t.compile_fail("tests/ui/bus_error_bad_context_type.rs");
    t.compile_fail("tests/ui/bus_error_duplicate_source.rs");
}
