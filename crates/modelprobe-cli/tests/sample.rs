use anyhow::Result;
use modelprobe_cli::assets;
use modelprobe_cli::runner::SampleRunner;
use modelprobe_core::SessionConfig;

#[test]
fn repeated_loads_are_byte_identical() -> Result<()> {
    assert_eq!(assets::packaged_model(), assets::packaged_model());
    assert_eq!(assets::packaged_input()?, assets::packaged_input()?);

    let first = SampleRunner::initialize()?;
    let second = SampleRunner::initialize()?;
    assert_eq!(first.model_bytes(), second.model_bytes());
    assert_eq!(
        first.input_views()[0].1.as_f32s()?,
        second.input_views()[0].1.as_f32s()?
    );
    Ok(())
}

#[test]
fn every_input_view_fits_the_pinned_buffer() -> Result<()> {
    let runner = SampleRunner::initialize()?;
    let buffer_elements = assets::packaged_input()?.len();
    for (_, view) in runner.input_views() {
        assert!(view.numel() <= buffer_elements);
    }
    Ok(())
}

#[test]
fn oversized_input_shape_fails_initialization() {
    // 10 floats cannot back the model's declared 1x3x16x16 input
    let err = SampleRunner::with_artifacts(assets::packaged_model(), vec![0.0; 10], None)
        .err()
        .expect("initialization must fail");
    assert!(err.to_string().contains("pinned buffer"));
}

#[test]
fn execute_yields_one_output_per_declared_name_in_order() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    let outputs = runner.run_once()?;

    assert_eq!(outputs.len(), runner.output_names().len());
    for ((name, _), declared) in outputs.iter().zip(runner.output_names()) {
        assert_eq!(name, declared);
    }
    Ok(())
}

#[test]
fn identity_output_echoes_the_packaged_input() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    let expected = runner.input_views()[0].1.as_f32s()?;
    let outputs = runner.run_once()?;
    assert_eq!(outputs[0].1.as_f32s()?, expected);
    Ok(())
}

#[test]
fn repeated_executes_on_one_session_are_deterministic() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    let first = runner.run_once()?;
    let second = runner.run_once()?;
    assert_eq!(first.len(), second.len());
    for ((_, a), (_, b)) in first.iter().zip(&second) {
        assert_eq!(a.data, b.data);
    }
    Ok(())
}

#[test]
fn execute_prints_a_header_and_shaped_values() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    let mut printed = Vec::new();
    runner.execute_into(&mut printed)?;

    let printed = String::from_utf8(printed)?;
    assert!(printed.starts_with("Output for output\n"));
    assert!(printed.contains('['));
    Ok(())
}

#[test]
fn dispose_twice_is_a_no_op() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    runner.dispose();
    runner.dispose();

    let err = runner.run_once().unwrap_err();
    assert!(err.to_string().contains("disposed"));
    Ok(())
}

#[test]
fn session_can_be_rebuilt_with_options() -> Result<()> {
    let mut runner = SampleRunner::initialize()?;
    runner.create_session(Some(SessionConfig::default().with_log_id("rebuilt")))?;
    let outputs = runner.run_once()?;
    assert_eq!(outputs.len(), 1);
    Ok(())
}
