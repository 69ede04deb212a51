//! 路径模式与缓冲模式的端到端检测

use std::path::{Path, PathBuf};

use pericmd_detect_core::{
    detect, DetectionRequest, Detector, FrameworkProfile, Reason, RequestError, STATUS_BAD_REQUEST, STATUS_OK,
};

const PERICMD_SCRIPT: &str = "#!/usr/bin/perl\n\nuse strict;\nuse Perinci::CmdLine::Any;\n\nPerinci::CmdLine::Any->new(url => '/main/app')->run;\n";

fn target_detector() -> Detector {
    let profile = FrameworkProfile::new("Target::Framework", "perl").with_variants(["Any", "Lite"]);
    Detector::new(profile).unwrap()
}

fn write_script(dir: &Path, name: &str, content: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    set_mode(&path, mode);
    path
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

#[test]
fn both_or_neither_input_is_a_request_error() {
    let d = target_detector();
    let both = DetectionRequest { file_path: Some("/nonexistent".into()), content: Some(b"#!".to_vec()), ..Default::default() };
    assert_eq!(d.detect(&both), Err(RequestError::Ambiguous));
    assert_eq!(d.detect(&DetectionRequest::default()), Err(RequestError::Missing));

    let result = d.run(&both);
    assert_eq!(result.status, STATUS_BAD_REQUEST);
    assert!(!result.is_match);
    assert!(result.is_request_error());
}

#[test]
fn perl_script_using_framework_matches() {
    let d = target_detector();
    let v = d
        .detect(&DetectionRequest::content("#!/usr/bin/perl\nuse Target::Framework;\n$app->run;\n"))
        .unwrap();
    assert!(v.is_match);
    assert_eq!(v.module.as_deref(), Some("Target::Framework"));
    assert!(!v.reason.to_string().is_empty());
}

#[test]
fn suppression_directive_beats_later_signature() {
    let d = target_detector();
    let v = d
        .detect(&DetectionRequest::content(
            "#!/usr/bin/perl\n# NO_TARGET_FRAMEWORK_SCRIPT\nuse Target::Framework;\n",
        ))
        .unwrap();
    assert!(!v.is_match);
    assert_eq!(v.reason, Reason::Suppressed { directive: "NO_TARGET_FRAMEWORK_SCRIPT".into() });
    assert_eq!(v.reason.to_string(), "explicitly marked as excluded via directive");
}

#[test]
fn missing_statement_is_reported() {
    let d = target_detector();
    let v = d
        .detect(&DetectionRequest::content("#!/usr/bin/perl\nuse Getopt::Long;\nrequire Target::Other;\n"))
        .unwrap();
    assert!(!v.is_match);
    assert_eq!(v.reason.to_string(), "no statement invoking the expected framework found");
}

#[test]
fn empty_and_non_shebang_content_fail_first_content_check() {
    let d = target_detector();
    for content in ["", "#", "use Target::Framework;\n", " #!/usr/bin/perl\n"] {
        let v = d.detect(&DetectionRequest::content(content)).unwrap();
        assert_eq!(v.reason, Reason::NoShebang, "content: {content:?}");
        assert_eq!(v.reason.to_string(), "does not start with a shebang sequence");
    }
}

#[test]
fn sh_shebang_is_interpreter_mismatch() {
    let v = target_detector()
        .detect(&DetectionRequest::content("#!/bin/sh\nuse Target::Framework;\n"))
        .unwrap();
    assert!(matches!(v.reason, Reason::InterpreterMismatch { .. }));
    assert!(v.reason.to_string().starts_with("shebang line does not name the expected interpreter"));
}

#[test]
fn default_detect_uses_pericmd_profile() {
    let result = detect(&DetectionRequest::content(PERICMD_SCRIPT));
    assert_eq!(result.status, STATUS_OK);
    assert!(result.is_match);
    assert_eq!(result.module.as_deref(), Some("Perinci::CmdLine::Any"));

    let result = detect(&DetectionRequest::content("#!/usr/bin/perl\n# NO_PERINCI_CMDLINE_SCRIPT\nuse Perinci::CmdLine;\n"));
    assert!(!result.is_match);
}

#[test]
fn path_mode_missing_file_and_directory_are_not_files() {
    let dir = tempfile::tempdir().unwrap();
    let d = target_detector();
    let missing = d.detect(&DetectionRequest::path(dir.path().join("missing"))).unwrap();
    assert_eq!(missing.reason, Reason::NotAFile);
    let directory = d.detect(&DetectionRequest::path(dir.path())).unwrap();
    assert_eq!(directory.reason, Reason::NotAFile);
    assert_eq!(directory.reason.to_string(), "not a file");
}

#[test]
fn path_mode_reads_whole_file_after_shebang_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let mut content = String::from("#!/usr/bin/env perl\n");
    for i in 0..2000 {
        content.push_str(&format!("my $v{i} = {i};\n"));
    }
    content.push_str("require Target::Framework::Lite;\n");
    let path = write_script(dir.path(), "long", &content, 0o755);

    let v = target_detector().detect(&DetectionRequest::path(&path)).unwrap();
    assert!(v.is_match);
    assert_eq!(v.module.as_deref(), Some("Target::Framework::Lite"));
}

#[test]
fn path_mode_zero_length_file_has_no_shebang() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "empty", "", 0o755);
    let v = target_detector().detect(&DetectionRequest::path(&path)).unwrap();
    assert_eq!(v.reason, Reason::NoShebang);
}

#[cfg(unix)]
#[test]
fn executable_flag_only_matters_for_non_executable_files() {
    let dir = tempfile::tempdir().unwrap();
    let script = "#!/usr/bin/perl\nuse Target::Framework;\n";
    let plain = write_script(dir.path(), "plain", script, 0o644);
    let exec = write_script(dir.path(), "exec", script, 0o755);
    let d = target_detector();

    let v = d.detect(&DetectionRequest::path(&plain).include_noexec(false)).unwrap();
    assert_eq!(v.reason, Reason::NotExecutable);
    assert!(d.detect(&DetectionRequest::path(&plain).include_noexec(true)).unwrap().is_match);

    assert!(d.detect(&DetectionRequest::path(&exec).include_noexec(false)).unwrap().is_match);
    assert!(d.detect(&DetectionRequest::path(&exec).include_noexec(true)).unwrap().is_match);

    // 缓冲模式不受影响
    let buf = DetectionRequest::content(script);
    assert_eq!(
        d.detect(&buf.clone().include_noexec(false)).unwrap(),
        d.detect(&buf.include_noexec(true)).unwrap()
    );
}

#[test]
fn path_mode_does_not_modify_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(dir.path(), "app", PERICMD_SCRIPT, 0o755);
    let before = std::fs::read(&path).unwrap();
    let first = detect(&DetectionRequest::path(&path));
    let second = detect(&DetectionRequest::path(&path));
    assert_eq!(first, second);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn wrapper_is_followed_one_level_only() {
    let dir = tempfile::tempdir().unwrap();
    let d = Detector::new(FrameworkProfile::default()).unwrap();

    let real = write_script(dir.path(), "real-app", PERICMD_SCRIPT, 0o755);
    let wrapper = format!("#!/bin/sh\n# WRAPPED_PERINCI_CMDLINE_SCRIPT: {}\nexec real-app \"$@\"\n", real.display());

    let v = d.detect(&DetectionRequest::content(wrapper.as_str()).detect_wrapper(true)).unwrap();
    assert!(v.is_match);
    assert_eq!(v.wrapped_program.as_deref(), Some(real.as_path()));
    assert_eq!(v.module.as_deref(), Some("Perinci::CmdLine::Any"));

    // 被包装程序自身的包装指令不再跟随
    let inner_wrapper = format!("#!/bin/sh\n# WRAPPED_PERINCI_CMDLINE_SCRIPT: {}\n", real.display());
    let middle = write_script(dir.path(), "middle", &inner_wrapper, 0o755);
    let outer = format!("#!/bin/sh\n# WRAPPED_PERINCI_CMDLINE_SCRIPT: {}\n", middle.display());
    let v = d.detect(&DetectionRequest::content(outer.as_str()).detect_wrapper(true)).unwrap();
    assert!(!v.is_match);
    match v.reason {
        Reason::Wraps { inner, .. } => assert!(matches!(*inner, Reason::InterpreterMismatch { .. })),
        other => panic!("unexpected reason: {other:?}"),
    }
}
