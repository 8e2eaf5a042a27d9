use std::path::PathBuf;

use editsync::config::{ConfigFlags, load_config_flags, parse_flag_tokens};
use editsync::model::{BracketPairHighlight, ConfigurationSnapshot, IndentOption, Rgb};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".editsyncrc");
    let content = r"
# comment
--no-wrap-lines

--theme nord

--indent=spaces:2 --tab-width 2
--debug-log=cycles.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert_eq!(flags.wrap_lines, Some(false));
    assert_eq!(flags.theme.as_deref(), Some("nord"));
    assert_eq!(flags.indent, Some(IndentOption::Spaces { count: 2 }));
    assert_eq!(flags.tab_width, Some(2));
    assert_eq!(flags.debug_log, Some(PathBuf::from("cycles.log")));
}

#[test]
fn test_missing_config_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".editsyncrc");
    let content = "--read-only\n--theme light\n--debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "editsync".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--system-cursor".to_string(),
        "session.json".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert_eq!(effective.editable, Some(false), "file flags should remain");
    assert_eq!(effective.system_cursor, Some(true), "cli flags should be applied");
    assert_eq!(effective.theme.as_deref(), Some("dark"), "cli should override theme");
    assert_eq!(
        effective.debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_effective_flags_build_snapshot() {
    let args = vec![
        "--font=Iosevka".to_string(),
        "--font-size=14".to_string(),
        "--bracket-highlight".to_string(),
        "bordered:#102030".to_string(),
        "--no-theme-background".to_string(),
    ];
    let snapshot = parse_flag_tokens(&args).snapshot();
    assert_eq!(snapshot.font.family, "Iosevka");
    assert!((snapshot.font.size - 14.0).abs() < f64::EPSILON);
    assert_eq!(
        snapshot.bracket_pair_highlight,
        Some(BracketPairHighlight::Bordered {
            color: Rgb::new(0x10, 0x20, 0x30)
        })
    );
    assert!(!snapshot.use_theme_background);
    assert_eq!(snapshot.tab_width, ConfigurationSnapshot::default().tab_width);
}

#[test]
fn test_later_token_wins_within_one_source() {
    let args = vec![
        "--wrap-lines".to_string(),
        "--no-wrap-lines".to_string(),
        "--tab-width=2".to_string(),
        "--tab-width=3".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.wrap_lines, Some(false));
    assert_eq!(flags.tab_width, Some(3));
}
