use logbook::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../logbook.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.llm.min_activity_codes <= cfg.llm.max_activity_codes);
    assert_eq!(cfg.llm.max_activity_codes, 6);
    assert_eq!(cfg.sheets.template_sheet, "log2");
    assert!(!cfg.paths.out_dir.is_empty());
}

#[test]
fn partial_config_keeps_defaults() {
    let cfg: Config = toml::from_str("[llm]\nmodel = \"llama3\"\n").expect("parse TOML");
    assert_eq!(cfg.llm.model, "llama3");
    assert_eq!(cfg.llm.host, "http://localhost:11434");
    assert_eq!(cfg.llm.timeout_seconds, 300);
    assert_eq!(cfg.sheets.final_sheet, "log");
    assert_eq!(cfg.output.preview_filename_for(7), "log_book_preview_7.xlsx");
}
