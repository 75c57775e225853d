use std::fs;

use tempfile::tempdir;

use super::*;

#[test]
fn defaults_are_sensible() {
    let config = Config::default();
    assert!(config.generate_map);
    assert!(!config.generate_map_include_sources);
    assert!(config.compile_on_watch);
    assert_eq!(config.exclude, vec!["**/node_modules/**".to_string()]);
    assert_eq!(config.autoprefix, AutoprefixSetting::Disabled);
    assert_eq!(config.effective_formats().len(), 1);
    assert_eq!(config.effective_formats()[0].extension, ".css");
}

#[test]
fn parses_full_config() {
    let toml = r#"
include = ["styles/**/*.scss"]
exclude = ["**/vendor/**"]
partials = ["**/imports/**"]
generate_map = false
autoprefix = ["defaults", "ie 11"]
force_base_directory = "/src"
root_is_workspace = true

[path_aliases]
"mylib" = "/node_modules/mylib"
"mylib/colors" = "/node_modules/mylib/dist/colors"

[[formats]]
extension = ".min.css"
style = "compressed"
save_path = "~/dist"

[[formats.replacements]]
search = "/src/"
replace = "/out/"
"#;
    let dir = tempdir().unwrap();
    let path = dir.path().join("livesass.toml");
    fs::write(&path, toml).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.include, vec!["styles/**/*.scss"]);
    assert!(!config.generate_map);
    assert_eq!(
        config.autoprefix,
        AutoprefixSetting::Targets(vec!["defaults".into(), "ie 11".into()])
    );
    assert!(config.root_is_workspace);
    assert_eq!(config.path_aliases.len(), 2);

    let format = &config.formats[0];
    assert_eq!(format.extension, ".min.css");
    assert_eq!(format.style, OutputStyle::Compressed);
    assert_eq!(format.save_path.as_deref(), Some("~/dist"));
    assert_eq!(format.replacements.len(), 1);
    assert_eq!(format.replacements[0].search, "/src/");
}

#[test]
fn autoprefix_accepts_bool_forms() {
    let on: Config = toml::from_str("autoprefix = true").unwrap();
    assert_eq!(on.autoprefix, AutoprefixSetting::Discover);

    let off: Config = toml::from_str("autoprefix = false").unwrap();
    assert_eq!(off.autoprefix, AutoprefixSetting::Disabled);
    assert!(!off.autoprefix.is_enabled());
}

#[test]
fn non_string_replacement_survives_parsing() {
    // The bad value must be reported when planning that format, not here.
    let toml = r#"
[[formats]]
[[formats.replacements]]
search = "/src/"
replace = 42
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert!(config.formats[0].replacements[0].replace.as_str().is_none());
}

#[test]
fn unknown_keys_produce_warnings_with_suggestions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("livesass.toml");
    fs::write(&path, "generate_mpa = true\n").unwrap();

    let (_, warnings) = load_with_warnings(&path).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "generate_mpa");
    assert_eq!(warnings[0].line, Some(1));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("generate_map"));
}

#[test]
fn include_patterns_fall_back_to_defaults() {
    let config = Config::default();
    assert_eq!(config.include_patterns(), vec!["**/*.sass", "**/*.scss"]);
}

#[test]
fn include_patterns_carry_partials_when_configured() {
    let config = Config {
        include: vec!["styles/**/*.scss".into()],
        partials: vec!["**/imports/**".into()],
        ..Config::default()
    };
    assert_eq!(
        config.include_patterns(),
        vec!["styles/**/*.scss", "**/imports/**"]
    );
}

#[test]
fn per_format_map_override_beats_global() {
    let config = Config {
        generate_map: true,
        ..Config::default()
    };
    let format = FormatSpec {
        generate_map: Some(false),
        ..FormatSpec::default()
    };
    assert!(!config.map_enabled(&format));
    assert!(config.map_enabled(&FormatSpec::default()));
}

#[test]
fn effective_base_requires_existing_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/styles")).unwrap();

    let config = Config {
        force_base_directory: Some("/src/styles".into()),
        ..Config::default()
    };
    assert_eq!(
        config.effective_base(dir.path()).unwrap(),
        dir.path().join("src/styles")
    );

    let bad = Config {
        force_base_directory: Some("/missing".into()),
        ..Config::default()
    };
    assert!(bad.effective_base(dir.path()).is_err());
}

#[test]
fn load_or_default_reads_project_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("livesass.toml"), "generate_map = false\n").unwrap();

    let config = load_or_default(Some(dir.path()));
    assert!(!config.generate_map);
}
