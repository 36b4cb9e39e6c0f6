use htstree::model::{EscapeTables, FeatureDefinition, ModelType, TreeSet};
use htstree::search::NO_LEAF;
use htstree::tree_file::ReadStrategy;
use htstree::{LoadError, TreeFiles, load_tree_set, load_tree_set_legacy};
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;
use tempfile::TempDir;

const GENDER_TREE: &str = "{*}[2]\n{\n 0 gender=male \"x_s2_12\" \"x_s2_7\"\n}\n";

const LEGACY_TREE: &str = r#"QS Q-gender { "m_","male_" }
{*}[2]
{
   0 Q-gender "x_s2_12" "x_s2_7"
}
{*}[3]
{
}
"#;

fn features() -> FeatureDefinition {
    FeatureDefinition::new().with_byte_feature("gender", &["female", "male"])
}

/// Writes one tree file per given model type and a `trees.toml` naming them.
fn voice_dir(content: &str, model_types: &[ModelType]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut config = String::from("read_strategy = \"buffered\"\n");
    for model_type in model_types {
        let file = format!("tree-{model_type}.inf");
        fs::write(dir.path().join(&file), content).unwrap();
        config.push_str(&format!("{model_type} = \"{file}\"\n"));
    }
    fs::write(dir.path().join("trees.toml"), config).unwrap();
    dir
}

fn config_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("trees.toml")
}

#[test]
fn test_load_legacy_from_config() {
    let dir = voice_dir(LEGACY_TREE, &[ModelType::Dur, ModelType::Lf0, ModelType::Mcp, ModelType::Str]);
    let set = load_tree_set_legacy(config_path(&dir)).unwrap();

    for model_type in ModelType::iter() {
        let expected = if model_type == ModelType::Mag { 0 } else { 2 };
        assert_eq!(set.num_trees(model_type), expected, "{model_type}");
    }
    assert_eq!(set.search_state_legacy(ModelType::Str, 2, "male_1"), 7);
    assert_eq!(set.search_state_legacy(ModelType::Str, 2, "f_1"), 12);
    // state 3 has an empty tree, state 5 has none
    assert_eq!(set.search_state_legacy(ModelType::Dur, 3, "male_1"), NO_LEAF);
    assert_eq!(set.search_state_legacy(ModelType::Dur, 5, "male_1"), NO_LEAF);
    assert_eq!(set.search_state_legacy(ModelType::Mag, 2, "male_1"), NO_LEAF);
    assert!(set.find_question(ModelType::Mcp, "Q-gender").is_ok());
}

#[test]
fn test_load_primary() {
    let dir = voice_dir(GENDER_TREE, &[ModelType::Dur, ModelType::Lf0, ModelType::Mcp]);
    let files = TreeFiles::from_file(config_path(&dir)).unwrap();
    let features = features();
    let set = load_tree_set(&files, &features, &EscapeTables::default()).unwrap();

    let male = features.encode(&[("gender", "male")]).unwrap();
    let female = features.encode(&[("gender", "female")]).unwrap();
    assert_eq!(set.search_state(ModelType::Lf0, 2, &male), 7);
    assert_eq!(set.search_state(ModelType::Mcp, 2, &female), 12);
    assert!(!set.is_loaded(ModelType::Str));
}

#[test]
fn test_missing_required_type() {
    let dir = voice_dir(LEGACY_TREE, &[ModelType::Dur, ModelType::Mcp]);
    let err = load_tree_set_legacy(config_path(&dir)).unwrap_err();
    assert!(matches!(err, LoadError::MissingRequired(ModelType::Lf0)));
}

#[test]
fn test_configured_optional_file_must_exist() {
    let dir = voice_dir(LEGACY_TREE, &[ModelType::Dur, ModelType::Lf0, ModelType::Mcp]);
    let files = TreeFiles::from_file(config_path(&dir))
        .unwrap()
        .with_path(ModelType::Mag, dir.path().join("missing.inf"));

    let err = TreeSet::new().load_legacy(&files).unwrap_err();
    match err {
        LoadError::Io { path, .. } => assert!(path.ends_with("missing.inf")),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_zero_trees_is_fatal() {
    let dir = voice_dir("QS Q-gender { \"m_\" }\n", &[ModelType::Dur, ModelType::Lf0, ModelType::Mcp]);
    let err = load_tree_set_legacy(config_path(&dir)).unwrap_err();
    match err {
        LoadError::Parse {
            model_type, source, ..
        } => {
            assert_eq!(model_type, ModelType::Dur);
            assert_eq!(source.kind(), &htstree::parser::ParsingErrorType::NoTrees);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trees.toml");
    fs::write(&path, "dur = 3\n").unwrap();
    assert!(matches!(load_tree_set_legacy(&path), Err(LoadError::Config(_))));
    assert!(matches!(
        load_tree_set_legacy(Path::new("no/such/trees.toml")),
        Err(LoadError::Io { .. })
    ));
}

#[test]
fn test_reload_replaces_family() {
    let dir = voice_dir(LEGACY_TREE, &[ModelType::Dur]);
    let other = dir.path().join("other.inf");
    fs::write(&other, "QS Q-a { \"a\" }\n{*}[4]\n{\n 0 Q-a \"x_1\" \"x_2\"\n}\n").unwrap();

    let mut set = TreeSet::new();
    let first = dir.path().join("tree-dur.inf");
    set.load_model_type_legacy(ModelType::Dur, &first, ReadStrategy::InMemory)
        .unwrap();
    set.load_model_type_legacy(ModelType::Dur, &other, ReadStrategy::InMemory)
        .unwrap();

    assert_eq!(set.num_trees(ModelType::Dur), 1);
    assert_eq!(set.questions(ModelType::Dur).len(), 1);
    assert_eq!(set.search_state_legacy(ModelType::Dur, 4, "a"), 2);
}

#[test]
fn test_concurrent_search_on_shared_set() {
    let dir = voice_dir(GENDER_TREE, &[ModelType::Dur, ModelType::Lf0, ModelType::Mcp]);
    let files = TreeFiles::from_file(config_path(&dir)).unwrap();
    let features = features();
    let set = load_tree_set(&files, &features, &EscapeTables::default()).unwrap();
    let male = features.encode(&[("gender", "male")]).unwrap();

    std::thread::scope(|scope| {
        for model_type in [ModelType::Dur, ModelType::Lf0, ModelType::Mcp] {
            let set = &set;
            let male = &male;
            scope.spawn(move || {
                for _ in 0..1000 {
                    assert_eq!(set.search_state(model_type, 2, male), 7);
                }
            });
        }
    });
}
