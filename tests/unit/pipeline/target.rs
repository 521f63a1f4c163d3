use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "{}").unwrap();
}

#[test]
fn args_select_the_target_kind() {
    let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    assert_eq!(Target::from_args(&s(&["all"])).unwrap(), Target::All);
    assert_eq!(
        Target::from_args(&s(&["data/x.json"])).unwrap(),
        Target::Single(PathBuf::from("data/x.json"))
    );
    assert_eq!(
        Target::from_args(&s(&["2020-01-01", "2020-12-31"])).unwrap(),
        Target::Range("2020-01-01".into(), "2020-12-31".into())
    );
    assert!(Target::from_args(&[]).is_err());
    assert!(Target::from_args(&s(&["a", "b", "c"])).is_err());
}

#[test]
fn all_walks_breadth_first_in_name_order() {
    let root = scratch("unit_pipeline_target_all");
    touch(&root.join("b.json"));
    touch(&root.join("2019/z.json"));
    touch(&root.join("a.json"));
    touch(&root.join("2018/y.json"));
    touch(&root.join("2018/deep/x.json"));

    let names = Target::All
        .files(&root)
        .unwrap()
        .iter()
        .map(|p| file_name(p))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a.json", "b.json", "y.json", "z.json", "x.json"]);
}

#[test]
fn range_compares_file_names_inclusively() {
    let root = scratch("unit_pipeline_target_range");
    for name in [
        "2020-01-01.json",
        "2020-01-02.json",
        "2020-01-03.json",
        "2020-01-04.json",
    ] {
        touch(&root.join("2020").join(name));
    }
    let files = Target::Range("2020-01-02".into(), "2020-01-03.json".into())
        .files(&root)
        .unwrap();
    let names = files.iter().map(|p| file_name(p)).collect::<Vec<_>>();
    assert_eq!(names, vec!["2020-01-02.json", "2020-01-03.json"]);
}

#[test]
fn single_target_must_exist() {
    let err = Target::Single(PathBuf::from("target/nope/missing.json"))
        .files(Path::new("."))
        .unwrap_err();
    assert!(err.to_string().contains("is not a file"));
}

#[test]
fn source_date_is_the_file_name_prefix() {
    assert_eq!(
        source_date(Path::new("data/2021/2021-03-04-extra.json")),
        "2021-03-04"
    );
    assert_eq!(source_date(Path::new("short.json")), "short.json");
}
