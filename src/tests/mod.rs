use difference::{Changeset, Difference};
use std::path::PathBuf;
use std::sync::LazyLock;

const REPLACE: Option<&str> = option_env!("REPLACE");

static SNAPSHOT_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/snapshots");
    let _ = std::fs::create_dir_all(&path);
    path
});

pub fn check_snapshot(name: &str, content: &[u8]) {
    let path = SNAPSHOT_PATH.join(format!("{}.txt", name));

    if !path.exists() {
        std::fs::write(&path, content).unwrap();
        panic!("new snapshot created");
    }

    let actual = std::fs::read(&path).unwrap();

    if REPLACE.is_some() && actual != content {
        std::fs::write(&path, content).unwrap();
        panic!("test was replaced");
    }

    let changeset = Changeset::new(
        &String::from_utf8_lossy(content),
        &String::from_utf8_lossy(&actual),
        "\n",
    );

    if changeset.distance != 0 {
        for diff in changeset.diffs {
            match diff {
                Difference::Same(ref x) => {
                    eprintln!(" {}", x);
                }
                Difference::Add(ref x) => {
                    eprintln!("+++++++++++++++++++\n{}\n+++++++++++++++++++", x);
                }
                Difference::Rem(ref x) => {
                    eprintln!("-------------------\n{}\n-------------------", x);
                }
            }
        }
    }

    assert_eq!(changeset.distance, 0);
}
