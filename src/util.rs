use std::path::{Path, PathBuf};

/// `song.mid` -> `<dir>/song<suffix>.<extension>`, `dir` being `out_dir` or the input's directory.
pub fn output_path(
    input: &Path,
    out_dir: Option<&Path>,
    suffix: &str,
    extension: &str,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    dir.join(format!("{}{}.{}", stem, suffix, extension))
}

pub fn sample_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    output_path(input, out_dir, "_sample", "mid")
}

pub fn encoded_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    output_path(input, out_dir, "_encoded", "json")
}
