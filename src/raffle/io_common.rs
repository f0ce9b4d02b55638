use std::path::{Path, PathBuf};

use crate::raffle::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The content type a browser would declare for this file, based on its extension.
pub fn declared_content_type(path: &str) -> String {
    let is_csv = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        mime::TEXT_CSV.to_string()
    } else {
        mime::APPLICATION_OCTET_STREAM.to_string()
    }
}

pub fn file_upload(path: &str) -> FileUpload {
    FileUpload::new(&simplify_file_name(path), &declared_content_type(path))
}

/// Resolves a path from the configuration file against the directory of that file.
pub fn resolve_path(root: Option<&Path>, path: &str) -> String {
    match root {
        Some(r) if Path::new(path).is_relative() => {
            let p: PathBuf = [r, Path::new(path)].iter().collect();
            p.display().to_string()
        }
        _ => path.to_string(),
    }
}

pub fn write_artifact(dir: &str, artifact: &ExportArtifact) -> RaffleResult<String> {
    fs::create_dir_all(dir).context(WritingOutputSnafu { path: dir })?;
    let p: PathBuf = [dir, artifact.file_name.as_str()].iter().collect();
    let path = p.display().to_string();
    info!("Writing {:?} to {:?}", artifact.kind, path);
    fs::write(&p, artifact.content.as_bytes()).context(WritingOutputSnafu { path: path.clone() })?;
    Ok(path)
}
