//! Avatar catalogue
//!
//! Stock avatars live on disk under `WF_AVATARS_DIR` (optionally grouped in
//! sub-directories) and are served statically under `WF_AVATARS_URL_PREFIX`.

use std::io;
use std::path::Path;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

// RFC 3986 unreserved characters stay literal
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "avif"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn walk(dir: &Path, relative: &mut Vec<String>, out: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // dotfiles include editor droppings and .DS_Store
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            relative.push(name);
            walk(&path, relative, out)?;
            relative.pop();
        } else if file_type.is_file() && is_image(&path) {
            let mut parts = relative.clone();
            parts.push(name);
            out.push(parts.join("/"));
        }
    }
    Ok(())
}

/// Every image under `root` as a URL below `prefix`, sorted.
/// A missing root yields an empty list.
pub fn list_avatar_urls(root: &Path, prefix: &str) -> io::Result<Vec<String>> {
    if !root.is_dir() {
        warn!("Avatar directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    walk(root, &mut Vec::new(), &mut files)?;
    files.sort();

    let prefix = prefix.trim_end_matches('/');
    Ok(files
        .iter()
        .map(|f| format!("{}/{}", prefix, encode_path(f)))
        .collect())
}

fn encode_path(relative: &str) -> String {
    relative
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
