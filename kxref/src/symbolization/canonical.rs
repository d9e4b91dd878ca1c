//! Lexical path canonicalization
//!
//! DWARF line programs join the compilation directory with include paths
//! verbatim, so kernel paths routinely look like
//! `/src/linux/./arch/x86/kernel/../include/asm/irq_vectors.h`. This module
//! collapses them without touching the filesystem (no symlink resolution).

/// Canonicalize a path lexically.
///
/// Rules:
/// 1. Duplicate separators collapse to one
/// 2. `.` segments are dropped
/// 3. `..` removes the preceding segment; at the root it is dropped, in a
///    relative path with nothing left to remove it is kept
/// 4. A trailing separator is removed (except for the root itself)
/// 5. An empty result becomes `.`
///
/// Applying it twice yields the same result as applying it once.
#[must_use]
pub fn canonicalize_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
