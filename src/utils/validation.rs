use thiserror::Error;

/// Longest stored filename, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No selected file")]
    EmptyFilename,

    #[error("File type not allowed. Allowed types: {allowed}")]
    DisallowedType { allowed: String },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File size {size} bytes exceeds maximum allowed {max} bytes ({} MB)", .max / 1024 / 1024)]
    FileTooLarge { size: usize, max: usize },
}

/// Returns the lowercased extension of `filename` if it is in `allowed`.
///
/// The extension is whatever follows the last `.`; a name without a dot has none.
pub fn allowed_extension(filename: &str, allowed: &[String]) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    allowed.iter().any(|a| *a == ext).then_some(ext)
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError::FileTooLarge {
            size,
            max: max_size,
        });
    }
    Ok(())
}

/// Rewrites a client-supplied filename into a safe storage key.
///
/// Only ASCII alphanumerics, `-`, `_` and `.` survive; everything else
/// (path separators, whitespace, control and non-ASCII characters) becomes `_`.
/// Leading dots and underscores are stripped so the result is never hidden and
/// never a relative path component.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let replaced: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = replaced.trim_start_matches(['.', '_']);

    if trimmed.is_empty() {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(truncate_keeping_extension(trimmed))
}

// Input is pure ASCII at this point, so byte offsets are char boundaries.
fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() + 1 < MAX_FILENAME_LEN => {
            let keep = MAX_FILENAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => name[..MAX_FILENAME_LEN].to_string(),
    }
}

/// Full validation pipeline for uploaded files; returns the sanitized name.
pub fn validate_upload(
    filename: &str,
    size: usize,
    allowed: &[String],
    max_size: usize,
) -> Result<String, ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    let disallowed = || ValidationError::DisallowedType {
        allowed: allowed.join(", "),
    };

    allowed_extension(filename, allowed).ok_or_else(disallowed)?;

    validate_file_size(size, max_size)?;

    let sanitized = sanitize_filename(filename)?;

    // Sanitizing can eat the stem entirely ("日本.txt" -> "txt").
    allowed_extension(&sanitized, allowed).ok_or_else(disallowed)?;

    Ok(sanitized)
}

/// Checks a name taken from a request path before it is joined onto the
/// storage directory.
pub fn validate_stored_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(ValidationError::InvalidFilename(name.to_string()));
    }
    Ok(())
}
