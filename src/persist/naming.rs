//! Directory names derived from labels and page titles

/// Characters that cannot appear in a folder name on common filesystems
const UNSAFE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

const TOWN_PREFIX: &str = "Town of ";
const STATE_SUFFIX: &str = ", MA";

/// Turns a page title into a folder name
///
/// Code-library titles repeat the municipality, as in
/// `"Town of Acton, MA Town of Acton, MA - Zoning Bylaw"`; the first copy of
/// such a repeat is dropped. Filesystem-unsafe characters are removed and
/// the result is trimmed.
///
/// # Examples
///
/// ```
/// use doc_harvest::persist::sanitize_folder_name;
///
/// assert_eq!(
///     sanitize_folder_name("Town of Acton, MA Town of Acton, MA - Zoning: Bylaw"),
///     "Town of Acton, MA - Zoning Bylaw"
/// );
/// ```
pub fn sanitize_folder_name(title: &str) -> String {
    let deduplicated = collapse_repeated_town(title);
    deduplicated
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Drops a `"Town of X, MA"` phrase when the same phrase follows it after
/// one space
fn collapse_repeated_town(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut rest = title;

    while let Some(start) = rest.find(TOWN_PREFIX) {
        let candidate = &rest[start..];
        match repeated_phrase_len(candidate) {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len..];
            }
            None => {
                let skip = start + TOWN_PREFIX.len();
                out.push_str(&rest[..skip]);
                rest = &rest[skip..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Length of the leading `"Town of X, MA"` phrase if it is immediately
/// repeated; the longest such phrase wins
fn repeated_phrase_len(candidate: &str) -> Option<usize> {
    let ends: Vec<usize> = candidate
        .match_indices(STATE_SUFFIX)
        .map(|(index, _)| index + STATE_SUFFIX.len())
        .collect();

    ends.into_iter().rev().find(|&end| {
        let phrase = &candidate[..end];
        let name = &phrase[TOWN_PREFIX.len()..end - STATE_SUFFIX.len()];
        let plain_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace());

        plain_name
            && candidate[end..]
                .strip_prefix(' ')
                .map(|after| after.starts_with(phrase))
                .unwrap_or(false)
    })
}

/// Turns a queue label into a single safe path component
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}
