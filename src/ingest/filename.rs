//! Filesystem-safe file names
//!
//! Output only contains `[a-z0-9._-]`, has no directory part and is never
//! empty.

use std::sync::OnceLock;

use regex::Regex;

const FALLBACK_STEM: &str = "file";

static UNSAFE: OnceLock<Regex> = OnceLock::new();
static DASHES: OnceLock<Regex> = OnceLock::new();

fn unsafe_regex() -> &'static Regex {
    UNSAFE.get_or_init(|| Regex::new(r"[^a-z0-9._-]+").expect("static pattern"))
}

fn dashes_regex() -> &'static Regex {
    DASHES.get_or_init(|| Regex::new(r"-{2,}").expect("static pattern"))
}

/// Latin letters with diacritics to their closest ASCII spelling
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

fn ascii_fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(folded) = fold_char(c) {
            out.push_str(folded);
        } else if c.is_whitespace() {
            out.push('-');
        }
    }
    out
}

fn clean_part(part: &str) -> String {
    let folded = ascii_fold(part);
    let replaced = unsafe_regex().replace_all(&folded, "-");
    let collapsed = dashes_regex().replace_all(&replaced, "-");
    collapsed.trim_matches(|c| c == '-' || c == '.').to_string()
}

/// Make an uploaded file name safe to store
pub fn normalize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original)
        .trim();

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.trim_matches('.').is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let mut stem = clean_part(stem);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }

    match ext.map(clean_part).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names_survive() {
        assert_eq!(normalize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(normalize_filename("my_file-2.tar.gz"), "my_file-2.tar.gz");
    }

    #[test]
    fn test_strips_directories() {
        assert_eq!(normalize_filename("../../etc/passwd"), "passwd");
        assert_eq!(normalize_filename("C:\\Users\\me\\Photo.JPG"), "photo.jpg");
    }

    #[test]
    fn test_folds_and_replaces() {
        assert_eq!(normalize_filename("Crème Brûlée (1).PNG"), "creme-brulee-1.png");
        assert_eq!(normalize_filename("Straße  Ålesund.jpeg"), "strasse-alesund.jpeg");
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(normalize_filename(""), "file");
        assert_eq!(normalize_filename("日本.png"), "file.png");
        assert_eq!(normalize_filename(".htaccess"), "htaccess");
        assert_eq!(normalize_filename("dir/"), "file");
    }
}
