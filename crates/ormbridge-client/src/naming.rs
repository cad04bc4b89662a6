//! Collection naming.

use std::fmt;

/// Kebab-case a model name: `@` and apostrophes are dropped, Latin-1
/// accented letters lose their accents, `/` becomes a separator, and words
/// split at case changes, digit boundaries and any other non-alphanumeric
/// character.
///
/// ```
/// use ormbridge_client::naming::kebab_collection_name;
///
/// assert_eq!(kebab_collection_name("MyPluralNames"), "my-plural-names");
/// assert_eq!(kebab_collection_name("@my-scope/Items"), "my-scope-items");
/// assert_eq!(kebab_collection_name("Café Orders"), "cafe-orders");
/// ```
pub fn kebab_collection_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '@' | '\'' | '\u{2019}' => {}
            // Combining diacritical marks.
            '\u{0300}'..='\u{036f}' => {}
            '/' => cleaned.push('-'),
            _ => match deburr(c) {
                Some(plain) => cleaned.push_str(plain),
                None => cleaned.push(c),
            },
        }
    }

    split_words(&cleaned)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// ASCII form of a Latin-1 Supplement letter.
fn deburr(c: char) -> Option<&'static str> {
    let plain = match c {
        'À'..='Å' => "A",
        'à'..='å' => "a",
        'Ç' => "C",
        'ç' => "c",
        'È'..='Ë' => "E",
        'è'..='ë' => "e",
        'Ì'..='Ï' => "I",
        'ì'..='ï' => "i",
        'Ð' => "D",
        'ð' => "d",
        'Ñ' => "N",
        'ñ' => "n",
        'Ò'..='Ö' | 'Ø' => "O",
        'ò'..='ö' | 'ø' => "o",
        'Ù'..='Ü' => "U",
        'ù'..='ü' => "u",
        'Ý' => "Y",
        'ý' | 'ÿ' => "y",
        'Æ' => "Ae",
        'æ' => "ae",
        'Þ' => "Th",
        'þ' => "th",
        'ß' => "ss",
        _ => return None,
    };
    Some(plain)
}

fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic())
                // "HTMLParser": split before the last capital of a run
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Older rule: lowercase, then the first `_` and first space become `-`.
pub fn legacy_collection_name(name: &str) -> String {
    name.to_lowercase().replacen('_', "-", 1).replacen(' ', "-", 1)
}

/// How model names map to collection names.
#[derive(Clone, Copy, Default)]
pub enum NamingStrategy {
    /// [`kebab_collection_name`].
    #[default]
    Kebab,
    /// [`legacy_collection_name`].
    Legacy,
    /// Caller-supplied mapping.
    Custom(fn(&str) -> String),
}

impl NamingStrategy {
    /// Collection name for a model name.
    pub fn collection_name(&self, model_name: &str) -> String {
        match self {
            NamingStrategy::Kebab => kebab_collection_name(model_name),
            NamingStrategy::Legacy => legacy_collection_name(model_name),
            NamingStrategy::Custom(f) => f(model_name),
        }
    }
}

impl fmt::Debug for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingStrategy::Kebab => write!(f, "Kebab"),
            NamingStrategy::Legacy => write!(f, "Legacy"),
            NamingStrategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
