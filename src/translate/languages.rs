//! Languages accepted as translation and synthesis targets.

use crate::error::{Result, VoxlateError};
use std::fmt;

/// Supported languages as `(code, English name)`, sorted by code.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("af", "afrikaans"),
    ("am", "amharic"),
    ("ar", "arabic"),
    ("az", "azerbaijani"),
    ("be", "belarusian"),
    ("bg", "bulgarian"),
    ("bn", "bengali"),
    ("bs", "bosnian"),
    ("ca", "catalan"),
    ("ceb", "cebuano"),
    ("co", "corsican"),
    ("cs", "czech"),
    ("cy", "welsh"),
    ("da", "danish"),
    ("de", "german"),
    ("el", "greek"),
    ("en", "english"),
    ("eo", "esperanto"),
    ("es", "spanish"),
    ("et", "estonian"),
    ("eu", "basque"),
    ("fa", "persian"),
    ("fi", "finnish"),
    ("fr", "french"),
    ("fy", "frisian"),
    ("ga", "irish"),
    ("gd", "scots gaelic"),
    ("gl", "galician"),
    ("gu", "gujarati"),
    ("ha", "hausa"),
    ("haw", "hawaiian"),
    ("he", "hebrew"),
    ("hi", "hindi"),
    ("hmn", "hmong"),
    ("hr", "croatian"),
    ("ht", "haitian creole"),
    ("hu", "hungarian"),
    ("hy", "armenian"),
    ("id", "indonesian"),
    ("ig", "igbo"),
    ("is", "icelandic"),
    ("it", "italian"),
    ("ja", "japanese"),
    ("jw", "javanese"),
    ("ka", "georgian"),
    ("kk", "kazakh"),
    ("km", "khmer"),
    ("kn", "kannada"),
    ("ko", "korean"),
    ("ku", "kurdish (kurmanji)"),
    ("ky", "kyrgyz"),
    ("la", "latin"),
    ("lb", "luxembourgish"),
    ("lo", "lao"),
    ("lt", "lithuanian"),
    ("lv", "latvian"),
    ("mg", "malagasy"),
    ("mi", "maori"),
    ("mk", "macedonian"),
    ("ml", "malayalam"),
    ("mn", "mongolian"),
    ("mr", "marathi"),
    ("ms", "malay"),
    ("mt", "maltese"),
    ("my", "myanmar (burmese)"),
    ("ne", "nepali"),
    ("nl", "dutch"),
    ("no", "norwegian"),
    ("ny", "chichewa"),
    ("or", "odia"),
    ("pa", "punjabi"),
    ("pl", "polish"),
    ("ps", "pashto"),
    ("pt", "portuguese"),
    ("ro", "romanian"),
    ("ru", "russian"),
    ("sd", "sindhi"),
    ("si", "sinhala"),
    ("sk", "slovak"),
    ("sl", "slovenian"),
    ("sm", "samoan"),
    ("sn", "shona"),
    ("so", "somali"),
    ("sq", "albanian"),
    ("sr", "serbian"),
    ("st", "sesotho"),
    ("su", "sundanese"),
    ("sv", "swedish"),
    ("sw", "swahili"),
    ("ta", "tamil"),
    ("te", "telugu"),
    ("tg", "tajik"),
    ("th", "thai"),
    ("tl", "filipino"),
    ("tr", "turkish"),
    ("ug", "uyghur"),
    ("uk", "ukrainian"),
    ("ur", "urdu"),
    ("uz", "uzbek"),
    ("vi", "vietnamese"),
    ("xh", "xhosa"),
    ("yi", "yiddish"),
    ("yo", "yoruba"),
    ("zh-cn", "chinese (simplified)"),
    ("zh-tw", "chinese (traditional)"),
    ("zu", "zulu"),
];

/// A validated entry of [`LANGUAGES`].
///
/// Only codes from the table can be constructed, so a `LanguageCode` is
/// always safe to embed in a file name or URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageCode(&'static str);

impl LanguageCode {
    /// Parse a code or English language name, case-insensitively.
    ///
    /// `"HI"`, `"hindi"` and `" hi "` all give `hi`. `"zh"` maps to
    /// simplified Chinese.
    pub fn parse(input: &str) -> Result<Self> {
        let wanted = input.trim().to_ascii_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "zh" => "zh-cn".to_string(),
            "iw" => "he".to_string(),
            _ => wanted,
        };

        LANGUAGES
            .iter()
            .find(|(code, name)| *code == wanted || *name == wanted)
            .map(|(code, _)| Self(code))
            .ok_or_else(|| VoxlateError::UnsupportedLanguage {
                code: input.trim().to_string(),
            })
    }

    pub fn code(&self) -> &'static str {
        self.0
    }

    /// English name of the language.
    pub fn name(&self) -> &'static str {
        LANGUAGES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
            .unwrap_or(self.0)
    }

    /// Code in the form Google endpoints expect (`zh-CN`).
    pub fn google_code(&self) -> String {
        match self.0.split_once('-') {
            Some((lang, region)) => format!("{lang}-{}", region.to_ascii_uppercase()),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in LANGUAGES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} before {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(LanguageCode::parse("HI").unwrap().code(), "hi");
        assert_eq!(LanguageCode::parse(" fr ").unwrap().code(), "fr");
        assert_eq!(LanguageCode::parse("zh-CN").unwrap().code(), "zh-cn");
        assert_eq!(LanguageCode::parse("zh_tw").unwrap().code(), "zh-tw");
    }

    #[test]
    fn parse_accepts_names_and_aliases() {
        assert_eq!(LanguageCode::parse("Hindi").unwrap().code(), "hi");
        assert_eq!(LanguageCode::parse("zh").unwrap().code(), "zh-cn");
        assert_eq!(LanguageCode::parse("iw").unwrap().code(), "he");
    }

    #[test]
    fn unknown_code_is_rejected() {
        match LanguageCode::parse("xx") {
            Err(VoxlateError::UnsupportedLanguage { code }) => assert_eq!(code, "xx"),
            other => panic!("expected UnsupportedLanguage, got {other:?}"),
        }
        assert!(LanguageCode::parse("").is_err());
        assert!(LanguageCode::parse("../../etc/passwd").is_err());
    }

    #[test]
    fn google_code_uppercases_region() {
        assert_eq!(LanguageCode::parse("zh-cn").unwrap().google_code(), "zh-CN");
        assert_eq!(LanguageCode::parse("hi").unwrap().google_code(), "hi");
    }

    #[test]
    fn name_and_display() {
        let code = LanguageCode::parse("ja").unwrap();
        assert_eq!(code.name(), "japanese");
        assert_eq!(code.to_string(), "ja");
    }
}
