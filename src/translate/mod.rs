//! Machine translation backends and the supported-language table.

pub mod google;
pub mod languages;
pub mod translator;

pub use google::GoogleTranslator;
pub use languages::LanguageCode;
pub use translator::{StubTranslator, Translation, Translator};
