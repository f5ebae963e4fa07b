/// A supported locale: its tag and the language name used by the stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub tag: &'static str,
    pub name: &'static str,
}

pub const LOCALES: &[Locale] = &[
    Locale { tag: "en", name: "english" },
    Locale { tag: "de", name: "german" },
    Locale { tag: "fr", name: "french" },
    Locale { tag: "es", name: "spanish" },
    Locale { tag: "ca", name: "catalan" },
    Locale { tag: "it", name: "italian" },
    Locale { tag: "tr", name: "turkish" },
    Locale { tag: "nl", name: "dutch" },
    Locale { tag: "el", name: "greek" },
];

pub fn name_by_tag(tag: &str) -> Option<&'static str> {
    LOCALES.iter().find(|l| l.tag == tag).map(|l| l.name)
}

pub fn tag_by_name(name: &str) -> Option<&'static str> {
    LOCALES.iter().find(|l| l.name == name).map(|l| l.tag)
}

pub fn exists(tag: &str) -> bool {
    LOCALES.iter().any(|l| l.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(name_by_tag("fr"), Some("french"));
        assert_eq!(tag_by_name("dutch"), Some("nl"));
        assert_eq!(name_by_tag("xx"), None);
        assert!(exists("el"));
        assert!(!exists("english"));
    }
}
