use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Resolved set of phrases used to scan transcript text for one request.
///
/// Phrases are always lowercased; callers lowercase transcript text the
/// same way before matching. An empty set is valid input and simply
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    phrases: Vec<String>,
}

impl KeywordSet {
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Literal substring match against already-lowercased text.
    /// No stemming, no tokenization, no word boundaries.
    pub fn matches(&self, lowercased_text: &str) -> bool {
        self.phrases.iter().any(|p| lowercased_text.contains(p.as_str()))
    }
}

/// Static category-to-phrases table used to resolve keyword sets.
///
/// Phrase lists hand-enumerate multilingual synonyms and transliterations
/// (English plus Arabic) for each sport, so matching needs no
/// language-specific normalization beyond lowercasing.
#[derive(Debug, Clone)]
pub struct SportLexicon {
    phrases: HashMap<String, Vec<String>>,
}

impl SportLexicon {
    /// Create a lexicon with the built-in sport keyword table
    pub fn new() -> Self {
        let mut lexicon = Self {
            phrases: HashMap::new(),
        };
        lexicon.load_default_phrases();
        lexicon
    }

    /// Load a lexicon from a plain-text file.
    ///
    /// Format: `[Category]` headers followed by one phrase per line;
    /// empty lines and `#` comments are skipped.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let mut lexicon = Self {
            phrases: HashMap::new(),
        };
        lexicon.parse_phrases_file(&content);
        info!("Loaded sport lexicon from: {}", path.as_ref().display());
        Ok(lexicon)
    }

    /// Resolve the keyword set for one request.
    ///
    /// A selected moment (other than the `"all"` sentinel) overrides the
    /// category: underscores become spaces, so `penalty_kick` scans for
    /// `penalty kick`. A blank moment counts as absent — upload forms
    /// post an empty string for an unfilled field, and an empty phrase
    /// would match every segment. Otherwise the full phrase list for the
    /// category is used. An unknown category resolves to an empty set
    /// rather than an error; the miss is logged so typos stay observable.
    pub fn resolve(&self, category: &str, selected_moment: Option<&str>) -> KeywordSet {
        if let Some(moment) = selected_moment {
            let moment = moment.trim();
            if !moment.is_empty() && moment != "all" {
                return KeywordSet::new(vec![moment.replace('_', " ")]);
            }
        }

        match self.phrases.get(category) {
            Some(phrases) => KeywordSet::new(phrases.clone()),
            None => {
                warn!("Unknown sport category '{}', no keywords resolved", category);
                KeywordSet::default()
            }
        }
    }

    /// Category names, sorted for stable listing
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.phrases.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.phrases.contains_key(category)
    }

    /// Add a phrase to a category
    pub fn add_phrase(&mut self, category: &str, phrase: String) {
        self.phrases
            .entry(category.to_string())
            .or_default()
            .push(phrase);
    }

    fn load_default_phrases(&mut self) {
        let handball = vec![
            "goal", "هدف", "قول",
            "save", "تصدي", "صد",
            "penalty", "ركلة جزاء", "بلنتي",
            "fast break", "هجمة مرتدة", "مرتدة سريعة",
            "turnover", "فقدان الكرة", "خسارة الكرة",
            "block", "اعتراض", "بلوك",
        ];

        let martial_arts = vec![
            "knockout", "ضربة قاضية", "كي أو",
            "submission", "اخضاع", "تسليم",
            "takedown", "طرح أرضًا", "مسكة",
            "punch", "لكمة", "بوكس",
            "kick", "ركلة", "شوت",
            "roundhouse", "ركلة دائرية", "ركلة دوران",
        ];

        let car_racing = vec![
            "overtake", "تجاوز", "عداه",
            "crash", "حادث", "خبط", "اصطدام",
            "fastest lap", "أسرع لفة", "أسرع دورة",
            "pit stop", "توقف للصيانة", "بيت ستوب",
            "final lap", "اللفة الأخيرة", "الدورة الأخيرة",
            "victory", "فوز", "ربح", "نصر",
        ];

        let basketball = vec![
            "3-pointer", "ثلاثية", "ثلاث نقاط",
            "slam dunk", "تغميسة", "دانك",
            "fast break", "هجمة مرتدة", "مرتدة سريعة",
            "steal", "سرقة الكرة", "خطف الكرة",
            "assist", "تمريرة حاسمة", "باص حاسم",
            "foul", "خطأ", "فاول",
        ];

        let football = vec![
            "goal", "هدف", "قول",
            "penalty kick", "ركلة جزاء", "بلنتي",
            "shot", "تسديدة", "شوت",
            "dangerous attack", "هجمة خطيرة", "هجمة قوية",
            "corner kick", "ركنية", "ضربة زاوية",
            "yellow card", "بطاقة صفراء", "كرت أصفر",
            "red card", "بطاقة حمراء", "كرت أحمر",
        ];

        let table = [
            ("Handball", handball),
            ("Martial Arts", martial_arts),
            ("Car Racing", car_racing),
            ("Basketball", basketball),
            ("Football", football),
        ];

        for (category, phrases) in table {
            self.phrases.insert(
                category.to_string(),
                phrases.into_iter().map(String::from).collect(),
            );
        }
    }

    fn parse_phrases_file(&mut self, content: &str) {
        let mut current_category: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_category = Some(line[1..line.len() - 1].to_string());
                continue;
            }

            if let Some(ref category) = current_category {
                self.add_phrase(category, line.to_string());
            } else {
                warn!("Ignoring lexicon phrase before first category header: {}", line);
            }
        }
    }

    /// Total phrase count across categories
    pub fn phrase_count(&self) -> usize {
        self.phrases.values().map(|v| v.len()).sum()
    }
}

impl Default for SportLexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicon_creation() {
        let lexicon = SportLexicon::new();

        assert_eq!(lexicon.categories().len(), 5);
        assert!(lexicon.contains_category("Football"));
        assert!(lexicon.contains_category("Handball"));
        assert!(lexicon.phrase_count() > 0);
    }

    #[test]
    fn test_resolve_category() {
        let lexicon = SportLexicon::new();
        let keywords = lexicon.resolve("Football", None);

        assert!(!keywords.is_empty());
        assert!(keywords.phrases().contains(&"goal".to_string()));
        assert!(keywords.phrases().contains(&"penalty kick".to_string()));
    }

    #[test]
    fn test_resolve_selected_moment_overrides_category() {
        let lexicon = SportLexicon::new();
        let keywords = lexicon.resolve("Football", Some("penalty_kick"));

        assert_eq!(keywords.phrases(), &["penalty kick".to_string()]);
    }

    #[test]
    fn test_resolve_all_sentinel_uses_full_category() {
        let lexicon = SportLexicon::new();
        let keywords = lexicon.resolve("Basketball", Some("all"));

        assert!(keywords.len() > 1);
        assert!(keywords.phrases().contains(&"slam dunk".to_string()));
    }

    #[test]
    fn test_resolve_blank_moment_falls_back_to_category() {
        let lexicon = SportLexicon::new();

        // An unfilled form field posts an empty string; it must not
        // become an empty phrase that matches every segment.
        let keywords = lexicon.resolve("Football", Some(""));
        assert!(keywords.len() > 1);
        assert!(keywords.phrases().contains(&"goal".to_string()));
        assert!(!keywords.matches("nothing here"));

        let keywords = lexicon.resolve("Football", Some("   "));
        assert!(keywords.phrases().contains(&"goal".to_string()));
    }

    #[test]
    fn test_resolve_unknown_category_is_empty() {
        let lexicon = SportLexicon::new();
        let keywords = lexicon.resolve("Cricket", None);

        assert!(keywords.is_empty());
    }

    #[test]
    fn test_keyword_set_lowercases_phrases() {
        let lexicon = SportLexicon::new();
        let keywords = lexicon.resolve("Football", Some("Penalty_Kick"));

        assert_eq!(keywords.phrases(), &["penalty kick".to_string()]);
    }

    #[test]
    fn test_keyword_set_substring_match() {
        let keywords = KeywordSet::new(vec!["goal".to_string(), "save".to_string()]);

        assert!(keywords.matches("what a goal that was"));
        assert!(keywords.matches("goalkeeper under pressure")); // substring, not word boundary
        assert!(!keywords.matches("nothing here"));
        assert!(!KeywordSet::default().matches("what a goal"));
    }

    #[test]
    fn test_lexicon_from_file() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("lexicon.txt");
            tokio::fs::write(&path, "# custom\n[Tennis]\nace\nbreak point\n")
                .await
                .unwrap();

            let lexicon = SportLexicon::from_file(&path).await.unwrap();
            assert!(lexicon.contains_category("Tennis"));
            assert_eq!(lexicon.resolve("Tennis", None).len(), 2);
        });
    }
}
