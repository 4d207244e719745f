//! Noun extraction for topic modeling.
//!
//! Diary text is tagged with Penn Treebank part-of-speech tags and only the
//! noun tags (`NN`, `NNS`, `NNP`, `NNPS`) are kept. Tagging sits behind
//! [`PosTagger`]: the default is a transformer tagger from `rust-bert`
//! (feature `bert-pos`), and [`LexiconTagger`] is a fallback that needs no
//! model files or libtorch.

use std::collections::HashMap;

use tracing::debug;

use crate::config::TaggerKind;
use crate::error::Result;
use crate::text::tokenize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn is_noun(&self) -> bool {
        self.tag.starts_with("NN")
    }
}

pub trait PosTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>>;

    fn name(&self) -> &str;
}

/// Keeps the nouns of `text`, joined by single spaces.
pub fn extract_nouns(tagger: &dyn PosTagger, text: &str) -> Result<String> {
    let nouns: Vec<String> = tagger
        .tag(text)?
        .into_iter()
        .filter(TaggedToken::is_noun)
        .map(|t| t.word)
        .collect();
    Ok(nouns.join(" "))
}

pub fn build_tagger(kind: TaggerKind) -> Result<Box<dyn PosTagger>> {
    match kind {
        TaggerKind::Lexicon => Ok(Box::new(LexiconTagger::new())),
        #[cfg(feature = "bert-pos")]
        TaggerKind::Bert => Ok(Box::new(bert::BertPosTagger::new()?)),
        #[cfg(not(feature = "bert-pos"))]
        TaggerKind::Bert => Err(crate::error::DiaryError::config(
            "the bert tagger needs the `bert-pos` cargo feature",
        )),
    }
}

const CLOSED_CLASSES: &[(&str, &[&str])] = &[
    ("DT", &[
        "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no",
        "all", "both", "either", "neither", "another", "such", "half",
    ]),
    ("PRP", &[
        "i", "me", "you", "he", "him", "she", "her", "it", "we", "us", "they", "them", "myself",
        "yourself", "himself", "herself", "itself", "ourselves", "yourselves", "themselves",
        "im", "ive", "ill", "id", "youre", "theyre", "hes", "shes", "its",
    ]),
    ("PRP$", &["my", "your", "his", "our", "their", "mine", "yours", "hers", "ours", "theirs"]),
    ("IN", &[
        "about", "above", "across", "after", "against", "along", "among", "around", "at",
        "before", "behind", "below", "beneath", "beside", "besides", "between", "beyond", "by",
        "despite", "down", "during", "except", "for", "from", "in", "inside", "into", "like",
        "near", "of", "off", "on", "onto", "out", "outside", "over", "past", "since", "through",
        "throughout", "till", "toward", "towards", "under", "underneath", "until", "up", "upon",
        "via", "with", "within", "without", "than", "because", "although", "though", "while",
        "whereas", "if", "unless", "whether", "as",
    ]),
    ("CC", &["and", "but", "or", "nor", "yet", "plus", "so"]),
    ("TO", &["to"]),
    ("MD", &["can", "could", "may", "might", "must", "shall", "should", "will", "would", "cant", "wont"]),
    ("VB", &[
        "be", "have", "do", "get", "go", "make", "take", "come", "see", "know", "think", "say",
        "tell", "give", "find", "feel", "leave", "buy", "spend", "pay", "eat", "drink", "sleep",
        "wake", "need", "want", "try", "decide", "use", "put", "let", "keep", "bring", "sit",
        "stand", "grab", "pick", "head", "start", "finish", "realize", "remember", "forget",
        "hope", "hate", "wear", "read", "write",
    ]),
    ("VBP", &["am", "are", "dont", "doesnt", "isnt", "arent"]),
    ("VBZ", &["is", "has", "does", "gets", "goes", "makes", "takes", "comes", "says", "seems"]),
    ("VBD", &[
        "was", "were", "had", "did", "got", "went", "made", "took", "came", "saw", "knew",
        "thought", "said", "told", "gave", "found", "felt", "left", "bought", "spent", "paid",
        "ate", "drank", "slept", "woke", "ran", "sat", "stood", "brought", "kept", "wore",
        "wrote", "didnt", "wasnt", "couldnt", "wouldnt",
    ]),
    ("VBN", &["been", "gone", "done", "eaten", "taken", "given", "seen", "known", "gotten", "written"]),
    ("VBG", &["being", "having", "doing", "going", "getting"]),
    ("RB", &[
        "not", "never", "also", "just", "very", "really", "too", "always", "often", "sometimes",
        "usually", "already", "still", "even", "again", "then", "now", "here", "there", "soon",
        "later", "almost", "quite", "rather", "ever", "maybe", "perhaps", "instead", "together",
        "away", "back", "once", "twice", "anyway", "probably", "definitely", "finally",
        "actually", "basically", "especially", "only", "well", "else", "ago", "tonight",
    ]),
    ("JJ", &[
        "good", "great", "new", "old", "big", "small", "little", "other", "same", "different",
        "last", "next", "first", "few", "many", "much", "more", "most", "less", "least", "own",
        "sure", "able", "happy", "excited", "tired", "busy", "free", "early", "late", "nice",
        "hard", "cheap", "expensive", "long", "short", "whole", "full", "quick", "fun",
        "okay", "ok", "bad", "best", "better", "worse", "worst", "final", "extra", "huge",
        "healthy", "hungry", "fresh", "favorite", "tasty", "cozy", "lazy", "fancy", "sweet",
        "hot", "cold", "warm", "local", "cute",
    ]),
    ("CD", &[
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
        "twelve", "hundred", "thousand", "million",
    ]),
    ("WDT", &["which", "whatever", "whichever"]),
    ("WP", &["what", "who", "whom", "whose", "whoever"]),
    ("WRB", &["when", "where", "why", "how"]),
    ("UH", &["oh", "yes", "yeah", "wow", "lol", "ugh", "hey", "hi", "please", "thanks"]),
];

// Open-class words the suffix rules would mis-tag.
const NOUN_EXCEPTIONS: &[&str] = &[
    "morning", "evening", "wedding", "building", "meeting", "clothing", "ceiling", "parking",
    "spring", "thing", "string", "pudding", "icing", "frosting", "stuffing", "lightning",
    "family", "supply", "belly", "jelly", "butterfly", "assembly", "rally", "anniversary",
    "news", "bus", "gas", "class", "glass", "dress", "business", "lens", "series",
];

// Both nouns and verbs in diary text. The previous tag decides.
const NOUN_VERBS: &[&str] = &[
    "cook", "walk", "watch", "order", "check", "love", "shop", "work", "call", "text", "plan",
    "drive", "visit", "run", "cost", "treat", "clean", "dance", "swim", "hike", "rest", "nap",
    "snack", "split", "return", "book", "cover", "drop", "stop", "meet", "share", "save",
];

// Tags after which a noun/verb word reads as a noun.
const NOUN_CONTEXT: &[&str] = &[
    "DT", "PRP$", "JJ", "CD", "IN", "NN", "NNS", "NNP", "NNPS", "POS",
];

const SUBJECT_PRONOUNS: &[&str] = &["i", "we", "you", "they"];
const THIRD_PERSON_PRONOUNS: &[&str] = &["he", "she", "it"];

/// Rule-based tagger: closed-class word lists, the previous token for
/// noun/verb ambiguity, a few suffix rules, and `NN`/`NNS` for everything
/// else.
pub struct LexiconTagger {
    lexicon: HashMap<&'static str, &'static str>,
}

impl LexiconTagger {
    pub fn new() -> Self {
        let mut lexicon = HashMap::new();
        for (tag, words) in CLOSED_CLASSES {
            for word in words.iter() {
                lexicon.entry(*word).or_insert(*tag);
            }
        }
        for word in NOUN_EXCEPTIONS {
            lexicon.insert(*word, "NN");
        }
        debug!("Lexicon tagger ready with {} entries", lexicon.len());
        Self { lexicon }
    }

    /// Tags `word` (lowercase) given the previous lowercase word and its tag.
    fn tag_word(&self, word: &str, prev: Option<(&str, &str)>) -> &'static str {
        if let Some(&tag) = self.lexicon.get(word) {
            return tag;
        }
        let after_subject = prev.is_some_and(|(w, _)| SUBJECT_PRONOUNS.contains(&w));
        let after_third_person = prev.is_some_and(|(w, _)| THIRD_PERSON_PRONOUNS.contains(&w));
        if NOUN_VERBS.contains(&word) {
            return match prev {
                None => "NN",
                Some((_, tag)) if NOUN_CONTEXT.contains(&tag) => "NN",
                Some(_) if after_subject => "VBP",
                Some(_) => "VB",
            };
        }
        match Self::tag_by_suffix(word) {
            "NN" | "NNS" if after_subject => "VBP",
            "NN" | "NNS" if after_third_person => "VBZ",
            tag => tag,
        }
    }

    fn tag_by_suffix(word: &str) -> &'static str {
        let len = word.chars().count();
        if !word.chars().any(char::is_alphabetic) {
            return "CD";
        }
        if len > 4 && word.ends_with("ly") {
            return "RB";
        }
        if len > 5 && word.ends_with("ing") {
            return "VBG";
        }
        if len > 4 && word.ends_with("ed") {
            return "VBD";
        }
        const ADJECTIVE_SUFFIXES: [&str; 8] =
            ["ous", "ful", "ive", "able", "ible", "ical", "less", "ish"];
        if len > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return "JJ";
        }
        if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
            return "NNS";
        }
        "NN"
    }
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let mut tagged = Vec::new();
        let mut prev: Option<(String, &'static str)> = None;
        for word in tokenize(text) {
            let lower = word.to_lowercase();
            let tag = self.tag_word(&lower, prev.as_ref().map(|(w, t)| (w.as_str(), *t)));
            tagged.push(TaggedToken {
                word: word.to_string(),
                tag: tag.to_string(),
            });
            prev = Some((lower, tag));
        }
        Ok(tagged)
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

/// Maps Universal Dependencies tags onto the nearest Penn Treebank tag.
/// Penn tags pass through unchanged.
pub fn universal_to_penn(label: &str) -> &str {
    match label {
        "NOUN" => "NN",
        "PROPN" => "NNP",
        "VERB" => "VB",
        "AUX" => "MD",
        "ADJ" => "JJ",
        "ADV" => "RB",
        "PRON" => "PRP",
        "DET" => "DT",
        "ADP" | "SCONJ" => "IN",
        "CCONJ" => "CC",
        "NUM" => "CD",
        "PART" => "RP",
        "INTJ" => "UH",
        "PUNCT" => ".",
        "SYM" => "SYM",
        "X" => "FW",
        other => other,
    }
}

#[cfg(feature = "bert-pos")]
mod bert {
    use rust_bert::pipelines::pos_tagging::POSModel;
    use tracing::info;

    use super::{universal_to_penn, PosTagger, TaggedToken};
    use crate::error::{DiaryError, Result};

    /// Transformer part-of-speech tagger. Downloads its weights on first use.
    pub struct BertPosTagger {
        model: POSModel,
    }

    impl BertPosTagger {
        pub fn new() -> Result<Self> {
            info!(
                "Loading POS model (cuda available: {})",
                tch::Cuda::is_available()
            );
            let model = POSModel::new(Default::default())
                .map_err(|e| DiaryError::model_fit("pos tagger", e.to_string()))?;
            Ok(Self { model })
        }
    }

    impl PosTagger for BertPosTagger {
        fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
            let output = self.model.predict(&[text]);
            let tags = output
                .into_iter()
                .next()
                .ok_or_else(|| DiaryError::model_fit("pos tagger", "no tagging output"))?;
            Ok(tags
                .into_iter()
                .map(|t| TaggedToken {
                    tag: universal_to_penn(&t.label).to_string(),
                    word: t.word,
                })
                .collect())
        }

        fn name(&self) -> &str {
            "bert"
        }
    }
}
