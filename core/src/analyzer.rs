use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
    static ref DEFAULT_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Construction-time knobs for [`Analyzer`]. Both index and query sides of a
/// corpus must use the same settings or lookups will miss.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub remove_stopwords: bool,
    pub stem: bool,
    /// Replaces the built-in English list when set. Ignored unless
    /// `remove_stopwords` is on.
    pub stopwords: Option<HashSet<String>>,
}

impl Default for AnalyzerConfig {
    /// Stopword removal and stemming on, built-in stopword list.
    fn default() -> Self {
        AnalyzerConfig {
            remove_stopwords: true,
            stem: true,
            stopwords: None,
        }
    }
}

/// Turns raw field text into the ordered token sequence everything else
/// operates on: NFKC fold, hyphens to spaces, `\w+` extraction, lowercase,
/// then optional stopword removal and stemming.
pub struct Analyzer {
    stopwords: HashSet<String>,
    stemmer: Option<Stemmer>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let stopwords = if config.remove_stopwords {
            config
                .stopwords
                .unwrap_or_else(|| DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect())
        } else {
            HashSet::new()
        };
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };
        Analyzer { stopwords, stemmer }
    }

    /// Tokenization and filtering disabled down to the bare pipeline.
    pub fn plain() -> Self {
        Analyzer::new(AnalyzerConfig {
            remove_stopwords: false,
            stem: false,
            stopwords: None,
        })
    }

    /// Normalize one field's text. Absent text yields an empty sequence.
    pub fn normalize(&self, text: Option<&str>) -> Vec<String> {
        let Some(text) = text else {
            return Vec::new();
        };
        let folded = text.nfkc().collect::<String>().replace('-', " ");
        let lowered = folded.to_lowercase();
        let mut tokens = Vec::new();
        for mat in TOKEN_RE.find_iter(&lowered) {
            let token = mat.as_str();
            if self.stopwords.contains(token) {
                continue;
            }
            match &self.stemmer {
                Some(stemmer) => tokens.push(stemmer.stem(token).to_string()),
                None => tokens.push(token.to_string()),
            }
        }
        tokens
    }
}
