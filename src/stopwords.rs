// Standard English stop words plus the money-diary boilerplate that carries
// no topical signal (section headers, pay and housing vocabulary).

use std::collections::BTreeSet;

pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together",
    "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
    "yourself", "yourselves",
];

pub const DIARY_STOP_WORDS: &[&str] = &[
    "pm", "im", "day", "week", "total", "daily", "like", "today", "dont", "just", "women", "way",
    "really", "ive", "diaries", "got", "gets", "ill", "things", "bit", "sevenday", "hes", "let",
    "shes", "lot", "little", "decide", "ready", "feel", "goes", "stop", "finally", "welcome",
    "money", "period", "job", "share", "millennials", "occupation", "paycheck", "taboo",
    "dollar", "year", "month", "worth", "rent", "bonus", "expenses", "mortgage", "debt",
    "expensesmortgage", "industry", "expensesrent", "salary", "savings", "insurance", "loan",
    "loans", "income", "student", "dollartoday", "cash", "room", "account", "woman", "living",
    "house", "housing", "mortgagepaycheck", "half", "split", "apartment", "totaldebt",
    "checksavingscd", "stuff", "hour", "hours", "people", "place", "years", "minutes",
    "tomorrow", "couple", "head", "meeting",
];

/// Union of the English list and `extra`.
pub fn stop_word_set<S: AsRef<str>>(extra: &[S]) -> BTreeSet<String> {
    ENGLISH_STOP_WORDS
        .iter()
        .map(|w| w.to_string())
        .chain(extra.iter().map(|w| w.as_ref().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_keeps_both_lists() {
        let set = stop_word_set(DIARY_STOP_WORDS);
        assert!(set.contains("the"));
        assert!(set.contains("mortgage"));
        assert!(set.contains("paycheck"));
        assert!(!set.contains("coffee"));
    }

    #[test]
    fn test_extra_words_are_lowercased() {
        let set = stop_word_set(&["Brunch"]);
        assert!(set.contains("brunch"));
    }
}
