//! Word substitutions (`! sub` and `! person` definitions).
//!
//! A substitution replaces a whole run of words. Longer keys are tried
//! first, so `what is up` wins over `what is`, and replaced words are never
//! substituted again in the same pass.

/// An ordered table of word substitutions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    /// Most words first, then longest text, then declaration order.
    entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    from: Vec<String>,
    to: Vec<String>,
}

impl Substitutions {
    /// Build a table from `(from, to)` pairs. Keys are matched case-insensitively;
    /// an empty key is ignored.
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut entries: Vec<Entry> = pairs
            .into_iter()
            .filter_map(|(from, to)| {
                let from: Vec<String> = from.split_whitespace().map(str::to_lowercase).collect();
                if from.is_empty() {
                    return None;
                }
                let to = to.split_whitespace().map(str::to_string).collect();
                Some(Entry { from, to })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.from
                .len()
                .cmp(&a.from.len())
                .then_with(|| text_len(&b.from).cmp(&text_len(&a.from)))
        });
        Substitutions { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrite a word list in one left-to-right pass.
    pub fn apply(&self, words: &[String]) -> Vec<String> {
        if self.is_empty() {
            return words.to_vec();
        }
        let mut out = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            let rest = &words[i..];
            let hit = self.entries.iter().find(|entry| {
                entry.from.len() <= rest.len()
                    && entry
                        .from
                        .iter()
                        .zip(rest)
                        .all(|(key, word)| key.as_str() == word.to_lowercase())
            });
            match hit {
                Some(entry) => {
                    out.extend(entry.to.iter().cloned());
                    i += entry.from.len();
                }
                None => {
                    out.push(words[i].clone());
                    i += 1;
                }
            }
        }
        out
    }

    /// [`apply`](Self::apply) on whitespace-separated text.
    pub fn apply_text(&self, text: &str) -> String {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        self.apply(&words).join(" ")
    }
}

fn text_len(words: &[String]) -> usize {
    words.iter().map(String::len).sum::<usize>() + words.len().saturating_sub(1)
}
